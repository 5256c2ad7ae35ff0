//! Runtime settings

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Resolved settings for generation, reload, and logging
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub rules: RulesSettings,
    pub reload: ReloadSettings,
    pub logging: LoggingSettings,
}

/// Where rule files go and how old versions are kept
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesSettings {
    pub dir: PathBuf,
    pub backup_enabled: bool,
    /// Defaults to `<dir>/.backup`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_dir: Option<PathBuf>,
    pub backup_retention_hours: u64,
}

impl Default for RulesSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("/etc/prometheus/rules/generated"),
            backup_enabled: true,
            backup_dir: None,
            backup_retention_hours: 168,
        }
    }
}

impl RulesSettings {
    pub fn backup_dir(&self) -> PathBuf {
        self.backup_dir
            .clone()
            .unwrap_or_else(|| self.dir.join(".backup"))
    }

    pub fn backup_retention(&self) -> Duration {
        Duration::from_secs(self.backup_retention_hours.saturating_mul(3600))
    }
}

/// How to reach the monitoring engine's reload endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReloadSettings {
    pub enabled: bool,
    /// Base URL; `/-/reload` is appended
    pub url: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub retry_multiplier: f64,
}

impl Default for ReloadSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            url: "http://localhost:9090".to_string(),
            timeout_secs: 30,
            max_retries: 3,
            retry_delay_ms: 1000,
            retry_multiplier: 2.0,
        }
    }
}

impl ReloadSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
