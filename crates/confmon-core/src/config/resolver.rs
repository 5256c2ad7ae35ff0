//! Layered settings resolution
//!
//! Settings are assembled from several sources, later ones winning:
//! 1. Built-in defaults
//! 2. Global file (`<config_dir>/confmon/config.toml`)
//! 3. Explicit file given on the command line
//! 4. `CONFMON_*` environment variables
//!
//! File layers are deep-merged, so a layer only needs the keys it changes.

use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use super::settings::Settings;
use crate::{Error, Result};
use confmon_fs::ConfigStore;

const ENV_PREFIX: &str = "CONFMON_";

/// Value type an environment variable is parsed as
#[derive(Clone, Copy)]
enum EnvKind {
    Text,
    Bool,
    Integer,
}

/// Environment variable, settings path, and value type
const ENV_OVERRIDES: &[(&str, [&str; 2], EnvKind)] = &[
    ("CONFMON_RULES_DIR", ["rules", "dir"], EnvKind::Text),
    ("CONFMON_RULES_BACKUP_DIR", ["rules", "backup_dir"], EnvKind::Text),
    ("CONFMON_RULES_BACKUP_ENABLED", ["rules", "backup_enabled"], EnvKind::Bool),
    ("CONFMON_RELOAD_ENABLED", ["reload", "enabled"], EnvKind::Bool),
    ("CONFMON_RELOAD_URL", ["reload", "url"], EnvKind::Text),
    ("CONFMON_RELOAD_TIMEOUT_SECS", ["reload", "timeout_secs"], EnvKind::Integer),
    ("CONFMON_LOG_LEVEL", ["logging", "level"], EnvKind::Text),
];

/// Resolves [`Settings`] from defaults, files, and environment
#[derive(Debug, Default)]
pub struct SettingsResolver {
    config_file: Option<PathBuf>,
    /// Override for the global config directory (used for testing)
    global_config_dir_override: Option<PathBuf>,
    env: Vec<(String, String)>,
}

impl SettingsResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `dir` instead of the platform config directory for layer 2.
    pub fn with_global_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.global_config_dir_override = Some(dir.into());
        self
    }

    /// Add an explicit settings file as layer 3. It must exist.
    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Supply environment variables; only `CONFMON_*` entries are kept.
    pub fn with_env<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(k, _)| k.starts_with(ENV_PREFIX))
            .collect();
        self
    }

    fn global_config_dir(&self) -> Option<PathBuf> {
        if let Some(ref dir) = self.global_config_dir_override {
            return Some(dir.clone());
        }
        dirs::config_dir().map(|d| d.join("confmon"))
    }

    pub fn resolve(&self) -> Result<Settings> {
        let mut merged = serde_json::to_value(Settings::default())?;

        if let Some(global_dir) = self.global_config_dir() {
            let global_path = global_dir.join("config.toml");
            if global_path.is_file() {
                tracing::debug!(?global_path, "Loading global settings (layer 2)");
                deep_merge_value(&mut merged, &load_layer(&global_path)?);
            } else {
                tracing::debug!(?global_path, "No global settings found (layer 2), skipping");
            }
        }

        if let Some(ref path) = self.config_file {
            if !path.is_file() {
                return Err(Error::not_found("settings file", path.display()));
            }
            tracing::debug!(?path, "Loading settings file (layer 3)");
            deep_merge_value(&mut merged, &load_layer(path)?);
        }

        self.apply_env(&mut merged)?;

        Ok(serde_json::from_value(merged)?)
    }

    fn apply_env(&self, merged: &mut Value) -> Result<()> {
        for (name, [section, key], kind) in ENV_OVERRIDES {
            let Some((_, raw)) = self.env.iter().find(|(k, _)| k == name) else {
                continue;
            };
            let value = parse_env(name, raw, *kind)?;
            tracing::debug!(variable = %name, "Applying environment override (layer 4)");

            let mut patch = Map::new();
            patch.insert((*key).to_string(), value);
            let mut layer = Map::new();
            layer.insert((*section).to_string(), Value::Object(patch));
            deep_merge_value(merged, &Value::Object(layer));
        }
        Ok(())
    }
}

fn load_layer(path: &Path) -> Result<Value> {
    Ok(ConfigStore::new().load(path)?)
}

fn parse_env(name: &str, raw: &str, kind: EnvKind) -> Result<Value> {
    match kind {
        EnvKind::Text => Ok(Value::String(raw.to_string())),
        EnvKind::Bool => match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Value::Bool(true)),
            "0" | "false" | "no" | "off" => Ok(Value::Bool(false)),
            _ => Err(Error::validation(name, format!("expected a boolean, got '{}'", raw))),
        },
        EnvKind::Integer => raw
            .parse::<u64>()
            .map(Value::from)
            .map_err(|_| Error::validation(name, format!("expected an integer, got '{}'", raw))),
    }
}

/// Recursively merge `other` into `base`; objects merge key by key, anything else is replaced.
fn deep_merge_value(base: &mut Value, other: &Value) {
    match (base, other) {
        (Value::Object(base_map), Value::Object(other_map)) => {
            for (key, other_val) in other_map {
                if let Some(base_val) = base_map.get_mut(key) {
                    deep_merge_value(base_val, other_val);
                } else {
                    base_map.insert(key.clone(), other_val.clone());
                }
            }
        }
        (base, other) => {
            *base = other.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deep_merge_keeps_untouched_siblings() {
        let mut base = json!({"reload": {"enabled": true, "url": "http://a"}});
        deep_merge_value(&mut base, &json!({"reload": {"url": "http://b"}}));
        assert_eq!(base, json!({"reload": {"enabled": true, "url": "http://b"}}));
    }

    #[test]
    fn env_booleans_accept_common_spellings() {
        assert_eq!(parse_env("X", "yes", EnvKind::Bool).unwrap(), json!(true));
        assert_eq!(parse_env("X", "0", EnvKind::Bool).unwrap(), json!(false));
        assert!(parse_env("X", "maybe", EnvKind::Bool).is_err());
    }

    #[test]
    fn non_prefixed_env_is_ignored() {
        let resolver = SettingsResolver::new().with_env([("HOME", "/root"), ("CONFMON_LOG_LEVEL", "debug")]);
        assert_eq!(resolver.env.len(), 1);
    }
}
