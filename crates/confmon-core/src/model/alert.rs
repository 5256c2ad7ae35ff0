//! Alert rules attached to groups

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;
use uuid::Uuid;

use super::template::{Template, TemplateKind};
use crate::merge::{ConfigMap, MergeStrategy, merge};
use crate::{Error, Result};

/// Config key holding the alert's pending duration
pub const FOR_DURATION_KEY: &str = "for_duration";
/// Config key holding custom labels
pub const LABELS_KEY: &str = "labels";
/// Config key holding custom annotations
pub const ANNOTATIONS_KEY: &str = "annotations";

static DURATION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(0|([0-9]+(ms|s|m|h|d|w|y))+)$").unwrap());

/// Alert severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    #[default]
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_true() -> bool {
    true
}

fn default_rule_priority() -> i32 {
    100
}

fn default_rule_strategy() -> MergeStrategy {
    MergeStrategy::Override
}

/// An alert rule owned by a group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRule {
    pub id: Uuid,
    pub group_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_name: Option<String>,
    /// Logical alert name; rules with equal names across a hierarchy are one alert
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub severity: Severity,
    pub query_template: String,
    #[serde(default)]
    pub default_config: ConfigMap,
    #[serde(default)]
    pub config: ConfigMap,
    #[serde(default = "default_rule_strategy")]
    pub merge_strategy: MergeStrategy,
    #[serde(default = "default_rule_priority")]
    pub priority: i32,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl AlertRule {
    pub fn new(group_id: Uuid, name: impl Into<String>, query_template: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            group_id,
            template_id: None,
            template_name: None,
            name: name.into(),
            description: String::new(),
            severity: Severity::default(),
            query_template: query_template.into(),
            default_config: ConfigMap::new(),
            config: ConfigMap::new(),
            merge_strategy: default_rule_strategy(),
            priority: default_rule_priority(),
            enabled: true,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Materialize an alert template on a group.
    ///
    /// The template's content becomes the query template and its defaults
    /// the rule's default config.
    pub fn from_template(
        template: &Template,
        group_id: Uuid,
        severity: Severity,
        config: ConfigMap,
    ) -> Result<Self> {
        if template.kind != TemplateKind::Alert {
            return Err(Error::validation(
                "template_id",
                format!(
                    "template '{}' is a {} template, expected alert",
                    template.name, template.kind
                ),
            ));
        }

        let mut rule = Self::new(group_id, template.name.clone(), template.content.clone());
        rule.template_id = Some(template.id);
        rule.template_name = Some(template.name.clone());
        rule.description = template.description.clone();
        rule.severity = severity;
        rule.default_config = template.default_config.clone();
        rule.config = config;
        Ok(rule)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_config(mut self, config: ConfigMap) -> Self {
        self.config = config;
        self
    }

    pub fn with_default_config(mut self, config: ConfigMap) -> Self {
        self.default_config = config;
        self
    }

    pub fn with_strategy(mut self, strategy: MergeStrategy) -> Self {
        self.merge_strategy = strategy;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Enabled and not soft-deleted.
    pub fn is_live(&self) -> bool {
        self.enabled && self.deleted_at.is_none()
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Default config with this rule's own config on top.
    pub fn merged_config(&self) -> ConfigMap {
        merge(&self.default_config, &self.config)
    }
}

/// Generation-relevant settings extracted from an alert's merged config
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertOptions {
    pub for_duration: Option<String>,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
}

impl AlertOptions {
    /// Read `for_duration`, `labels`, and `annotations` from a config map.
    ///
    /// Fails when the duration is not valid Prometheus duration syntax or
    /// when labels/annotations are not flat objects.
    pub fn from_config(config: &ConfigMap) -> Result<Self> {
        let for_duration = match config.get(FOR_DURATION_KEY) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.is_empty() => None,
            Some(Value::String(s)) => {
                if !is_valid_duration(s) {
                    return Err(Error::validation(
                        FOR_DURATION_KEY,
                        format!("'{}' is not a valid duration", s),
                    ));
                }
                Some(s.clone())
            }
            Some(other) => {
                return Err(Error::validation(
                    FOR_DURATION_KEY,
                    format!("expected a duration string, got {}", other),
                ));
            }
        };

        Ok(Self {
            for_duration,
            labels: string_map(config, LABELS_KEY)?,
            annotations: string_map(config, ANNOTATIONS_KEY)?,
        })
    }
}

/// Prometheus duration syntax, e.g. `5m`, `1h30m`, `250ms`.
pub fn is_valid_duration(value: &str) -> bool {
    DURATION_PATTERN.is_match(value)
}

fn string_map(config: &ConfigMap, key: &str) -> Result<BTreeMap<String, String>> {
    let object = match config.get(key) {
        None | Some(Value::Null) => return Ok(BTreeMap::new()),
        Some(Value::Object(object)) => object,
        Some(other) => {
            return Err(Error::validation(
                key,
                format!("expected an object, got {}", other),
            ));
        }
    };

    object
        .iter()
        .map(|(name, value)| match value {
            Value::String(s) => Ok((name.clone(), s.clone())),
            Value::Number(_) | Value::Bool(_) => Ok((name.clone(), value.to_string())),
            other => Err(Error::validation(
                format!("{}.{}", key, name),
                format!("expected a scalar value, got {}", other),
            )),
        })
        .collect()
}
