//! Computed resolution results
//!
//! These are never stored. They are rebuilt from live rows every time a
//! target is resolved.

use serde::Serialize;
use uuid::Uuid;

use super::alert::{AlertRule, Severity};
use super::instance::Instance;
use super::scope::Scope;
use super::template::TemplateKind;
use crate::merge::{ConfigMap, MergeStrategy};

/// The winning check or script for one logical policy
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectiveCheck {
    pub instance_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<Uuid>,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TemplateKind,
    pub content: String,
    pub language: String,
    pub content_hash: String,
    pub scope: String,
    pub priority: i32,
    /// Template defaults merged with the instance override
    pub config: ConfigMap,
    #[serde(skip)]
    pub source_scope: Scope,
}

impl From<&Instance> for EffectiveCheck {
    fn from(instance: &Instance) -> Self {
        Self {
            instance_id: instance.id,
            template_id: instance.template_id,
            name: instance.name.clone(),
            kind: instance.kind,
            content: instance.content.clone(),
            language: instance.language.clone(),
            content_hash: instance.content_hash.clone(),
            scope: instance.scope_identifier(),
            priority: instance.priority,
            config: instance.effective_config(),
            source_scope: instance.scope,
        }
    }
}

/// The winning alert rule for one alert name after hierarchy resolution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectiveAlertRule {
    pub rule_id: Uuid,
    pub name: String,
    pub description: String,
    pub severity: Severity,
    /// Group whose rule supplied the final definition
    pub source_group_id: Uuid,
    pub merge_strategy: MergeStrategy,
    /// Rendered query, or the raw template when rendering failed
    pub query: String,
    pub query_template: String,
    pub config: ConfigMap,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub render_error: Option<String>,
}

impl EffectiveAlertRule {
    pub fn new(rule: &AlertRule, config: ConfigMap, query: String) -> Self {
        Self {
            rule_id: rule.id,
            name: rule.name.clone(),
            description: rule.description.clone(),
            severity: rule.severity,
            source_group_id: rule.group_id,
            merge_strategy: rule.merge_strategy,
            query,
            query_template: rule.query_template.clone(),
            config,
            render_error: None,
        }
    }

    pub fn is_rendered(&self) -> bool {
        self.render_error.is_none()
    }
}
