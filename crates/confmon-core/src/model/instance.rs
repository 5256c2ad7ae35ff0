//! Scoped policy instances
//!
//! An instance is a check or script materialized at a scope, carrying its
//! own copy of the template fields and an uninterpreted override config.

use chrono::{DateTime, Utc};
use confmon_fs::compute_content_checksum;
use semver::Version;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::scope::{Scope, ScopeKind};
use super::template::{Template, TemplateKind};
use crate::Result;
use crate::merge::{ConfigMap, MergeStrategy};

fn default_true() -> bool {
    true
}

fn initial_version() -> Version {
    Version::new(1, 0, 0)
}

/// A template (or directly authored policy) bound to a scope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub id: Uuid,
    /// Origin template, absent for directly created instances
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<Uuid>,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TemplateKind,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub language: String,
    #[serde(default = "initial_version")]
    pub version: Version,
    #[serde(default)]
    pub default_config: ConfigMap,
    #[serde(default)]
    pub content_hash: String,
    #[serde(flatten)]
    pub scope: Scope,
    /// Override config, merged onto `default_config` at resolution time
    #[serde(default)]
    pub config: ConfigMap,
    #[serde(default)]
    pub merge_strategy: MergeStrategy,
    /// Higher wins between competing instances at the same scope
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Instance {
    /// Create an instance without an origin template.
    pub fn new(
        name: impl Into<String>,
        kind: TemplateKind,
        content: impl Into<String>,
        scope: Scope,
    ) -> Self {
        let content = content.into();
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            template_id: None,
            name: name.into(),
            kind,
            content_hash: compute_content_checksum(&content),
            content,
            language: String::new(),
            version: initial_version(),
            default_config: ConfigMap::new(),
            scope,
            config: ConfigMap::new(),
            merge_strategy: MergeStrategy::default(),
            priority: 0,
            active: true,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Materialize `template` at the requested scope.
    ///
    /// Every template field is copied so later template edits do not leak
    /// into existing instances. `config` is stored as given; merging with
    /// the defaults happens at resolution time.
    pub fn from_template(
        template: &Template,
        scope: ScopeKind,
        namespace_id: Option<Uuid>,
        group_id: Option<Uuid>,
        config: ConfigMap,
    ) -> Result<Self> {
        let scope = Scope::from_parts(scope, namespace_id, group_id)?;
        let now = Utc::now();

        Ok(Self {
            id: Uuid::new_v4(),
            template_id: Some(template.id),
            name: template.name.clone(),
            kind: template.kind,
            content: template.content.clone(),
            language: template.language.clone(),
            version: template.version.clone(),
            default_config: template.default_config.clone(),
            content_hash: template.content_hash.clone(),
            scope,
            config,
            merge_strategy: MergeStrategy::default(),
            priority: 0,
            active: true,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
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

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Active and not soft-deleted.
    pub fn is_live(&self) -> bool {
        self.active && self.deleted_at.is_none()
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Template defaults combined with the override config.
    pub fn effective_config(&self) -> ConfigMap {
        self.merge_strategy.apply(&self.default_config, &self.config)
    }

    pub fn scope_identifier(&self) -> String {
        self.scope.identifier()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn map(value: serde_json::Value) -> ConfigMap {
        value.as_object().cloned().unwrap()
    }

    fn disk_template() -> Template {
        Template::new("disk", TemplateKind::Check, "check_disk -w {{ .warn }}")
            .with_language("sh")
            .with_default_config(map(json!({"warn": 80, "crit": 90})))
    }

    #[test]
    fn from_template_copies_fields_and_keeps_override_raw() {
        let template = disk_template();
        let ns = Uuid::new_v4();
        let group = Uuid::new_v4();

        let instance = Instance::from_template(
            &template,
            ScopeKind::Group,
            Some(ns),
            Some(group),
            map(json!({"warn": 70})),
        )
        .unwrap();

        assert_ne!(instance.id, template.id);
        assert_eq!(instance.template_id, Some(template.id));
        assert_eq!(instance.name, "disk");
        assert_eq!(instance.language, "sh");
        assert_eq!(instance.content_hash, template.content_hash);
        assert_eq!(instance.default_config, template.default_config);
        assert_eq!(instance.config, map(json!({"warn": 70})));
        assert_eq!(instance.scope.group_id(), Some(group));
        assert_eq!(instance.priority, 0);
        assert!(instance.is_live());
    }

    #[test]
    fn from_template_rejects_inconsistent_scope() {
        let template = disk_template();

        let err = Instance::from_template(
            &template,
            ScopeKind::Global,
            Some(Uuid::new_v4()),
            None,
            ConfigMap::new(),
        )
        .unwrap_err();

        assert!(matches!(err, Error::ScopeConsistency { .. }));
    }

    #[test]
    fn effective_config_follows_strategy() {
        let template = disk_template();
        let instance =
            Instance::from_template(&template, ScopeKind::Global, None, None, map(json!({"crit": 95})))
                .unwrap();

        assert_eq!(
            instance.effective_config(),
            map(json!({"warn": 80, "crit": 95}))
        );

        let replaced = instance.with_strategy(MergeStrategy::Override);
        assert_eq!(replaced.effective_config(), map(json!({"crit": 95})));
    }

    #[test]
    fn flattened_scope_round_trips_through_yaml() {
        let ns = Uuid::new_v4();
        let instance = Instance::new(
            "mount",
            TemplateKind::Check,
            "mountpoint /data",
            Scope::Namespace { namespace_id: ns },
        );

        let yaml = serde_yaml::to_string(&instance).unwrap();
        assert!(yaml.contains("scope: namespace"));

        let parsed: Instance = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.scope, instance.scope);
    }

    #[test]
    fn inactive_or_deleted_instances_are_not_live() {
        let inactive = Instance::new("a", TemplateKind::Check, "", Scope::Global).with_active(false);
        assert!(!inactive.is_live());

        let mut deleted = Instance::new("b", TemplateKind::Check, "", Scope::Global);
        deleted.deleted_at = Some(Utc::now());
        assert!(!deleted.is_live());
    }
}
