//! Catalog templates
//!
//! A template is the reusable definition of a check, script, or alert.
//! Instances and alert rules are materialized from it at a scope.

use chrono::{DateTime, Utc};
use confmon_fs::{compute_content_checksum, content_matches};
use semver::Version;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::merge::ConfigMap;

/// What a template produces when instantiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateKind {
    Check,
    Script,
    Alert,
}

impl TemplateKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Check => "check",
            Self::Script => "script",
            Self::Alert => "alert",
        }
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reusable catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TemplateKind,
    /// Script body, check command, or alert query template
    pub content: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub default_config: ConfigMap,
    #[serde(default = "initial_version")]
    pub version: Version,
    /// `sha256:<hex>` of `content`; empty until first stored
    #[serde(default)]
    pub content_hash: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

fn initial_version() -> Version {
    Version::new(1, 0, 0)
}

impl Template {
    pub fn new(name: impl Into<String>, kind: TemplateKind, content: impl Into<String>) -> Self {
        let content = content.into();
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind,
            content_hash: compute_content_checksum(&content),
            content,
            language: String::new(),
            description: String::new(),
            default_config: ConfigMap::new(),
            version: initial_version(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_default_config(mut self, config: ConfigMap) -> Self {
        self.default_config = config;
        self
    }

    pub fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    /// Replace the content and recompute its hash.
    pub fn update_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.content_hash = compute_content_checksum(&self.content);
        self.updated_at = Utc::now();
    }

    /// Fill in the content hash if it has never been computed.
    pub fn ensure_hash(&mut self) {
        if self.content_hash.is_empty() {
            self.content_hash = compute_content_checksum(&self.content);
        }
    }

    /// True when `content` no longer matches this template's recorded hash.
    ///
    /// Used to detect instances whose copied script has diverged from
    /// the catalog entry they came from.
    pub fn has_drifted(&self, content: &str) -> bool {
        !content_matches(content, &self.content_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_template_hashes_content() {
        let template = Template::new("disk", TemplateKind::Check, "df -h /");
        assert_eq!(template.content_hash, compute_content_checksum("df -h /"));
        assert_eq!(template.version, Version::new(1, 0, 0));
    }

    #[test]
    fn update_content_recomputes_hash() {
        let mut template = Template::new("disk", TemplateKind::Check, "df -h /");
        let before = template.content_hash.clone();

        template.update_content("df -h /data");

        assert_ne!(template.content_hash, before);
        assert!(!template.has_drifted("df -h /data"));
        assert!(template.has_drifted("df -h /"));
    }

    #[test]
    fn ensure_hash_keeps_existing_value() {
        let mut template = Template::new("disk", TemplateKind::Check, "df -h /");
        template.content_hash = "sha256:recorded".into();

        template.ensure_hash();

        assert_eq!(template.content_hash, "sha256:recorded");
    }

    #[test]
    fn kind_uses_type_key_in_documents() {
        let template: Template = serde_json::from_str(
            r#"{"id": "00000000-0000-0000-0000-000000000001",
                "name": "cpu", "type": "alert", "content": "cpu > {{ .threshold }}"}"#,
        )
        .unwrap();
        assert_eq!(template.kind, TemplateKind::Alert);
        assert!(template.content_hash.is_empty());
    }
}
