//! Namespaces, groups, and targets

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tenant boundary that owns groups
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl Namespace {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: String::new(),
        }
    }
}

/// A node in a namespace's group tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: Uuid,
    pub namespace_id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Uuid>,
    /// Higher-priority groups win when a target's groups disagree
    #[serde(default)]
    pub priority: i32,
    /// Auto-created one-per-target group
    #[serde(default)]
    pub is_default_own: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Group {
    pub fn new(namespace_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            namespace_id,
            name: name.into(),
            parent_id: None,
            priority: 0,
            is_default_own: false,
            description: String::new(),
            deleted_at: None,
        }
    }

    pub fn with_parent(mut self, parent_id: Uuid) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn default_own(mut self) -> Self {
        self.is_default_own = true;
        self
    }
}

/// A target's membership in one group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub group_id: Uuid,
    #[serde(default)]
    pub is_default_own: bool,
}

/// A monitored host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub id: Uuid,
    pub hostname: String,
    #[serde(default)]
    pub memberships: Vec<Membership>,
}

impl Target {
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            hostname: hostname.into(),
            memberships: Vec::new(),
        }
    }

    pub fn with_membership(mut self, group_id: Uuid) -> Self {
        self.memberships.push(Membership {
            group_id,
            is_default_own: false,
        });
        self
    }

    pub fn is_member_of(&self, group_id: Uuid) -> bool {
        self.memberships.iter().any(|m| m.group_id == group_id)
    }
}
