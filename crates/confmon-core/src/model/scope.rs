//! Policy scopes
//!
//! A scope says how broadly an instance applies. The identifiers each scope
//! needs live inside its variant, so an instance can never hold a group id
//! while claiming to be global.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::{Error, Result};

/// Scope level without identifiers, as it appears in stored documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeKind {
    Global,
    Namespace,
    Group,
}

impl ScopeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Namespace => "namespace",
            Self::Group => "group",
        }
    }
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Breadth at which a policy instance applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "ScopeParts", into = "ScopeParts")]
pub enum Scope {
    Global,
    Namespace { namespace_id: Uuid },
    Group { namespace_id: Uuid, group_id: Uuid },
}

impl Scope {
    /// Build a scope from a level and optional identifiers.
    ///
    /// The identifiers must match the level exactly: global takes neither,
    /// namespace takes only `namespace_id`, group takes both.
    pub fn from_parts(
        kind: ScopeKind,
        namespace_id: Option<Uuid>,
        group_id: Option<Uuid>,
    ) -> Result<Self> {
        match (kind, namespace_id, group_id) {
            (ScopeKind::Global, None, None) => Ok(Self::Global),
            (ScopeKind::Global, Some(_), _) => Err(Error::scope(
                "namespace_id",
                "global scope must not reference a namespace",
            )),
            (ScopeKind::Global, None, Some(_)) => Err(Error::scope(
                "group_id",
                "global scope must not reference a group",
            )),
            (ScopeKind::Namespace, Some(namespace_id), None) => {
                Ok(Self::Namespace { namespace_id })
            }
            (ScopeKind::Namespace, None, _) => Err(Error::scope(
                "namespace_id",
                "namespace scope requires a namespace",
            )),
            (ScopeKind::Namespace, Some(_), Some(_)) => Err(Error::scope(
                "group_id",
                "namespace scope must not reference a group",
            )),
            (ScopeKind::Group, Some(namespace_id), Some(group_id)) => Ok(Self::Group {
                namespace_id,
                group_id,
            }),
            (ScopeKind::Group, None, _) => Err(Error::scope(
                "namespace_id",
                "group scope requires a namespace",
            )),
            (ScopeKind::Group, Some(_), None) => {
                Err(Error::scope("group_id", "group scope requires a group"))
            }
        }
    }

    pub fn kind(&self) -> ScopeKind {
        match self {
            Self::Global => ScopeKind::Global,
            Self::Namespace { .. } => ScopeKind::Namespace,
            Self::Group { .. } => ScopeKind::Group,
        }
    }

    pub fn namespace_id(&self) -> Option<Uuid> {
        match self {
            Self::Global => None,
            Self::Namespace { namespace_id } | Self::Group { namespace_id, .. } => {
                Some(*namespace_id)
            }
        }
    }

    pub fn group_id(&self) -> Option<Uuid> {
        match self {
            Self::Group { group_id, .. } => Some(*group_id),
            Self::Global | Self::Namespace { .. } => None,
        }
    }

    /// Short identifier used in logs: `global`, `namespace:<id>`, `group:<id>`.
    pub fn identifier(&self) -> String {
        match self {
            Self::Global => "global".to_string(),
            Self::Namespace { namespace_id } => format!("namespace:{}", namespace_id),
            Self::Group { group_id, .. } => format!("group:{}", group_id),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identifier())
    }
}

/// Flat document form of a scope.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct ScopeParts {
    scope: ScopeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    namespace_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    group_id: Option<Uuid>,
}

impl TryFrom<ScopeParts> for Scope {
    type Error = Error;

    fn try_from(parts: ScopeParts) -> Result<Self> {
        Scope::from_parts(parts.scope, parts.namespace_id, parts.group_id)
    }
}

impl From<Scope> for ScopeParts {
    fn from(scope: Scope) -> Self {
        Self {
            scope: scope.kind(),
            namespace_id: scope.namespace_id(),
            group_id: scope.group_id(),
        }
    }
}
