//! Config map merging
//!
//! Every place that combines two config maps goes through this module:
//! template defaults with instance overrides, and ancestor rules with
//! descendant rules in the alert hierarchy.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// A config document: string keys to arbitrary JSON values.
pub type ConfigMap = Map<String, Value>;

/// How an override map combines with the map beneath it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeStrategy {
    /// Union of keys, override values win conflicts
    #[default]
    Merge,
    /// Override map replaces the base map entirely
    Override,
}

impl MergeStrategy {
    /// Combine `base` and `overlay` according to this strategy.
    pub fn apply(self, base: &ConfigMap, overlay: &ConfigMap) -> ConfigMap {
        match self {
            Self::Merge => merge(base, overlay),
            Self::Override => overlay.clone(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Merge => "merge",
            Self::Override => "override",
        }
    }
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MergeStrategy {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "merge" => Ok(Self::Merge),
            "override" => Ok(Self::Override),
            other => Err(crate::Error::validation(
                "merge_strategy",
                format!("expected 'merge' or 'override', got '{}'", other),
            )),
        }
    }
}

/// Shallow, top-level key union of two config maps.
///
/// Every key in `overlay` replaces the same key in `base`; keys only in
/// `base` are kept. Nested objects are replaced as opaque values, never
/// merged recursively.
pub fn merge(base: &ConfigMap, overlay: &ConfigMap) -> ConfigMap {
    let mut result = base.clone();
    for (key, value) in overlay {
        result.insert(key.clone(), value.clone());
    }
    result
}
