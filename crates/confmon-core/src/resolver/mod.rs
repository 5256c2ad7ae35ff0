//! Effective policy resolution
//!
//! Two strategies share the dedup and merge primitives but not their rules:
//!
//! - [`ScopeResolver`] for checks and scripts: flat global/group scopes,
//!   first-seen wins by [`DedupKey`].
//! - [`AlertHierarchyResolver`] for alert rules: root-to-leaf walk of each
//!   group's ancestor chain, deduplicated by rule name.

mod dedup;
mod hierarchy;
mod scope;

pub use dedup::{DedupKey, DedupSet};
pub use hierarchy::AlertHierarchyResolver;
pub use scope::{ResolvedInstances, ScopeResolver};
