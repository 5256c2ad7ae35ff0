//! Effective policy resolution for scoped monitoring configuration
//!
//! Checks, scripts, and alert rules are defined once as templates and
//! materialized at a scope (global, namespace, or group). This crate works
//! out which of those materializations actually applies to a target:
//!
//! - **Merging**: shallow config merge with `merge` / `override` strategies
//! - **Instantiation**: copying templates into scoped instances and rules
//! - **Scope resolution**: first-seen-wins dedup of checks across a target's groups
//! - **Hierarchy resolution**: child-overrides-parent alert rules along group ancestry
//! - **Rendering**: `{{ .key }}` substitution in alert queries
//!
//! # Architecture
//!
//! ```text
//!              confmon-cli
//!                   |
//!             confmon-rules
//!                   |
//!             confmon-core
//!                   |
//!              confmon-fs
//! ```
//!
//! Persistence is abstracted behind the traits in [`store`]; the bundled
//! [`MemoryStore`] is seeded from a [`Catalog`] document.
//!
//! # Example
//!
//! ```ignore
//! use confmon_core::{Catalog, ScopeResolver};
//!
//! let store = Catalog::load(path)?.into_store()?;
//! let checks = ScopeResolver::new(&store).effective_checks(target_id)?;
//! ```

pub mod config;
pub mod error;
pub mod merge;
pub mod model;
pub mod render;
pub mod resolver;
pub mod store;

pub use config::{LoggingSettings, ReloadSettings, RulesSettings, Settings, SettingsResolver};
pub use error::{Error, Result};
pub use merge::{ConfigMap, MergeStrategy, merge};
pub use model::{
    AlertOptions, AlertRule, EffectiveAlertRule, EffectiveCheck, Group, Instance, Membership,
    Namespace, Scope, ScopeKind, Severity, Target, Template, TemplateKind,
};
pub use render::{RenderError, render};
pub use resolver::{AlertHierarchyResolver, DedupKey, DedupSet, ResolvedInstances, ScopeResolver};
pub use store::{
    AlertRuleStore, Catalog, GroupStore, InstanceStore, MemoryStore, Store, TargetStore,
    TemplateStore,
};

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn not_found_displays_entity_and_id() {
        let id = Uuid::nil();
        let error = Error::not_found("group", id);

        let display = error.to_string();
        assert!(display.contains("group"), "got: {}", display);
        assert!(display.contains(&id.to_string()), "got: {}", display);
        assert!(error.is_not_found());
    }

    #[test]
    fn render_errors_convert_into_core_errors() {
        let error: Error = render("{{ .missing }}", &ConfigMap::new()).unwrap_err().into();
        assert!(matches!(error, Error::Render(RenderError::MissingVariable { .. })));
    }
}
