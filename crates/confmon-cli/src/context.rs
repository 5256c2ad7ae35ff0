//! Command context: resolved settings plus the catalog to work against

use confmon_core::{Catalog, MemoryStore, Settings, SettingsResolver, Target, TargetStore};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::{CliError, Result};

/// Everything a command needs beyond its own arguments
#[derive(Debug)]
pub struct Context {
    pub settings: Settings,
    pub json: bool,
    catalog: Option<PathBuf>,
}

impl Context {
    pub fn new(settings: Settings, catalog: Option<PathBuf>, json: bool) -> Self {
        Self {
            settings,
            json,
            catalog,
        }
    }

    /// Load the catalog given with `--catalog` into a fresh store.
    pub fn load_store(&self) -> Result<MemoryStore> {
        let path = self.catalog.as_deref().ok_or_else(|| {
            CliError::user("This command needs a catalog; pass --catalog <file>")
        })?;
        tracing::debug!(?path, "Loading catalog");
        Ok(Catalog::load(path)?.into_store()?)
    }
}

/// Layered settings: defaults, global file, `--config`, then `CONFMON_*` env.
pub fn resolve_settings(config: Option<&Path>) -> Result<Settings> {
    let mut resolver = SettingsResolver::new().with_env(std::env::vars());
    if let Some(path) = config {
        resolver = resolver.with_config_file(path);
    }
    Ok(resolver.resolve()?)
}

/// Look a target up by id when `selector` parses as a UUID, else by hostname.
pub fn find_target(store: &MemoryStore, selector: &str) -> Result<Target> {
    let target = match Uuid::parse_str(selector) {
        Ok(id) => store.get_target(id),
        Err(_) => store.find_target_by_hostname(selector),
    };
    target.map_err(|e| {
        if e.is_not_found() {
            CliError::user(format!("Unknown target '{}'", selector))
        } else {
            e.into()
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use confmon_core::{Group, GroupStore, Namespace};

    fn store_with_target() -> (MemoryStore, Target) {
        let store = MemoryStore::new();
        let ns = store.create_namespace(Namespace::new("prod")).unwrap();
        let group = store.create_group(Group::new(ns.id, "web")).unwrap();
        let target = store
            .create_target(Target::new("web-01").with_membership(group.id))
            .unwrap();
        (store, target)
    }

    #[test]
    fn finds_target_by_hostname_or_id() {
        let (store, target) = store_with_target();

        assert_eq!(find_target(&store, "web-01").unwrap().id, target.id);
        assert_eq!(
            find_target(&store, &target.id.to_string()).unwrap().hostname,
            "web-01"
        );
    }

    #[test]
    fn unknown_target_is_a_user_error() {
        let (store, _) = store_with_target();

        let err = find_target(&store, "db-01").unwrap_err();
        assert!(matches!(err, CliError::User { .. }));
        assert!(err.to_string().contains("db-01"));
    }

    #[test]
    fn data_commands_require_a_catalog() {
        let context = Context::new(Settings::default(), None, false);
        assert!(matches!(context.load_store(), Err(CliError::User { .. })));
    }
}
