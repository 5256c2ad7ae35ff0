//! Catalog snapshots
//!
//! A catalog is a whole store serialized as one document. It is how the
//! command line tool and tests seed a [`MemoryStore`].

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use uuid::Uuid;

use super::{AlertRuleStore, GroupStore, InstanceStore, MemoryStore, TargetStore, TemplateStore};
use crate::model::{AlertRule, Group, Instance, Namespace, Target, Template};
use crate::{Error, Result};
use confmon_fs::ConfigStore;

/// Every table of a store as one document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub templates: Vec<Template>,
    #[serde(default)]
    pub namespaces: Vec<Namespace>,
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub targets: Vec<Target>,
    #[serde(default)]
    pub instances: Vec<Instance>,
    #[serde(default)]
    pub alert_rules: Vec<AlertRule>,
}

impl Catalog {
    /// Load a catalog from a `.toml`, `.json`, `.yaml`, or `.yml` file.
    pub fn load(path: &Path) -> Result<Self> {
        let catalog: Self = ConfigStore::new().load(path)?;
        tracing::debug!(
            ?path,
            templates = catalog.templates.len(),
            groups = catalog.groups.len(),
            targets = catalog.targets.len(),
            instances = catalog.instances.len(),
            alert_rules = catalog.alert_rules.len(),
            "Loaded catalog"
        );
        Ok(catalog)
    }

    /// Write the catalog atomically, format chosen by extension.
    pub fn save(&self, path: &Path) -> Result<()> {
        ConfigStore::new().save(path, self)?;
        Ok(())
    }

    /// Insert every row into a fresh store, in dependency order.
    ///
    /// Groups may be listed in any order; parents are inserted before their
    /// children. A parent that never appears is a foreign key violation.
    pub fn into_store(self) -> Result<MemoryStore> {
        let store = MemoryStore::new();

        for namespace in self.namespaces {
            store.create_namespace(namespace)?;
        }
        for template in self.templates {
            store.create_template(template)?;
        }
        insert_groups(&store, self.groups)?;
        for target in self.targets {
            store.create_target(target)?;
        }
        for instance in self.instances {
            store.create_instance(instance)?;
        }
        for rule in self.alert_rules {
            store.create_alert_rule(rule)?;
        }

        Ok(store)
    }
}

fn insert_groups(store: &MemoryStore, mut pending: Vec<Group>) -> Result<()> {
    let mut inserted: HashSet<Uuid> = HashSet::new();

    while !pending.is_empty() {
        let (ready, blocked): (Vec<Group>, Vec<Group>) = pending
            .into_iter()
            .partition(|g| g.parent_id.is_none_or(|p| inserted.contains(&p)));

        if ready.is_empty() {
            let missing = blocked
                .iter()
                .find_map(|g| g.parent_id)
                .unwrap_or_default();
            return Err(Error::foreign_key("group", missing));
        }

        for group in ready {
            inserted.insert(group.id);
            store.create_group(group)?;
        }
        pending = blocked;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Scope, TemplateKind};

    #[test]
    fn children_listed_before_parents_are_inserted() {
        let namespace = Namespace::new("prod");
        let root = Group::new(namespace.id, "root");
        let leaf = Group::new(namespace.id, "leaf").with_parent(root.id);

        let catalog = Catalog {
            namespaces: vec![namespace],
            groups: vec![leaf.clone(), root.clone()],
            ..Default::default()
        };

        let store = catalog.into_store().unwrap();
        let chain = store.ancestors(leaf.id).unwrap();
        assert_eq!(chain.len(), 1);
        assert_eq!(chain[0].id, root.id);
    }

    #[test]
    fn missing_parent_is_foreign_key_violation() {
        let namespace = Namespace::new("prod");
        let orphan = Group::new(namespace.id, "orphan").with_parent(Uuid::new_v4());

        let catalog = Catalog {
            namespaces: vec![namespace],
            groups: vec![orphan],
            ..Default::default()
        };

        assert!(matches!(
            catalog.into_store(),
            Err(Error::ForeignKeyViolation { entity: "group", .. })
        ));
    }

    #[test]
    fn snapshot_round_trips_through_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.yaml");

        let store = MemoryStore::new();
        store
            .create_template(Template::new("disk", TemplateKind::Check, "df"))
            .unwrap();
        store
            .create_instance(Instance::new("mount", TemplateKind::Check, "mount", Scope::Global))
            .unwrap();

        store.snapshot().save(&path).unwrap();
        let reloaded = Catalog::load(&path).unwrap();

        assert_eq!(reloaded, store.snapshot());
    }
}
