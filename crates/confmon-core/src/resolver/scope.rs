//! Flat scope resolution for checks and scripts

use uuid::Uuid;

use super::dedup::DedupSet;
use crate::model::{EffectiveCheck, Instance};
use crate::store::{GroupStore, InstanceStore, TargetStore};
use crate::{Error, Result};

/// Winning instances for a target, split by where they came from
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedInstances {
    pub global: Vec<Instance>,
    pub group: Vec<Instance>,
}

impl ResolvedInstances {
    pub fn len(&self) -> usize {
        self.global.len() + self.group.len()
    }

    pub fn is_empty(&self) -> bool {
        self.global.is_empty() && self.group.is_empty()
    }

    /// Global instances followed by group instances.
    pub fn into_combined(self) -> Vec<Instance> {
        let mut combined = self.global;
        combined.extend(self.group);
        combined
    }
}

/// Picks the single winning instance per logical check for a target
///
/// Group-scope instances beat global ones with the same key, and among
/// group instances the target's higher-priority group wins. Namespace-scope
/// instances do not take part in target resolution.
pub struct ScopeResolver<'a, S> {
    store: &'a S,
}

impl<'a, S> ScopeResolver<'a, S>
where
    S: GroupStore + TargetStore + InstanceStore,
{
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub fn resolve_for_target(&self, target_id: Uuid) -> Result<ResolvedInstances> {
        let target = self.store.get_target(target_id)?;
        let groups = self.store.target_groups(target.id)?;
        if groups.is_empty() {
            return Err(Error::not_found("group membership for target", target.hostname));
        }

        let mut seen = DedupSet::new();

        let mut group = Vec::new();
        for g in &groups {
            let candidates = self.store.instances_by_group(g.id)?;
            tracing::debug!(
                group = %g.name,
                priority = g.priority,
                candidates = candidates.len(),
                "Collecting group instances"
            );
            group.extend(seen.take_unclaimed(candidates));
        }

        let global = seen.take_unclaimed(self.store.global_instances()?);

        tracing::debug!(
            target = %target.hostname,
            groups = groups.len(),
            global = global.len(),
            group = group.len(),
            "Resolved instances for target"
        );

        Ok(ResolvedInstances { global, group })
    }

    /// Effective checks for a target with template defaults merged in.
    pub fn effective_checks(&self, target_id: Uuid) -> Result<Vec<EffectiveCheck>> {
        let resolved = self.resolve_for_target(target_id)?;
        Ok(resolved
            .into_combined()
            .iter()
            .map(EffectiveCheck::from)
            .collect())
    }

    /// Instances visible at a group: its own, then its namespace's, then global.
    pub fn resolve_for_group(&self, group_id: Uuid) -> Result<Vec<Instance>> {
        let group = self.store.get_group(group_id)?;
        let mut seen = DedupSet::new();

        let mut resolved = seen.take_unclaimed(self.store.instances_by_group(group.id)?);
        resolved.extend(seen.take_unclaimed(
            self.store.instances_by_namespace(group.namespace_id)?,
        ));
        resolved.extend(seen.take_unclaimed(self.store.global_instances()?));
        Ok(resolved)
    }

    /// Instances visible at a namespace: its own, then global.
    pub fn resolve_for_namespace(&self, namespace_id: Uuid) -> Result<Vec<Instance>> {
        let namespace = self.store.get_namespace(namespace_id)?;
        let mut seen = DedupSet::new();

        let mut resolved = seen.take_unclaimed(self.store.instances_by_namespace(namespace.id)?);
        resolved.extend(seen.take_unclaimed(self.store.global_instances()?));
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Group, Namespace, Scope, Target, TemplateKind};
    use crate::store::MemoryStore;

    #[test]
    fn target_without_groups_is_not_found() {
        let store = MemoryStore::new();
        let target = store.create_target(Target::new("lonely")).unwrap();

        let err = ScopeResolver::new(&store)
            .resolve_for_target(target.id)
            .unwrap_err();

        assert!(err.is_not_found());
    }

    #[test]
    fn missing_target_is_not_found() {
        let store = MemoryStore::new();
        let err = ScopeResolver::new(&store)
            .resolve_for_target(Uuid::new_v4())
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn namespace_instances_are_ignored_for_targets_but_used_for_groups() {
        let store = MemoryStore::new();
        let ns = store.create_namespace(Namespace::new("prod")).unwrap();
        let group = store.create_group(Group::new(ns.id, "web")).unwrap();
        let target = store
            .create_target(Target::new("web-01").with_membership(group.id))
            .unwrap();
        store
            .create_instance(Instance::new(
                "ntp",
                TemplateKind::Check,
                "ntpq -p",
                Scope::Namespace { namespace_id: ns.id },
            ))
            .unwrap();

        let resolver = ScopeResolver::new(&store);

        assert!(resolver.resolve_for_target(target.id).unwrap().is_empty());
        assert_eq!(resolver.resolve_for_group(group.id).unwrap().len(), 1);
        assert_eq!(resolver.resolve_for_namespace(ns.id).unwrap().len(), 1);
    }

    #[test]
    fn namespace_instance_beats_global_at_namespace_level() {
        let store = MemoryStore::new();
        let ns = store.create_namespace(Namespace::new("prod")).unwrap();
        let global = store
            .create_instance(Instance::new("ntp", TemplateKind::Check, "global", Scope::Global))
            .unwrap();
        let scoped = store
            .create_instance(Instance::new(
                "ntp",
                TemplateKind::Check,
                "scoped",
                Scope::Namespace { namespace_id: ns.id },
            ))
            .unwrap();

        let resolved = ScopeResolver::new(&store)
            .resolve_for_namespace(ns.id)
            .unwrap();

        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].id, scoped.id);
        assert_ne!(resolved[0].id, global.id);
    }
}
