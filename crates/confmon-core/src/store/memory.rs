//! In-memory store backend
//!
//! Holds every table behind one lock. Each call takes the lock once, so a
//! single call is consistent but consecutive calls may observe concurrent
//! writes in between.

use chrono::Utc;
use confmon_fs::compute_content_checksum;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use super::{AlertRuleStore, Catalog, GroupStore, InstanceStore, TargetStore, TemplateStore};
use crate::model::{AlertRule, Group, Instance, Membership, Namespace, Scope, Target, Template};
use crate::{Error, Result};

#[derive(Debug, Default)]
struct Tables {
    namespaces: BTreeMap<Uuid, Namespace>,
    groups: BTreeMap<Uuid, Group>,
    targets: BTreeMap<Uuid, Target>,
    templates: BTreeMap<Uuid, Template>,
    instances: BTreeMap<Uuid, Instance>,
    alert_rules: BTreeMap<Uuid, AlertRule>,
}

impl Tables {
    fn group(&self, id: Uuid) -> Result<&Group> {
        self.groups
            .get(&id)
            .filter(|g| g.deleted_at.is_none())
            .ok_or_else(|| Error::not_found("group", id))
    }

    fn require_namespace(&self, id: Uuid) -> Result<()> {
        if self.namespaces.contains_key(&id) {
            Ok(())
        } else {
            Err(Error::foreign_key("namespace", id))
        }
    }

    fn require_group(&self, id: Uuid) -> Result<&Group> {
        self.groups
            .get(&id)
            .filter(|g| g.deleted_at.is_none())
            .ok_or_else(|| Error::foreign_key("group", id))
    }

    fn require_template(&self, id: Option<Uuid>) -> Result<()> {
        match id {
            Some(id) if !self.templates.contains_key(&id) => Err(Error::foreign_key("template", id)),
            _ => Ok(()),
        }
    }

    fn ancestors_of(&self, id: Uuid) -> Result<Vec<Group>> {
        let mut chain = Vec::new();
        let mut visited = HashSet::from([id]);
        let mut current = self.group(id)?.parent_id;

        while let Some(parent_id) = current {
            if !visited.insert(parent_id) {
                return Err(Error::CircularReference { group_id: id });
            }
            let parent = self.require_group(parent_id)?;
            chain.push(parent.clone());
            current = parent.parent_id;
        }

        Ok(chain)
    }

    fn validate_scope(&self, instance: &Instance) -> Result<()> {
        self.require_template(instance.template_id)?;
        match instance.scope {
            Scope::Global => Ok(()),
            Scope::Namespace { namespace_id } => self.require_namespace(namespace_id),
            Scope::Group {
                namespace_id,
                group_id,
            } => {
                self.require_namespace(namespace_id)?;
                let group = self.require_group(group_id)?;
                if group.namespace_id != namespace_id {
                    return Err(Error::scope(
                        "group_id",
                        format!(
                            "group {} belongs to namespace {}, not {}",
                            group_id, group.namespace_id, namespace_id
                        ),
                    ));
                }
                Ok(())
            }
        }
    }

    fn live_instance_mut(&mut self, id: Uuid) -> Result<&mut Instance> {
        self.instances
            .get_mut(&id)
            .filter(|i| !i.is_deleted())
            .ok_or_else(|| Error::not_found("instance", id))
    }

    fn live_rule_mut(&mut self, id: Uuid) -> Result<&mut AlertRule> {
        self.alert_rules
            .get_mut(&id)
            .filter(|r| !r.is_deleted())
            .ok_or_else(|| Error::not_found("alert rule", id))
    }

    fn instances_where(&self, predicate: impl Fn(&Instance) -> bool) -> Vec<Instance> {
        let mut found: Vec<Instance> = self
            .instances
            .values()
            .filter(|i| !i.is_deleted() && predicate(i))
            .cloned()
            .collect();
        sort_instances(&mut found);
        found
    }
}

fn sort_instances(instances: &mut [Instance]) {
    instances.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.id.cmp(&b.id))
    });
}

fn sort_rules(rules: &mut [AlertRule]) {
    rules.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.id.cmp(&b.id))
    });
}

fn reject_duplicate<T>(table: &BTreeMap<Uuid, T>, entity: &str, id: Uuid) -> Result<()> {
    if table.contains_key(&id) {
        return Err(Error::validation(
            "id",
            format!("{} {} already exists", entity, id),
        ));
    }
    Ok(())
}

/// Thread-safe in-memory implementation of every store trait
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy every row, soft-deleted ones included, into a catalog document.
    pub fn snapshot(&self) -> Catalog {
        let tables = self.read();
        Catalog {
            templates: tables.templates.values().cloned().collect(),
            namespaces: tables.namespaces.values().cloned().collect(),
            groups: tables.groups.values().cloned().collect(),
            targets: tables.targets.values().cloned().collect(),
            instances: tables.instances.values().cloned().collect(),
            alert_rules: tables.alert_rules.values().cloned().collect(),
        }
    }
}

impl GroupStore for MemoryStore {
    fn get_namespace(&self, id: Uuid) -> Result<Namespace> {
        self.read()
            .namespaces
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::not_found("namespace", id))
    }

    fn create_namespace(&self, namespace: Namespace) -> Result<Namespace> {
        let mut tables = self.write();
        reject_duplicate(&tables.namespaces, "namespace", namespace.id)?;
        tables.namespaces.insert(namespace.id, namespace.clone());
        Ok(namespace)
    }

    fn list_namespaces(&self) -> Result<Vec<Namespace>> {
        let mut namespaces: Vec<_> = self.read().namespaces.values().cloned().collect();
        namespaces.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(namespaces)
    }

    fn get_group(&self, id: Uuid) -> Result<Group> {
        self.read().group(id).cloned()
    }

    fn create_group(&self, group: Group) -> Result<Group> {
        let mut tables = self.write();
        reject_duplicate(&tables.groups, "group", group.id)?;
        tables.require_namespace(group.namespace_id)?;
        if let Some(parent_id) = group.parent_id {
            tables.require_group(parent_id)?;
        }
        tables.groups.insert(group.id, group.clone());
        Ok(group)
    }

    fn list_groups(&self) -> Result<Vec<Group>> {
        let mut groups: Vec<_> = self
            .read()
            .groups
            .values()
            .filter(|g| g.deleted_at.is_none())
            .cloned()
            .collect();
        groups.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(groups)
    }

    fn reparent_group(&self, id: Uuid, parent_id: Option<Uuid>) -> Result<Group> {
        let mut tables = self.write();
        tables.group(id)?;

        if let Some(parent_id) = parent_id {
            tables.require_group(parent_id)?;
            let parent_chain = tables.ancestors_of(parent_id)?;
            if parent_id == id || parent_chain.iter().any(|g| g.id == id) {
                return Err(Error::CircularReference { group_id: id });
            }
        }

        let group = tables
            .groups
            .get_mut(&id)
            .ok_or_else(|| Error::not_found("group", id))?;
        group.parent_id = parent_id;
        tracing::debug!(group_id = %id, ?parent_id, "Group reparented");
        Ok(group.clone())
    }

    fn ancestors(&self, id: Uuid) -> Result<Vec<Group>> {
        self.read().ancestors_of(id)
    }

    fn children(&self, id: Uuid) -> Result<Vec<Group>> {
        let tables = self.read();
        tables.group(id)?;
        let mut children: Vec<_> = tables
            .groups
            .values()
            .filter(|g| g.parent_id == Some(id) && g.deleted_at.is_none())
            .cloned()
            .collect();
        children.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.name.cmp(&b.name)));
        Ok(children)
    }

    fn count_groups_by_namespace(&self, namespace_id: Uuid) -> Result<usize> {
        Ok(self
            .read()
            .groups
            .values()
            .filter(|g| g.namespace_id == namespace_id && g.deleted_at.is_none())
            .count())
    }
}

impl TargetStore for MemoryStore {
    fn get_target(&self, id: Uuid) -> Result<Target> {
        self.read()
            .targets
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::not_found("target", id))
    }

    fn find_target_by_hostname(&self, hostname: &str) -> Result<Target> {
        self.read()
            .targets
            .values()
            .find(|t| t.hostname == hostname)
            .cloned()
            .ok_or_else(|| Error::not_found("target", hostname))
    }

    fn create_target(&self, target: Target) -> Result<Target> {
        let mut tables = self.write();
        reject_duplicate(&tables.targets, "target", target.id)?;
        if tables.targets.values().any(|t| t.hostname == target.hostname) {
            return Err(Error::validation(
                "hostname",
                format!("target '{}' already exists", target.hostname),
            ));
        }
        for membership in &target.memberships {
            tables.require_group(membership.group_id)?;
        }
        tables.targets.insert(target.id, target.clone());
        Ok(target)
    }

    fn list_targets(&self) -> Result<Vec<Target>> {
        let mut targets: Vec<_> = self.read().targets.values().cloned().collect();
        targets.sort_by(|a, b| a.hostname.cmp(&b.hostname));
        Ok(targets)
    }

    fn add_membership(&self, target_id: Uuid, group_id: Uuid, is_default_own: bool) -> Result<()> {
        let mut tables = self.write();
        tables.require_group(group_id)?;
        let target = tables
            .targets
            .get_mut(&target_id)
            .ok_or_else(|| Error::not_found("target", target_id))?;

        match target.memberships.iter_mut().find(|m| m.group_id == group_id) {
            Some(existing) => existing.is_default_own = is_default_own,
            None => target.memberships.push(Membership {
                group_id,
                is_default_own,
            }),
        }
        Ok(())
    }

    fn target_groups(&self, target_id: Uuid) -> Result<Vec<Group>> {
        let tables = self.read();
        let target = tables
            .targets
            .get(&target_id)
            .ok_or_else(|| Error::not_found("target", target_id))?;

        let mut groups: Vec<Group> = target
            .memberships
            .iter()
            .filter_map(|m| tables.group(m.group_id).ok().cloned())
            .collect();
        groups.sort_by(|a, b| b.priority.cmp(&a.priority));
        Ok(groups)
    }
}

impl TemplateStore for MemoryStore {
    fn get_template(&self, id: Uuid) -> Result<Template> {
        self.read()
            .templates
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::not_found("template", id))
    }

    fn create_template(&self, mut template: Template) -> Result<Template> {
        let mut tables = self.write();
        reject_duplicate(&tables.templates, "template", template.id)?;
        template.ensure_hash();
        tables.templates.insert(template.id, template.clone());
        Ok(template)
    }

    fn update_template(&self, mut template: Template) -> Result<Template> {
        let mut tables = self.write();
        let existing = tables
            .templates
            .get(&template.id)
            .ok_or_else(|| Error::not_found("template", template.id))?;

        template.created_at = existing.created_at;
        template.content_hash = compute_content_checksum(&template.content);
        template.updated_at = Utc::now();
        tables.templates.insert(template.id, template.clone());
        Ok(template)
    }

    fn delete_template(&self, id: Uuid) -> Result<()> {
        let mut tables = self.write();
        if !tables.templates.contains_key(&id) {
            return Err(Error::not_found("template", id));
        }

        let references = tables
            .instances
            .values()
            .filter(|i| i.template_id == Some(id))
            .count()
            + tables
                .alert_rules
                .values()
                .filter(|r| r.template_id == Some(id))
                .count();
        if references > 0 {
            return Err(Error::validation(
                "template_id",
                format!("template {} is still referenced by {} rows", id, references),
            ));
        }

        tables.templates.remove(&id);
        Ok(())
    }

    fn list_templates(&self) -> Result<Vec<Template>> {
        let mut templates: Vec<_> = self.read().templates.values().cloned().collect();
        templates.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(templates)
    }
}

impl InstanceStore for MemoryStore {
    fn get_instance(&self, id: Uuid) -> Result<Instance> {
        self.read()
            .instances
            .get(&id)
            .filter(|i| !i.is_deleted())
            .cloned()
            .ok_or_else(|| Error::not_found("instance", id))
    }

    fn create_instance(&self, instance: Instance) -> Result<Instance> {
        let mut tables = self.write();
        reject_duplicate(&tables.instances, "instance", instance.id)?;
        tables.validate_scope(&instance)?;
        tables.instances.insert(instance.id, instance.clone());
        tracing::debug!(
            instance_id = %instance.id,
            scope = %instance.scope_identifier(),
            "Instance created"
        );
        Ok(instance)
    }

    fn update_instance(&self, mut instance: Instance) -> Result<Instance> {
        let mut tables = self.write();
        tables.validate_scope(&instance)?;
        let existing = tables.live_instance_mut(instance.id)?;
        instance.created_at = existing.created_at;
        instance.updated_at = Utc::now();
        *existing = instance.clone();
        Ok(instance)
    }

    fn soft_delete_instance(&self, id: Uuid) -> Result<()> {
        let mut tables = self.write();
        let instance = tables.live_instance_mut(id)?;
        instance.deleted_at = Some(Utc::now());
        Ok(())
    }

    fn restore_instance(&self, id: Uuid) -> Result<Instance> {
        let mut tables = self.write();
        let instance = tables
            .instances
            .get_mut(&id)
            .ok_or_else(|| Error::not_found("instance", id))?;
        if !instance.is_deleted() {
            return Err(Error::validation(
                "deleted_at",
                format!("instance {} is not deleted", id),
            ));
        }
        instance.deleted_at = None;
        instance.updated_at = Utc::now();
        Ok(instance.clone())
    }

    fn purge_instance(&self, id: Uuid) -> Result<()> {
        self.write()
            .instances
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| Error::not_found("instance", id))
    }

    fn list_instances(&self) -> Result<Vec<Instance>> {
        Ok(self.read().instances_where(|_| true))
    }

    fn global_instances(&self) -> Result<Vec<Instance>> {
        Ok(self
            .read()
            .instances_where(|i| matches!(i.scope, Scope::Global)))
    }

    fn instances_by_namespace(&self, namespace_id: Uuid) -> Result<Vec<Instance>> {
        Ok(self.read().instances_where(|i| {
            matches!(i.scope, Scope::Namespace { namespace_id: ns } if ns == namespace_id)
        }))
    }

    fn instances_by_group(&self, group_id: Uuid) -> Result<Vec<Instance>> {
        Ok(self
            .read()
            .instances_where(|i| i.scope.group_id() == Some(group_id)))
    }

    fn instances_by_template(&self, template_id: Uuid) -> Result<Vec<Instance>> {
        Ok(self
            .read()
            .instances_where(|i| i.template_id == Some(template_id)))
    }
}

impl AlertRuleStore for MemoryStore {
    fn get_alert_rule(&self, id: Uuid) -> Result<AlertRule> {
        self.read()
            .alert_rules
            .get(&id)
            .filter(|r| !r.is_deleted())
            .cloned()
            .ok_or_else(|| Error::not_found("alert rule", id))
    }

    fn create_alert_rule(&self, rule: AlertRule) -> Result<AlertRule> {
        let mut tables = self.write();
        reject_duplicate(&tables.alert_rules, "alert rule", rule.id)?;
        tables.require_group(rule.group_id)?;
        tables.require_template(rule.template_id)?;
        tables.alert_rules.insert(rule.id, rule.clone());
        Ok(rule)
    }

    fn update_alert_rule(&self, mut rule: AlertRule) -> Result<AlertRule> {
        let mut tables = self.write();
        tables.require_group(rule.group_id)?;
        tables.require_template(rule.template_id)?;
        let existing = tables.live_rule_mut(rule.id)?;
        rule.created_at = existing.created_at;
        rule.updated_at = Utc::now();
        *existing = rule.clone();
        Ok(rule)
    }

    fn soft_delete_alert_rule(&self, id: Uuid) -> Result<()> {
        let mut tables = self.write();
        let rule = tables.live_rule_mut(id)?;
        rule.deleted_at = Some(Utc::now());
        Ok(())
    }

    fn restore_alert_rule(&self, id: Uuid) -> Result<AlertRule> {
        let mut tables = self.write();
        let rule = tables
            .alert_rules
            .get_mut(&id)
            .ok_or_else(|| Error::not_found("alert rule", id))?;
        if !rule.is_deleted() {
            return Err(Error::validation(
                "deleted_at",
                format!("alert rule {} is not deleted", id),
            ));
        }
        rule.deleted_at = None;
        rule.updated_at = Utc::now();
        Ok(rule.clone())
    }

    fn purge_alert_rule(&self, id: Uuid) -> Result<()> {
        self.write()
            .alert_rules
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| Error::not_found("alert rule", id))
    }

    fn list_alert_rules(&self) -> Result<Vec<AlertRule>> {
        let mut rules: Vec<_> = self
            .read()
            .alert_rules
            .values()
            .filter(|r| !r.is_deleted())
            .cloned()
            .collect();
        sort_rules(&mut rules);
        Ok(rules)
    }

    fn alert_rules_by_group(&self, group_id: Uuid) -> Result<Vec<AlertRule>> {
        let mut rules: Vec<_> = self
            .read()
            .alert_rules
            .values()
            .filter(|r| r.group_id == group_id && !r.is_deleted())
            .cloned()
            .collect();
        sort_rules(&mut rules);
        Ok(rules)
    }

    fn groups_with_enabled_rules(&self) -> Result<Vec<Uuid>> {
        let groups: BTreeSet<Uuid> = self
            .read()
            .alert_rules
            .values()
            .filter(|r| r.is_live())
            .map(|r| r.group_id)
            .collect();
        Ok(groups.into_iter().collect())
    }
}
