//! Persistence collaborator interfaces
//!
//! Resolvers and generators only see these traits. Backends translate their
//! own failure modes into [`crate::Error`] before returning, so nothing
//! above this layer inspects storage-specific errors.
//!
//! List methods never return soft-deleted rows unless they say so.

mod catalog;
mod memory;

pub use catalog::Catalog;
pub use memory::MemoryStore;

use uuid::Uuid;

use crate::Result;
use crate::model::{AlertRule, Group, Instance, Namespace, Target, Template};

/// Namespaces and the group tree
pub trait GroupStore {
    fn get_namespace(&self, id: Uuid) -> Result<Namespace>;
    fn create_namespace(&self, namespace: Namespace) -> Result<Namespace>;
    fn list_namespaces(&self) -> Result<Vec<Namespace>>;

    fn get_group(&self, id: Uuid) -> Result<Group>;
    fn create_group(&self, group: Group) -> Result<Group>;
    fn list_groups(&self) -> Result<Vec<Group>>;

    /// Move a group under a new parent, rejecting moves that would form a cycle.
    fn reparent_group(&self, id: Uuid, parent_id: Option<Uuid>) -> Result<Group>;

    /// Ancestor chain nearest first: parent, grandparent, up to the root.
    ///
    /// The group itself is not included.
    fn ancestors(&self, id: Uuid) -> Result<Vec<Group>>;

    fn children(&self, id: Uuid) -> Result<Vec<Group>>;
    fn count_groups_by_namespace(&self, namespace_id: Uuid) -> Result<usize>;
}

/// Monitored hosts and their memberships
pub trait TargetStore {
    fn get_target(&self, id: Uuid) -> Result<Target>;
    fn find_target_by_hostname(&self, hostname: &str) -> Result<Target>;
    fn create_target(&self, target: Target) -> Result<Target>;
    fn list_targets(&self) -> Result<Vec<Target>>;
    fn add_membership(&self, target_id: Uuid, group_id: Uuid, is_default_own: bool) -> Result<()>;

    /// Groups the target belongs to, highest group priority first.
    ///
    /// Groups with equal priority keep their membership order.
    fn target_groups(&self, target_id: Uuid) -> Result<Vec<Group>>;
}

/// Template catalog
pub trait TemplateStore {
    fn get_template(&self, id: Uuid) -> Result<Template>;
    fn create_template(&self, template: Template) -> Result<Template>;
    /// Replace a template; the stored hash always matches the new content.
    fn update_template(&self, template: Template) -> Result<Template>;
    /// Remove a template that no instance or rule references.
    fn delete_template(&self, id: Uuid) -> Result<()>;
    fn list_templates(&self) -> Result<Vec<Template>>;
}

/// Scoped check and script instances
pub trait InstanceStore {
    fn get_instance(&self, id: Uuid) -> Result<Instance>;
    fn create_instance(&self, instance: Instance) -> Result<Instance>;
    fn update_instance(&self, instance: Instance) -> Result<Instance>;
    fn soft_delete_instance(&self, id: Uuid) -> Result<()>;
    fn restore_instance(&self, id: Uuid) -> Result<Instance>;
    fn purge_instance(&self, id: Uuid) -> Result<()>;
    fn list_instances(&self) -> Result<Vec<Instance>>;

    /// Global-scope instances.
    fn global_instances(&self) -> Result<Vec<Instance>>;
    /// Namespace-scope instances bound to `namespace_id`.
    fn instances_by_namespace(&self, namespace_id: Uuid) -> Result<Vec<Instance>>;
    /// Group-scope instances bound to `group_id`.
    fn instances_by_group(&self, group_id: Uuid) -> Result<Vec<Instance>>;
    /// Instances materialized from `template_id`.
    fn instances_by_template(&self, template_id: Uuid) -> Result<Vec<Instance>>;
}

/// Alert rules owned by groups
pub trait AlertRuleStore {
    fn get_alert_rule(&self, id: Uuid) -> Result<AlertRule>;
    fn create_alert_rule(&self, rule: AlertRule) -> Result<AlertRule>;
    fn update_alert_rule(&self, rule: AlertRule) -> Result<AlertRule>;
    fn soft_delete_alert_rule(&self, id: Uuid) -> Result<()>;
    fn restore_alert_rule(&self, id: Uuid) -> Result<AlertRule>;
    fn purge_alert_rule(&self, id: Uuid) -> Result<()>;
    fn list_alert_rules(&self) -> Result<Vec<AlertRule>>;

    /// Non-deleted rules of one group, enabled or not.
    fn alert_rules_by_group(&self, group_id: Uuid) -> Result<Vec<AlertRule>>;

    /// Groups owning at least one enabled, non-deleted rule.
    fn groups_with_enabled_rules(&self) -> Result<Vec<Uuid>>;
}

/// Every collaborator interface at once.
pub trait Store: GroupStore + TargetStore + TemplateStore + InstanceStore + AlertRuleStore {}

impl<T> Store for T where T: GroupStore + TargetStore + TemplateStore + InstanceStore + AlertRuleStore {}
