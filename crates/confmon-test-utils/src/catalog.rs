//! [`TestCatalog`] builder for resolution and generation scenarios.

use confmon_core::{
    AlertRule, AlertRuleStore, ConfigMap, Group, GroupStore, Instance, InstanceStore, MemoryStore,
    Namespace, ScopeKind, Target, TargetStore, Template, TemplateKind, TemplateStore,
};
use serde_json::Value;

/// Build a [`ConfigMap`] from a `json!` object literal.
///
/// # Panics
/// Panics if `value` is not a JSON object.
pub fn config(value: Value) -> ConfigMap {
    match value {
        Value::Object(map) => map,
        other => panic!("config() expects a JSON object, got {}", other),
    }
}

/// An in-memory store with one namespace and helpers to populate it.
///
/// # Example
///
/// ```rust,no_run
/// use confmon_test_utils::{TestCatalog, config};
/// use serde_json::json;
///
/// let catalog = TestCatalog::new();
/// let web = catalog.group("web", 100);
/// let _host = catalog.target("web-01", &[&web]);
/// catalog.alert_rule(&web, "HighCPU", "cpu > {{ .threshold }}", config(json!({"threshold": 90})));
/// ```
pub struct TestCatalog {
    pub store: MemoryStore,
    pub namespace: Namespace,
}

impl Default for TestCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl TestCatalog {
    pub fn new() -> Self {
        let store = MemoryStore::new();
        let namespace = store
            .create_namespace(Namespace::new("test"))
            .expect("TestCatalog::new: failed to create namespace");
        Self { store, namespace }
    }

    /// Root group in the test namespace.
    pub fn group(&self, name: &str, priority: i32) -> Group {
        self.store
            .create_group(Group::new(self.namespace.id, name).with_priority(priority))
            .expect("TestCatalog::group: failed to create group")
    }

    /// Group nested under `parent`.
    pub fn child_group(&self, parent: &Group, name: &str) -> Group {
        self.store
            .create_group(Group::new(self.namespace.id, name).with_parent(parent.id))
            .expect("TestCatalog::child_group: failed to create group")
    }

    /// Target that belongs to `groups`, in the order given.
    pub fn target(&self, hostname: &str, groups: &[&Group]) -> Target {
        let target = groups
            .iter()
            .fold(Target::new(hostname), |t, g| t.with_membership(g.id));
        self.store
            .create_target(target)
            .expect("TestCatalog::target: failed to create target")
    }

    pub fn template(
        &self,
        name: &str,
        kind: TemplateKind,
        content: &str,
        defaults: ConfigMap,
    ) -> Template {
        self.store
            .create_template(Template::new(name, kind, content).with_default_config(defaults))
            .expect("TestCatalog::template: failed to create template")
    }

    pub fn global_instance(&self, template: &Template, config: ConfigMap) -> Instance {
        self.instance(template, ScopeKind::Global, None, None, config)
    }

    pub fn namespace_instance(&self, template: &Template, config: ConfigMap) -> Instance {
        self.instance(
            template,
            ScopeKind::Namespace,
            Some(self.namespace.id),
            None,
            config,
        )
    }

    pub fn group_instance(
        &self,
        template: &Template,
        group: &Group,
        config: ConfigMap,
    ) -> Instance {
        self.instance(
            template,
            ScopeKind::Group,
            Some(group.namespace_id),
            Some(group.id),
            config,
        )
    }

    fn instance(
        &self,
        template: &Template,
        scope: ScopeKind,
        namespace_id: Option<uuid::Uuid>,
        group_id: Option<uuid::Uuid>,
        config: ConfigMap,
    ) -> Instance {
        let instance = Instance::from_template(template, scope, namespace_id, group_id, config)
            .expect("TestCatalog: invalid scope");
        self.store
            .create_instance(instance)
            .expect("TestCatalog: failed to create instance")
    }

    /// Store an already-built instance.
    pub fn insert_instance(&self, instance: Instance) -> Instance {
        self.store
            .create_instance(instance)
            .expect("TestCatalog::insert_instance: failed to create instance")
    }

    /// Enabled rule on `group` with the default (override) strategy.
    pub fn alert_rule(
        &self,
        group: &Group,
        name: &str,
        query: &str,
        config: ConfigMap,
    ) -> AlertRule {
        self.insert_rule(AlertRule::new(group.id, name, query).with_config(config))
    }

    /// Store an already-built rule.
    pub fn insert_rule(&self, rule: AlertRule) -> AlertRule {
        self.store
            .create_alert_rule(rule)
            .expect("TestCatalog::insert_rule: failed to create alert rule")
    }
}
