//! Generate-then-reload orchestration

use confmon_core::{AlertRuleStore, GroupStore};
use uuid::Uuid;

use crate::Result;
use crate::generator::{BatchReport, GenerateOutcome, PrometheusRuleGenerator};
use crate::reload::ReloadNotifier;

/// Runs rule generation and notifies the engine when files changed
pub struct RulePublisher<'a, S, N> {
    generator: PrometheusRuleGenerator<'a, S>,
    notifier: N,
}

impl<'a, S, N> RulePublisher<'a, S, N>
where
    S: GroupStore + AlertRuleStore,
    N: ReloadNotifier,
{
    pub fn new(generator: PrometheusRuleGenerator<'a, S>, notifier: N) -> Self {
        Self {
            generator,
            notifier,
        }
    }

    pub fn generator(&self) -> &PrometheusRuleGenerator<'a, S> {
        &self.generator
    }

    /// Regenerate one group; reload only if its file was written or removed.
    ///
    /// A generation error is returned and no reload is attempted.
    pub fn publish_group(&self, group_id: Uuid) -> Result<GenerateOutcome> {
        let outcome = self.generator.generate_for_group(group_id)?;
        if outcome.changed() {
            self.notifier.notify_reload();
        } else {
            tracing::debug!(group_id = %group_id, "Rules directory unchanged, no reload");
        }
        Ok(outcome)
    }

    /// Regenerate every group, expire old backups, and reload once if anything changed.
    pub fn publish_all(&self) -> Result<BatchReport> {
        let report = self.generator.generate_all()?;

        if let Err(e) = self.generator.files().cleanup_expired_backups() {
            tracing::warn!(error = %e, "Backup cleanup failed");
        }

        if report.changed() {
            self.notifier.notify_reload();
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::RuleFileManager;
    use confmon_core::{AlertRule, Group, MemoryStore, Namespace};
    use std::cell::Cell;

    #[derive(Default)]
    struct CountingNotifier {
        calls: Cell<usize>,
    }

    impl ReloadNotifier for &CountingNotifier {
        fn notify_reload(&self) {
            self.calls.set(self.calls.get() + 1);
        }
    }

    fn store_with_group() -> (MemoryStore, Group) {
        let store = MemoryStore::new();
        let ns = store.create_namespace(Namespace::new("prod")).unwrap();
        let group = store.create_group(Group::new(ns.id, "web")).unwrap();
        (store, group)
    }

    #[test]
    fn reloads_after_write_but_not_after_noop_delete() {
        let dir = tempfile::tempdir().unwrap();
        let (store, group) = store_with_group();
        let notifier = CountingNotifier::default();
        let publisher = RulePublisher::new(
            PrometheusRuleGenerator::new(&store, RuleFileManager::new(dir.path())),
            &notifier,
        );

        publisher.publish_group(group.id).unwrap();
        assert_eq!(notifier.calls.get(), 0);

        let rule = store
            .create_alert_rule(AlertRule::new(group.id, "Up", "up == 0"))
            .unwrap();
        publisher.publish_group(group.id).unwrap();
        assert_eq!(notifier.calls.get(), 1);

        store.soft_delete_alert_rule(rule.id).unwrap();
        publisher.publish_group(group.id).unwrap();
        assert_eq!(notifier.calls.get(), 2);

        publisher.publish_group(group.id).unwrap();
        assert_eq!(notifier.calls.get(), 2);
    }

    #[test]
    fn failed_generation_does_not_reload() {
        let dir = tempfile::tempdir().unwrap();
        let (store, group) = store_with_group();
        store
            .create_alert_rule(AlertRule::new(group.id, "Broken", "x > {{ .missing }}"))
            .unwrap();
        let notifier = CountingNotifier::default();
        let publisher = RulePublisher::new(
            PrometheusRuleGenerator::new(&store, RuleFileManager::new(dir.path())),
            &notifier,
        );

        assert!(publisher.publish_group(group.id).is_err());
        assert_eq!(notifier.calls.get(), 0);
    }
}
