//! Prometheus rule generation
//!
//! Turns a group's own enabled alert rules into one rule file. Ancestor
//! rules are not folded in here; hierarchy resolution is a per-target view
//! provided by [`confmon_core::AlertHierarchyResolver`].

use confmon_core::{AlertOptions, AlertRule, AlertRuleStore, Group, GroupStore, render};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use uuid::Uuid;

use crate::files::RuleFileManager;
use crate::prometheus::{PrometheusRule, RuleFile, RuleGroup, is_valid_alert_name};
use crate::{Error, Result};

/// A rule left out of a generated file, and why
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRule {
    pub name: String,
    pub reason: String,
}

/// What one group's generation did to the rules directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerateOutcome {
    /// A rule file was written
    Written {
        path: PathBuf,
        rule_count: usize,
        skipped: Vec<SkippedRule>,
    },
    /// The group has no enabled rules; its file is gone
    Removed { existed: bool },
}

impl GenerateOutcome {
    /// True when the rules directory changed.
    pub fn changed(&self) -> bool {
        match self {
            Self::Written { .. } => true,
            Self::Removed { existed } => *existed,
        }
    }
}

/// A group whose generation failed during a batch run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupFailure {
    pub group_id: Uuid,
    pub error: String,
}

/// Aggregate result of generating every group
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub succeeded: Vec<Uuid>,
    pub failed: Vec<GroupFailure>,
    /// Stale files removed for groups that no longer own enabled rules
    pub pruned: Vec<Uuid>,
}

impl BatchReport {
    pub fn success_count(&self) -> usize {
        self.succeeded.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failed.len()
    }

    pub fn changed(&self) -> bool {
        !self.succeeded.is_empty() || !self.pruned.is_empty()
    }
}

/// Builds and writes rule files from stored alert rules
pub struct PrometheusRuleGenerator<'a, S> {
    store: &'a S,
    files: RuleFileManager,
}

impl<'a, S> PrometheusRuleGenerator<'a, S>
where
    S: GroupStore + AlertRuleStore,
{
    pub fn new(store: &'a S, files: RuleFileManager) -> Self {
        Self { store, files }
    }

    pub fn files(&self) -> &RuleFileManager {
        &self.files
    }

    /// Regenerate the rule file of one group.
    ///
    /// With no enabled rules the file is removed (a missing file is fine).
    /// Rules that fail conversion are logged and skipped; if none convert,
    /// nothing is written and [`Error::NoConvertibleRules`] is returned.
    pub fn generate_for_group(&self, group_id: Uuid) -> Result<GenerateOutcome> {
        let group = self.store.get_group(group_id)?;
        let rules: Vec<AlertRule> = self
            .store
            .alert_rules_by_group(group.id)?
            .into_iter()
            .filter(AlertRule::is_live)
            .collect();

        if rules.is_empty() {
            let existed = self.files.remove(group.id)?;
            tracing::info!(
                group_id = %group.id,
                existed,
                "No enabled alert rules, rule file removed"
            );
            return Ok(GenerateOutcome::Removed { existed });
        }

        let (file, skipped) = build_rule_file(&group, &rules);
        let rule_count = file.rule_count();
        if rule_count == 0 {
            return Err(Error::NoConvertibleRules {
                group_id: group.id,
                attempted: rules.len(),
            });
        }

        let path = self.files.write(group.id, &file)?;
        tracing::info!(
            group_id = %group.id,
            rules = rule_count,
            skipped = skipped.len(),
            ?path,
            "Generated Prometheus rule file"
        );

        Ok(GenerateOutcome::Written {
            path,
            rule_count,
            skipped,
        })
    }

    /// Regenerate every group that owns an enabled rule, then prune stale files.
    ///
    /// A failing group is recorded in the report and does not stop the run.
    pub fn generate_all(&self) -> Result<BatchReport> {
        let group_ids = self.store.groups_with_enabled_rules()?;
        let mut report = BatchReport::default();

        for group_id in &group_ids {
            match self.generate_for_group(*group_id) {
                Ok(_) => report.succeeded.push(*group_id),
                Err(e) => {
                    tracing::error!(group_id = %group_id, error = %e, "Rule generation failed");
                    report.failed.push(GroupFailure {
                        group_id: *group_id,
                        error: e.to_string(),
                    });
                }
            }
        }

        let active: BTreeSet<Uuid> = group_ids.into_iter().collect();
        for stale in self.files.list_group_ids()? {
            if active.contains(&stale) {
                continue;
            }
            match self.files.remove(stale) {
                Ok(_) => report.pruned.push(stale),
                Err(e) => {
                    tracing::error!(group_id = %stale, error = %e, "Failed to prune stale rule file");
                    report.failed.push(GroupFailure {
                        group_id: stale,
                        error: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            succeeded = report.success_count(),
            failed = report.failure_count(),
            pruned = report.pruned.len(),
            "Batch rule generation finished"
        );
        Ok(report)
    }
}

/// Convert `rules` into a single-group rule file, collecting the ones that fail.
pub fn build_rule_file(group: &Group, rules: &[AlertRule]) -> (RuleFile, Vec<SkippedRule>) {
    let mut converted = Vec::with_capacity(rules.len());
    let mut skipped = Vec::new();

    for rule in rules {
        match convert_rule(group, rule) {
            Ok(prometheus_rule) => converted.push(prometheus_rule),
            Err(e) => {
                tracing::warn!(
                    group_id = %group.id,
                    alert = %rule.name,
                    error = %e,
                    "Skipping alert rule that failed conversion"
                );
                skipped.push(SkippedRule {
                    name: rule.name.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    let file = RuleFile::single(RuleGroup {
        name: rule_group_name(group),
        rules: converted,
    });
    (file, skipped)
}

/// Convert one stored alert rule into its Prometheus form.
///
/// `severity` and `group_id` labels are always set from the rule itself;
/// custom annotations may replace the generated `summary` and `description`.
pub fn convert_rule(group: &Group, rule: &AlertRule) -> Result<PrometheusRule> {
    let config = rule.merged_config();

    let expr = render(&rule.query_template, &config)
        .map_err(|e| Error::invalid_rule(&rule.name, e.to_string()))?;
    let options =
        AlertOptions::from_config(&config).map_err(|e| Error::invalid_rule(&rule.name, e.to_string()))?;

    let alert = alert_name(rule, group);
    if !is_valid_alert_name(&alert) {
        return Err(Error::invalid_rule(
            &rule.name,
            format!("'{}' is not a valid Prometheus alert name", alert),
        ));
    }

    let mut labels = options.labels;
    labels.insert("severity".to_string(), rule.severity.to_string());
    labels.insert("group_id".to_string(), group.id.to_string());

    let mut annotations = BTreeMap::from([
        ("summary".to_string(), rule.name.clone()),
        ("description".to_string(), rule.description.clone()),
    ]);
    annotations.extend(options.annotations);

    Ok(PrometheusRule {
        alert,
        expr,
        for_duration: options.for_duration,
        labels,
        annotations,
    })
}

/// `<RuleName>_Group_<group id without hyphens>`
pub fn alert_name(rule: &AlertRule, group: &Group) -> String {
    format!("{}_Group_{}", rule.name, group.id.simple())
}

/// `group_<GroupName>_<GroupID>`
pub fn rule_group_name(group: &Group) -> String {
    format!("group_{}_{}", group.name, group.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use confmon_core::{ConfigMap, Severity};
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    fn map(value: Value) -> ConfigMap {
        value.as_object().cloned().unwrap()
    }

    fn group() -> Group {
        Group::new(Uuid::new_v4(), "web")
    }

    #[test]
    fn converts_rule_with_labels_and_annotations() {
        let group = group();
        let rule = AlertRule::new(group.id, "HighCPU", "avg(cpu) > {{ .threshold }}")
            .with_description("CPU is hot")
            .with_severity(Severity::Critical)
            .with_default_config(map(json!({"threshold": 80})))
            .with_config(map(json!({
                "threshold": 90,
                "for_duration": "5m",
                "labels": {"team": "infra", "severity": "ignored"},
                "annotations": {"runbook": "https://runbooks/cpu"}
            })));

        let converted = convert_rule(&group, &rule).unwrap();

        assert_eq!(converted.alert, format!("HighCPU_Group_{}", group.id.simple()));
        assert_eq!(converted.expr, "avg(cpu) > 90");
        assert_eq!(converted.for_duration.as_deref(), Some("5m"));
        assert_eq!(converted.labels["severity"], "critical");
        assert_eq!(converted.labels["team"], "infra");
        assert_eq!(converted.labels["group_id"], group.id.to_string());
        assert_eq!(converted.annotations["summary"], "HighCPU");
        assert_eq!(converted.annotations["description"], "CPU is hot");
        assert_eq!(converted.annotations["runbook"], "https://runbooks/cpu");
    }

    #[test]
    fn render_failure_is_conversion_failure() {
        let group = group();
        let rule = AlertRule::new(group.id, "Broken", "x > {{ .missing }}");

        assert!(matches!(
            convert_rule(&group, &rule),
            Err(Error::InvalidRule { .. })
        ));
    }

    #[test]
    fn invalid_duration_is_conversion_failure() {
        let group = group();
        let rule = AlertRule::new(group.id, "Slow", "latency > 1")
            .with_config(map(json!({"for_duration": "five minutes"})));

        assert!(convert_rule(&group, &rule).is_err());
    }

    #[test]
    fn alert_name_must_be_prometheus_safe() {
        let group = group();
        let rule = AlertRule::new(group.id, "High CPU", "cpu > 1");

        assert!(convert_rule(&group, &rule).is_err());
    }

    #[test]
    fn build_rule_file_keeps_good_rules_and_reports_bad_ones() {
        let group = group();
        let rules = vec![
            AlertRule::new(group.id, "Up", "up == 0"),
            AlertRule::new(group.id, "Broken", "x > {{ .missing }}"),
        ];

        let (file, skipped) = build_rule_file(&group, &rules);

        assert_eq!(file.groups.len(), 1);
        assert_eq!(file.groups[0].name, format!("group_web_{}", group.id));
        assert_eq!(file.rule_count(), 1);
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].name, "Broken");
    }

    #[test]
    fn removed_outcome_changes_only_when_file_existed() {
        assert!(GenerateOutcome::Removed { existed: true }.changed());
        assert!(!GenerateOutcome::Removed { existed: false }.changed());
    }
}
