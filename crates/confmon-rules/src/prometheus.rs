//! Prometheus rule file document
//!
//! Field names and layout follow the format Prometheus parses from
//! `rule_files`:
//!
//! ```yaml
//! groups:
//!   - name: group_web_<id>
//!     rules:
//!       - alert: HighCPU_Group_<id>
//!         expr: avg(cpu) > 90
//!         for: 5m
//!         labels: {severity: critical}
//!         annotations: {summary: HighCPU}
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Valid Prometheus alert names (metric-name syntax)
static ALERT_NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z_:][a-zA-Z0-9_:]*$").unwrap());

/// A whole rule file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleFile {
    pub groups: Vec<RuleGroup>,
}

/// One named group of rules evaluated together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleGroup {
    pub name: String,
    pub rules: Vec<PrometheusRule>,
}

/// One alerting rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrometheusRule {
    pub alert: String,
    pub expr: String,
    #[serde(rename = "for", default, skip_serializing_if = "Option::is_none")]
    pub for_duration: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl RuleFile {
    pub fn single(group: RuleGroup) -> Self {
        Self {
            groups: vec![group],
        }
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    pub fn rule_count(&self) -> usize {
        self.groups.iter().map(|g| g.rules.len()).sum()
    }
}

/// True if Prometheus would accept `name` as an alert name.
pub fn is_valid_alert_name(name: &str) -> bool {
    ALERT_NAME_PATTERN.is_match(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn for_is_omitted_when_absent() {
        let rule = PrometheusRule {
            alert: "Up".into(),
            expr: "up == 0".into(),
            for_duration: None,
            labels: BTreeMap::new(),
            annotations: BTreeMap::new(),
        };

        let yaml = RuleFile::single(RuleGroup {
            name: "g".into(),
            rules: vec![rule],
        })
        .to_yaml()
        .unwrap();

        assert!(!yaml.contains("for:"));
        assert!(!yaml.contains("labels:"));
    }

    #[test]
    fn parses_prometheus_layout() {
        let yaml = "groups:\n- name: g\n  rules:\n  - alert: A\n    expr: up == 0\n    for: 5m\n    labels:\n      severity: critical\n";

        let file = RuleFile::from_yaml(yaml).unwrap();

        assert_eq!(file.rule_count(), 1);
        let rule = &file.groups[0].rules[0];
        assert_eq!(rule.for_duration.as_deref(), Some("5m"));
        assert_eq!(rule.labels["severity"], "critical");
    }

    #[rstest]
    #[case("HighCPU_Group_0a1b", true)]
    #[case("job:latency:rate5m", true)]
    #[case("_private", true)]
    #[case("High-CPU", false)]
    #[case("9lives", false)]
    #[case("", false)]
    fn alert_name_syntax(#[case] name: &str, #[case] valid: bool) {
        assert_eq!(is_valid_alert_name(name), valid);
    }
}
