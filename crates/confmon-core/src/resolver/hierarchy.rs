//! Ancestor-chain resolution for alert rules
//!
//! Alert rules live on groups. A rule on a child group overrides (or merges
//! onto) the rule with the same name on any of its ancestors.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashSet};
use uuid::Uuid;

use crate::merge::{ConfigMap, merge};
use crate::model::{AlertRule, EffectiveAlertRule, Group};
use crate::render::render;
use crate::store::{AlertRuleStore, GroupStore, TargetStore};
use crate::Result;

/// Rule currently winning for one alert name, with its accumulated config
struct Winner {
    rule: AlertRule,
    config: ConfigMap,
}

pub struct AlertHierarchyResolver<'a, S> {
    store: &'a S,
}

impl<'a, S> AlertHierarchyResolver<'a, S>
where
    S: GroupStore + TargetStore + AlertRuleStore,
{
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// The group's chain ordered root first, ending with the group itself.
    pub fn hierarchy(&self, group_id: Uuid) -> Result<Vec<Group>> {
        let group = self.store.get_group(group_id)?;
        let mut chain = self.store.ancestors(group_id)?;
        chain.reverse();
        chain.push(group);
        Ok(chain)
    }

    /// Effective alert rules for a target, sorted by name.
    ///
    /// Hierarchies of all the target's groups are walked lowest group
    /// priority first, so the highest-priority group's chain is applied
    /// last. A group shared by several chains is visited once.
    pub fn resolve_for_target(&self, target_id: Uuid) -> Result<Vec<EffectiveAlertRule>> {
        let target = self.store.get_target(target_id)?;
        let groups = self.store.target_groups(target.id)?;
        if groups.is_empty() {
            tracing::debug!(target_id = %target.id, "Target has no groups, no alert rules apply");
            return Ok(Vec::new());
        }

        let mut visited = HashSet::new();
        let mut nodes = Vec::new();
        for group in groups.iter().rev() {
            for node in self.hierarchy(group.id)? {
                if visited.insert(node.id) {
                    nodes.push(node);
                }
            }
        }

        self.resolve_nodes(&nodes)
    }

    /// Effective alert rules seen from one group through its ancestors.
    pub fn resolve_for_group(&self, group_id: Uuid) -> Result<Vec<EffectiveAlertRule>> {
        let nodes = self.hierarchy(group_id)?;
        self.resolve_nodes(&nodes)
    }

    fn resolve_nodes(&self, nodes: &[Group]) -> Result<Vec<EffectiveAlertRule>> {
        let mut winners: BTreeMap<String, Winner> = BTreeMap::new();

        for node in nodes {
            let mut rules: Vec<AlertRule> = self
                .store
                .alert_rules_by_group(node.id)?
                .into_iter()
                .filter(AlertRule::is_live)
                .collect();
            // Within one group the highest-priority rule is applied last.
            rules.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.name.cmp(&b.name)));

            for rule in rules {
                match winners.entry(rule.name.clone()) {
                    Entry::Vacant(slot) => {
                        slot.insert(Winner {
                            config: rule.config.clone(),
                            rule,
                        });
                    }
                    Entry::Occupied(mut slot) => {
                        let winner = slot.get_mut();
                        tracing::debug!(
                            alert = %rule.name,
                            group = %node.name,
                            strategy = %rule.merge_strategy,
                            "Descendant rule overrides ancestor"
                        );
                        winner.config = rule.merge_strategy.apply(&winner.config, &rule.config);
                        winner.rule = rule;
                    }
                }
            }
        }

        Ok(winners.into_values().map(finish).collect())
    }
}

fn finish(winner: Winner) -> EffectiveAlertRule {
    let Winner { rule, config } = winner;
    let config = merge(&rule.default_config, &config);

    match render(&rule.query_template, &config) {
        Ok(query) => EffectiveAlertRule::new(&rule, config, query),
        Err(e) => {
            tracing::warn!(
                alert = %rule.name,
                group_id = %rule.group_id,
                error = %e,
                "Query render failed, using unrendered template"
            );
            let mut effective = EffectiveAlertRule::new(&rule, config, rule.query_template.clone());
            effective.render_error = Some(e.to_string());
            effective
        }
    }
}
