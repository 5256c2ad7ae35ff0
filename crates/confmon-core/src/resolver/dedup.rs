//! Logical identity of policy instances

use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

use crate::model::{Instance, TemplateKind};

/// What makes two instances "the same check"
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DedupKey {
    /// Instances materialized from one template
    Template(Uuid),
    /// Directly created instances, matched on name and type
    Named { name: String, kind: TemplateKind },
}

impl DedupKey {
    pub fn of(instance: &Instance) -> Self {
        match instance.template_id {
            Some(id) => Self::Template(id),
            None => Self::Named {
                name: instance.name.clone(),
                kind: instance.kind,
            },
        }
    }
}

impl fmt::Display for DedupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Template(id) => write!(f, "{}", id),
            Self::Named { name, kind } => write!(f, "{}:{}", name, kind),
        }
    }
}

/// Keys already claimed during one resolution pass
#[derive(Debug, Default)]
pub struct DedupSet {
    seen: HashSet<DedupKey>,
}

impl DedupSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the instance's key. Returns false if an earlier instance owns it.
    pub fn claim(&mut self, instance: &Instance) -> bool {
        self.seen.insert(DedupKey::of(instance))
    }

    pub fn contains(&self, instance: &Instance) -> bool {
        self.seen.contains(&DedupKey::of(instance))
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Keep the live candidates whose key is still unclaimed, claiming as it goes.
    ///
    /// Candidates are taken in the order given, so the caller's ordering
    /// decides which of two competing instances wins.
    pub fn take_unclaimed(&mut self, candidates: Vec<Instance>) -> Vec<Instance> {
        let mut kept = Vec::with_capacity(candidates.len());
        for instance in candidates {
            if !instance.is_live() {
                continue;
            }
            if self.claim(&instance) {
                kept.push(instance);
            } else {
                tracing::debug!(
                    instance_id = %instance.id,
                    key = %DedupKey::of(&instance),
                    scope = %instance.scope_identifier(),
                    "Discarding instance shadowed by a more specific one"
                );
            }
        }
        kept
    }
}
