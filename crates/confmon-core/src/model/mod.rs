//! Domain model: templates, scoped instances, alert rules, and the group tree

mod alert;
mod effective;
mod group;
mod instance;
mod scope;
mod template;

pub use alert::{
    ANNOTATIONS_KEY, AlertOptions, AlertRule, FOR_DURATION_KEY, LABELS_KEY, Severity,
    is_valid_duration,
};
pub use effective::{EffectiveAlertRule, EffectiveCheck};
pub use group::{Group, Membership, Namespace, Target};
pub use instance::Instance;
pub use scope::{Scope, ScopeKind};
pub use template::{Template, TemplateKind};
