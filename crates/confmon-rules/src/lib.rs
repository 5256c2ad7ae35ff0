//! Prometheus rule file generation for confmon
//!
//! Converts each group's enabled alert rules into a Prometheus rule file,
//! publishes it atomically into the watched rules directory, and asks the
//! monitoring engine to reload.
//!
//! - [`PrometheusRuleGenerator`]: per-group and batch generation
//! - [`RuleFileManager`]: file naming, atomic writes, backups, pruning
//! - [`HttpReloadTrigger`]: best-effort `POST /-/reload` with retries
//! - [`RulePublisher`]: generation followed by reload when files changed

pub mod error;
pub mod files;
pub mod generator;
pub mod prometheus;
pub mod publisher;
pub mod reload;

pub use error::{Error, Result};
pub use files::{BackupPolicy, RuleFileManager};
pub use generator::{
    BatchReport, GenerateOutcome, GroupFailure, PrometheusRuleGenerator, SkippedRule,
    build_rule_file, convert_rule,
};
pub use prometheus::{PrometheusRule, RuleFile, RuleGroup};
pub use publisher::RulePublisher;
pub use reload::{
    DisabledReload, HttpReloadTrigger, ReloadError, ReloadNotifier, notifier_from_settings,
};
