//! Shared test utilities for the confmon workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`catalog`]: [`TestCatalog`] builder over an in-memory store
//! - [`rules_dir`]: [`TestRulesDir`] scratch directory with rule-file assertions

pub mod catalog;
pub mod rules_dir;

pub use catalog::{TestCatalog, config};
pub use rules_dir::TestRulesDir;
