//! Filesystem primitives for confmon
//!
//! Provides the safe I/O operations the rule pipeline depends on:
//! write-to-temp-then-rename publication, idempotent removal, SHA-256
//! content checksums, and format-agnostic config loading.

pub mod checksum;
pub mod config;
pub mod error;
pub mod io;

pub use checksum::{compute_content_checksum, compute_file_checksum, content_matches};
pub use config::ConfigStore;
pub use error::{Error, Result};
