//! Command implementations for confmon-cli

pub mod alerts;
pub mod checks;
pub mod generate;
pub mod settings;

pub use alerts::run_alerts;
pub use checks::run_checks;
pub use generate::run_generate;
pub use settings::run_settings;
