//! Runtime settings and their layered resolution

mod resolver;
mod settings;

pub use resolver::SettingsResolver;
pub use settings::{LoggingSettings, ReloadSettings, RulesSettings, Settings};
