//! CLI argument parsing using clap derive

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

/// confmon - Resolve effective monitoring policy and publish Prometheus rules
#[derive(Parser, Debug)]
#[command(name = "confmon")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Settings file layered over the global config
    #[arg(long, global = true, env = "CONFMON_CONFIG")]
    pub config: Option<PathBuf>,

    /// Catalog snapshot (.yaml, .yml, .toml, .json) to resolve against
    #[arg(long, global = true, env = "CONFMON_CATALOG")]
    pub catalog: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Show the effective checks and scripts for a target
    ///
    /// Examples:
    ///   confmon --catalog catalog.yaml checks web-01
    ///   confmon --catalog catalog.yaml checks 0b6f...-uuid --json
    Checks {
        /// Target hostname or id
        target: String,
    },

    /// Show the effective alert rules for a target
    Alerts {
        /// Target hostname or id
        target: String,
    },

    /// Generate Prometheus rule files and ask the engine to reload
    ///
    /// Without --group every group with enabled rules is regenerated and
    /// files of groups that no longer own rules are removed.
    Generate {
        /// Only regenerate this group
        #[arg(long)]
        group: Option<Uuid>,
    },

    /// Print the resolved settings
    Settings,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from([
            "confmon", "checks", "web-01", "--catalog", "c.yaml", "--json",
        ])
        .unwrap();

        assert!(cli.json);
        assert_eq!(cli.catalog, Some(PathBuf::from("c.yaml")));
        assert_eq!(
            cli.command,
            Commands::Checks {
                target: "web-01".to_string()
            }
        );
    }

    #[test]
    fn generate_group_must_be_a_uuid() {
        assert!(Cli::try_parse_from(["confmon", "generate", "--group", "web"]).is_err());

        let id = Uuid::new_v4();
        let cli =
            Cli::try_parse_from(["confmon", "generate", "--group", &id.to_string()]).unwrap();
        assert_eq!(cli.command, Commands::Generate { group: Some(id) });
    }
}
