//! Effective checks for a target

use colored::Colorize;
use confmon_core::ScopeResolver;
use serde_json::Value;

use crate::context::{Context, find_target};
use crate::error::Result;

/// Run the checks command
pub fn run_checks(ctx: &Context, selector: &str) -> Result<()> {
    let store = ctx.load_store()?;
    let target = find_target(&store, selector)?;
    let checks = ScopeResolver::new(&store).effective_checks(target.id)?;

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&checks)?);
        return Ok(());
    }

    println!("{} {}", "Effective checks for".bold(), target.hostname.cyan());
    println!();

    if checks.is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for check in &checks {
        println!(
            "  {:<24} {:<7} {}",
            check.name.green(),
            check.kind.to_string(),
            check.scope.dimmed()
        );
        if !check.config.is_empty() {
            println!("    config: {}", Value::Object(check.config.clone()));
        }
    }

    println!();
    println!("{} {} effective", "Total:".dimmed(), checks.len());
    Ok(())
}
