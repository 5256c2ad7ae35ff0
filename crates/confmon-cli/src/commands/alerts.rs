//! Effective alert rules for a target

use colored::Colorize;
use confmon_core::AlertHierarchyResolver;

use crate::context::{Context, find_target};
use crate::error::Result;

/// Run the alerts command
pub fn run_alerts(ctx: &Context, selector: &str) -> Result<()> {
    let store = ctx.load_store()?;
    let target = find_target(&store, selector)?;
    let rules = AlertHierarchyResolver::new(&store).resolve_for_target(target.id)?;

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&rules)?);
        return Ok(());
    }

    println!(
        "{} {}",
        "Effective alert rules for".bold(),
        target.hostname.cyan()
    );
    println!();

    if rules.is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for rule in &rules {
        println!(
            "  {:<24} {:<8} {}",
            rule.name.green(),
            rule.severity.to_string(),
            format!("from group {}", rule.source_group_id).dimmed()
        );
        println!("    {}", rule.query);
        if let Some(ref error) = rule.render_error {
            println!("    {} {}", "not rendered:".yellow(), error);
        }
    }

    println!();
    println!("{} {} effective", "Total:".dimmed(), rules.len());
    Ok(())
}
