//! Rule file generation and reload

use colored::Colorize;
use confmon_rules::{
    BatchReport, GenerateOutcome, PrometheusRuleGenerator, RuleFileManager, RulePublisher,
    notifier_from_settings,
};
use serde_json::json;
use uuid::Uuid;

use crate::context::Context;
use crate::error::{CliError, Result};

/// Run the generate command
pub fn run_generate(ctx: &Context, group: Option<Uuid>) -> Result<()> {
    let store = ctx.load_store()?;
    let files = RuleFileManager::from_settings(&ctx.settings.rules);
    let publisher = RulePublisher::new(
        PrometheusRuleGenerator::new(&store, files),
        notifier_from_settings(&ctx.settings.reload),
    );

    match group {
        Some(group_id) => {
            let outcome = publisher.publish_group(group_id)?;
            print_outcome(ctx, group_id, &outcome)
        }
        None => {
            let report = publisher.publish_all()?;
            print_report(ctx, &report)?;
            if report.failed.is_empty() {
                Ok(())
            } else {
                Err(CliError::user(format!(
                    "{} group(s) failed to generate",
                    report.failure_count()
                )))
            }
        }
    }
}

fn print_outcome(ctx: &Context, group_id: Uuid, outcome: &GenerateOutcome) -> Result<()> {
    if ctx.json {
        let value = match outcome {
            GenerateOutcome::Written {
                path,
                rule_count,
                skipped,
            } => json!({
                "group_id": group_id,
                "outcome": "written",
                "path": path,
                "rule_count": rule_count,
                "skipped": skipped
                    .iter()
                    .map(|s| json!({"name": s.name, "reason": s.reason}))
                    .collect::<Vec<_>>(),
            }),
            GenerateOutcome::Removed { existed } => json!({
                "group_id": group_id,
                "outcome": "removed",
                "existed": existed,
            }),
        };
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    match outcome {
        GenerateOutcome::Written {
            path,
            rule_count,
            skipped,
        } => {
            println!(
                "{} {} ({} rules)",
                "Wrote".green().bold(),
                path.display(),
                rule_count
            );
            for rule in skipped {
                println!("  {} {}: {}", "skipped".yellow(), rule.name, rule.reason);
            }
        }
        GenerateOutcome::Removed { existed: true } => {
            println!("{} rule file for group {}", "Removed".yellow().bold(), group_id);
        }
        GenerateOutcome::Removed { existed: false } => {
            println!("{} group {} has no enabled rules", "Nothing to do:".dimmed(), group_id);
        }
    }
    Ok(())
}

fn print_report(ctx: &Context, report: &BatchReport) -> Result<()> {
    if ctx.json {
        let value = json!({
            "succeeded": report.succeeded,
            "failed": report
                .failed
                .iter()
                .map(|f| json!({"group_id": f.group_id, "error": f.error}))
                .collect::<Vec<_>>(),
            "pruned": report.pruned,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    for group_id in &report.succeeded {
        println!("  {} group {}", "ok".green(), group_id);
    }
    for failure in &report.failed {
        println!("  {} group {}: {}", "failed".red(), failure.group_id, failure.error);
    }
    for group_id in &report.pruned {
        println!("  {} group {}", "pruned".yellow(), group_id);
    }

    println!();
    println!(
        "{} {} generated, {} failed, {} pruned",
        "Total:".dimmed(),
        report.success_count(),
        report.failure_count(),
        report.pruned.len()
    );
    Ok(())
}
