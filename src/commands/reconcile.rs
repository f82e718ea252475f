use anyhow::Result;
use colored::Colorize;

use super::CommandContext;
use crate::output::{OutputFormat, SentraOutput};
use sentra::reconcile::{reconcile_environment, ReconciliationReport};
use sentra::utils::CancelToken;
use sentra::verify::{verify_build_freshness, Issue};

pub fn run(ctx: &CommandContext) -> Result<()> {
    let detected = ctx.detect()?;
    if detected.is_empty() {
        println!("{}", sentra::engine::NO_ECOSYSTEMS.yellow());
        return Ok(());
    }

    let cancel = CancelToken::new();
    let mut issues: Vec<Issue> = Vec::new();
    for ecosystem in &detected {
        issues.extend(verify_build_freshness(ecosystem, &cancel)?.issues);
    }

    if issues.is_empty() {
        println!("{}", "No issues found to reconcile".green());
        return Ok(());
    }

    let report = reconcile_environment(&issues, &detected[0], &cancel)?;

    match ctx.format {
        OutputFormat::Json => {
            let output = SentraOutput::new("reconcile")
                .with_success(report.is_success)
                .with_data(serde_json::to_value(&report)?);
            println!("{}", output.to_json()?);
        }
        OutputFormat::Text => output_text(&report),
    }

    if !report.failed.is_empty() {
        std::process::exit(1);
    }

    Ok(())
}

fn output_text(report: &ReconciliationReport) {
    for result in &report.fixed {
        println!("{} {}: {}", "✓".green(), result.issue_kind, result.message);
    }
    for result in &report.failed {
        println!("{} {}: {}", "✗".red(), result.issue_kind, result.message);
    }

    println!();
    println!("{} {}", "Summary:".bold(), report.message);
}
