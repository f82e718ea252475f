use anyhow::Result;
use colored::Colorize;

use super::CommandContext;
use crate::output::{severity_icon, OutputFormat, SentraOutput};
use sentra::utils::CancelToken;
use sentra::verify::{verify_build_freshness, FreshnessReport, Severity};

pub fn run(ctx: &CommandContext) -> Result<()> {
    let detected = ctx.detect()?;
    let Some(first) = detected.first() else {
        println!("{}", sentra::engine::NO_ECOSYSTEMS.yellow());
        return Ok(());
    };

    let report = verify_build_freshness(first, &CancelToken::new())?;

    match ctx.format {
        OutputFormat::Json => {
            let output = SentraOutput::new("verify")
                .with_success(report.is_healthy)
                .with_data(serde_json::to_value(&report)?);
            println!("{}", output.to_json()?);
        }
        OutputFormat::Text => output_text(&report),
    }

    let has_errors = report
        .issues
        .iter()
        .any(|i| i.severity == Severity::Error);
    if has_errors {
        std::process::exit(1);
    }

    Ok(())
}

fn output_text(report: &FreshnessReport) {
    println!("{} {}", "Ecosystem:".bold(), report.ecosystem_id);

    if report.issues.is_empty() {
        println!("{}", "Build outputs are fresh ✨".green());
        return;
    }

    for issue in &report.issues {
        println!("{} {}", severity_icon(issue.severity), issue.message);
        if issue.fix_available && !issue.fix_command.is_empty() {
            println!("  {} {}", "Fix:".cyan(), issue.fix_command);
        }
    }

    println!();
    println!(
        "{} {} issue(s) found",
        "Summary:".bold(),
        report.issues.len()
    );
}
