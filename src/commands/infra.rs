use anyhow::Result;
use colored::Colorize;

use super::CommandContext;
use sentra::infra::{check_infrastructure, InfrastructureReport};
use crate::output::{OutputFormat, SentraOutput};
use sentra::utils::CancelToken;

pub fn run(ctx: &CommandContext) -> Result<()> {
    let detected = ctx.detect()?;
    let Some(first) = detected.first() else {
        println!("{}", sentra::engine::NO_ECOSYSTEMS.yellow());
        return Ok(());
    };

    let report = check_infrastructure(first, &CancelToken::new())?;

    match ctx.format {
        OutputFormat::Json => {
            let output = SentraOutput::new("infra")
                .with_success(report.is_healthy)
                .with_data(serde_json::to_value(&report)?);
            println!("{}", output.to_json()?);
        }
        OutputFormat::Text => output_text(&report),
    }

    if !report.is_healthy {
        std::process::exit(1);
    }

    Ok(())
}

fn output_text(report: &InfrastructureReport) {
    println!("{} {}", "Ecosystem:".bold(), report.ecosystem_id);

    for service in &report.services {
        let icon = if service.healthy {
            "✓".green()
        } else {
            "✗".red()
        };
        println!("{} {}", icon, service.message);
    }

    if let Some(version) = &report.version {
        match &version.info {
            Some(info) => {
                let icon = if version.is_valid {
                    "✓".green()
                } else {
                    "✗".red()
                };
                println!("{} {} version {}", icon, info.language, info.full_version);
            }
            None => println!("{} version probe failed: {}", "⚠".yellow(), version.error),
        }

        for suggestion in &version.suggestions {
            println!("  {} {}", "→".cyan(), suggestion.description);
            for command in &suggestion.commands {
                println!("    {}", command.dimmed());
            }
        }
    }

    for issue in &report.issues {
        println!("  {}", issue.dimmed());
    }

    println!();
    if report.is_healthy {
        println!("{}", "Infrastructure is healthy ✨".green());
    } else {
        println!("{} {} issue(s) found", "Summary:".bold(), report.issues.len());
    }
}
