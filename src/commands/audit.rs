use anyhow::Result;
use colored::Colorize;

use super::CommandContext;
use sentra::audit::{audit_environment, EnvVarReport};
use crate::output::{OutputFormat, SentraOutput};
use sentra::utils::CancelToken;

pub fn run(ctx: &CommandContext) -> Result<()> {
    let detected = ctx.detect()?;
    let Some(first) = detected.first() else {
        println!("{}", sentra::engine::NO_ECOSYSTEMS.yellow());
        return Ok(());
    };

    let report = audit_environment(first, &CancelToken::new())?;

    match ctx.format {
        OutputFormat::Json => {
            let output = SentraOutput::new("audit")
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

fn output_text(report: &EnvVarReport) {
    println!("{} {}", "Ecosystem:".bold(), report.ecosystem_id);
    println!(
        "{} reference(s) across the project",
        report.references.len()
    );

    if report.is_healthy {
        println!();
        println!("{}", "All referenced variables are set ✨".green());
        return;
    }

    println!();
    for name in &report.missing {
        println!("{} {}", "✗".red(), name);
        for reference in report.references.iter().filter(|r| &r.name == name).take(3) {
            println!("  {}", format!("{}:{}", reference.file, reference.line).dimmed());
        }
    }

    println!();
    println!(
        "{} {} variable(s) missing",
        "Summary:".bold(),
        report.missing.len()
    );
}
