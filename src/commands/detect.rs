use anyhow::Result;
use colored::Colorize;

use super::CommandContext;
use crate::output::{OutputFormat, SentraOutput};

pub fn run(ctx: &CommandContext) -> Result<()> {
    let detected = ctx.detect()?;

    match ctx.format {
        OutputFormat::Json => {
            let data: Vec<serde_json::Value> = detected
                .iter()
                .map(|e| {
                    serde_json::json!({
                        "id": e.id(),
                        "name": e.descriptor.name,
                        "confidence": e.confidence,
                    })
                })
                .collect();

            let output = SentraOutput::new("detect")
                .with_success(!detected.is_empty())
                .with_data(serde_json::json!({ "ecosystems": data }));
            println!("{}", output.to_json()?);
        }
        OutputFormat::Text => {
            if detected.is_empty() {
                println!("{}", sentra::engine::NO_ECOSYSTEMS.yellow());
                return Ok(());
            }

            for ecosystem in &detected {
                println!(
                    "{} {} {}",
                    "✓".green(),
                    ecosystem.id(),
                    format!("(confidence: {:.2})", ecosystem.confidence).dimmed()
                );
            }
        }
    }

    Ok(())
}
