use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::CommandContext;
use output::OutputFormat;
use sentra::config::loader;

/// Sentra - development-environment health checks
/// Detects project ecosystems from declarative descriptors and diagnoses
/// build freshness, infrastructure parity and environment variables.
#[derive(Parser)]
#[command(name = "sentra")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Output format (text, json)
    #[arg(long, global = true, default_value = "text")]
    format: String,

    /// Descriptor directory (default: SENTRA_CONFIG_DIR, then alongside the
    /// executable, then the current directory)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the ecosystems detected in a project
    Detect {
        /// Project directory to inspect
        #[arg(default_value = ".")]
        project_root: PathBuf,
    },

    /// Verify build outputs are fresh with respect to the manifest
    Verify {
        #[arg(default_value = ".")]
        project_root: PathBuf,
    },

    /// Check required services and language version
    Infra {
        #[arg(default_value = ".")]
        project_root: PathBuf,
    },

    /// Audit environment variable references against the process environment
    Audit {
        #[arg(default_value = ".")]
        project_root: PathBuf,
    },

    /// Run the recorded fixes for detected issues
    Reconcile {
        #[arg(default_value = ".")]
        project_root: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let base = cli.config_dir.unwrap_or_else(loader::default_config_base);
    let descriptors = loader::discover_descriptors(&base)?;

    let format = OutputFormat::from_str(&cli.format);
    let ctx = |project_root: PathBuf| CommandContext {
        descriptors,
        project_root,
        format,
    };

    match cli.command {
        Commands::Detect { project_root } => commands::detect::run(&ctx(project_root)),
        Commands::Verify { project_root } => commands::verify::run(&ctx(project_root)),
        Commands::Infra { project_root } => commands::infra::run(&ctx(project_root)),
        Commands::Audit { project_root } => commands::audit::run(&ctx(project_root)),
        Commands::Reconcile { project_root } => commands::reconcile::run(&ctx(project_root)),
    }
}
