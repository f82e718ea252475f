//! CLI subcommand implementations.

pub mod audit;
pub mod detect;
pub mod infra;
pub mod reconcile;
pub mod verify;

use std::path::PathBuf;

use anyhow::{bail, Result};

use crate::output::OutputFormat;
use sentra::config::EcosystemDescriptor;
use sentra::detect::DetectedEcosystem;

/// Shared state every subcommand receives.
pub struct CommandContext {
    pub descriptors: Vec<EcosystemDescriptor>,
    pub project_root: PathBuf,
    pub format: OutputFormat,
}

impl CommandContext {
    /// Detect ecosystems, failing when the project root does not exist.
    pub fn detect(&self) -> Result<Vec<DetectedEcosystem<'_>>> {
        if !self.project_root.is_dir() {
            bail!("project root not found: {}", self.project_root.display());
        }
        Ok(sentra::detect::detect_ecosystems(
            &self.project_root,
            &self.descriptors,
        ))
    }
}
