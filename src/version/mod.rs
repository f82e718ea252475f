//! Language version probing.
//!
//! The probe runs a descriptor's version command, extracts the version with
//! the descriptor's regex, and normalizes it to a major.minor.patch triple.
//! Descriptor regexes are compiled here at use-time, never at load: a bad
//! regex fails one probe, not the whole engine.

pub mod validate;

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::VersionSection;
use crate::utils::{run_shell, CancelToken, RunOutcome};

/// Deadline for the version command itself.
const VERSION_PROBE_TIMEOUT: Duration = Duration::from_secs(10);
/// Deadline for each version-manager check command.
const MANAGER_CHECK_TIMEOUT: Duration = Duration::from_secs(2);

/// A specific runtime distribution detected in the probe output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeVariantInfo {
    pub name: String,
    pub provider: String,
    pub full_name: String,
}

/// Detected language version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionInfo {
    pub language: String,
    /// Raw version exactly as captured, e.g. `17.0.9+11`.
    pub full_version: String,
    /// Normalized `major.minor.patch` triple.
    pub version: String,
    pub major: String,
    pub minor: String,
    pub patch: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime_variant: Option<RuntimeVariantInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_manager: Option<String>,
}

/// Probe the current language version for a descriptor.
pub fn probe_version(
    version: &VersionSection,
    cwd: &Path,
    cancel: &CancelToken,
) -> Result<VersionInfo> {
    if version.version_command.is_empty() {
        bail!("no version command configured");
    }

    let outcome = run_shell(&version.version_command, cwd, VERSION_PROBE_TIMEOUT, cancel);
    let output = match outcome {
        RunOutcome::Completed { output, exit_code: 0 } => output,
        RunOutcome::Completed { output, exit_code } => {
            bail!(
                "version command exited with code {}: {}",
                exit_code,
                output.trim()
            );
        }
        RunOutcome::TimedOut => bail!("version command timed out"),
        RunOutcome::Cancelled => bail!("operation cancelled"),
        RunOutcome::SpawnError(e) => bail!("version command failed: {}", e),
    };

    let output = output.trim().to_string();
    let parsed = parse_version(&output, &version.version_pattern)
        .with_context(|| format!("cannot parse version from '{}'", version.version_command))?;

    let runtime_variant = if version.runtime_pattern.is_empty() {
        None
    } else {
        detect_runtime_variant(&output, version)
    };

    Ok(VersionInfo {
        language: version.language.clone(),
        full_version: parsed.full,
        version: parsed.semantic,
        major: parsed.major,
        minor: parsed.minor,
        patch: parsed.patch,
        runtime_variant,
        version_manager: detect_version_manager(version, cwd, cancel),
    })
}

/// Version components extracted from probe output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedVersion {
    pub full: String,
    pub semantic: String,
    pub major: String,
    pub minor: String,
    pub patch: String,
}

/// Apply a version pattern to probe output. Capture group 1 is the full
/// version; the normalized triple pads missing parts with `0` and strips
/// `+`/`-` suffixes from the patch.
pub fn parse_version(output: &str, pattern: &str) -> Result<ParsedVersion> {
    let re = Regex::new(pattern).with_context(|| format!("invalid version pattern: {}", pattern))?;

    let full = re
        .captures(output)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .context("version pattern not found in output")?;

    let parts: Vec<&str> = full.split('.').collect();
    let major = parts[0].to_string();
    let minor = parts.get(1).map(|s| s.to_string()).unwrap_or_else(|| "0".to_string());
    let patch = parts
        .get(2)
        .map(|s| {
            s.split(&['+', '-'][..])
                .next()
                .unwrap_or("0")
                .to_string()
        })
        .unwrap_or_else(|| "0".to_string());

    let semantic = format!("{}.{}.{}", major, minor, patch);

    Ok(ParsedVersion {
        full,
        semantic,
        major,
        minor,
        patch,
    })
}

/// Match probe output against known runtime variants, in declaration order.
/// Falls back to the generic runtime pattern with provider `Unknown`.
fn detect_runtime_variant(output: &str, version: &VersionSection) -> Option<RuntimeVariantInfo> {
    for variant in &version.runtime_variants {
        let Ok(re) = Regex::new(&variant.pattern) else {
            continue;
        };
        if re.is_match(output) {
            return Some(RuntimeVariantInfo {
                name: variant.name.clone(),
                provider: variant.provider.clone(),
                full_name: format!("{} ({})", variant.name, variant.provider),
            });
        }
    }

    if let Ok(re) = Regex::new(&version.runtime_pattern) {
        if let Some(name) = re.captures(output).and_then(|c| c.get(1)) {
            let name = name.as_str().to_string();
            return Some(RuntimeVariantInfo {
                name: name.clone(),
                provider: "Unknown".to_string(),
                full_name: name,
            });
        }
    }

    None
}

/// First version manager whose check command exits 0.
fn detect_version_manager(
    version: &VersionSection,
    cwd: &Path,
    cancel: &CancelToken,
) -> Option<String> {
    for manager in &version.version_managers {
        if manager.check_command.is_empty() {
            continue;
        }
        let outcome = run_shell(&manager.check_command, cwd, MANAGER_CHECK_TIMEOUT, cancel);
        if outcome.succeeded() {
            return Some(manager.name.clone());
        }
    }
    None
}
