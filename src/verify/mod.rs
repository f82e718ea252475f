//! Build freshness verification.
//!
//! Each descriptor declares an ordered list of freshness checks comparing a
//! source file's mtime against a fixed target or the newest match of a glob.
//! A check whose source is missing is a check-level failure: it is logged
//! and skipped, and verification continues. Issues come out in declaration
//! order.

use std::fmt;
use std::path::Path;

use anyhow::{bail, Result};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::config::{CheckKind, FreshnessCheck};
use crate::detect::DetectedEcosystem;
use crate::utils::fs::{expand_env, glob_files, modified_time, newest_file, path_exists};
use crate::utils::CancelToken;

/// The closed set of issue kinds the engine can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    StaleBuild,
    MissingTarget,
    MissingBuildOutput,
    VersionTooOld,
    VersionTooNew,
    VersionExcluded,
    RuntimeExcluded,
    RuntimeNotPreferred,
    MissingEnvVar,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::StaleBuild => "stale_build",
            IssueKind::MissingTarget => "missing_target",
            IssueKind::MissingBuildOutput => "missing_build_output",
            IssueKind::VersionTooOld => "version_too_old",
            IssueKind::VersionTooNew => "version_too_new",
            IssueKind::VersionExcluded => "version_excluded",
            IssueKind::RuntimeExcluded => "runtime_excluded",
            IssueKind::RuntimeNotPreferred => "runtime_not_preferred",
            IssueKind::MissingEnvVar => "missing_env_var",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A detected problem, carrying its remediation command when one is
/// recorded for the ecosystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub severity: Severity,
    pub message: String,
    pub fix_available: bool,
    #[serde(default)]
    pub fix_command: String,
}

impl Issue {
    fn with_fix(kind: IssueKind, message: String, fix_command: String) -> Self {
        Self {
            kind,
            severity: Severity::Error,
            message,
            fix_available: true,
            fix_command,
        }
    }

    fn warning(kind: IssueKind, message: String) -> Self {
        Self {
            kind,
            severity: Severity::Warning,
            message,
            fix_available: false,
            fix_command: String::new(),
        }
    }
}

/// Result of verifying one ecosystem's build freshness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FreshnessReport {
    pub ecosystem_id: String,
    pub is_healthy: bool,
    pub issues: Vec<Issue>,
}

/// Evaluate every freshness check declared by the detected ecosystem.
pub fn verify_build_freshness(
    ecosystem: &DetectedEcosystem<'_>,
    cancel: &CancelToken,
) -> Result<FreshnessReport> {
    let mut report = FreshnessReport {
        ecosystem_id: ecosystem.id().to_string(),
        is_healthy: true,
        issues: Vec::new(),
    };

    for check in &ecosystem.descriptor.verification.build_freshness.commands {
        if cancel.is_cancelled() {
            bail!("operation cancelled");
        }

        match evaluate_check(check, &ecosystem.project_root, ecosystem) {
            Ok(Some(issue)) => {
                report.is_healthy = false;
                report.issues.push(issue);
            }
            Ok(None) => {}
            Err(e) => {
                warn!(
                    "freshness check '{}' in {} failed: {:#}",
                    check.name, report.ecosystem_id, e
                );
            }
        }
    }

    Ok(report)
}

fn evaluate_check(
    check: &FreshnessCheck,
    project_root: &Path,
    ecosystem: &DetectedEcosystem<'_>,
) -> Result<Option<Issue>> {
    // Reserved and unknown kinds are no-ops so descriptor files can evolve
    // ahead of the engine.
    if check.kind != CheckKind::TimestampCompare {
        return Ok(None);
    }

    let source_path = project_root.join(expand_env(&check.source));
    if !path_exists(&source_path) {
        bail!("source file not found: {}", source_path.display());
    }
    let source_mtime = modified_time(&source_path)?;

    if !check.target_pattern.is_empty() {
        return compare_against_pattern(check, source_mtime, project_root, ecosystem);
    }

    if !check.target.is_empty() {
        let target_path = project_root.join(expand_env(&check.target));
        if !path_exists(&target_path) {
            return Ok(Some(Issue::warning(
                IssueKind::MissingTarget,
                format!("Target file not found: {}", check.target),
            )));
        }

        let target_mtime = modified_time(&target_path)?;
        if source_mtime > target_mtime {
            return Ok(Some(Issue::with_fix(
                IssueKind::StaleBuild,
                format!("{} is newer than {}", check.source, check.target),
                stale_build_fix(ecosystem),
            )));
        }
    }

    Ok(None)
}

fn compare_against_pattern(
    check: &FreshnessCheck,
    source_mtime: std::time::SystemTime,
    project_root: &Path,
    ecosystem: &DetectedEcosystem<'_>,
) -> Result<Option<Issue>> {
    let pattern = project_root.join(expand_env(&check.target_pattern));
    let matches = glob_files(&pattern.to_string_lossy())?;

    if matches.is_empty() {
        return Ok(Some(Issue::warning(
            IssueKind::MissingBuildOutput,
            format!("No files found matching pattern: {}", check.target_pattern),
        )));
    }

    let Some((newest_path, newest_mtime)) = newest_file(&matches) else {
        bail!("no readable files matched pattern: {}", check.target_pattern);
    };

    if source_mtime > newest_mtime {
        let shown = newest_path
            .strip_prefix(project_root)
            .unwrap_or(&newest_path)
            .display();
        return Ok(Some(Issue::with_fix(
            IssueKind::StaleBuild,
            format!("{} is newer than build output ({})", check.source, shown),
            stale_build_fix(ecosystem),
        )));
    }

    Ok(None)
}

fn stale_build_fix(ecosystem: &DetectedEcosystem<'_>) -> String {
    ecosystem
        .descriptor
        .fix_for(IssueKind::StaleBuild.as_str())
        .map(|f| f.command.clone())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_kind_strings_round_trip() {
        let kinds = [
            IssueKind::StaleBuild,
            IssueKind::MissingTarget,
            IssueKind::MissingBuildOutput,
            IssueKind::VersionTooOld,
            IssueKind::VersionTooNew,
            IssueKind::VersionExcluded,
            IssueKind::RuntimeExcluded,
            IssueKind::RuntimeNotPreferred,
            IssueKind::MissingEnvVar,
        ];
        for kind in kinds {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
            let back: IssueKind = serde_json::from_str(&json).unwrap();
            assert_eq!(back, kind);
        }
    }

    #[test]
    fn test_severity_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Severity::Error).unwrap(), "\"error\"");
        assert_eq!(
            serde_json::to_string(&Severity::Warning).unwrap(),
            "\"warning\""
        );
    }
}
