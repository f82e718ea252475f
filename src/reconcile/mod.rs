//! Issue reconciliation.
//!
//! Runs the remediation command recorded for each fixable issue, with an
//! optional verification command afterwards. A failed fix never aborts the
//! pass; every fixable issue ends up in exactly one of the `fixed` or
//! `failed` lists.

use std::time::Duration;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::config::Fix;
use crate::detect::DetectedEcosystem;
use crate::utils::{run_shell, CancelToken, RunOutcome};
use crate::verify::Issue;

/// Deadline for a fix command.
const FIX_TIMEOUT: Duration = Duration::from_secs(5 * 60);
/// Deadline for a verification command.
const VERIFY_TIMEOUT: Duration = Duration::from_secs(60);

/// Result of one fix attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixResult {
    pub issue_kind: String,
    #[serde(default)]
    pub command: String,
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub fixed: Vec<FixResult>,
    pub failed: Vec<FixResult>,
    pub is_success: bool,
    pub message: String,
}

/// Attempt to fix every issue marked fixable, in order.
pub fn reconcile_environment(
    issues: &[Issue],
    ecosystem: &DetectedEcosystem<'_>,
    cancel: &CancelToken,
) -> Result<ReconciliationReport> {
    let mut fixed = Vec::new();
    let mut failed = Vec::new();

    for issue in issues {
        if !issue.fix_available {
            continue;
        }
        if cancel.is_cancelled() {
            bail!("operation cancelled");
        }

        let kind = issue.kind.as_str();
        let fix = ecosystem.descriptor.fix_for(kind);

        // The ecosystem's fix map is consulted first; an issue may still
        // carry its own command when no record exists.
        if fix.is_none() && issue.fix_command.is_empty() {
            failed.push(FixResult {
                issue_kind: kind.to_string(),
                command: String::new(),
                success: false,
                message: "No fix available for this issue type".to_string(),
                error: String::new(),
            });
            continue;
        }

        let result = execute_fix(fix, issue, ecosystem, cancel)?;
        if result.success {
            fixed.push(result);
        } else {
            failed.push(result);
        }
    }

    let mut message = String::new();
    if !fixed.is_empty() {
        message.push_str(&format!("Fixed {} issue(s)", fixed.len()));
    }
    if !failed.is_empty() {
        if !message.is_empty() {
            message.push_str(", ");
        }
        message.push_str(&format!("Failed to fix {} issue(s)", failed.len()));
    }

    Ok(ReconciliationReport {
        is_success: failed.is_empty() && !fixed.is_empty(),
        fixed,
        failed,
        message,
    })
}

fn execute_fix(
    fix: Option<&Fix>,
    issue: &Issue,
    ecosystem: &DetectedEcosystem<'_>,
    cancel: &CancelToken,
) -> Result<FixResult> {
    let kind = issue.kind.as_str();

    // Prefer the recorded command, fall back to the one the issue carries.
    let command = match fix {
        Some(f) if !f.command.is_empty() => f.command.clone(),
        _ => issue.fix_command.clone(),
    };

    let mut result = FixResult {
        issue_kind: kind.to_string(),
        command: command.clone(),
        success: false,
        message: String::new(),
        error: String::new(),
    };

    if command.is_empty() {
        result.message = "No fix command available".to_string();
        return Ok(result);
    }

    match run_shell(&command, &ecosystem.project_root, FIX_TIMEOUT, cancel) {
        RunOutcome::Completed { exit_code: 0, .. } => {}
        RunOutcome::Completed { output, exit_code } => {
            result.error = format!("exit code {}", exit_code);
            result.message = format!("Fix command failed: {}", output.trim());
            return Ok(result);
        }
        RunOutcome::TimedOut => {
            result.error = "timeout".to_string();
            result.message = "Fix command timed out".to_string();
            return Ok(result);
        }
        RunOutcome::Cancelled => bail!("operation cancelled"),
        RunOutcome::SpawnError(e) => {
            result.error = e.clone();
            result.message = format!("Fix command failed: {}", e);
            return Ok(result);
        }
    }

    let description = fix.map(|f| f.description.as_str()).unwrap_or("");
    let verify_command = fix.map(|f| f.verify_command.as_str()).unwrap_or("");

    if !verify_command.is_empty() {
        match run_shell(verify_command, &ecosystem.project_root, VERIFY_TIMEOUT, cancel) {
            RunOutcome::Completed { exit_code: 0, .. } => {
                result.success = true;
                result.message =
                    format!("Fix executed and verified successfully: {}", description);
            }
            RunOutcome::Completed { output, exit_code } => {
                result.error = format!("exit code {}", exit_code);
                result.message = format!(
                    "Fix executed but verification failed: {}",
                    output.trim()
                );
            }
            RunOutcome::TimedOut => {
                result.error = "timeout".to_string();
                result.message = "Fix executed but verification timed out".to_string();
            }
            RunOutcome::Cancelled => bail!("operation cancelled"),
            RunOutcome::SpawnError(e) => {
                result.error = e.clone();
                result.message = format!("Fix executed but verification failed: {}", e);
            }
        }
    } else {
        result.success = true;
        result.message = format!("Fix executed: {}", description);
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EcosystemDescriptor, Manifest, Reconciliation};
    use crate::verify::{IssueKind, Severity};
    use std::path::Path;

    fn issue(kind: IssueKind, fix_command: &str) -> Issue {
        Issue {
            kind,
            severity: Severity::Error,
            message: "test issue".to_string(),
            fix_available: true,
            fix_command: fix_command.to_string(),
        }
    }

    fn ecosystem_with_fixes<'a>(
        descriptor: &'a EcosystemDescriptor,
        root: &Path,
    ) -> DetectedEcosystem<'a> {
        DetectedEcosystem {
            descriptor,
            project_root: root.to_path_buf(),
            confidence: 1.0,
        }
    }

    fn descriptor(fixes: Vec<Fix>) -> EcosystemDescriptor {
        EcosystemDescriptor {
            id: "fix-test".to_string(),
            manifest: Manifest {
                primary_file: "manifest.txt".to_string(),
                ..Default::default()
            },
            reconciliation: Reconciliation { fixes },
            ..Default::default()
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_successful_fix_without_verification() {
        let dir = tempfile::tempdir().unwrap();
        let descriptor = descriptor(vec![Fix {
            issue_type: "stale_build".to_string(),
            command: "true".to_string(),
            verify_command: String::new(),
            description: "Rebuild".to_string(),
        }]);
        let eco = ecosystem_with_fixes(&descriptor, dir.path());

        let report = reconcile_environment(
            &[issue(IssueKind::StaleBuild, "")],
            &eco,
            &CancelToken::new(),
        )
        .unwrap();

        assert!(report.is_success);
        assert_eq!(report.fixed.len(), 1);
        assert!(report.failed.is_empty());
        assert!(report.fixed[0].message.contains("Rebuild"));
        assert_eq!(report.message, "Fixed 1 issue(s)");
    }

    #[cfg(unix)]
    #[test]
    fn test_fix_with_failing_verification() {
        let dir = tempfile::tempdir().unwrap();
        let descriptor = descriptor(vec![Fix {
            issue_type: "stale_build".to_string(),
            command: "true".to_string(),
            verify_command: "exit 1".to_string(),
            description: "Rebuild".to_string(),
        }]);
        let eco = ecosystem_with_fixes(&descriptor, dir.path());

        let report = reconcile_environment(
            &[issue(IssueKind::StaleBuild, "")],
            &eco,
            &CancelToken::new(),
        )
        .unwrap();

        assert!(!report.is_success);
        assert_eq!(report.failed.len(), 1);
        assert!(report.failed[0]
            .message
            .contains("verification failed"));
    }

    #[cfg(unix)]
    #[test]
    fn test_unfixable_issue_is_recorded_as_failed() {
        let dir = tempfile::tempdir().unwrap();
        let descriptor = descriptor(Vec::new());
        let eco = ecosystem_with_fixes(&descriptor, dir.path());

        let report = reconcile_environment(
            &[issue(IssueKind::MissingTarget, "")],
            &eco,
            &CancelToken::new(),
        )
        .unwrap();

        assert!(!report.is_success);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(
            report.failed[0].message,
            "No fix available for this issue type"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_issue_fix_command_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let descriptor = descriptor(Vec::new());
        let eco = ecosystem_with_fixes(&descriptor, dir.path());

        let report = reconcile_environment(
            &[issue(IssueKind::StaleBuild, "true")],
            &eco,
            &CancelToken::new(),
        )
        .unwrap();

        assert!(report.is_success);
        assert_eq!(report.fixed.len(), 1);
        assert_eq!(report.fixed[0].command, "true");
    }

    #[cfg(unix)]
    #[test]
    fn test_every_fixable_issue_is_accounted_for() {
        let dir = tempfile::tempdir().unwrap();
        let descriptor = descriptor(vec![Fix {
            issue_type: "stale_build".to_string(),
            command: "true".to_string(),
            verify_command: String::new(),
            description: "Rebuild".to_string(),
        }]);
        let eco = ecosystem_with_fixes(&descriptor, dir.path());

        let issues = vec![
            issue(IssueKind::StaleBuild, ""),
            issue(IssueKind::MissingTarget, ""),
            Issue {
                kind: IssueKind::MissingBuildOutput,
                severity: Severity::Warning,
                message: "not fixable".to_string(),
                fix_available: false,
                fix_command: String::new(),
            },
        ];

        let report = reconcile_environment(&issues, &eco, &CancelToken::new()).unwrap();
        // Two fixable issues, one result each; the unfixable one is skipped.
        assert_eq!(report.fixed.len() + report.failed.len(), 2);
        assert_eq!(report.message, "Fixed 1 issue(s), Failed to fix 1 issue(s)");
    }

    #[cfg(unix)]
    #[test]
    fn test_no_fixable_issues_is_not_a_success() {
        let dir = tempfile::tempdir().unwrap();
        let descriptor = descriptor(Vec::new());
        let eco = ecosystem_with_fixes(&descriptor, dir.path());

        let report = reconcile_environment(&[], &eco, &CancelToken::new()).unwrap();
        assert!(!report.is_success);
        assert!(report.fixed.is_empty() && report.failed.is_empty());
    }
}
