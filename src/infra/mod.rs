//! Infrastructure parity checks.
//!
//! Probes each service a descriptor declares, in declaration order, and
//! optionally folds in the language version check when the descriptor
//! carries a version probe.

use std::time::Duration;

use anyhow::{bail, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::Service;
use crate::detect::DetectedEcosystem;
use crate::utils::{run_shell, CancelToken, RunOutcome};
use crate::version::validate::{validate_version, Suggestion};
use crate::version::{probe_version, VersionInfo};

/// Deadline for each service check command.
const SERVICE_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// Probe result for one declared service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub name: String,
    pub running: bool,
    /// Empty when no extraction regex was configured or it did not match.
    #[serde(default)]
    pub version: String,
    pub healthy: bool,
    pub message: String,
}

/// Language version check folded into an infrastructure report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionCheck {
    pub detected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<VersionInfo>,
    pub is_valid: bool,
    pub issues: Vec<String>,
    pub suggestions: Vec<Suggestion>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfrastructureReport {
    pub ecosystem_id: String,
    pub services: Vec<ServiceStatus>,
    pub is_healthy: bool,
    pub issues: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<VersionCheck>,
}

/// Check every declared service and, when configured, the language version.
pub fn check_infrastructure(
    ecosystem: &DetectedEcosystem<'_>,
    cancel: &CancelToken,
) -> Result<InfrastructureReport> {
    let mut report = InfrastructureReport {
        ecosystem_id: ecosystem.id().to_string(),
        services: Vec::new(),
        is_healthy: true,
        issues: Vec::new(),
        version: None,
    };

    for service in &ecosystem.descriptor.infrastructure.services {
        if cancel.is_cancelled() {
            bail!("operation cancelled");
        }

        let status = check_service(service, ecosystem, cancel)?;
        if !status.healthy {
            report.is_healthy = false;
            report.issues.push(status.message.clone());
        }
        report.services.push(status);
    }

    if ecosystem.descriptor.has_version_probe() {
        let check = run_version_check(ecosystem, cancel)?;
        report.issues.extend(check.issues.iter().cloned());
        report.version = Some(check);
    }

    Ok(report)
}

fn check_service(
    service: &Service,
    ecosystem: &DetectedEcosystem<'_>,
    cancel: &CancelToken,
) -> Result<ServiceStatus> {
    let mut status = ServiceStatus {
        name: service.name.clone(),
        running: false,
        version: String::new(),
        healthy: false,
        message: String::new(),
    };

    let outcome = run_shell(
        &service.check_command,
        &ecosystem.project_root,
        SERVICE_CHECK_TIMEOUT,
        cancel,
    );

    let output = match outcome {
        RunOutcome::Completed { output, exit_code: 0 } => output,
        RunOutcome::Completed { output, exit_code } => {
            status.message = format!(
                "Service check failed: exit code {} ({})",
                exit_code,
                output.trim()
            );
            return Ok(status);
        }
        RunOutcome::TimedOut => {
            status.message = format!("Service check failed: '{}' timed out", service.check_command);
            return Ok(status);
        }
        RunOutcome::Cancelled => bail!("operation cancelled"),
        RunOutcome::SpawnError(e) => {
            status.message = format!("Service check failed: {}", e);
            return Ok(status);
        }
    };

    status.running = true;
    let output = output.trim();

    if !service.version_extract.is_empty() {
        if let Some(version) = extract_version(output, &service.version_extract) {
            status.version = version;
        }
    }

    if output.is_empty() {
        status.message = format!("{} check returned no output", service.name);
    } else {
        status.healthy = true;
        status.message = format!("{} is running", service.name);
        if !status.version.is_empty() {
            status.message.push_str(&format!(" (version: {})", status.version));
        }
    }

    Ok(status)
}

fn extract_version(output: &str, pattern: &str) -> Option<String> {
    let re = Regex::new(pattern).ok()?;
    re.captures(output)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

fn run_version_check(
    ecosystem: &DetectedEcosystem<'_>,
    cancel: &CancelToken,
) -> Result<VersionCheck> {
    let info = match probe_version(
        &ecosystem.descriptor.version,
        &ecosystem.project_root,
        cancel,
    ) {
        Ok(info) => info,
        Err(e) => {
            if cancel.is_cancelled() {
                bail!("operation cancelled");
            }
            return Ok(VersionCheck {
                detected: false,
                info: None,
                is_valid: false,
                issues: Vec::new(),
                suggestions: Vec::new(),
                error: format!("{:#}", e),
            });
        }
    };

    let validation = validate_version(&info, ecosystem.descriptor);
    Ok(VersionCheck {
        detected: true,
        info: Some(info),
        is_valid: validation.is_valid,
        issues: validation.issues.iter().map(|i| i.message.clone()).collect(),
        suggestions: validation.suggestions,
        error: String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EcosystemDescriptor, Infrastructure, Manifest};
    use std::path::Path;

    fn detected<'a>(
        descriptor: &'a EcosystemDescriptor,
        root: &Path,
    ) -> DetectedEcosystem<'a> {
        DetectedEcosystem {
            descriptor,
            project_root: root.to_path_buf(),
            confidence: 1.0,
        }
    }

    fn descriptor_with_services(services: Vec<Service>) -> EcosystemDescriptor {
        EcosystemDescriptor {
            id: "svc-test".to_string(),
            manifest: Manifest {
                primary_file: "manifest.txt".to_string(),
                ..Default::default()
            },
            infrastructure: Infrastructure { services },
            ..Default::default()
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_running_service_with_version() {
        let dir = tempfile::tempdir().unwrap();
        let descriptor = descriptor_with_services(vec![Service {
            name: "postgres".to_string(),
            check_command: "echo 'PostgreSQL 16.2 on x86_64'".to_string(),
            version_extract: r"PostgreSQL (\S+)".to_string(),
        }]);

        let eco = detected(&descriptor, dir.path());
        let report = check_infrastructure(&eco, &CancelToken::new()).unwrap();

        assert!(report.is_healthy);
        assert_eq!(report.services.len(), 1);
        let status = &report.services[0];
        assert!(status.running && status.healthy);
        assert_eq!(status.version, "16.2");
        assert!(status.message.contains("postgres is running"));
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_service_check() {
        let dir = tempfile::tempdir().unwrap();
        let descriptor = descriptor_with_services(vec![Service {
            name: "redis".to_string(),
            check_command: "exit 1".to_string(),
            version_extract: String::new(),
        }]);

        let eco = detected(&descriptor, dir.path());
        let report = check_infrastructure(&eco, &CancelToken::new()).unwrap();

        assert!(!report.is_healthy);
        assert!(!report.services[0].running);
        assert_eq!(report.issues.len(), 1);
        assert!(report.issues[0].contains("Service check failed"));
    }

    #[cfg(unix)]
    #[test]
    fn test_silent_service_is_unhealthy() {
        let dir = tempfile::tempdir().unwrap();
        let descriptor = descriptor_with_services(vec![Service {
            name: "quiet".to_string(),
            check_command: "true".to_string(),
            version_extract: String::new(),
        }]);

        let eco = detected(&descriptor, dir.path());
        let report = check_infrastructure(&eco, &CancelToken::new()).unwrap();

        let status = &report.services[0];
        assert!(status.running);
        assert!(!status.healthy);
        assert!(status.message.contains("returned no output"));
    }

    #[cfg(unix)]
    #[test]
    fn test_version_check_merged_into_report() {
        use crate::config::{Requirements, VersionSection};

        let dir = tempfile::tempdir().unwrap();
        let mut descriptor = descriptor_with_services(Vec::new());
        descriptor.version = VersionSection {
            language: "java".to_string(),
            version_command: r#"echo 'openjdk version "8.0.352"'"#.to_string(),
            version_pattern: r#"openjdk version "([^"]+)""#.to_string(),
            ..Default::default()
        };
        descriptor.requirements = Requirements {
            min_version: "11".to_string(),
            ..Default::default()
        };

        let eco = detected(&descriptor, dir.path());
        let report = check_infrastructure(&eco, &CancelToken::new()).unwrap();

        let version = report.version.as_ref().unwrap();
        assert!(version.detected);
        assert!(!version.is_valid);
        assert!(report.issues.iter().any(|i| i.contains("below minimum")));
    }
}
