//! Version requirement validation and fix suggestions.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::VersionInfo;
use crate::config::EcosystemDescriptor;
use crate::verify::{IssueKind, Severity};

/// A version or runtime compatibility problem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub kind: IssueKind,
    pub severity: Severity,
    pub message: String,
    pub current: String,
    pub required: String,
}

/// An actionable remediation for validation issues.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    pub kind: String,
    pub description: String,
    /// Candidate versions (or runtime names) that would satisfy the
    /// requirements.
    pub versions: Vec<String>,
    /// Concrete shell commands, present when a version manager was detected.
    pub commands: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub issues: Vec<ValidationIssue>,
    pub suggestions: Vec<Suggestion>,
}

/// Validate a probed version against the descriptor's requirements.
pub fn validate_version(info: &VersionInfo, descriptor: &EcosystemDescriptor) -> ValidationResult {
    let req = &descriptor.requirements;
    let mut result = ValidationResult {
        is_valid: true,
        issues: Vec::new(),
        suggestions: Vec::new(),
    };

    if !req.min_version.is_empty() && compare_versions(&info.version, &req.min_version) == Ordering::Less {
        result.is_valid = false;
        result.issues.push(ValidationIssue {
            kind: IssueKind::VersionTooOld,
            severity: Severity::Error,
            message: format!(
                "Version {} is below minimum required {}",
                info.version, req.min_version
            ),
            current: info.version.clone(),
            required: req.min_version.clone(),
        });
    }

    if !req.max_version.is_empty()
        && compare_versions(&info.version, &req.max_version) == Ordering::Greater
    {
        result.is_valid = false;
        result.issues.push(ValidationIssue {
            kind: IssueKind::VersionTooNew,
            severity: Severity::Error,
            message: format!(
                "Version {} exceeds maximum allowed {}",
                info.version, req.max_version
            ),
            current: info.version.clone(),
            required: req.max_version.clone(),
        });
    }

    for excluded in &req.excluded_versions {
        // An entry matches exactly or as a major prefix ("8" excludes 8.x.y).
        if info.version == *excluded || info.version.starts_with(&format!("{}.", excluded)) {
            result.is_valid = false;
            result.issues.push(ValidationIssue {
                kind: IssueKind::VersionExcluded,
                severity: Severity::Error,
                message: format!("Version {} is excluded", info.version),
                current: info.version.clone(),
                required: "different version".to_string(),
            });
        }
    }

    if let Some(variant) = &info.runtime_variant {
        for excluded in &req.excluded_runtimes {
            if variant.name == *excluded || variant.provider == *excluded {
                result.is_valid = false;
                result.issues.push(ValidationIssue {
                    kind: IssueKind::RuntimeExcluded,
                    severity: Severity::Warning,
                    message: format!("Runtime {} is not recommended", variant.full_name),
                    current: variant.full_name.clone(),
                    required: "different runtime".to_string(),
                });
            }
        }

        if !req.preferred_runtimes.is_empty() {
            let preferred = req
                .preferred_runtimes
                .iter()
                .any(|p| variant.name == *p || variant.provider == *p);
            if !preferred {
                result.issues.push(ValidationIssue {
                    kind: IssueKind::RuntimeNotPreferred,
                    severity: Severity::Warning,
                    message: format!("Runtime {} is not in preferred list", variant.full_name),
                    current: variant.full_name.clone(),
                    required: req.preferred_runtimes.join(" or "),
                });
            }
        }
    }

    if !result.is_valid {
        result.suggestions = build_suggestions(info, descriptor, &result.issues);
    }

    result
}

/// Compare two dotted version strings numerically, component by component.
/// The shorter version is padded with zeros; non-numeric components count
/// as zero. Accepts un-normalized inputs such as `17` vs `17.0.0`.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let parts_a: Vec<i64> = a.split('.').map(numeric_part).collect();
    let parts_b: Vec<i64> = b.split('.').map(numeric_part).collect();

    let len = parts_a.len().max(parts_b.len());
    for i in 0..len {
        let pa = parts_a.get(i).copied().unwrap_or(0);
        let pb = parts_b.get(i).copied().unwrap_or(0);
        match pa.cmp(&pb) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

fn numeric_part(s: &str) -> i64 {
    s.trim().parse().unwrap_or(0)
}

fn build_suggestions(
    info: &VersionInfo,
    descriptor: &EcosystemDescriptor,
    issues: &[ValidationIssue],
) -> Vec<Suggestion> {
    let req = &descriptor.requirements;

    let manager = info.version_manager.as_ref().and_then(|name| {
        descriptor
            .version
            .version_managers
            .iter()
            .find(|m| m.name == *name)
    });

    let mut suggestions = Vec::new();
    for issue in issues {
        match issue.kind {
            IssueKind::VersionTooOld | IssueKind::VersionTooNew | IssueKind::VersionExcluded => {
                let versions = if !req.preferred_versions.is_empty() {
                    req.preferred_versions.clone()
                } else {
                    [&req.min_version, &req.max_version]
                        .into_iter()
                        .filter(|v| !v.is_empty())
                        .cloned()
                        .collect()
                };

                let mut commands = Vec::new();
                if let Some(manager) = manager {
                    for version in &versions {
                        if !manager.install_command.is_empty() {
                            commands.push(manager.install_command.replace("{version}", version));
                        }
                        if !manager.switch_command.is_empty() {
                            commands.push(manager.switch_command.replace("{version}", version));
                        }
                    }
                }

                suggestions.push(Suggestion {
                    kind: "switch_version".to_string(),
                    description: format!(
                        "Switch to a compatible version (required: {})",
                        issue.required
                    ),
                    versions,
                    commands,
                });
            }
            IssueKind::RuntimeExcluded | IssueKind::RuntimeNotPreferred => {
                suggestions.push(Suggestion {
                    kind: "switch_runtime".to_string(),
                    description: format!("Switch to a preferred runtime: {}", issue.required),
                    versions: req.preferred_runtimes.clone(),
                    commands: Vec::new(),
                });
            }
            _ => {}
        }
    }

    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Requirements, VersionManager, VersionSection};
    use crate::version::RuntimeVariantInfo;

    fn info(version: &str) -> VersionInfo {
        VersionInfo {
            language: "java".to_string(),
            full_version: version.to_string(),
            version: version.to_string(),
            major: version.split('.').next().unwrap_or("0").to_string(),
            minor: "0".to_string(),
            patch: "0".to_string(),
            runtime_variant: None,
            version_manager: None,
        }
    }

    fn descriptor_with(req: Requirements) -> EcosystemDescriptor {
        EcosystemDescriptor {
            id: "test".to_string(),
            requirements: req,
            ..Default::default()
        }
    }

    #[test]
    fn test_compare_versions_is_antisymmetric() {
        let pairs = [
            ("1.0.0", "2.0.0"),
            ("17", "17.0.0"),
            ("8.0.352", "11"),
            ("1.22.0", "1.9.9"),
            ("3.10", "3.10.1"),
        ];
        for (a, b) in pairs {
            assert_eq!(compare_versions(a, b), compare_versions(b, a).reverse());
            assert_eq!(compare_versions(a, a), Ordering::Equal);
        }
    }

    #[test]
    fn test_compare_versions_pads_with_zeros() {
        assert_eq!(compare_versions("17", "17.0.0"), Ordering::Equal);
        assert_eq!(compare_versions("17.1", "17.0.9"), Ordering::Greater);
        assert_eq!(compare_versions("2.9", "2.10"), Ordering::Less);
    }

    #[test]
    fn test_min_version_violation() {
        let descriptor = descriptor_with(Requirements {
            min_version: "11".to_string(),
            ..Default::default()
        });

        let result = validate_version(&info("8.0.352"), &descriptor);
        assert!(!result.is_valid);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].kind, IssueKind::VersionTooOld);
        assert_eq!(result.issues[0].current, "8.0.352");
    }

    #[test]
    fn test_max_version_violation() {
        let descriptor = descriptor_with(Requirements {
            max_version: "20".to_string(),
            ..Default::default()
        });

        let result = validate_version(&info("21.0.1"), &descriptor);
        assert!(!result.is_valid);
        assert_eq!(result.issues[0].kind, IssueKind::VersionTooNew);
    }

    #[test]
    fn test_excluded_version_matches_major_prefix() {
        let descriptor = descriptor_with(Requirements {
            excluded_versions: vec!["8".to_string()],
            ..Default::default()
        });

        let result = validate_version(&info("8.0.352"), &descriptor);
        assert!(!result.is_valid);
        assert_eq!(result.issues[0].kind, IssueKind::VersionExcluded);

        // 18.x must not be caught by the "8" prefix.
        let result = validate_version(&info("18.0.0"), &descriptor);
        assert!(result.is_valid);
    }

    #[test]
    fn test_runtime_checks_apply_only_with_variant() {
        let descriptor = descriptor_with(Requirements {
            preferred_runtimes: vec!["Temurin".to_string()],
            excluded_runtimes: vec!["Oracle JDK".to_string()],
            ..Default::default()
        });

        // No variant detected: runtime requirements are skipped.
        let result = validate_version(&info("17.0.0"), &descriptor);
        assert!(result.issues.is_empty());

        let mut with_variant = info("17.0.0");
        with_variant.runtime_variant = Some(RuntimeVariantInfo {
            name: "Oracle JDK".to_string(),
            provider: "Oracle".to_string(),
            full_name: "Oracle JDK (Oracle)".to_string(),
        });
        let result = validate_version(&with_variant, &descriptor);
        assert!(!result.is_valid);
        let kinds: Vec<IssueKind> = result.issues.iter().map(|i| i.kind).collect();
        assert!(kinds.contains(&IssueKind::RuntimeExcluded));
        assert!(kinds.contains(&IssueKind::RuntimeNotPreferred));
    }

    #[test]
    fn test_suggestions_expand_manager_templates() {
        let descriptor = EcosystemDescriptor {
            id: "java-maven".to_string(),
            version: VersionSection {
                version_managers: vec![VersionManager {
                    name: "sdkman".to_string(),
                    check_command: "sdk version".to_string(),
                    install_command: "sdk install java {version}".to_string(),
                    switch_command: "sdk use java {version}".to_string(),
                }],
                ..Default::default()
            },
            requirements: Requirements {
                min_version: "11".to_string(),
                preferred_versions: vec!["17".to_string(), "21".to_string()],
                ..Default::default()
            },
            ..Default::default()
        };

        let mut probed = info("8.0.352");
        probed.version_manager = Some("sdkman".to_string());

        let result = validate_version(&probed, &descriptor);
        assert!(!result.is_valid);
        let suggestion = &result.suggestions[0];
        assert_eq!(suggestion.versions, vec!["17", "21"]);
        assert!(suggestion
            .commands
            .contains(&"sdk install java 17".to_string()));
        assert!(suggestion.commands.contains(&"sdk use java 21".to_string()));
    }

    #[test]
    fn test_suggestions_fall_back_to_version_range() {
        let descriptor = descriptor_with(Requirements {
            min_version: "11".to_string(),
            max_version: "21".to_string(),
            ..Default::default()
        });

        let result = validate_version(&info("8.0.352"), &descriptor);
        assert_eq!(result.suggestions[0].versions, vec!["11", "21"]);
        assert!(result.suggestions[0].commands.is_empty());
    }
}
