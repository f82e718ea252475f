//! Ecosystem descriptor schema.
//!
//! Descriptors are declarative YAML documents describing one language or
//! tool ecosystem: how to detect it, which file anchors freshness checks,
//! how to probe versions and services, and which remediation commands fix
//! which issue kinds. All language-specific knowledge lives here; the engine
//! code stays language-agnostic.

pub mod loader;

use serde::{Deserialize, Serialize};

/// Top-level document: every descriptor file nests its content under an
/// `ecosystem` key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DescriptorFile {
    #[serde(default)]
    pub ecosystem: EcosystemDescriptor,
}

/// One ecosystem (language/toolchain profile). Immutable after load.
///
/// Unknown keys in the YAML are ignored so descriptor files can evolve
/// ahead of the engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EcosystemDescriptor {
    /// Unique identifier, e.g. `java-maven`. Required.
    #[serde(default)]
    pub id: String,

    /// Human-readable name.
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub detection: Detection,

    #[serde(default)]
    pub manifest: Manifest,

    #[serde(default)]
    pub cache: CacheSection,

    #[serde(default)]
    pub build: BuildSection,

    #[serde(default)]
    pub verification: Verification,

    #[serde(default)]
    pub version: VersionSection,

    #[serde(default)]
    pub requirements: Requirements,

    #[serde(default)]
    pub infrastructure: Infrastructure,

    #[serde(default)]
    pub environment: Environment,

    #[serde(default)]
    pub reconciliation: Reconciliation,
}

impl EcosystemDescriptor {
    /// Look up the recorded fix for an issue kind.
    pub fn fix_for(&self, issue_kind: &str) -> Option<&Fix> {
        self.reconciliation
            .fixes
            .iter()
            .find(|f| f.issue_type == issue_kind)
    }

    /// Whether this descriptor declares a version probe.
    pub fn has_version_probe(&self) -> bool {
        !self.version.version_command.is_empty()
    }
}

/// How to recognise this ecosystem in a project tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Detection {
    /// All of these must exist for the descriptor to match.
    #[serde(default)]
    pub required_files: Vec<String>,

    /// Each present file raises confidence.
    #[serde(default)]
    pub optional_files: Vec<String>,

    /// Each present directory raises confidence. May contain `${ENV}`.
    #[serde(default)]
    pub directory_patterns: Vec<String>,
}

/// The source-of-truth file whose mtime anchors freshness comparisons.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    /// Required.
    #[serde(default)]
    pub primary_file: String,

    #[serde(default)]
    pub location: String,

    #[serde(default)]
    pub format: String,
}

/// Dependency cache locations, in priority order. May contain `${ENV}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheSection {
    #[serde(default)]
    pub locations: Vec<String>,
}

/// Build output locations and the command that regenerates them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildSection {
    #[serde(default)]
    pub output_directories: Vec<String>,

    #[serde(default)]
    pub artifact_patterns: Vec<String>,

    #[serde(default)]
    pub clean_command: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Verification {
    #[serde(default)]
    pub build_freshness: BuildFreshness,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildFreshness {
    /// Checks evaluated in declaration order.
    #[serde(default)]
    pub commands: Vec<FreshnessCheck>,
}

/// Kind tag of a freshness check. Only `timestamp_compare` is evaluated;
/// the other declared kinds are reserved and treated as no-ops, as is any
/// tag this engine does not know.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    TimestampCompare,
    Command,
    FileExists,
    VersionCheck,
    #[default]
    #[serde(other)]
    Unknown,
}

/// One freshness check record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FreshnessCheck {
    #[serde(default)]
    pub name: String,

    #[serde(rename = "type", default)]
    pub kind: CheckKind,

    /// Path relative to the project root. May contain `${ENV}`.
    #[serde(default)]
    pub source: String,

    /// Single comparison target, relative to the project root.
    #[serde(default)]
    pub target: String,

    /// Glob of comparison targets; the newest match is compared.
    #[serde(default)]
    pub target_pattern: String,

    #[serde(default)]
    pub description: String,
}

/// Version probing configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VersionSection {
    #[serde(default)]
    pub language: String,

    /// Shell command whose output carries the version string.
    #[serde(default)]
    pub version_command: String,

    /// Regex with capture group 1 = full version.
    #[serde(default)]
    pub version_pattern: String,

    /// Optional regex with capture group 1 = runtime name.
    #[serde(default)]
    pub runtime_pattern: String,

    #[serde(default)]
    pub version_managers: Vec<VersionManager>,

    #[serde(default)]
    pub runtime_variants: Vec<RuntimeVariant>,
}

/// An external tool that installs and switches language versions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VersionManager {
    #[serde(default)]
    pub name: String,

    /// Exits 0 when the manager is active.
    #[serde(default)]
    pub check_command: String,

    /// Template with a `{version}` placeholder.
    #[serde(default)]
    pub install_command: String,

    /// Template with a `{version}` placeholder.
    #[serde(default)]
    pub switch_command: String,
}

/// A specific distribution of a language runtime (e.g. Temurin vs Oracle).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeVariant {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub provider: String,

    /// Regex that identifies this variant in the probe output.
    #[serde(default)]
    pub pattern: String,
}

/// Version requirements checked against the probed version.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Requirements {
    #[serde(default)]
    pub min_version: String,

    #[serde(default)]
    pub max_version: String,

    #[serde(default)]
    pub preferred_versions: Vec<String>,

    /// Exact versions or major prefixes that must not be used.
    #[serde(default)]
    pub excluded_versions: Vec<String>,

    #[serde(default)]
    pub preferred_runtimes: Vec<String>,

    #[serde(default)]
    pub excluded_runtimes: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Infrastructure {
    /// Services checked in declaration order.
    #[serde(default)]
    pub services: Vec<Service>,
}

/// A runtime service this ecosystem depends on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Service {
    #[serde(default)]
    pub name: String,

    /// Shell command; exit 0 with output means the service is up.
    #[serde(default)]
    pub check_command: String,

    /// Optional regex with capture group 1 = service version.
    #[serde(default)]
    pub version_extract: String,
}

/// Environment-variable audit configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Environment {
    /// Regexes with capture group 1 = variable name.
    #[serde(default)]
    pub variable_patterns: Vec<String>,

    /// Globs of files that declare variables (`.env` format).
    #[serde(default)]
    pub config_files: Vec<String>,

    /// Variables the descriptor author declares as always required.
    #[serde(default)]
    pub required_vars: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Reconciliation {
    #[serde(default)]
    pub fixes: Vec<Fix>,
}

/// A recorded remediation for one issue kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fix {
    /// Issue kind this fix applies to, e.g. `stale_build`.
    #[serde(default)]
    pub issue_type: String,

    #[serde(default)]
    pub command: String,

    /// Optional command that confirms the fix worked.
    #[serde(default)]
    pub verify_command: String,

    #[serde(default)]
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_descriptor() {
        let yaml = r#"
ecosystem:
  id: java-maven
  name: Java (Maven)
  manifest:
    primary_file: pom.xml
"#;
        let file: DescriptorFile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(file.ecosystem.id, "java-maven");
        assert_eq!(file.ecosystem.manifest.primary_file, "pom.xml");
        assert!(file.ecosystem.detection.required_files.is_empty());
    }

    #[test]
    fn test_parse_check_kinds() {
        let yaml = r#"
ecosystem:
  id: demo
  manifest:
    primary_file: demo.toml
  verification:
    build_freshness:
      commands:
        - name: compiled
          type: timestamp_compare
          source: demo.toml
          target: out/demo.bin
        - name: reserved
          type: file_exists
          source: out/demo.bin
        - name: future
          type: quantum_compare
          source: demo.toml
"#;
        let file: DescriptorFile = serde_yaml::from_str(yaml).unwrap();
        let checks = &file.ecosystem.verification.build_freshness.commands;
        assert_eq!(checks[0].kind, CheckKind::TimestampCompare);
        assert_eq!(checks[1].kind, CheckKind::FileExists);
        assert_eq!(checks[2].kind, CheckKind::Unknown);
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let yaml = r#"
ecosystem:
  id: demo
  manifest:
    primary_file: demo.toml
  future_section:
    anything: goes
"#;
        let file: DescriptorFile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(file.ecosystem.id, "demo");
    }

    #[test]
    fn test_fix_lookup() {
        let yaml = r#"
ecosystem:
  id: demo
  manifest:
    primary_file: demo.toml
  reconciliation:
    fixes:
      - issue_type: stale_build
        command: make build
        description: Rebuild
"#;
        let file: DescriptorFile = serde_yaml::from_str(yaml).unwrap();
        let eco = file.ecosystem;
        assert_eq!(eco.fix_for("stale_build").unwrap().command, "make build");
        assert!(eco.fix_for("missing_env_var").is_none());
    }
}
