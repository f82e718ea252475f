//! Ecosystem detection.
//!
//! A descriptor matches a project when all of its required files exist and
//! the weighted confidence reaches 0.5. Required files are a binary gate;
//! optional files and directory patterns only disambiguate overlapping
//! ecosystems, so their boosts are small and the total is clamped to 1.0.

use std::path::Path;

use crate::config::EcosystemDescriptor;
use crate::utils::fs::{dir_exists, expand_env, path_exists};

/// Weight of the optional-files boost.
const OPTIONAL_WEIGHT: f64 = 0.2;
/// Weight of the directory-pattern boost.
const PATTERN_WEIGHT: f64 = 0.1;
/// Minimum confidence for a descriptor to count as matched.
const MATCH_THRESHOLD: f64 = 0.5;

/// A descriptor matched against one project root.
#[derive(Debug, Clone)]
pub struct DetectedEcosystem<'a> {
    pub descriptor: &'a EcosystemDescriptor,
    pub project_root: std::path::PathBuf,
    pub confidence: f64,
}

impl DetectedEcosystem<'_> {
    pub fn id(&self) -> &str {
        &self.descriptor.id
    }
}

/// Score every descriptor against `project_root` and return the matches in
/// registry order.
pub fn detect_ecosystems<'a>(
    project_root: &Path,
    descriptors: &'a [EcosystemDescriptor],
) -> Vec<DetectedEcosystem<'a>> {
    let mut detected = Vec::new();

    for descriptor in descriptors {
        if let Some(confidence) = score(project_root, descriptor) {
            detected.push(DetectedEcosystem {
                descriptor,
                project_root: project_root.to_path_buf(),
                confidence,
            });
        }
    }

    detected
}

/// Confidence for one descriptor, or `None` when it does not match.
fn score(project_root: &Path, descriptor: &EcosystemDescriptor) -> Option<f64> {
    let detection = &descriptor.detection;

    let required_present = detection
        .required_files
        .iter()
        .filter(|f| path_exists(&project_root.join(f.as_str())))
        .count();

    // All required files must be present.
    if !detection.required_files.is_empty() && required_present < detection.required_files.len() {
        return None;
    }

    let mut confidence = 1.0;
    if !detection.required_files.is_empty() {
        confidence = required_present as f64 / detection.required_files.len() as f64;
    }

    if !detection.optional_files.is_empty() {
        let present = detection
            .optional_files
            .iter()
            .filter(|f| path_exists(&project_root.join(f.as_str())))
            .count();
        confidence += present as f64 / detection.optional_files.len() as f64 * OPTIONAL_WEIGHT;
        confidence = confidence.min(1.0);
    }

    if !detection.directory_patterns.is_empty() {
        let present = detection
            .directory_patterns
            .iter()
            .filter(|p| dir_exists(&project_root.join(expand_env(p))))
            .count();
        confidence += present as f64 / detection.directory_patterns.len() as f64 * PATTERN_WEIGHT;
        confidence = confidence.min(1.0);
    }

    (confidence >= MATCH_THRESHOLD).then_some(confidence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Detection, Manifest};

    fn descriptor(required: &[&str], optional: &[&str], patterns: &[&str]) -> EcosystemDescriptor {
        EcosystemDescriptor {
            id: "test".to_string(),
            manifest: Manifest {
                primary_file: "manifest.txt".to_string(),
                ..Default::default()
            },
            detection: Detection {
                required_files: required.iter().map(|s| s.to_string()).collect(),
                optional_files: optional.iter().map(|s| s.to_string()).collect(),
                directory_patterns: patterns.iter().map(|s| s.to_string()).collect(),
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_required_file_never_matches() {
        let dir = tempfile::tempdir().unwrap();
        let descriptors = vec![descriptor(&["pom.xml"], &["mvnw"], &[])];

        // Optional files alone cannot rescue a failed required gate.
        std::fs::write(dir.path().join("mvnw"), "").unwrap();
        let detected = detect_ecosystems(dir.path(), &descriptors);
        assert!(detected.is_empty());
    }

    #[test]
    fn test_required_file_gives_full_confidence() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("pom.xml"), "<project/>").unwrap();

        let descriptors = vec![descriptor(&["pom.xml"], &[], &[])];
        let detected = detect_ecosystems(dir.path(), &descriptors);
        assert_eq!(detected.len(), 1);
        assert_eq!(detected[0].confidence, 1.0);
    }

    #[test]
    fn test_optional_boost_is_clamped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("pom.xml"), "<project/>").unwrap();
        std::fs::write(dir.path().join("mvnw"), "").unwrap();

        let descriptors = vec![descriptor(&["pom.xml"], &["mvnw"], &[])];
        let detected = detect_ecosystems(dir.path(), &descriptors);
        assert_eq!(detected[0].confidence, 1.0);
    }

    #[test]
    fn test_adding_signals_never_lowers_confidence() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("pom.xml"), "<project/>").unwrap();

        let descriptors = vec![descriptor(&["pom.xml"], &["mvnw", "mvnw.cmd"], &["src"])];
        let before = detect_ecosystems(dir.path(), &descriptors)[0].confidence;

        std::fs::write(dir.path().join("mvnw"), "").unwrap();
        std::fs::create_dir(dir.path().join("src")).unwrap();
        let after = detect_ecosystems(dir.path(), &descriptors)[0].confidence;

        assert!(after >= before);
    }

    #[test]
    fn test_directory_pattern_expands_env() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("go.mod"), "module x").unwrap();
        std::fs::create_dir(dir.path().join("vendor")).unwrap();
        std::env::set_var("SENTRA_TEST_VENDOR_DIR", "vendor");

        let descriptors = vec![descriptor(&["go.mod"], &[], &["${SENTRA_TEST_VENDOR_DIR}"])];
        let detected = detect_ecosystems(dir.path(), &descriptors);
        assert_eq!(detected.len(), 1);
        assert_eq!(detected[0].confidence, 1.0);
    }

    #[test]
    fn test_pattern_only_descriptor_matches_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("gradle")).unwrap();

        let descriptors = vec![descriptor(&[], &[], &["gradle"])];
        let detected = detect_ecosystems(dir.path(), &descriptors);
        assert_eq!(detected.len(), 1);
        assert_eq!(detected[0].confidence, 1.0);
    }
}
