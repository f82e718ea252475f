//! Descriptor discovery and loading.
//!
//! Discovery is tolerant by design: descriptors are hand-authored YAML and a
//! single bad file must not block startup. Files that fail to parse or
//! validate are logged and skipped; duplicate ids keep the first occurrence.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use log::{debug, warn};
use walkdir::WalkDir;

use super::{DescriptorFile, EcosystemDescriptor};

/// Load and validate a single descriptor file.
pub fn load_descriptor(path: &Path) -> Result<EcosystemDescriptor> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read descriptor {}", path.display()))?;

    let file: DescriptorFile = serde_yaml::from_str(&content)
        .with_context(|| format!("cannot parse descriptor {}", path.display()))?;

    validate(&file.ecosystem)
        .with_context(|| format!("invalid descriptor {}", path.display()))?;

    Ok(file.ecosystem)
}

/// Discover all descriptors under `base`.
///
/// Layouts, newest first:
/// 1. `{base}/config/languages/**` and `{base}/config/infrastructure/**`
/// 2. `{base}/language-configs/*` (flat) and `{base}/tool-configs/**`
/// 3. YAML files directly in `{base}`
pub fn discover_descriptors(base: &Path) -> Result<Vec<EcosystemDescriptor>> {
    if !base.is_dir() {
        bail!("descriptor directory not found: {}", base.display());
    }

    let config_root = base.join("config");
    let legacy_languages = base.join("language-configs");
    let legacy_tools = base.join("tool-configs");

    let mut files = Vec::new();
    if config_root.is_dir() {
        collect_yaml_files(&config_root.join("languages"), true, &mut files);
        collect_yaml_files(&config_root.join("infrastructure"), true, &mut files);
    } else if legacy_languages.is_dir() || legacy_tools.is_dir() {
        collect_yaml_files(&legacy_languages, false, &mut files);
        collect_yaml_files(&legacy_tools, true, &mut files);
    } else {
        collect_yaml_files(base, false, &mut files);
    }

    let mut descriptors: Vec<EcosystemDescriptor> = Vec::new();
    for path in files {
        let descriptor = match load_descriptor(&path) {
            Ok(d) => d,
            Err(e) => {
                warn!("skipping {}: {:#}", path.display(), e);
                continue;
            }
        };

        if descriptors.iter().any(|d| d.id == descriptor.id) {
            warn!(
                "skipping {}: duplicate ecosystem id '{}'",
                path.display(),
                descriptor.id
            );
            continue;
        }

        debug!("loaded ecosystem '{}' from {}", descriptor.id, path.display());
        descriptors.push(descriptor);
    }

    Ok(descriptors)
}

/// Resolve the descriptor base directory for the host binaries.
///
/// Order: `SENTRA_CONFIG_DIR`, then a `config/` directory next to (or one
/// level above) the executable, then the current working directory.
pub fn default_config_base() -> PathBuf {
    if let Ok(dir) = std::env::var("SENTRA_CONFIG_DIR") {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(exe_dir) = exe.parent() {
            if exe_dir.join("config").is_dir() {
                return exe_dir.to_path_buf();
            }
            let parent = exe_dir.join("..");
            if parent.join("config").is_dir() {
                return parent;
            }
        }
    }

    PathBuf::from(".")
}

fn validate(descriptor: &EcosystemDescriptor) -> Result<()> {
    if descriptor.id.is_empty() {
        bail!("ecosystem.id is required");
    }
    if descriptor.manifest.primary_file.is_empty() {
        bail!("ecosystem.manifest.primary_file is required");
    }
    Ok(())
}

fn collect_yaml_files(dir: &Path, recursive: bool, out: &mut Vec<PathBuf>) {
    if !dir.is_dir() {
        return;
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let walker = WalkDir::new(dir)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok());

    for entry in walker {
        if entry.file_type().is_file() && is_yaml_file(entry.path()) {
            out.push(entry.into_path());
        }
    }
}

fn is_yaml_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            e == "yaml" || e == "yml"
        })
        .unwrap_or(false)
}
