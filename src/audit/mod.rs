//! Environment-variable auditing.
//!
//! Scans source files for environment variable references using the
//! descriptor's regexes, then cross-checks the referenced names against the
//! process environment and against variables declared in `.env`-style
//! config files. The auditor only reads the environment, never writes it.

use std::path::Path;

use anyhow::{bail, Result};
use log::warn;
use regex::Regex;
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::detect::DetectedEcosystem;
use crate::utils::fs::{expand_env, glob_files};
use crate::utils::CancelToken;

/// Source file extensions the scanner looks at.
const SOURCE_EXTENSIONS: &[&str] = &[
    "go", "java", "js", "ts", "jsx", "tsx", "py", "cpp", "c", "h", "cs",
];

/// Directory names skipped wherever they appear below the project root.
const SKIP_DIRS: &[&str] = &["node_modules", ".git", "target", "build"];

/// One occurrence of an environment variable in source code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvVarReference {
    pub name: String,
    /// Path relative to the project root.
    pub file: String,
    /// 1-based line number.
    pub line: usize,
    /// The regex that matched.
    pub pattern: String,
    pub is_set: bool,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvVarReport {
    pub ecosystem_id: String,
    pub references: Vec<EnvVarReference>,
    /// Deduplicated names that are referenced or declared but not set.
    pub missing: Vec<String>,
    pub is_healthy: bool,
    pub issues: Vec<String>,
}

/// Audit environment variables for a detected ecosystem.
pub fn audit_environment(
    ecosystem: &DetectedEcosystem<'_>,
    cancel: &CancelToken,
) -> Result<EnvVarReport> {
    let mut report = EnvVarReport {
        ecosystem_id: ecosystem.id().to_string(),
        references: Vec::new(),
        missing: Vec::new(),
        is_healthy: true,
        issues: Vec::new(),
    };

    let patterns = compile_patterns(&ecosystem.descriptor.environment.variable_patterns);
    let mut references = scan_references(&ecosystem.project_root, &patterns, cancel)?;

    for reference in &mut references {
        match std::env::var(&reference.name) {
            Ok(value) => {
                reference.is_set = true;
                reference.value = value;
            }
            Err(_) => {
                if !report.missing.contains(&reference.name) {
                    report.missing.push(reference.name.clone());
                }
            }
        }
    }
    for name in &report.missing {
        report
            .issues
            .push(format!("Missing environment variable: {}", name));
    }
    report.references = references;

    for name in declared_variables(
        &ecosystem.project_root,
        &ecosystem.descriptor.environment.config_files,
    ) {
        if std::env::var(&name).is_err() && !report.missing.contains(&name) {
            report
                .issues
                .push(format!("Variable {} declared in config but not set", name));
            report.missing.push(name);
        }
    }

    report.is_healthy = report.missing.is_empty();
    Ok(report)
}

fn compile_patterns(patterns: &[String]) -> Vec<(String, Regex)> {
    let mut compiled = Vec::new();
    for pattern in patterns {
        match Regex::new(pattern) {
            Ok(re) => compiled.push((pattern.clone(), re)),
            Err(e) => warn!("skipping invalid variable pattern '{}': {}", pattern, e),
        }
    }
    compiled
}

fn scan_references(
    project_root: &Path,
    patterns: &[(String, Regex)],
    cancel: &CancelToken,
) -> Result<Vec<EnvVarReference>> {
    let mut references = Vec::new();

    let walker = WalkDir::new(project_root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || entry
                    .file_name()
                    .to_str()
                    .map(|name| !SKIP_DIRS.contains(&name))
                    .unwrap_or(true)
        });

    for entry in walker {
        if cancel.is_cancelled() {
            bail!("operation cancelled");
        }

        let Ok(entry) = entry else {
            continue;
        };
        if !entry.file_type().is_file() || !is_source_file(entry.path()) {
            continue;
        }

        // Unreadable files (permissions, binary junk) are silently skipped.
        let Ok(content) = std::fs::read_to_string(entry.path()) else {
            continue;
        };

        let shown = entry
            .path()
            .strip_prefix(project_root)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .into_owned();

        for (line_idx, line) in content.lines().enumerate() {
            for (pattern, re) in patterns {
                for captures in re.captures_iter(line) {
                    if let Some(name) = captures.get(1) {
                        references.push(EnvVarReference {
                            name: name.as_str().to_string(),
                            file: shown.clone(),
                            line: line_idx + 1,
                            pattern: pattern.clone(),
                            is_set: false,
                            value: String::new(),
                        });
                    }
                }
            }
        }
    }

    Ok(references)
}

fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SOURCE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Variable names declared by the ecosystem's config files (`.env` format
/// is the only declared-variables format).
fn declared_variables(project_root: &Path, config_globs: &[String]) -> Vec<String> {
    let mut names = Vec::new();

    for pattern in config_globs {
        let full = project_root.join(expand_env(pattern));
        let matches = match glob_files(&full.to_string_lossy()) {
            Ok(m) => m,
            Err(e) => {
                warn!("skipping config file pattern '{}': {:#}", pattern, e);
                continue;
            }
        };

        for path in matches {
            if !is_env_file(&path) {
                continue;
            }
            let Ok(content) = std::fs::read_to_string(&path) else {
                continue;
            };
            for key in parse_env_file(&content) {
                if !names.contains(&key) {
                    names.push(key);
                }
            }
        }
    }

    names
}

fn is_env_file(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("env")
        || path.to_string_lossy().contains(".env")
}

/// Parse `KEY=VALUE` lines, skipping blanks and `#` comments.
fn parse_env_file(content: &str) -> Vec<String> {
    let mut keys = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(idx) = line.find('=') {
            let key = line[..idx].trim();
            if !key.is_empty() {
                keys.push(key.to_string());
            }
        }
    }
    keys
}
