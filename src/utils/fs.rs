//! Filesystem helpers shared by the detector, verifier and auditor.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};

/// Check if a path exists (file or directory).
pub fn path_exists(path: &Path) -> bool {
    path.exists()
}

/// Check if a path exists and is a directory.
pub fn dir_exists(path: &Path) -> bool {
    path.is_dir()
}

/// Last modification time of a file.
pub fn modified_time(path: &Path) -> Result<SystemTime> {
    let meta = std::fs::metadata(path)
        .with_context(|| format!("cannot stat {}", path.display()))?;
    meta.modified()
        .with_context(|| format!("no modification time for {}", path.display()))
}

/// Expand `${NAME}` environment references in a pattern.
///
/// Unset variables expand to the empty string, matching what descriptor
/// authors expect from shell-style interpolation. A lone `$` or an
/// unterminated `${` is passed through verbatim.
pub fn expand_env(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        if chars.peek() != Some(&'{') {
            out.push('$');
            continue;
        }
        chars.next(); // consume '{'

        let mut name = String::new();
        let mut closed = false;
        for c in chars.by_ref() {
            if c == '}' {
                closed = true;
                break;
            }
            name.push(c);
        }

        if closed {
            if let Ok(value) = std::env::var(&name) {
                out.push_str(&value);
            }
        } else {
            // Unterminated reference, keep the raw text.
            out.push_str("${");
            out.push_str(&name);
        }
    }

    out
}

/// Find files matching a glob pattern. Directories are filtered out.
///
/// A malformed pattern is reported as an error so the caller can log and
/// skip the individual check that referenced it.
pub fn glob_files(pattern: &str) -> Result<Vec<PathBuf>> {
    let paths = glob::glob(pattern)
        .with_context(|| format!("invalid glob pattern: {}", pattern))?;

    let mut files = Vec::new();
    for entry in paths.flatten() {
        if entry.is_file() {
            files.push(entry);
        }
    }
    Ok(files)
}

/// Newest file among `paths` by modification time, with that time.
pub fn newest_file(paths: &[PathBuf]) -> Option<(PathBuf, SystemTime)> {
    let mut newest: Option<(PathBuf, SystemTime)> = None;
    for path in paths {
        let Ok(mtime) = modified_time(path) else {
            continue;
        };
        match &newest {
            Some((_, best)) if mtime <= *best => {}
            _ => newest = Some((path.clone(), mtime)),
        }
    }
    newest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_env_known_variable() {
        std::env::set_var("SENTRA_TEST_FS_VAR", "workspace");
        assert_eq!(expand_env("${SENTRA_TEST_FS_VAR}/cache"), "workspace/cache");
    }

    #[test]
    fn test_expand_env_unset_variable_is_empty() {
        std::env::remove_var("SENTRA_TEST_FS_UNSET");
        assert_eq!(expand_env("a${SENTRA_TEST_FS_UNSET}b"), "ab");
    }

    #[test]
    fn test_expand_env_passthrough() {
        assert_eq!(expand_env("no variables here"), "no variables here");
        assert_eq!(expand_env("price: $5"), "price: $5");
        assert_eq!(expand_env("${UNTERMINATED"), "${UNTERMINATED");
    }

    #[test]
    fn test_glob_files_skips_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("a.txt"), "x").unwrap();

        let pattern = format!("{}/*", dir.path().display());
        let files = glob_files(&pattern).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("a.txt"));
    }

    #[test]
    fn test_newest_file_picks_latest() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("old.txt");
        let new = dir.path().join("new.txt");
        std::fs::write(&old, "x").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(30));
        std::fs::write(&new, "y").unwrap();

        let (path, _) = newest_file(&[old, new.clone()]).unwrap();
        assert_eq!(path, new);
    }
}
