//! Target discovery
//!
//! Expands the command-line targets (files or directories) into the sorted
//! list of Rust source files to mutate. Hidden directories and build output
//! are always skipped; the config can exclude more directories and filter
//! files by content.

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{MutationError, Result};

/// Expand each target into `.rs` files, recursively for directories.
/// The result is sorted so runs are reproducible.
pub fn discover(targets: &[PathBuf], config: &Config) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for target in targets {
        if target.is_file() {
            if is_rust_source(target) {
                files.push(target.clone());
            }
        } else if target.is_dir() {
            walk(target, config, &mut files)?;
        } else {
            return Err(MutationError::FileReadError {
                file: target.clone(),
                error: "no such file or directory".to_string(),
            });
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

/// Content-based skip rules. Returns the reason a file should not be
/// mutated, or `None` to proceed.
pub fn skip_reason(source: &str, config: &Config) -> Option<&'static str> {
    if config.skip_with_build_tags && source.contains("#![cfg(") {
        return Some("has a crate-level cfg attribute");
    }
    if config.skip_without_test
        && !source.contains("#[test]")
        && !source.contains("#[cfg(test)]")
    {
        return Some("has no tests");
    }
    None
}

fn walk(dir: &Path, config: &Config, files: &mut Vec<PathBuf>) -> Result<()> {
    let entries = std::fs::read_dir(dir).map_err(|e| MutationError::FileReadError {
        file: dir.to_path_buf(),
        error: e.to_string(),
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| MutationError::FileReadError {
            file: dir.to_path_buf(),
            error: e.to_string(),
        })?;
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();

        if path.is_dir() {
            if excluded_dir(&name, config) {
                continue;
            }
            walk(&path, config, files)?;
        } else if is_rust_source(&path) {
            files.push(path);
        }
    }
    Ok(())
}

fn excluded_dir(name: &str, config: &Config) -> bool {
    name.starts_with('.')
        || name == "target"
        || config.exclude_dirs.iter().any(|d| d == name)
}

fn is_rust_source(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == "rs")
}
