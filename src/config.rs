//! Configuration file parsing for mutation testing

use serde::Deserialize;
use std::path::Path;

use crate::error::MutationError;

/// Run configuration loaded from a YAML file.
///
/// Everything here is optional; an absent config file is equivalent to the
/// defaults below.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Skip source files that contain no test code
    #[serde(default)]
    pub skip_without_test: bool,
    /// Skip source files gated behind a crate-level cfg attribute
    #[serde(default)]
    pub skip_with_build_tags: bool,
    /// Print the JSON report document to stdout at run end
    #[serde(default)]
    pub json_output: bool,
    /// Suppress per-mutant console output and the summary line
    #[serde(default)]
    pub silent_mode: bool,
    /// Directory names excluded from target discovery
    #[serde(default)]
    pub exclude_dirs: Vec<String>,
    /// Global regex exclusion scope: entries of the form
    /// `<pattern> [operator, operator...]`, applied to every source unit
    #[serde(default)]
    pub disable_regexps: Vec<String>,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self, MutationError> {
        let content = std::fs::read_to_string(path).map_err(|e| MutationError::ConfigError {
            message: format!("Failed to read config file '{}': {}", path.display(), e),
        })?;

        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| MutationError::ConfigError {
                message: format!("Failed to parse config file '{}': {}", path.display(), e),
            })?;

        Ok(config)
    }
}
