//! Error types for mutation testing

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during mutation testing
#[derive(Debug, Error)]
pub enum MutationError {
    /// An operator name was registered twice
    #[error("Mutation operator '{name}' is already registered")]
    DuplicateOperator { name: String },

    /// Failed to read source file
    #[error("Failed to read file '{}': {error}", file.display())]
    FileReadError { file: PathBuf, error: String },

    /// Failed to write a mutant or restore an original
    #[error("Failed to write file '{}': {error}", file.display())]
    WriteError { file: PathBuf, error: String },

    /// Failed to parse source file as Rust
    #[error("Failed to parse '{}' as Rust: {error}", file.display())]
    ParseError { file: PathBuf, error: String },

    /// The walker was driven out of its strict apply/revert alternation
    #[error("Mutation protocol violation: {reason}")]
    ProtocolError { reason: String },

    /// A planned mutation could not be applied or reverted
    #[error("Failed to apply mutation: {reason}")]
    FailedToApply { reason: String },

    /// Test or exec command could not be spawned
    #[error("Test execution failed: {error}")]
    TestExecutionError { error: String },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError { message: String },
}

/// Result type for mutation operations
pub type Result<T> = std::result::Result<T, MutationError>;
