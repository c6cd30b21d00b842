//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable needed for live extraction was not set.
    ///
    /// Only raised when a run actually has to contact the source site; cached runs
    /// need neither the base URL nor credentials.
    #[error("missing required environment variable: {name}")]
    MissingEnvVar { name: &'static str },

    /// Base URL could not be parsed.
    #[error("invalid source URL '{value}': {source}")]
    InvalidUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },

    /// Timeout string could not be parsed as whole seconds.
    #[error("failed to parse page timeout '{value}': {source}")]
    InvalidTimeout {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    /// Neither a model directory nor the stub embedder was configured.
    #[error("no embedding model configured: set {name} or pass --stub-embedder")]
    ModelDirRequired { name: &'static str },

    /// Specified path does not exist on the filesystem.
    #[error("path does not exist: {path}")]
    PathNotFound { path: PathBuf },

    /// Path exists but is not a file (when a file was expected).
    #[error("path is not a file: {path}")]
    NotAFile { path: PathBuf },

    /// Path exists but is not a directory (when a directory was expected).
    #[error("path is not a directory: {path}")]
    NotADirectory { path: PathBuf },
}
