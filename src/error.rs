//! Error types for the ambient surfaces (config loading, export).
//!
//! The tick path (step, AI update, record, metrics) never fails; these
//! errors only come from reading configuration and serializing exports.

use std::path::PathBuf;

use thiserror::Error;

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Document is not valid JSON for [`crate::config::PendulumConfig`].
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A parameter is outside its physical domain.
    #[error("invalid {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}

/// Export packaging errors.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to serialize export summary: {0}")]
    Serialize(#[from] serde_json::Error),
}
