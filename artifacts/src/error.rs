//! Error types for artifact rendering, writing and configuration.
//!
//! Covers every failure mode of this crate: I/O, JSON and YAML
//! (de)serialization, template rendering, and malformed definition files.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while rendering or writing artifacts.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Template compilation or rendering failure.
    #[error("template error: {0}")]
    TemplateError(#[from] tera::Error),

    /// A definition file could not be parsed.
    #[error("invalid definition file {path}: {message}")]
    InvalidDefinitionFile { path: PathBuf, message: String },

    /// Two definition files declare the same entity.
    #[error("entity '{0}' is defined more than once")]
    DuplicateDefinition(String),
}

/// Convenience alias for results with [`ArtifactError`].
pub type Result<T> = std::result::Result<T, ArtifactError>;
