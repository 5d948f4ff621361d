//! Error types for entity generation.
//!
//! [`GeneratorError`] covers every failure of the registry, the schema
//! synchronizer and the orchestrator. Transports that only need the broad
//! category use [`GeneratorError::kind`]. Recoverable conditions that do not
//! abort an operation are reported as [`GenerationWarning`]s instead.

use entity_schema_artifacts::ArtifactError;
use entity_schema_core::ValidationError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while generating, updating or deleting entities.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// The definition failed validation; nothing was changed.
    #[error("invalid definition for '{entity}': {}", join_errors(.errors))]
    InvalidDefinition {
        entity: String,
        errors: Vec<ValidationError>,
    },

    /// An entity or table with the same name already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    /// No entity with the given name is registered.
    #[error("entity not found: {0}")]
    NotFound(String),

    /// A DDL statement failed.
    #[error("schema sync failed on table '{table}': {message}")]
    SchemaSync { table: String, message: String },

    /// Writing or removing generated artifacts failed.
    #[error("artifact write failed: {0}")]
    ArtifactWrite(#[from] ArtifactError),

    /// Registry access failure.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A registry row could not be turned back into a definition.
    #[error("conversion error: {0}")]
    Conversion(String),

    /// Table prefix contains invalid characters.
    #[error("invalid prefix '{0}': must contain only alphanumeric characters and underscores")]
    InvalidPrefix(String),

    /// Another generation operation holds the gate.
    #[error("another generation operation is in progress")]
    Busy,
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Broad error category, stable across transports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    InvalidDefinition,
    Conflict,
    NotFound,
    SchemaSyncFailure,
    ArtifactWriteFailure,
    Internal,
}

impl GeneratorError {
    /// Builds an [`InvalidDefinition`](Self::InvalidDefinition) error from a
    /// single validation failure.
    pub fn invalid(entity: &str, error: ValidationError) -> Self {
        GeneratorError::InvalidDefinition {
            entity: entity.to_string(),
            errors: vec![error],
        }
    }

    /// Maps the error to its broad category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            GeneratorError::InvalidDefinition { .. } | GeneratorError::InvalidPrefix(_) => {
                ErrorKind::InvalidDefinition
            }
            GeneratorError::Conflict(_) | GeneratorError::Busy => ErrorKind::Conflict,
            GeneratorError::NotFound(_) => ErrorKind::NotFound,
            GeneratorError::SchemaSync { .. } => ErrorKind::SchemaSyncFailure,
            GeneratorError::ArtifactWrite(_) => ErrorKind::ArtifactWriteFailure,
            GeneratorError::Database(_) | GeneratorError::Conversion(_) => ErrorKind::Internal,
        }
    }
}

/// Non-fatal condition reported alongside a successful operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "warning", rename_all = "kebab-case")]
pub enum GenerationWarning {
    /// A relation points at an entity that is not registered; its inverse
    /// was not written.
    RelationTargetUnresolved { field: String, target: String },
    /// A generated file had been edited by hand and was overwritten.
    ArtifactModified { path: String },
    /// The inverse of `source_field` was not written because `entity`
    /// already has an unrelated field named `field`.
    InverseNameTaken {
        entity: String,
        field: String,
        source_field: String,
    },
    /// A relation declared on `entity` pointed at an entity that was
    /// recreated; the field and its storage were dropped.
    RelationDropped { entity: String, field: String },
}

impl std::fmt::Display for GenerationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationWarning::RelationTargetUnresolved { field, target } => {
                write!(f, "relation '{field}' targets unknown entity '{target}'")
            }
            GenerationWarning::ArtifactModified { path } => {
                write!(f, "overwrote manually modified artifact '{path}'")
            }
            GenerationWarning::InverseNameTaken {
                entity,
                field,
                source_field,
            } => write!(
                f,
                "'{entity}.{field}' already exists; inverse of '{source_field}' not written"
            ),
            GenerationWarning::RelationDropped { entity, field } => {
                write!(f, "relation '{entity}.{field}' was dropped with its target")
            }
        }
    }
}

/// Convenience alias for results with [`GeneratorError`].
pub type Result<T> = std::result::Result<T, GeneratorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        let invalid = GeneratorError::invalid(
            "Employee",
            ValidationError::DuplicateField("name".to_string()),
        );
        assert_eq!(invalid.kind(), ErrorKind::InvalidDefinition);
        assert!(invalid.to_string().contains("duplicate field: name"));

        assert_eq!(GeneratorError::Busy.kind(), ErrorKind::Conflict);
        assert_eq!(
            GeneratorError::SchemaSync {
                table: "employees".to_string(),
                message: "boom".to_string(),
            }
            .kind(),
            ErrorKind::SchemaSyncFailure
        );
        assert_eq!(
            GeneratorError::Conversion("bad row".to_string()).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn test_warning_serializes_tagged() {
        let warning = GenerationWarning::RelationTargetUnresolved {
            field: "skills".to_string(),
            target: "Skill".to_string(),
        };
        let json = serde_json::to_value(&warning).unwrap();
        assert_eq!(json["warning"], "relation-target-unresolved");
        assert_eq!(json["target"], "Skill");

        let taken = GenerationWarning::InverseNameTaken {
            entity: "Skill".to_string(),
            field: "employees".to_string(),
            source_field: "skills".to_string(),
        };
        assert_eq!(serde_json::to_value(&taken).unwrap()["warning"], "inverse-name-taken");
        assert_eq!(
            taken.to_string(),
            "'Skill.employees' already exists; inverse of 'skills' not written"
        );
    }
}
