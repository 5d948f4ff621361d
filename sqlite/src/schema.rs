//! Registry table definitions with customizable table prefixes.
//!
//! The registry is the single source of truth for generated entities. It is
//! stored in two normalized tables next to the generated tables themselves:
//!
//! - `{prefix}entities`: one row per entity (name, physical table)
//! - `{prefix}entity_fields`: one row per field, ordered by `position`,
//!   deleted together with its entity
//!
//! # Custom prefix
//!
//! Prefixes must contain only alphanumeric characters and underscores, so
//! that registry tables of several tools can share one database without
//! colliding with generated tables.

use crate::error::{GeneratorError, Result};

/// Validates that a table prefix contains only alphanumeric characters and underscores.
pub(crate) fn validate_prefix(prefix: &str) -> Result<()> {
    if prefix.is_empty() {
        return Err(GeneratorError::InvalidPrefix(prefix.to_string()));
    }
    if !prefix.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(GeneratorError::InvalidPrefix(prefix.to_string()));
    }
    Ok(())
}

/// Generates the registry schema for the given prefix.
///
/// Every statement is idempotent (`IF NOT EXISTS`).
///
/// # Errors
///
/// Returns [`GeneratorError::InvalidPrefix`] if the prefix is invalid.
pub fn generate_registry_sql(prefix: &str) -> Result<String> {
    validate_prefix(prefix)?;

    let sql = format!(
        r#"
CREATE TABLE IF NOT EXISTS {prefix}entities (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    table_name TEXT NOT NULL UNIQUE,
    format_version TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS {prefix}entity_fields (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    entity_id INTEGER NOT NULL REFERENCES {prefix}entities(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    name TEXT NOT NULL,
    scalar_type TEXT,
    relation_type TEXT,
    target TEXT,
    target_table TEXT,
    inverse_name TEXT,
    on_delete TEXT,
    join_side TEXT,
    required INTEGER NOT NULL DEFAULT 1,
    is_unique INTEGER NOT NULL DEFAULT 0,
    default_value TEXT,
    UNIQUE (entity_id, name),
    CHECK ((scalar_type IS NULL) != (relation_type IS NULL))
);

CREATE INDEX IF NOT EXISTS idx_{prefix}entity_fields_entity ON {prefix}entity_fields(entity_id);
CREATE INDEX IF NOT EXISTS idx_{prefix}entity_fields_target ON {prefix}entity_fields(target);
"#,
        prefix = prefix
    );

    Ok(sql)
}

/// Generates `DROP TABLE` statements for the registry tables.
///
/// Generated entity tables are left alone.
///
/// # Errors
///
/// Returns [`GeneratorError::InvalidPrefix`] if the prefix is invalid.
pub fn generate_registry_drop_sql(prefix: &str) -> Result<String> {
    validate_prefix(prefix)?;

    let sql = format!(
        r#"
DROP TABLE IF EXISTS {prefix}entity_fields;
DROP TABLE IF EXISTS {prefix}entities;
"#,
        prefix = prefix
    );

    Ok(sql)
}
