//! Entity definition validation.
//!
//! Validates structural invariants of an [`EntityDefinition`] before any side
//! effect happens: identifier syntax, duplicate field names, columns that
//! would collide once relation fields are expanded to `_id` columns, reserved
//! column names, and default values that do not fit their field.
//!
//! # Examples
//!
//! ```
//! use entity_schema_core::*;
//!
//! let def = EntityDefinition::new("Employee", "employees")
//!     .with_field(FieldDefinition::scalar("name", ScalarType::String));
//! assert!(validate_definition(&def).is_empty());
//!
//! // Invalid: duplicate field name
//! let bad = EntityDefinition::new("Employee", "employees")
//!     .with_field(FieldDefinition::scalar("x", ScalarType::String))
//!     .with_field(FieldDefinition::scalar("x", ScalarType::Number));
//! assert_eq!(
//!     validate_definition(&bad),
//!     vec![ValidationError::DuplicateField("x".to_string())]
//! );
//! ```

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::naming;
use crate::types::{EntityDefinition, FieldDefinition, RESERVED_COLUMNS, ScalarType};

static ENTITY_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][A-Za-z0-9]*$").expect("valid regex"));
static TABLE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z_][a-z0-9_]*$").expect("valid regex"));
static FIELD_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex"));

/// Identifiers are used verbatim in DDL, so they are length-capped.
const MAX_IDENTIFIER_LEN: usize = 63;

/// Definition validation errors.
///
/// Each variant names the offending entity, table or field so callers can
/// point at it directly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Entity name is empty or whitespace-only.
    #[error("entity name cannot be empty")]
    EmptyEntityName,
    /// Entity name is not a PascalCase identifier.
    #[error("invalid entity name '{0}': expected a PascalCase identifier")]
    InvalidEntityName(String),
    /// Table name is not a lowercase SQL identifier.
    #[error("invalid table name '{0}': expected lowercase letters, digits and underscores")]
    InvalidTableName(String),
    /// Field name is not an identifier.
    #[error("invalid field name '{0}'")]
    InvalidFieldName(String),
    /// Field maps onto a column every generated table already has.
    #[error("field '{0}' collides with a reserved column")]
    ReservedFieldName(String),
    /// Two fields share the same name.
    #[error("duplicate field: {0}")]
    DuplicateField(String),
    /// Two fields would be stored in the same physical column.
    #[error("field '{field}' maps to column '{column}', which another field already uses")]
    DuplicateColumn { field: String, column: String },
    /// Scalar type name is not part of the fixed scalar set.
    #[error("field '{field}' has unknown type '{type_name}'")]
    UnknownScalarType { field: String, type_name: String },
    /// Relation type name is not one of the four relation kinds.
    #[error("field '{field}' has unknown relation type '{type_name}'")]
    UnknownRelationType { field: String, type_name: String },
    /// `onDelete` value is not a known referential action.
    #[error("field '{field}' has unknown onDelete action '{action}'")]
    UnknownOnDelete { field: String, action: String },
    /// `onDelete` given for a relation kind that owns no column.
    #[error("field '{0}': onDelete only applies to many-to-one and one-to-one relations")]
    OnDeleteNotApplicable(String),
    /// Relation target is empty.
    #[error("field '{0}' has an empty relation target")]
    EmptyRelationTarget(String),
    /// Relation target is not a valid entity or table name.
    #[error("field '{field}' targets invalid entity '{target}'")]
    InvalidRelationTarget { field: String, target: String },
    /// Explicit inverse name is not an identifier.
    #[error("field '{field}' declares invalid inverse name '{name}'")]
    InvalidInverseName { field: String, name: String },
    /// Relation fields cannot carry a literal default.
    #[error("relation field '{0}' cannot have a default value")]
    RelationDefault(String),
    /// Default value does not match the field's scalar type.
    #[error("default value of field '{field}' must be a {expected}")]
    DefaultValueMismatch { field: String, expected: &'static str },
}

/// Validates an entity definition.
///
/// Returns an empty vector when the definition is valid. Validation stops at
/// the first problem, so at most one error is reported.
pub fn validate_definition(def: &EntityDefinition) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if def.name.trim().is_empty() {
        errors.push(ValidationError::EmptyEntityName);
        return errors;
    }
    if !is_entity_name(&def.name) {
        errors.push(ValidationError::InvalidEntityName(def.name.clone()));
        return errors;
    }
    if !is_table_name(&def.table_name) {
        errors.push(ValidationError::InvalidTableName(def.table_name.clone()));
        return errors;
    }

    errors.extend(validate_fields(&def.fields));
    errors
}

/// Returns `true` if `name` is a valid PascalCase entity name.
pub fn is_entity_name(name: &str) -> bool {
    name.len() <= MAX_IDENTIFIER_LEN && ENTITY_NAME.is_match(name)
}

/// Returns `true` if `name` is a valid physical table name.
pub fn is_table_name(name: &str) -> bool {
    name.len() <= MAX_IDENTIFIER_LEN && TABLE_NAME.is_match(name)
}

/// Returns `true` if `name` is a valid field identifier.
pub fn is_field_name(name: &str) -> bool {
    name.len() <= MAX_IDENTIFIER_LEN && FIELD_NAME.is_match(name)
}

fn validate_fields(fields: &[FieldDefinition]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen_names: HashSet<&str> = HashSet::new();
    let mut seen_columns: HashSet<String> =
        RESERVED_COLUMNS.iter().map(|c| c.to_string()).collect();

    for field in fields {
        if !is_field_name(&field.name) {
            errors.push(ValidationError::InvalidFieldName(field.name.clone()));
            return errors;
        }
        if !seen_names.insert(field.name.as_str()) {
            errors.push(ValidationError::DuplicateField(field.name.clone()));
            return errors;
        }

        if let Some(column) = stored_column(field) {
            if RESERVED_COLUMNS.contains(&column.as_str()) {
                errors.push(ValidationError::ReservedFieldName(field.name.clone()));
                return errors;
            }
            if !seen_columns.insert(column.clone()) {
                errors.push(ValidationError::DuplicateColumn {
                    field: field.name.clone(),
                    column,
                });
                return errors;
            }
        }

        if let Some(error) = validate_field(field) {
            errors.push(error);
            return errors;
        }
    }

    errors
}

fn validate_field(field: &FieldDefinition) -> Option<ValidationError> {
    if let Some(relation) = field.as_relation() {
        if relation.target.trim().is_empty() {
            return Some(ValidationError::EmptyRelationTarget(field.name.clone()));
        }
        if !is_entity_name(&relation.target) || !is_table_name(&relation.target_table) {
            return Some(ValidationError::InvalidRelationTarget {
                field: field.name.clone(),
                target: relation.target.clone(),
            });
        }
        if let Some(inverse) = &relation.inverse_name {
            if !is_field_name(inverse) {
                return Some(ValidationError::InvalidInverseName {
                    field: field.name.clone(),
                    name: inverse.clone(),
                });
            }
        }
        if field.default_value.is_some() {
            return Some(ValidationError::RelationDefault(field.name.clone()));
        }
        return None;
    }

    let scalar = field.scalar_type()?;
    let default = field.default_value.as_ref()?;
    let expected = match scalar {
        ScalarType::Boolean if !default.is_boolean() => Some("boolean"),
        t if t.is_numeric() && !default.is_number() => Some("number"),
        ScalarType::Json => None,
        ScalarType::Boolean => None,
        t if t.is_numeric() => None,
        _ if !default.is_string() => Some("string"),
        _ => None,
    };
    expected.map(|expected| ValidationError::DefaultValueMismatch {
        field: field.name.clone(),
        expected,
    })
}

/// Column a field occupies on its own table, if any.
///
/// Non-owning relation sides and many-to-many fields occupy no column.
pub fn stored_column(field: &FieldDefinition) -> Option<String> {
    match field.as_relation() {
        None => Some(naming::column_name(&field.name)),
        Some(relation) if relation.kind.owns_column() => {
            Some(naming::foreign_key_column(&field.name))
        }
        Some(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::types::RelationSpec;

    fn employee() -> EntityDefinition {
        EntityDefinition::new("Employee", "employees")
    }

    #[test]
    fn test_accepts_valid_definition() {
        let def = employee()
            .with_field(FieldDefinition::scalar("firstName", ScalarType::String))
            .with_field(FieldDefinition::scalar("active", ScalarType::Boolean).with_default(json!(true)))
            .with_field(FieldDefinition::relation(
                "department",
                RelationSpec::many_to_one("Department", "departments"),
            ));
        assert!(validate_definition(&def).is_empty());
    }

    #[test]
    fn test_rejects_bad_entity_and_table_names() {
        let def = EntityDefinition::new("employee", "employees");
        assert_eq!(
            validate_definition(&def),
            vec![ValidationError::InvalidEntityName("employee".to_string())]
        );

        let def = EntityDefinition::new("Employee", "Employees;--");
        assert_eq!(
            validate_definition(&def),
            vec![ValidationError::InvalidTableName("Employees;--".to_string())]
        );
    }

    #[test]
    fn test_rejects_reserved_columns() {
        let def = employee().with_field(FieldDefinition::scalar("createdAt", ScalarType::Datetime));
        assert_eq!(
            validate_definition(&def),
            vec![ValidationError::ReservedFieldName("createdAt".to_string())]
        );
    }

    #[test]
    fn test_rejects_relation_column_collision() {
        let def = employee()
            .with_field(FieldDefinition::scalar("department_id", ScalarType::Number))
            .with_field(FieldDefinition::relation(
                "department",
                RelationSpec::many_to_one("Department", "departments"),
            ));
        assert_eq!(
            validate_definition(&def),
            vec![ValidationError::DuplicateColumn {
                field: "department".to_string(),
                column: "department_id".to_string(),
            }]
        );
    }

    #[test]
    fn test_many_to_many_occupies_no_column() {
        let def = employee()
            .with_field(FieldDefinition::scalar("skills_id", ScalarType::Number))
            .with_field(FieldDefinition::relation(
                "skills",
                RelationSpec::many_to_many("Skill", "skills"),
            ));
        assert!(validate_definition(&def).is_empty());
    }

    #[test]
    fn test_rejects_mismatched_defaults() {
        let def = employee().with_field(FieldDefinition::scalar("age", ScalarType::Number).with_default(json!("ten")));
        assert_eq!(
            validate_definition(&def),
            vec![ValidationError::DefaultValueMismatch {
                field: "age".to_string(),
                expected: "number",
            }]
        );

        let def = employee().with_field(
            FieldDefinition::relation("manager", RelationSpec::many_to_one("Employee", "employees"))
                .with_default(json!(1)),
        );
        assert_eq!(
            validate_definition(&def),
            vec![ValidationError::RelationDefault("manager".to_string())]
        );
    }
}
