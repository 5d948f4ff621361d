//! Core definition types and pure planning logic for runtime-generated
//! entities.
//!
//! This crate defines the data model an operator uses to declare a business
//! entity and everything that can be computed from it without touching a
//! database or the file system:
//!
//! - [`EntityDefinition`]: an entity's name, physical table and ordered
//!   fields.
//! - [`FieldDefinition`]: a scalar column ([`ScalarType`]) or a relation
//!   ([`RelationSpec`]).
//! - [`RelationKind`]: the closed set of relation kinds, with the
//!   [`JoinSide`] that records which side owns the storage.
//! - [`EntityInput`]: the camelCase wire shape, normalized into a typed
//!   definition.
//!
//! Validation ([`validate_definition`]) rejects bad identifiers, duplicate
//! fields and column collisions. Diffing ([`diff_fields`]) computes the
//! fields added and removed by an update. The [`relations`] module plans the
//! inverse-field edits that keep bidirectional relations consistent, and
//! [`naming`] holds the table, column and junction naming rules.
//!
//! # Example
//!
//! ```
//! use entity_schema_core::*;
//!
//! let employee = EntityDefinition::new("Employee", "employees")
//!     .with_field(FieldDefinition::scalar("name", ScalarType::String))
//!     .with_field(FieldDefinition::relation(
//!         "department",
//!         RelationSpec::many_to_one("Department", "departments"),
//!     ));
//! assert!(validate_definition(&employee).is_empty());
//!
//! let edited = vec![FieldDefinition::scalar("name", ScalarType::String)];
//! let diff = diff_fields(&employee.fields, &edited);
//! assert_eq!(diff.removed[0].name, "department");
//! ```

mod diff;
pub mod naming;
pub mod relations;
mod types;
mod validate;
mod wire;

pub use diff::{FieldDiff, FieldKey, carry_over_join_sides, diff_fields, removed_junction_relations};
pub use types::*;
pub use validate::{
    ValidationError, is_entity_name, is_field_name, is_table_name, stored_column,
    validate_definition,
};
pub use wire::{EntityInput, FieldInput, RelationInput};
