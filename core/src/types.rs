//! Definition types for runtime-generated entities.
//!
//! This module defines the data model used to describe a generated entity:
//! its name and physical table, its scalar fields, and its relations to other
//! entities. The types derive [`serde`] traits so that they can round-trip
//! through JSON, the SQLite registry, and the artifact templates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Version of the entity definition format (semver).
///
/// Recorded in the artifact manifest so that artifacts rendered from an older
/// definition format can be recognised.
pub const DEFINITION_FORMAT_VERSION: &str = "1.0.0";

/// Column names every generated table carries; user fields may not reuse them.
pub const RESERVED_COLUMNS: [&str; 3] = ["id", "created_at", "updated_at"];

/// Scalar type of a non-relational field.
///
/// Each variant maps to exactly one column type (see the sqlite crate's DDL
/// module). `Integer` and `Float` are accepted alongside `Number` because the
/// column mapping distinguishes 32-bit integers from fixed-point decimals.
///
/// # Examples
///
/// ```
/// use entity_schema_core::ScalarType;
///
/// assert_eq!(ScalarType::parse("datetime"), Some(ScalarType::Datetime));
/// assert_eq!(ScalarType::parse("uuid"), None);
/// assert_eq!(ScalarType::Email.as_str(), "email");
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    /// Short text, at most 255 characters.
    String,
    /// Unbounded text.
    Text,
    /// 32-bit integer.
    Number,
    /// 32-bit integer (explicit alias of `Number`).
    Integer,
    /// Fixed-point decimal with two fractional digits.
    Float,
    /// Boolean, defaulting to `false`.
    Boolean,
    /// Calendar date.
    Date,
    /// Timestamp with time zone.
    Datetime,
    /// E-mail address, stored like `String`.
    Email,
    /// Structured JSON document.
    Json,
}

impl ScalarType {
    /// All scalar types, in declaration order.
    pub const ALL: [ScalarType; 10] = [
        ScalarType::String,
        ScalarType::Text,
        ScalarType::Number,
        ScalarType::Integer,
        ScalarType::Float,
        ScalarType::Boolean,
        ScalarType::Date,
        ScalarType::Datetime,
        ScalarType::Email,
        ScalarType::Json,
    ];

    /// Returns the wire name of this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarType::String => "string",
            ScalarType::Text => "text",
            ScalarType::Number => "number",
            ScalarType::Integer => "integer",
            ScalarType::Float => "float",
            ScalarType::Boolean => "boolean",
            ScalarType::Date => "date",
            ScalarType::Datetime => "datetime",
            ScalarType::Email => "email",
            ScalarType::Json => "json",
        }
    }

    /// Parses a wire name, returning `None` for unknown types.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }

    /// Returns `true` for types whose values are JSON numbers.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ScalarType::Number | ScalarType::Integer | ScalarType::Float
        )
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Referential action applied to a foreign-key column when its target row is
/// deleted.
///
/// Only meaningful for relations that own a column (many-to-one and the
/// owning side of one-to-one). Defaults to [`OnDelete::SetNull`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OnDelete {
    /// Delete the referencing row as well.
    Cascade,
    /// Clear the foreign-key column (the default).
    #[default]
    SetNull,
    /// Reject the delete while references exist.
    Restrict,
    /// Defer the check; equivalent to `Restrict` at statement end.
    NoAction,
}

impl OnDelete {
    /// Returns the wire name (`"set-null"`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            OnDelete::Cascade => "cascade",
            OnDelete::SetNull => "set-null",
            OnDelete::Restrict => "restrict",
            OnDelete::NoAction => "no-action",
        }
    }

    /// Returns the SQL referential action (`"SET NULL"`, ...).
    pub fn as_sql(&self) -> &'static str {
        match self {
            OnDelete::Cascade => "CASCADE",
            OnDelete::SetNull => "SET NULL",
            OnDelete::Restrict => "RESTRICT",
            OnDelete::NoAction => "NO ACTION",
        }
    }

    /// Parses a wire name, returning `None` for unknown actions.
    pub fn parse(s: &str) -> Option<Self> {
        [
            OnDelete::Cascade,
            OnDelete::SetNull,
            OnDelete::Restrict,
            OnDelete::NoAction,
        ]
        .into_iter()
        .find(|a| a.as_str() == s)
    }
}

/// Which side of a symmetric relation owns its physical storage.
///
/// The owner of a many-to-many relation owns the junction table; the owner
/// of a one-to-one relation owns the `_id` column. Inverses written by the
/// relation maintainer are always [`JoinSide::Inverse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinSide {
    /// Declared by the user; owns the storage.
    #[default]
    Owner,
    /// Maintained automatically on the target entity.
    Inverse,
}

/// Fieldless relation tag as it appears on the wire (`"many-to-one"`, ...).
///
/// This is the part of a relation that participates in the diff identity
/// key; the payload of [`RelationKind`] does not.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum RelationType {
    ManyToOne,
    OneToMany,
    ManyToMany,
    OneToOne,
}

impl RelationType {
    /// Returns the wire name of this relation type.
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationType::ManyToOne => "many-to-one",
            RelationType::OneToMany => "one-to-many",
            RelationType::ManyToMany => "many-to-many",
            RelationType::OneToOne => "one-to-one",
        }
    }

    /// Parses a wire name, returning `None` for unknown relation types.
    pub fn parse(s: &str) -> Option<Self> {
        [
            RelationType::ManyToOne,
            RelationType::OneToMany,
            RelationType::ManyToMany,
            RelationType::OneToOne,
        ]
        .into_iter()
        .find(|t| t.as_str() == s)
    }

    /// Returns `true` if a field of this type holds a collection.
    pub fn is_to_many(&self) -> bool {
        matches!(self, RelationType::OneToMany | RelationType::ManyToMany)
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of relation kinds, each carrying only the data it needs.
///
/// # Examples
///
/// ```
/// use entity_schema_core::{JoinSide, OnDelete, RelationKind, RelationType};
///
/// let kind = RelationKind::ManyToOne { on_delete: OnDelete::Cascade };
/// assert!(kind.owns_column());
/// assert_eq!(kind.inverse(), RelationKind::OneToMany);
///
/// let m2m = RelationKind::ManyToMany { side: JoinSide::Owner };
/// assert!(m2m.owns_junction());
/// assert_eq!(m2m.inverse().relation_type(), RelationType::ManyToMany);
/// assert!(!m2m.inverse().owns_junction());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RelationKind {
    /// Many rows of this entity reference one target row via an `_id` column.
    ManyToOne { on_delete: OnDelete },
    /// Collection side of a many-to-one declared on the target.
    OneToMany,
    /// Pairing rows stored in a junction table owned by one side.
    ManyToMany { side: JoinSide },
    /// One-to-one link; the owning side carries a unique `_id` column.
    OneToOne { on_delete: OnDelete, side: JoinSide },
}

impl RelationKind {
    /// Builds the user-authored (owning) kind for a wire relation type.
    ///
    /// `on_delete` is ignored for kinds that do not own a column.
    pub fn authored(relation_type: RelationType, on_delete: OnDelete) -> Self {
        match relation_type {
            RelationType::ManyToOne => RelationKind::ManyToOne { on_delete },
            RelationType::OneToMany => RelationKind::OneToMany,
            RelationType::ManyToMany => RelationKind::ManyToMany {
                side: JoinSide::Owner,
            },
            RelationType::OneToOne => RelationKind::OneToOne {
                on_delete,
                side: JoinSide::Owner,
            },
        }
    }

    /// Returns the wire tag of this kind.
    pub fn relation_type(&self) -> RelationType {
        match self {
            RelationKind::ManyToOne { .. } => RelationType::ManyToOne,
            RelationKind::OneToMany => RelationType::OneToMany,
            RelationKind::ManyToMany { .. } => RelationType::ManyToMany,
            RelationKind::OneToOne { .. } => RelationType::OneToOne,
        }
    }

    /// Returns the referential action for kinds that own a column.
    pub fn on_delete(&self) -> Option<OnDelete> {
        match self {
            RelationKind::ManyToOne { on_delete } => Some(*on_delete),
            RelationKind::OneToOne {
                on_delete,
                side: JoinSide::Owner,
            } => Some(*on_delete),
            _ => None,
        }
    }

    /// Returns the join side; many-to-one is always the owner and one-to-many
    /// always the inverse.
    pub fn side(&self) -> JoinSide {
        match self {
            RelationKind::ManyToOne { .. } => JoinSide::Owner,
            RelationKind::OneToMany => JoinSide::Inverse,
            RelationKind::ManyToMany { side } | RelationKind::OneToOne { side, .. } => *side,
        }
    }

    /// Returns `true` if the declaring table carries an `_id` column.
    pub fn owns_column(&self) -> bool {
        matches!(
            self,
            RelationKind::ManyToOne { .. }
                | RelationKind::OneToOne {
                    side: JoinSide::Owner,
                    ..
                }
        )
    }

    /// Returns `true` if the declaring entity owns a junction table.
    pub fn owns_junction(&self) -> bool {
        matches!(
            self,
            RelationKind::ManyToMany {
                side: JoinSide::Owner
            }
        )
    }

    /// Returns `true` if this side owns any physical storage.
    pub fn is_owning(&self) -> bool {
        self.owns_column() || self.owns_junction()
    }

    /// Returns the kind of the matching field on the target entity.
    ///
    /// many-to-one ↔ one-to-many, many-to-many ↔ many-to-many,
    /// one-to-one ↔ one-to-one; the join side flips.
    pub fn inverse(&self) -> RelationKind {
        match self {
            RelationKind::ManyToOne { .. } => RelationKind::OneToMany,
            RelationKind::OneToMany => RelationKind::ManyToOne {
                on_delete: OnDelete::default(),
            },
            RelationKind::ManyToMany { side } => RelationKind::ManyToMany { side: side.flip() },
            RelationKind::OneToOne { on_delete, side } => RelationKind::OneToOne {
                on_delete: *on_delete,
                side: side.flip(),
            },
        }
    }

    /// Returns a copy with the join side replaced (no-op for kinds with a
    /// fixed side).
    pub fn with_side(self, new_side: JoinSide) -> Self {
        match self {
            RelationKind::ManyToMany { .. } => RelationKind::ManyToMany { side: new_side },
            RelationKind::OneToOne { on_delete, .. } => RelationKind::OneToOne {
                on_delete,
                side: new_side,
            },
            other => other,
        }
    }
}

impl JoinSide {
    fn flip(self) -> Self {
        match self {
            JoinSide::Owner => JoinSide::Inverse,
            JoinSide::Inverse => JoinSide::Owner,
        }
    }
}

/// Relation carried by a relational field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationSpec {
    /// Target entity name.
    pub target: String,
    /// Physical table of the target entity.
    pub target_table: String,
    /// Name of the matching field on the target (explicit or defaulted when
    /// the inverse is written).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inverse_name: Option<String>,
    /// Relation kind and its kind-specific data.
    pub kind: RelationKind,
}

impl RelationSpec {
    /// Creates a relation of the given kind.
    pub fn new(target: &str, target_table: &str, kind: RelationKind) -> Self {
        Self {
            target: target.to_string(),
            target_table: target_table.to_string(),
            inverse_name: None,
            kind,
        }
    }

    /// Creates a many-to-one relation with the default `SET NULL` action.
    pub fn many_to_one(target: &str, target_table: &str) -> Self {
        Self::new(
            target,
            target_table,
            RelationKind::ManyToOne {
                on_delete: OnDelete::default(),
            },
        )
    }

    /// Creates the owning side of a many-to-many relation.
    pub fn many_to_many(target: &str, target_table: &str) -> Self {
        Self::new(
            target,
            target_table,
            RelationKind::ManyToMany {
                side: JoinSide::Owner,
            },
        )
    }

    /// Creates the owning side of a one-to-one relation.
    pub fn one_to_one(target: &str, target_table: &str) -> Self {
        Self::new(
            target,
            target_table,
            RelationKind::OneToOne {
                on_delete: OnDelete::default(),
                side: JoinSide::Owner,
            },
        )
    }

    /// Sets an explicit inverse field name.
    pub fn with_inverse_name(mut self, name: &str) -> Self {
        self.inverse_name = Some(name.to_string());
        self
    }

    /// Sets the referential action (ignored by kinds without a column).
    pub fn with_on_delete(mut self, action: OnDelete) -> Self {
        self.kind = match self.kind {
            RelationKind::ManyToOne { .. } => RelationKind::ManyToOne { on_delete: action },
            RelationKind::OneToOne { side, .. } => RelationKind::OneToOne {
                on_delete: action,
                side,
            },
            other => other,
        };
        self
    }
}

/// Storage type of a field: a scalar column or a relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Scalar(ScalarType),
    Relation(RelationSpec),
}

/// A single field of an entity.
///
/// # Examples
///
/// ```
/// use entity_schema_core::{FieldDefinition, RelationSpec, ScalarType};
///
/// let name = FieldDefinition::scalar("name", ScalarType::String).unique();
/// assert!(name.required);
/// assert!(name.unique);
///
/// let dept = FieldDefinition::relation(
///     "department",
///     RelationSpec::many_to_one("Department", "departments"),
/// )
/// .optional();
/// assert_eq!(dept.as_relation().unwrap().target, "Department");
/// assert!(!dept.required);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Field name, unique within its entity.
    pub name: String,
    /// Scalar type or relation.
    pub field_type: FieldType,
    /// Whether a value is mandatory (defaults to `true`).
    pub required: bool,
    /// Whether values must be unique across rows.
    pub unique: bool,
    /// Literal default value, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<serde_json::Value>,
}

impl FieldDefinition {
    /// Creates a required scalar field.
    pub fn scalar(name: &str, scalar: ScalarType) -> Self {
        Self {
            name: name.to_string(),
            field_type: FieldType::Scalar(scalar),
            required: true,
            unique: false,
            default_value: None,
        }
    }

    /// Creates a required relation field.
    pub fn relation(name: &str, relation: RelationSpec) -> Self {
        Self {
            name: name.to_string(),
            field_type: FieldType::Relation(relation),
            required: true,
            unique: false,
            default_value: None,
        }
    }

    /// Marks the field as optional.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Marks the field as unique.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Sets a literal default value.
    pub fn with_default(mut self, value: serde_json::Value) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Returns the scalar type, or `None` for relation fields.
    pub fn scalar_type(&self) -> Option<ScalarType> {
        match &self.field_type {
            FieldType::Scalar(t) => Some(*t),
            FieldType::Relation(_) => None,
        }
    }

    /// Returns the relation, or `None` for scalar fields.
    pub fn as_relation(&self) -> Option<&RelationSpec> {
        match &self.field_type {
            FieldType::Relation(r) => Some(r),
            FieldType::Scalar(_) => None,
        }
    }

    /// Returns `true` for relation fields.
    pub fn is_relation(&self) -> bool {
        matches!(self.field_type, FieldType::Relation(_))
    }

    /// Returns `true` if the column created for this field accepts `NULL`.
    ///
    /// Optional fields are nullable, and so is a foreign key whose
    /// referential action is `SET NULL`.
    pub fn is_nullable(&self) -> bool {
        match self.as_relation() {
            Some(relation) => {
                !self.required || relation.kind.on_delete() == Some(OnDelete::SetNull)
            }
            None => !self.required,
        }
    }

    /// Returns `true` if this relation field targets `entity`.
    pub fn targets(&self, entity: &str) -> bool {
        self.as_relation().is_some_and(|r| r.target == entity)
    }
}

/// Declarative description of a generated entity.
///
/// # Examples
///
/// ```
/// use entity_schema_core::*;
///
/// let employee = EntityDefinition::new("Employee", "employees")
///     .with_field(FieldDefinition::scalar("name", ScalarType::String))
///     .with_field(FieldDefinition::relation(
///         "skills",
///         RelationSpec::many_to_many("Skill", "skills"),
///     ));
///
/// assert!(employee.find_field("name").is_some());
/// assert_eq!(employee.relation_fields().count(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDefinition {
    /// PascalCase entity name, the registry key.
    pub name: String,
    /// Physical table name.
    pub table_name: String,
    /// Fields in declaration order.
    pub fields: Vec<FieldDefinition>,
}

impl EntityDefinition {
    /// Creates an entity with no fields.
    pub fn new(name: &str, table_name: &str) -> Self {
        Self {
            name: name.to_string(),
            table_name: table_name.to_string(),
            fields: Vec::new(),
        }
    }

    /// Appends a field.
    pub fn with_field(mut self, field: FieldDefinition) -> Self {
        self.fields.push(field);
        self
    }

    /// Finds a field by name.
    pub fn find_field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns `true` if a field with the given name exists.
    pub fn has_field(&self, name: &str) -> bool {
        self.find_field(name).is_some()
    }

    /// Iterates over relation fields.
    pub fn relation_fields(&self) -> impl Iterator<Item = (&FieldDefinition, &RelationSpec)> {
        self.fields
            .iter()
            .filter_map(|f| f.as_relation().map(|r| (f, r)))
    }

    /// Iterates over scalar fields.
    pub fn scalar_fields(&self) -> impl Iterator<Item = (&FieldDefinition, ScalarType)> {
        self.fields
            .iter()
            .filter_map(|f| f.scalar_type().map(|t| (f, t)))
    }

    /// Returns a summary suitable for listings.
    pub fn summary(&self) -> EntitySummary {
        EntitySummary {
            name: self.name.clone(),
            table_name: self.table_name.clone(),
            field_count: self.fields.len(),
            relation_count: self.relation_fields().count(),
        }
    }
}

/// Listing entry for a stored entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySummary {
    pub name: String,
    pub table_name: String,
    pub field_count: usize,
    pub relation_count: usize,
}

/// A relation declared elsewhere that points at a given entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingRelation {
    /// Entity declaring the relation.
    pub source_entity: String,
    /// Table of the declaring entity.
    pub source_table: String,
    /// Name of the relation field on the declaring entity.
    pub field_name: String,
    /// Relation tag of that field.
    pub relation_type: RelationType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_type_parse_round_trips_all() {
        for t in ScalarType::ALL {
            assert_eq!(ScalarType::parse(t.as_str()), Some(t));
        }
        assert_eq!(ScalarType::parse("String"), None);
    }

    #[test]
    fn test_relation_kind_inverse_mapping() {
        let m2o = RelationKind::ManyToOne {
            on_delete: OnDelete::Cascade,
        };
        assert_eq!(m2o.inverse(), RelationKind::OneToMany);

        let o2o = RelationKind::authored(RelationType::OneToOne, OnDelete::Restrict);
        let inv = o2o.inverse();
        assert_eq!(inv.side(), JoinSide::Inverse);
        assert!(!inv.owns_column());
        assert_eq!(inv.on_delete(), None);
        assert_eq!(inv.inverse(), o2o);
    }

    #[test]
    fn test_one_to_many_owns_nothing() {
        let kind = RelationKind::authored(RelationType::OneToMany, OnDelete::Cascade);
        assert!(!kind.is_owning());
        assert_eq!(kind.on_delete(), None);
    }

    #[test]
    fn test_with_on_delete_ignored_for_many_to_many() {
        let spec = RelationSpec::many_to_many("Skill", "skills").with_on_delete(OnDelete::Cascade);
        assert_eq!(spec.kind.on_delete(), None);
    }

    #[test]
    fn test_foreign_key_nullability() {
        let set_null = FieldDefinition::relation(
            "department",
            RelationSpec::many_to_one("Department", "departments"),
        );
        assert!(set_null.is_nullable());

        let cascade = FieldDefinition::relation(
            "department",
            RelationSpec::many_to_one("Department", "departments").with_on_delete(OnDelete::Cascade),
        );
        assert!(!cascade.is_nullable());
        assert!(cascade.optional().is_nullable());
        assert!(!FieldDefinition::scalar("name", ScalarType::String).is_nullable());
    }

    #[test]
    fn test_relation_kind_serializes_tagged() {
        let kind = RelationKind::OneToOne {
            on_delete: OnDelete::NoAction,
            side: JoinSide::Owner,
        };
        let json = serde_json::to_value(kind).unwrap();
        assert_eq!(json["type"], "one-to-one");
        assert_eq!(json["on_delete"], "no-action");
        assert_eq!(json["side"], "owner");
    }
}
