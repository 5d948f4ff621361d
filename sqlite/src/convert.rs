//! Bidirectional conversion between [`EntityDefinition`] and registry rows.
//!
//! A field row stores either `scalar_type` or the relation columns
//! (`relation_type`, `target`, `target_table`, `inverse_name`, `on_delete`,
//! `join_side`); the registry schema enforces that exactly one of
//! `scalar_type` and `relation_type` is set. Field order is preserved through
//! the `position` column. Default values are stored as JSON text.

use entity_schema_core::{
    DEFINITION_FORMAT_VERSION, EntityDefinition, FieldDefinition, FieldType, JoinSide, OnDelete,
    RelationKind, RelationSpec, RelationType, ScalarType,
};
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::error::{GeneratorError, Result};

fn join_side_to_str(side: JoinSide) -> &'static str {
    match side {
        JoinSide::Owner => "owner",
        JoinSide::Inverse => "inverse",
    }
}

fn parse_join_side(s: Option<&str>) -> Result<JoinSide> {
    match s {
        None | Some("owner") => Ok(JoinSide::Owner),
        Some("inverse") => Ok(JoinSide::Inverse),
        Some(other) => Err(GeneratorError::Conversion(format!(
            "unknown join side: {other}"
        ))),
    }
}

/// Referential action carried by the kind, including the inverse side of a
/// one-to-one, which keeps the owner's action.
fn stored_on_delete(kind: &RelationKind) -> Option<OnDelete> {
    match kind {
        RelationKind::ManyToOne { on_delete } | RelationKind::OneToOne { on_delete, .. } => {
            Some(*on_delete)
        }
        RelationKind::OneToMany | RelationKind::ManyToMany { .. } => None,
    }
}

/// Column values of one `entity_fields` row.
struct FieldRow {
    name: String,
    scalar_type: Option<String>,
    relation_type: Option<String>,
    target: Option<String>,
    target_table: Option<String>,
    inverse_name: Option<String>,
    on_delete: Option<String>,
    join_side: Option<String>,
    required: bool,
    unique: bool,
    default_value: Option<String>,
}

impl FieldRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            name: row.get(0)?,
            scalar_type: row.get(1)?,
            relation_type: row.get(2)?,
            target: row.get(3)?,
            target_table: row.get(4)?,
            inverse_name: row.get(5)?,
            on_delete: row.get(6)?,
            join_side: row.get(7)?,
            required: row.get(8)?,
            unique: row.get(9)?,
            default_value: row.get(10)?,
        })
    }

    fn into_field(self) -> Result<FieldDefinition> {
        let field_type = match (self.scalar_type, self.relation_type) {
            (Some(scalar), None) => FieldType::Scalar(ScalarType::parse(&scalar).ok_or_else(
                || GeneratorError::Conversion(format!("unknown scalar type: {scalar}")),
            )?),
            (None, Some(relation_type)) => {
                FieldType::Relation(relation_from_parts(
                    &relation_type,
                    self.target,
                    self.target_table,
                    self.inverse_name,
                    self.on_delete.as_deref(),
                    self.join_side.as_deref(),
                )?)
            }
            _ => {
                return Err(GeneratorError::Conversion(format!(
                    "field '{}' must have exactly one of scalar_type and relation_type",
                    self.name
                )));
            }
        };

        let default_value = self
            .default_value
            .map(|text| serde_json::from_str(&text))
            .transpose()
            .map_err(|e| {
                GeneratorError::Conversion(format!("invalid default for '{}': {e}", self.name))
            })?;

        Ok(FieldDefinition {
            name: self.name,
            field_type,
            required: self.required,
            unique: self.unique,
            default_value,
        })
    }
}

fn relation_from_parts(
    relation_type: &str,
    target: Option<String>,
    target_table: Option<String>,
    inverse_name: Option<String>,
    on_delete: Option<&str>,
    join_side: Option<&str>,
) -> Result<RelationSpec> {
    let relation_type = RelationType::parse(relation_type).ok_or_else(|| {
        GeneratorError::Conversion(format!("unknown relation type: {relation_type}"))
    })?;
    let on_delete = match on_delete {
        None => OnDelete::default(),
        Some(action) => OnDelete::parse(action).ok_or_else(|| {
            GeneratorError::Conversion(format!("unknown onDelete action: {action}"))
        })?,
    };
    let side = parse_join_side(join_side)?;
    let (Some(target), Some(target_table)) = (target, target_table) else {
        return Err(GeneratorError::Conversion(
            "relation row without target".to_string(),
        ));
    };

    let kind = RelationKind::authored(relation_type, on_delete).with_side(side);
    Ok(RelationSpec {
        target,
        target_table,
        inverse_name,
        kind,
    })
}

/// Inserts or replaces an entity definition.
///
/// An existing row with the same name keeps its id; its fields are replaced
/// wholesale. Must be called inside a transaction for atomicity.
pub(crate) fn upsert_entity(conn: &Connection, prefix: &str, def: &EntityDefinition) -> Result<i64> {
    let existing: Option<i64> = conn
        .query_row(
            &format!("SELECT id FROM {prefix}entities WHERE name = ?1"),
            params![def.name],
            |row| row.get(0),
        )
        .optional()?;

    let entity_id = match existing {
        Some(id) => {
            conn.execute(
                &format!(
                    "UPDATE {prefix}entities SET table_name = ?1, format_version = ?2, \
                     updated_at = CURRENT_TIMESTAMP WHERE id = ?3"
                ),
                params![def.table_name, DEFINITION_FORMAT_VERSION, id],
            )?;
            conn.execute(
                &format!("DELETE FROM {prefix}entity_fields WHERE entity_id = ?1"),
                params![id],
            )?;
            id
        }
        None => {
            conn.execute(
                &format!(
                    "INSERT INTO {prefix}entities (name, table_name, format_version) VALUES (?1, ?2, ?3)"
                ),
                params![def.name, def.table_name, DEFINITION_FORMAT_VERSION],
            )?;
            conn.last_insert_rowid()
        }
    };

    insert_fields(conn, prefix, entity_id, &def.fields)?;
    Ok(entity_id)
}

fn insert_fields(
    conn: &Connection,
    prefix: &str,
    entity_id: i64,
    fields: &[FieldDefinition],
) -> Result<()> {
    let mut stmt = conn.prepare(&format!(
        "INSERT INTO {prefix}entity_fields \
         (entity_id, position, name, scalar_type, relation_type, target, target_table, \
          inverse_name, on_delete, join_side, required, is_unique, default_value) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
    ))?;

    for (position, field) in fields.iter().enumerate() {
        let relation = field.as_relation();
        let default_value = field
            .default_value
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| GeneratorError::Conversion(e.to_string()))?;

        stmt.execute(params![
            entity_id,
            position as i64,
            field.name,
            field.scalar_type().map(|t| t.as_str()),
            relation.map(|r| r.kind.relation_type().as_str()),
            relation.map(|r| r.target.as_str()),
            relation.map(|r| r.target_table.as_str()),
            relation.and_then(|r| r.inverse_name.as_deref()),
            relation.and_then(|r| stored_on_delete(&r.kind)).map(|a| a.as_str()),
            relation.map(|r| join_side_to_str(r.kind.side())),
            field.required,
            field.unique,
            default_value,
        ])?;
    }
    Ok(())
}

/// Loads an entity definition by name.
///
/// Returns `None` if no entity with the given name is registered.
pub(crate) fn load_entity(conn: &Connection, prefix: &str, name: &str) -> Result<Option<EntityDefinition>> {
    let entity: Option<(i64, String, String)> = conn
        .query_row(
            &format!("SELECT id, name, table_name FROM {prefix}entities WHERE name = ?1"),
            params![name],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()?;

    let Some((entity_id, name, table_name)) = entity else {
        return Ok(None);
    };

    let mut stmt = conn.prepare(&format!(
        "SELECT name, scalar_type, relation_type, target, target_table, inverse_name, \
         on_delete, join_side, required, is_unique, default_value \
         FROM {prefix}entity_fields WHERE entity_id = ?1 ORDER BY position"
    ))?;
    let rows = stmt
        .query_map(params![entity_id], FieldRow::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let fields = rows
        .into_iter()
        .map(FieldRow::into_field)
        .collect::<Result<Vec<_>>>()?;

    Ok(Some(EntityDefinition {
        name,
        table_name,
        fields,
    }))
}

/// Deletes an entity; its field rows cascade. Returns `true` if a row was
/// deleted.
pub(crate) fn delete_entity(conn: &Connection, prefix: &str, name: &str) -> Result<bool> {
    let deleted = conn.execute(
        &format!("DELETE FROM {prefix}entities WHERE name = ?1"),
        params![name],
    )?;
    Ok(deleted > 0)
}
