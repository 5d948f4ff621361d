//! DDL planning for generated entity tables.
//!
//! Every function here is pure: it turns definitions into SQL statements
//! without touching a connection. The [`SchemaSynchronizer`] executes the
//! statements, and [`EntityGenerator::plan`] returns them as a dry run.
//!
//! # Column mapping
//!
//! | Scalar type          | Column type                |
//! |----------------------|----------------------------|
//! | `string`, `email`    | `VARCHAR(255)`             |
//! | `text`               | `TEXT`                     |
//! | `number`, `integer`  | `INTEGER`                  |
//! | `float`              | `DECIMAL(10,2)`            |
//! | `boolean`            | `BOOLEAN ... DEFAULT FALSE`|
//! | `date`               | `DATE`                     |
//! | `datetime`           | `TIMESTAMP WITH TIME ZONE` |
//! | `json`               | `JSONB`                    |
//!
//! Foreign keys are `INTEGER` columns named `{field}_id`. SQLite cannot add a
//! constraint to an existing table, so each foreign key is a named column
//! constraint (`CONSTRAINT fk_{table}_{column} REFERENCES ...`). The
//! referenced table is resolved lazily, so self-references and references to
//! tables created later do not block creation.
//!
//! [`SchemaSynchronizer`]: crate::SchemaSynchronizer
//! [`EntityGenerator::plan`]: crate::EntityGenerator::plan

use entity_schema_core::{
    EntityDefinition, FieldDefinition, RelationKind, RelationSpec, ScalarType, naming,
};
use serde::Serialize;
use serde_json::Value;

/// Column type for a scalar field.
pub fn column_type(scalar: ScalarType) -> &'static str {
    match scalar {
        ScalarType::String | ScalarType::Email => "VARCHAR(255)",
        ScalarType::Text => "TEXT",
        ScalarType::Number | ScalarType::Integer => "INTEGER",
        ScalarType::Float => "DECIMAL(10,2)",
        ScalarType::Boolean => "BOOLEAN",
        ScalarType::Date => "DATE",
        ScalarType::Datetime => "TIMESTAMP WITH TIME ZONE",
        ScalarType::Json => "JSONB",
    }
}

/// Statements creating one entity table, split into the steps the
/// synchronizer runs in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TablePlan {
    /// Physical table name.
    pub table: String,
    /// The `CREATE TABLE` statement for the main table.
    pub create: String,
    /// Unique indexes on the main table.
    pub indexes: Vec<String>,
    /// One `CREATE TABLE IF NOT EXISTS` per owned junction table.
    pub junctions: Vec<String>,
}

impl TablePlan {
    /// All statements in execution order.
    pub fn statements(&self) -> Vec<String> {
        std::iter::once(self.create.clone())
            .chain(self.indexes.iter().cloned())
            .chain(self.junctions.iter().cloned())
            .collect()
    }
}

/// Plans the creation of `def`'s table, unique indexes and junctions.
pub fn plan_create_table(def: &EntityDefinition) -> TablePlan {
    let table = &def.table_name;
    let mut columns = vec!["    id INTEGER PRIMARY KEY AUTOINCREMENT".to_string()];
    for field in &def.fields {
        if let Some(column) = column_definition(table, field, ColumnContext::Create) {
            columns.push(format!("    {column}"));
        }
    }
    columns.push(
        "    created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT CURRENT_TIMESTAMP".to_string(),
    );
    columns.push(
        "    updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT CURRENT_TIMESTAMP".to_string(),
    );

    TablePlan {
        table: table.clone(),
        create: format!("CREATE TABLE {table} (\n{}\n)", columns.join(",\n")),
        indexes: def
            .fields
            .iter()
            .filter_map(|f| unique_index(table, f))
            .collect(),
        junctions: def
            .relation_fields()
            .filter_map(|(f, r)| junction_definition(table, f, r))
            .collect(),
    }
}

/// Plans an in-place alteration of `table`.
///
/// Removed fields are processed first so that a field re-added under the
/// same name (a changed type or target) gets a fresh column. Columns added
/// in place are nullable unless they carry a default, because existing rows
/// cannot satisfy `NOT NULL`. Junctions of removed many-to-many fields are
/// not dropped here; see
/// [`plan_orphaned_junctions`](entity_schema_core::relations::plan_orphaned_junctions).
pub fn plan_alter_table(
    table: &str,
    added: &[FieldDefinition],
    removed: &[FieldDefinition],
) -> Vec<String> {
    let mut statements = Vec::new();

    for field in removed {
        if let Some(column) = owned_column(field) {
            statements.extend(plan_drop_column(table, &column));
        }
    }

    for field in added {
        if let Some(column) = column_definition(table, field, ColumnContext::Alter) {
            statements.push(format!("ALTER TABLE {table} ADD COLUMN {column}"));
        }
        statements.extend(unique_index(table, field));
        if let Some((f, r)) = field.as_relation().map(|r| (field, r)) {
            statements.extend(junction_definition(table, f, r));
        }
    }

    statements
}

/// Plans dropping a column together with the unique index that depends on it.
pub fn plan_drop_column(table: &str, column: &str) -> Vec<String> {
    vec![
        format!(
            "DROP INDEX IF EXISTS {}",
            naming::unique_index_name(table, column)
        ),
        format!("ALTER TABLE {table} DROP COLUMN {column}"),
    ]
}

/// Plans dropping `table` after its junction tables.
pub fn plan_drop_table(table: &str, junction_tables: &[String]) -> Vec<String> {
    junction_tables
        .iter()
        .map(|j| format!("DROP TABLE IF EXISTS {j}"))
        .chain(std::iter::once(format!("DROP TABLE IF EXISTS {table}")))
        .collect()
}

/// Plans the junction table of an owning many-to-many field.
///
/// Returns `None` for any other field.
pub fn plan_junction(table: &str, field: &FieldDefinition) -> Option<String> {
    let relation = field.as_relation()?;
    junction_definition(table, field, relation)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ColumnContext {
    Create,
    Alter,
}

fn owned_column(field: &FieldDefinition) -> Option<String> {
    match field.as_relation() {
        None => Some(naming::column_name(&field.name)),
        Some(r) if r.kind.owns_column() => Some(naming::foreign_key_column(&field.name)),
        Some(_) => None,
    }
}

fn column_definition(table: &str, field: &FieldDefinition, ctx: ColumnContext) -> Option<String> {
    match field.as_relation() {
        None => {
            let scalar = field.scalar_type()?;
            Some(scalar_column(field, scalar, ctx))
        }
        Some(relation) => foreign_key_column(table, field, relation, ctx),
    }
}

fn scalar_column(field: &FieldDefinition, scalar: ScalarType, ctx: ColumnContext) -> String {
    let column = naming::column_name(&field.name);
    let default = field
        .default_value
        .as_ref()
        .and_then(sql_literal)
        .or_else(|| (scalar == ScalarType::Boolean).then(|| "FALSE".to_string()));

    let not_null = match ctx {
        ColumnContext::Create => !field.is_nullable(),
        ColumnContext::Alter => !field.is_nullable() && default.is_some(),
    };

    let mut sql = format!("{column} {}", column_type(scalar));
    if not_null {
        sql.push_str(" NOT NULL");
    }
    if let Some(default) = default {
        sql.push_str(" DEFAULT ");
        sql.push_str(&default);
    }
    sql
}

fn foreign_key_column(
    table: &str,
    field: &FieldDefinition,
    relation: &RelationSpec,
    ctx: ColumnContext,
) -> Option<String> {
    if !relation.kind.owns_column() {
        return None;
    }
    let action = relation.kind.on_delete()?;
    let column = naming::foreign_key_column(&field.name);
    // ADD COLUMN with a REFERENCES clause must default to NULL.
    let not_null = ctx == ColumnContext::Create && !field.is_nullable();

    Some(format!(
        "{column} INTEGER{} CONSTRAINT {} REFERENCES {}(id) ON DELETE {}",
        if not_null { " NOT NULL" } else { "" },
        naming::fk_constraint_name(table, &column),
        relation.target_table,
        action.as_sql(),
    ))
}

fn unique_index(table: &str, field: &FieldDefinition) -> Option<String> {
    let column = owned_column(field)?;
    let one_to_one_owner = field
        .as_relation()
        .is_some_and(|r| matches!(r.kind, RelationKind::OneToOne { .. }) && r.kind.owns_column());
    if !field.unique && !one_to_one_owner {
        return None;
    }
    Some(format!(
        "CREATE UNIQUE INDEX IF NOT EXISTS {} ON {table}({column})",
        naming::unique_index_name(table, &column)
    ))
}

fn junction_definition(
    table: &str,
    field: &FieldDefinition,
    relation: &RelationSpec,
) -> Option<String> {
    if !relation.kind.owns_junction() {
        return None;
    }
    let junction = naming::junction_table_name(&field.name, table, &relation.target_table);
    let (source_column, target_column) = naming::junction_columns(table, &relation.target_table);

    Some(format!(
        "CREATE TABLE IF NOT EXISTS {junction} (\n    \
         {source_column} INTEGER NOT NULL CONSTRAINT {} REFERENCES {table}(id) ON DELETE CASCADE,\n    \
         {target_column} INTEGER NOT NULL CONSTRAINT {} REFERENCES {}(id) ON DELETE CASCADE,\n    \
         PRIMARY KEY ({source_column}, {target_column})\n)",
        naming::fk_constraint_name(&junction, &source_column),
        naming::fk_constraint_name(&junction, &target_column),
        relation.target_table,
    ))
}

/// Renders a JSON default as an SQL literal.
fn sql_literal(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Bool(true) => Some("TRUE".to_string()),
        Value::Bool(false) => Some("FALSE".to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(quote(s)),
        other => Some(quote(&other.to_string())),
    }
}

fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}
