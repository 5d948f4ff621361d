//! Applying entity DDL to the database.
//!
//! [`SchemaSynchronizer`] executes the statements planned by [`crate::ddl`].
//! Each operation runs in its own transaction; a failing statement rolls the
//! operation back and surfaces as [`GeneratorError::SchemaSync`] naming the
//! table. Failures are not retried. Callers that want to resume after a
//! partial failure consult [`SchemaSynchronizer::table_exists`] and retry
//! with [`ExistingTable::Adopt`].

use entity_schema_core::{EntityDefinition, FieldDefinition};
use rusqlite::{Connection, params};
use tracing::{debug, info};

use crate::ddl;
use crate::error::{GeneratorError, Result};

/// What [`SchemaSynchronizer::create_table`] does when the table already
/// exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExistingTable {
    /// Fail with [`GeneratorError::Conflict`].
    #[default]
    Reject,
    /// Keep the existing table and run the remaining idempotent steps
    /// (unique indexes, junction tables).
    Adopt,
}

/// Executes table, column and junction DDL against a connection.
pub struct SchemaSynchronizer<'a> {
    conn: &'a Connection,
}

impl<'a> SchemaSynchronizer<'a> {
    /// Creates a synchronizer over `conn`.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Creates the table for `def`, then its unique indexes and junctions.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::Conflict`] if the table exists and
    /// `existing` is [`ExistingTable::Reject`], or
    /// [`GeneratorError::SchemaSync`] if a statement fails.
    pub fn create_table(&self, def: &EntityDefinition, existing: ExistingTable) -> Result<()> {
        let plan = ddl::plan_create_table(def);
        let mut statements = Vec::new();

        if self.table_exists(&def.table_name)? {
            match existing {
                ExistingTable::Reject => {
                    return Err(GeneratorError::Conflict(format!(
                        "table '{}' already exists",
                        def.table_name
                    )));
                }
                ExistingTable::Adopt => {
                    info!(table = %def.table_name, "adopting existing table");
                }
            }
        } else {
            statements.push(plan.create.clone());
        }
        statements.extend(plan.indexes.iter().cloned());
        statements.extend(plan.junctions.iter().cloned());

        self.run(&def.table_name, &statements)?;
        info!(table = %def.table_name, junctions = plan.junctions.len(), "table created");
        Ok(())
    }

    /// Adds and removes columns in place. No-op if both lists are empty.
    pub fn alter_table(
        &self,
        table: &str,
        added: &[FieldDefinition],
        removed: &[FieldDefinition],
    ) -> Result<()> {
        if added.is_empty() && removed.is_empty() {
            debug!(table = %table, "nothing to alter");
            return Ok(());
        }
        let statements = ddl::plan_alter_table(table, added, removed);
        self.run(table, &statements)?;
        info!(
            table = %table,
            added = added.len(),
            removed = removed.len(),
            "table altered"
        );
        Ok(())
    }

    /// Drops `table` after its junction tables. Missing tables are ignored.
    pub fn drop_table(&self, table: &str, junction_tables: &[String]) -> Result<()> {
        self.run(table, &ddl::plan_drop_table(table, junction_tables))?;
        info!(table = %table, junctions = junction_tables.len(), "table dropped");
        Ok(())
    }

    /// Drops a column and its unique index. Missing tables and columns are
    /// ignored, so the call can be repeated.
    pub fn drop_column(&self, table: &str, column: &str) -> Result<()> {
        if !self.column_names(table)?.iter().any(|c| c == column) {
            debug!(table = %table, column = %column, "column already absent");
            return Ok(());
        }
        self.run(table, &ddl::plan_drop_column(table, column))?;
        info!(table = %table, column = %column, "column dropped");
        Ok(())
    }

    /// Drops a junction table if it exists.
    pub fn drop_junction(&self, junction: &str) -> Result<()> {
        self.run(junction, &[format!("DROP TABLE IF EXISTS {junction}")])?;
        debug!(table = %junction, "junction dropped");
        Ok(())
    }

    /// Returns `true` if a table with the given name exists.
    pub fn table_exists(&self, table: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
            params![table],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Column names of `table` in declaration order; empty if the table does
    /// not exist.
    pub fn column_names(&self, table: &str) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM pragma_table_info(?1) ORDER BY cid")?;
        let names = stmt
            .query_map(params![table], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(names)
    }

    fn run(&self, table: &str, statements: &[String]) -> Result<()> {
        let sync_error = |e: rusqlite::Error| GeneratorError::SchemaSync {
            table: table.to_string(),
            message: e.to_string(),
        };

        let tx = self.conn.unchecked_transaction()?;
        for sql in statements {
            debug!(table = %table, sql = %sql, "executing DDL");
            tx.execute_batch(sql).map_err(sync_error)?;
        }
        tx.commit().map_err(sync_error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use entity_schema_core::{RelationSpec, ScalarType};

    use super::*;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        conn
    }

    fn employee() -> EntityDefinition {
        EntityDefinition::new("Employee", "employees")
            .with_field(FieldDefinition::scalar("name", ScalarType::String))
            .with_field(FieldDefinition::relation(
                "skills",
                RelationSpec::many_to_many("Skill", "skills"),
            ))
    }

    #[test]
    fn test_create_table_and_junction() {
        let conn = conn();
        let sync = SchemaSynchronizer::new(&conn);
        sync.create_table(&employee(), ExistingTable::Reject).unwrap();

        assert_eq!(
            sync.column_names("employees").unwrap(),
            vec!["id", "name", "created_at", "updated_at"]
        );
        assert!(sync.table_exists("skills_employees_skills").unwrap());
    }

    #[test]
    fn test_existing_table_conflicts_unless_adopted() {
        let conn = conn();
        let sync = SchemaSynchronizer::new(&conn);
        conn.execute_batch("CREATE TABLE employees (id INTEGER PRIMARY KEY)")
            .unwrap();

        assert!(matches!(
            sync.create_table(&employee(), ExistingTable::Reject),
            Err(GeneratorError::Conflict(_))
        ));
        assert!(!sync.table_exists("skills_employees_skills").unwrap());

        sync.create_table(&employee(), ExistingTable::Adopt).unwrap();
        assert!(sync.table_exists("skills_employees_skills").unwrap());
        assert_eq!(sync.column_names("employees").unwrap(), vec!["id"]);
    }

    #[test]
    fn test_alter_and_drop_column() {
        let conn = conn();
        let sync = SchemaSynchronizer::new(&conn);
        sync.create_table(&employee(), ExistingTable::Reject).unwrap();

        let added = vec![FieldDefinition::scalar("email", ScalarType::Email).unique()];
        sync.alter_table("employees", &added, &[]).unwrap();
        assert!(sync.column_names("employees").unwrap().contains(&"email".to_string()));

        sync.drop_column("employees", "email").unwrap();
        sync.drop_column("employees", "email").unwrap();
        assert!(!sync.column_names("employees").unwrap().contains(&"email".to_string()));
    }

    #[test]
    fn test_failed_statement_reports_table() {
        let conn = conn();
        let sync = SchemaSynchronizer::new(&conn);
        sync.create_table(&employee(), ExistingTable::Reject).unwrap();

        let duplicate = vec![FieldDefinition::scalar("name", ScalarType::String)];
        let err = sync.alter_table("employees", &duplicate, &[]).unwrap_err();
        match err {
            GeneratorError::SchemaSync { table, .. } => assert_eq!(table, "employees"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_drop_table_is_idempotent() {
        let conn = conn();
        let sync = SchemaSynchronizer::new(&conn);
        sync.create_table(&employee(), ExistingTable::Reject).unwrap();
        let junctions = vec!["skills_employees_skills".to_string()];

        sync.drop_table("employees", &junctions).unwrap();
        sync.drop_table("employees", &junctions).unwrap();
        assert!(!sync.table_exists("employees").unwrap());
        assert!(!sync.table_exists("skills_employees_skills").unwrap());
    }
}
