//! The entity registry.
//!
//! [`Registry`] is the durable store of every generated entity's definition
//! and the single source of truth for the rest of the engine: generated
//! artifacts are output only and are never read back.
//!
//! # Example
//!
//! ```no_run
//! use entity_schema_core::{EntityDefinition, FieldDefinition, ScalarType};
//! use entity_schema_sqlite::Registry;
//! use rusqlite::Connection;
//!
//! let conn = Connection::open("entities.db").unwrap();
//! let registry = Registry::new(&conn, "eg_").unwrap();
//! registry.up().unwrap();
//!
//! let skill = EntityDefinition::new("Skill", "skills")
//!     .with_field(FieldDefinition::scalar("title", ScalarType::String));
//! registry.put(&skill).unwrap();
//!
//! assert_eq!(registry.get("Skill").unwrap(), Some(skill));
//! ```

use entity_schema_core::{EntityDefinition, EntitySummary, IncomingRelation, relations};
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use tracing::debug;

use crate::convert;
use crate::error::{GeneratorError, Result};
use crate::schema::{generate_registry_drop_sql, generate_registry_sql, validate_prefix};

/// Structured registry of entity definitions in two prefixed tables.
///
/// Reads see every write made earlier through the same connection. `put`
/// stores whatever it is given; validation is the caller's job.
pub struct Registry<'a> {
    conn: &'a Connection,
    prefix: String,
}

impl<'a> Registry<'a> {
    /// Creates a registry over the given connection and table prefix.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::InvalidPrefix`] if the prefix is invalid.
    pub fn new(conn: &'a Connection, prefix: impl Into<String>) -> Result<Self> {
        let prefix = prefix.into();
        validate_prefix(&prefix)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { conn, prefix })
    }

    /// Builds a registry for a prefix that has already been validated.
    pub(crate) fn from_validated(conn: &'a Connection, prefix: &str) -> Self {
        Self {
            conn,
            prefix: prefix.to_string(),
        }
    }

    /// Returns the underlying connection.
    pub fn connection(&self) -> &'a Connection {
        self.conn
    }

    /// Table prefix of the registry tables.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Creates the registry tables if they do not exist.
    ///
    /// Idempotent. Executes within a transaction.
    pub fn up(&self) -> Result<()> {
        let sql = generate_registry_sql(&self.prefix)?;
        let tx = self.conn.unchecked_transaction()?;
        tx.execute_batch(&sql)?;
        tx.commit()?;
        debug!(prefix = %self.prefix, "registry tables ready");
        Ok(())
    }

    /// Drops the registry tables. Generated entity tables are left alone.
    pub fn down(&self) -> Result<()> {
        let sql = generate_registry_drop_sql(&self.prefix)?;
        let tx = self.conn.unchecked_transaction()?;
        tx.execute_batch(&sql)?;
        tx.commit()?;
        Ok(())
    }

    /// Stores `def`, replacing any definition with the same name.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::Database`] if another entity already uses
    /// the table name.
    pub fn put(&self, def: &EntityDefinition) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        convert::upsert_entity(&tx, &self.prefix, def)?;
        tx.commit()?;
        Ok(())
    }

    /// Loads a definition by entity name.
    pub fn get(&self, name: &str) -> Result<Option<EntityDefinition>> {
        convert::load_entity(self.conn, &self.prefix, name)
    }

    /// Removes a definition. Returns `false` if it was not registered.
    pub fn remove(&self, name: &str) -> Result<bool> {
        let tx = self.conn.unchecked_transaction()?;
        let removed = convert::delete_entity(&tx, &self.prefix, name)?;
        tx.commit()?;
        Ok(removed)
    }

    /// Returns `true` if an entity with the given name is registered.
    pub fn contains(&self, name: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}entities WHERE name = ?1", self.prefix),
            params![name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Entity names in alphabetical order.
    pub fn names(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT name FROM {}entities ORDER BY name",
            self.prefix
        ))?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(names)
    }

    /// Loads every definition, ordered by name.
    pub fn all(&self) -> Result<Vec<EntityDefinition>> {
        let names = self.names()?;
        let mut defs = Vec::with_capacity(names.len());
        for name in &names {
            if let Some(def) = self.get(name)? {
                defs.push(def);
            }
        }
        Ok(defs)
    }

    /// Summaries of every definition, ordered by name.
    pub fn list(&self) -> Result<Vec<EntitySummary>> {
        Ok(self.all()?.iter().map(EntityDefinition::summary).collect())
    }

    /// Entity that owns the physical table `table`, if any.
    pub fn table_owner(&self, table: &str) -> Result<Option<String>> {
        let owner = self
            .conn
            .query_row(
                &format!(
                    "SELECT name FROM {}entities WHERE table_name = ?1",
                    self.prefix
                ),
                params![table],
                |row| row.get(0),
            )
            .optional()?;
        Ok(owner)
    }

    /// Physical table of a registered entity.
    pub fn resolve_table(&self, name: &str) -> Result<Option<String>> {
        let table = self
            .conn
            .query_row(
                &format!(
                    "SELECT table_name FROM {}entities WHERE name = ?1",
                    self.prefix
                ),
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(table)
    }

    /// Relations declared on other entities that target `name`.
    ///
    /// Non-owning fields that merely mirror one of `name`'s own relations
    /// (the inverses the maintainer wrote) are excluded.
    pub fn list_incoming(&self, name: &str) -> Result<Vec<IncomingRelation>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT e.name, e.table_name, f.name FROM {p}entity_fields f \
             JOIN {p}entities e ON e.id = f.entity_id \
             WHERE f.target = ?1 AND e.name != ?1 \
             ORDER BY e.name, f.position",
            p = self.prefix
        ))?;
        let candidates = stmt
            .query_map(params![name], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let own = self.get(name)?;
        let mut incoming = Vec::new();
        for (source_entity, source_table, field_name) in candidates {
            let Some(source) = self.get(&source_entity)? else {
                continue;
            };
            let Some(relation) = source.find_field(&field_name).and_then(|f| f.as_relation()) else {
                return Err(GeneratorError::Conversion(format!(
                    "field '{field_name}' of '{source_entity}' is not a relation"
                )));
            };
            let mirrored = !relation.kind.is_owning()
                && own.as_ref().is_some_and(|own| {
                    own.relation_fields()
                        .filter(|(_, r)| r.target == source_entity)
                        .any(|(_, r)| relations::inverse_name(name, r) == field_name)
                });
            if mirrored {
                continue;
            }
            incoming.push(IncomingRelation {
                source_entity,
                source_table,
                field_name,
                relation_type: relation.kind.relation_type(),
            });
        }
        Ok(incoming)
    }

    /// Returns a snapshot of the registry state.
    pub fn status(&self) -> Result<RegistryStatus> {
        if !self.tables_exist()? {
            return Ok(RegistryStatus::default());
        }
        Ok(RegistryStatus {
            tables_exist: true,
            entity_count: self.count_rows("entities")?,
            field_count: self.count_rows("entity_fields")?,
        })
    }

    /// Checks whether the entities table exists.
    pub(crate) fn tables_exist(&self) -> Result<bool> {
        let table_name = format!("{}entities", self.prefix);
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
            [&table_name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Counts rows in a prefixed table.
    fn count_rows(&self, table: &str) -> Result<usize> {
        let full_table = format!("{}{}", self.prefix, table);
        let count: i64 =
            self.conn
                .query_row(&format!("SELECT COUNT(*) FROM {full_table}"), [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

/// Snapshot of the registry, returned by [`Registry::status`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistryStatus {
    /// Whether the registry tables exist.
    pub tables_exist: bool,
    /// Number of registered entities.
    pub entity_count: usize,
    /// Number of stored fields across all entities.
    pub field_count: usize,
}
