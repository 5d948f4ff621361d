//! SQLite backend for runtime-generated entities.
//!
//! This crate stores entity definitions in a structured registry, turns them
//! into tables, foreign keys and junction tables, keeps bidirectional
//! relations consistent across entities, and orchestrates all of it together
//! with artifact rendering.
//!
//! # Architecture
//!
//! - **`schema`**: registry table SQL with customizable table prefixes
//! - **`convert`**: `EntityDefinition` ↔ registry row transformations
//! - **`store`**: [`Registry`], the durable source of truth
//! - **`ddl`**: pure DDL planning for entity tables and junctions
//! - **`synchronizer`**: [`SchemaSynchronizer`], applies DDL transactionally
//! - **`maintainer`**: [`RelationMaintainer`], applies inverse-field edits
//! - **`gate`**: [`GenerationGate`], the single-writer flag
//! - **`generator`**: [`EntityGenerator`], the orchestrator
//!
//! # Quick start
//!
//! ```no_run
//! use entity_schema_artifacts::GeneratorConfig;
//! use entity_schema_core::EntityInput;
//! use entity_schema_sqlite::{EntityGenerator, GenerateOptions};
//!
//! let config = GeneratorConfig::load("entity-gen.yml").unwrap();
//! let mut generator = EntityGenerator::from_config(&config).unwrap();
//!
//! let input = EntityInput::from_json(
//!     r#"{"name": "Department", "fields": [{"name": "title", "type": "string"}]}"#,
//! )
//! .unwrap();
//! let def = generator.normalize(&input).unwrap();
//! let result = generator.generate(def, GenerateOptions::default()).unwrap();
//! println!("{}", result.message);
//!
//! for summary in generator.list().unwrap() {
//!     println!("{} -> {}", summary.name, summary.table_name);
//! }
//! ```
//!
//! # Table prefix customization
//!
//! Registry tables are prefixed (`eg_entities`, `eg_entity_fields`), so the
//! registry can live in the same database as the generated tables.
//! Prefixes must contain only alphanumeric characters and underscores.

mod convert;
pub mod ddl;
mod error;
mod gate;
mod generator;
mod maintainer;
mod schema;
mod store;
mod synchronizer;

pub use error::{ErrorKind, GenerationWarning, GeneratorError, Result};
pub use gate::{GateGuard, GenerationGate};
pub use generator::{
    DeletedEntity, EntityGenerator, GenerateOptions, GeneratedEntity, GenerationPlan,
    GeneratorStatus, Phase, PlanAction,
};
pub use maintainer::{MaintenanceReport, RelationMaintainer};
pub use schema::{generate_registry_drop_sql, generate_registry_sql};
pub use store::{Registry, RegistryStatus};
pub use synchronizer::{ExistingTable, SchemaSynchronizer};
