//! Source artifacts, artifact manifests and configuration for generated
//! entities.
//!
//! This crate turns entity definitions into source files and manages
//! everything around them on disk:
//!
//! - [`ArtifactRenderer`] renders the model, DTOs, service, controller and
//!   module files of an entity from embedded templates.
//! - [`ArtifactWriter`] writes rendered files and keeps the
//!   [`ArtifactManifest`] (per-file SHA-256 checksums) up to date.
//! - [`GeneratorConfig`] is the YAML configuration shared by the generator
//!   and the CLI.
//! - [`DefinitionSet`] loads wire-shape definitions from JSON or YAML files.
//!
//! # Quick start
//!
//! ```no_run
//! use entity_schema_artifacts::{ArtifactRenderer, ArtifactWriter, GeneratorConfig};
//! use entity_schema_core::{EntityDefinition, FieldDefinition, ScalarType};
//!
//! let config = GeneratorConfig::load("entity-gen.yml").unwrap();
//! let writer = ArtifactWriter::new(&config.artifacts.output_dir, config.artifacts.enabled);
//!
//! let def = EntityDefinition::new("Skill", "skills")
//!     .with_field(FieldDefinition::scalar("title", ScalarType::String));
//! let rendered = ArtifactRenderer::new().unwrap().render(&def).unwrap();
//! let report = writer.write(&rendered).unwrap();
//! println!("wrote {} files", report.files.len());
//! ```

mod config;
mod error;
mod loader;
mod manifest;
mod render;
mod writer;

pub use config::{ArtifactsConfig, DEFAULT_TABLE_PREFIX, DatabaseConfig, GeneratorConfig};
pub use error::{ArtifactError, Result};
pub use loader::DefinitionSet;
pub use manifest::{ArtifactManifest, EntityArtifacts, MANIFEST_FILE_NAME, checksum_bytes};
pub use render::{ArtifactRenderer, RenderedArtifacts, RenderedFile, module_name};
pub use writer::{ArtifactWriter, WriteReport};
