//! Generator configuration.
//!
//! Defines the YAML-serializable configuration that controls where the
//! entity registry lives, where artifacts are written, and which entities are
//! fixed system entities hidden from listings.
//!
//! # Example YAML
//!
//! ```yaml
//! version: "1.0"
//! database:
//!   path: hr.db
//!   table_prefix: eg_
//! artifacts:
//!   output_dir: src/generated
//!   enabled: true
//! system_entities:
//!   - User
//!   - Application
//! ```

use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default registry table prefix.
pub const DEFAULT_TABLE_PREFIX: &str = "eg_";

/// Where the registry and the generated tables are stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database file.
    pub path: PathBuf,
    /// Prefix of the registry tables (`{prefix}entities`, ...).
    pub table_prefix: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("entities.db"),
            table_prefix: DEFAULT_TABLE_PREFIX.to_string(),
        }
    }
}

/// Artifact output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactsConfig {
    /// Root directory; each entity gets a `{snake_name}/` subdirectory.
    pub output_dir: PathBuf,
    /// When `false`, artifacts are rendered but not written.
    pub enabled: bool,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("generated"),
            enabled: true,
        }
    }
}

/// Top-level generator configuration.
///
/// Loaded from a YAML file (typically `entity-gen.yml`). Every section is
/// optional and falls back to [`Default`].
///
/// # Examples
///
/// ```
/// use entity_schema_artifacts::GeneratorConfig;
///
/// let config: GeneratorConfig = serde_yaml::from_str("system_entities: [User]").unwrap();
/// assert!(config.is_system_entity("User"));
/// assert_eq!(config.database.table_prefix, "eg_");
/// assert!(config.artifacts.enabled);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Configuration format version (e.g., `"1.0"`).
    pub version: String,
    pub database: DatabaseConfig,
    pub artifacts: ArtifactsConfig,
    /// Fixed entities excluded from listings.
    pub system_entities: Vec<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            database: DatabaseConfig::default(),
            artifacts: ArtifactsConfig::default(),
            system_entities: Vec::new(),
        }
    }
}

impl GeneratorConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::ArtifactError::IoError) if the file cannot
    /// be read, or [`YamlError`](crate::ArtifactError::YamlError) if parsing
    /// fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::ArtifactError::IoError) if the file cannot
    /// be written, or [`YamlError`](crate::ArtifactError::YamlError) if
    /// serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Returns `true` if `entity` is a fixed system entity.
    pub fn is_system_entity(&self, entity: &str) -> bool {
        self.system_entities.iter().any(|e| e == entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_yaml() -> &'static str {
        r#"
version: "1.0"
database:
  path: hr.db
  table_prefix: hr_
artifacts:
  output_dir: src/generated
  enabled: false
system_entities:
  - User
  - Application
  - Menu
  - Page
"#
    }

    #[test]
    fn test_deserialize_complete() {
        let config: GeneratorConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        assert_eq!(config.database.path, PathBuf::from("hr.db"));
        assert_eq!(config.database.table_prefix, "hr_");
        assert_eq!(config.artifacts.output_dir, PathBuf::from("src/generated"));
        assert!(!config.artifacts.enabled);
        assert_eq!(config.system_entities.len(), 4);
    }

    #[test]
    fn test_deserialize_partial_sections() {
        let config: GeneratorConfig =
            serde_yaml::from_str("database:\n  path: other.db\n").unwrap();
        assert_eq!(config.database.path, PathBuf::from("other.db"));
        assert_eq!(config.database.table_prefix, DEFAULT_TABLE_PREFIX);
        assert_eq!(config.artifacts, ArtifactsConfig::default());
        assert!(config.system_entities.is_empty());
    }

    #[test]
    fn test_is_system_entity() {
        let config: GeneratorConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        assert!(config.is_system_entity("Menu"));
        assert!(!config.is_system_entity("Employee"));
        assert!(!config.is_system_entity("menu"));
    }

    #[test]
    fn test_load_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entity-gen.yml");

        let original: GeneratorConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        original.save(&path).unwrap();

        assert_eq!(GeneratorConfig::load(&path).unwrap(), original);
    }
}
