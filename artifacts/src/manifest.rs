//! Manifest of the artifact files written for each entity.
//!
//! The manifest lives in the artifact output directory as
//! [`MANIFEST_FILE_NAME`] and records, per entity, every file that was
//! written together with its SHA-256 checksum. Before artifacts are
//! overwritten the recorded checksums are compared with the files on disk so
//! that manual edits can be reported instead of silently discarded.
//!
//! # Examples
//!
//! ```no_run
//! use entity_schema_artifacts::{ArtifactManifest, EntityArtifacts};
//!
//! let mut manifest = ArtifactManifest::load_or_new("generated/.entity-manifest.json").unwrap();
//! let mut entry = EntityArtifacts::new("employees", "employee");
//! entry.files.insert("employee/model.rs".into(), "abc123".into());
//! manifest.update_entry("Employee", entry);
//! manifest.save("generated/.entity-manifest.json").unwrap();
//! ```

use std::collections::BTreeMap;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::Result;

/// File name of the manifest inside the artifact output directory.
pub const MANIFEST_FILE_NAME: &str = ".entity-manifest.json";

/// Files written for one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityArtifacts {
    /// Physical table the artifacts were rendered against.
    pub table_name: String,
    /// Output subdirectory, relative to the manifest.
    pub module: String,
    /// RFC 3339 timestamp of the last write.
    pub generated_at: String,
    /// SHA-256 hex digest per file, keyed by path relative to the manifest.
    pub files: BTreeMap<String, String>,
}

impl EntityArtifacts {
    /// Creates an entry with no files, stamped with the current time.
    pub fn new(table_name: &str, module: &str) -> Self {
        Self {
            table_name: table_name.to_string(),
            module: module.to_string(),
            generated_at: now_rfc3339(),
            files: BTreeMap::new(),
        }
    }
}

/// Top-level artifact manifest.
///
/// Persisted as pretty-printed JSON in the artifact output directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    /// Definition format the artifacts were rendered from (mirrors
    /// [`entity_schema_core::DEFINITION_FORMAT_VERSION`]).
    pub format_version: String,
    /// Version of the generator that wrote the manifest.
    pub tool_version: String,
    /// RFC 3339 timestamp of the last manifest update.
    pub updated_at: String,
    /// Per-entity artifacts keyed by entity name.
    pub entities: BTreeMap<String, EntityArtifacts>,
}

impl Default for ArtifactManifest {
    fn default() -> Self {
        Self::new(env!("CARGO_PKG_VERSION"))
    }
}

impl ArtifactManifest {
    /// Creates an empty manifest.
    pub fn new(tool_version: &str) -> Self {
        Self {
            format_version: entity_schema_core::DEFINITION_FORMAT_VERSION.to_string(),
            tool_version: tool_version.to_string(),
            updated_at: now_rfc3339(),
            entities: BTreeMap::new(),
        }
    }

    /// Loads a manifest from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::ArtifactError::IoError) if the file cannot
    /// be read, or [`JsonError`](crate::ArtifactError::JsonError) if the
    /// content is not valid manifest JSON.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let manifest = serde_json::from_reader(reader)?;
        Ok(manifest)
    }

    /// Loads a manifest, or returns an empty one if the file does not exist.
    pub fn load_or_new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Saves the manifest as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Inserts or replaces the entry for `entity` and refreshes `updated_at`.
    pub fn update_entry(&mut self, entity: &str, artifacts: EntityArtifacts) {
        self.entities.insert(entity.to_string(), artifacts);
        self.updated_at = now_rfc3339();
    }

    /// Removes the entry for `entity`, returning it if present.
    pub fn remove_entry(&mut self, entity: &str) -> Option<EntityArtifacts> {
        let removed = self.entities.remove(entity);
        if removed.is_some() {
            self.updated_at = now_rfc3339();
        }
        removed
    }

    /// Looks up the entry for an entity.
    pub fn get(&self, entity: &str) -> Option<&EntityArtifacts> {
        self.entities.get(entity)
    }

    /// Returns `true` if the manifest has an entry for `entity`.
    pub fn contains(&self, entity: &str) -> bool {
        self.entities.contains_key(entity)
    }

    /// Computes the SHA-256 hex digest of a file.
    pub fn calculate_checksum(path: impl AsRef<Path>) -> Result<String> {
        let bytes = std::fs::read(path)?;
        Ok(checksum_bytes(&bytes))
    }

    /// Recorded files of `entity` whose content on disk no longer matches the
    /// recorded checksum.
    ///
    /// `root` is the directory holding the manifest. Files that were deleted
    /// from disk are not reported.
    pub fn modified_files(&self, root: &Path, entity: &str) -> Result<Vec<String>> {
        let Some(entry) = self.entities.get(entity) else {
            return Ok(Vec::new());
        };

        let mut modified = Vec::new();
        for (relative, recorded) in &entry.files {
            let path = root.join(relative);
            if !path.exists() {
                continue;
            }
            if Self::calculate_checksum(&path)? != *recorded {
                modified.push(relative.clone());
            }
        }
        Ok(modified)
    }
}

/// SHA-256 hex digest of in-memory content.
pub fn checksum_bytes(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_creation() {
        let m = ArtifactManifest::new("0.1.0");
        assert_eq!(
            m.format_version,
            entity_schema_core::DEFINITION_FORMAT_VERSION
        );
        assert_eq!(m.tool_version, "0.1.0");
        assert!(m.entities.is_empty());
        assert!(m.updated_at.ends_with('Z'));
    }

    #[test]
    fn test_checksum_bytes() {
        // SHA-256 of "hello world"
        assert_eq!(
            checksum_bytes(b"hello world"),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_load_or_new_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = ArtifactManifest::load_or_new(dir.path().join(MANIFEST_FILE_NAME)).unwrap();
        assert!(manifest.entities.is_empty());
    }

    #[test]
    fn test_load_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MANIFEST_FILE_NAME);

        let mut m = ArtifactManifest::new("0.1.0");
        let mut entry = EntityArtifacts::new("employees", "employee");
        entry
            .files
            .insert("employee/model.rs".to_string(), checksum_bytes(b"struct"));
        m.update_entry("Employee", entry);
        m.save(&path).unwrap();

        let loaded = ArtifactManifest::load(&path).unwrap();
        assert_eq!(loaded, m);
        assert!(loaded.contains("Employee"));
    }

    #[test]
    fn test_modified_files_detects_manual_edits() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("employee")).unwrap();
        std::fs::write(dir.path().join("employee/model.rs"), "edited by hand").unwrap();
        std::fs::write(dir.path().join("employee/dto.rs"), "dto").unwrap();

        let mut m = ArtifactManifest::new("0.1.0");
        let mut entry = EntityArtifacts::new("employees", "employee");
        entry
            .files
            .insert("employee/model.rs".to_string(), checksum_bytes(b"model"));
        entry
            .files
            .insert("employee/dto.rs".to_string(), checksum_bytes(b"dto"));
        entry
            .files
            .insert("employee/gone.rs".to_string(), checksum_bytes(b"gone"));
        m.update_entry("Employee", entry);

        let modified = m.modified_files(dir.path(), "Employee").unwrap();
        assert_eq!(modified, vec!["employee/model.rs".to_string()]);
        assert!(m.modified_files(dir.path(), "Skill").unwrap().is_empty());
    }

    #[test]
    fn test_remove_entry() {
        let mut m = ArtifactManifest::new("0.1.0");
        m.update_entry("Skill", EntityArtifacts::new("skills", "skill"));
        assert!(m.remove_entry("Skill").is_some());
        assert!(m.remove_entry("Skill").is_none());
        assert!(!m.contains("Skill"));
    }
}
