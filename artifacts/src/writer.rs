//! Writing rendered artifacts to the output directory.
//!
//! The writer keeps the [`ArtifactManifest`] in the output directory in step
//! with the files on disk: every write records fresh checksums, every removal
//! drops the entity's entry. Files edited by hand since the last write are
//! reported before being overwritten.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::Result;
use crate::manifest::{ArtifactManifest, EntityArtifacts, MANIFEST_FILE_NAME, checksum_bytes};
use crate::render::{RenderedArtifacts, module_name};

/// Result of [`ArtifactWriter::write`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteReport {
    /// Relative paths of the rendered files.
    pub files: Vec<String>,
    /// Files whose on-disk content had been edited since the last write.
    pub modified: Vec<String>,
    /// `false` when output is disabled and nothing was written.
    pub written: bool,
}

/// Writes artifacts under an output directory.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    output_dir: PathBuf,
    enabled: bool,
}

impl ArtifactWriter {
    /// Creates a writer for `output_dir`. A disabled writer touches nothing.
    pub fn new(output_dir: impl Into<PathBuf>, enabled: bool) -> Self {
        Self {
            output_dir: output_dir.into(),
            enabled,
        }
    }

    /// Root output directory.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Returns `true` if artifacts are written to disk.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Path of the manifest file.
    pub fn manifest_path(&self) -> PathBuf {
        self.output_dir.join(MANIFEST_FILE_NAME)
    }

    /// Loads the manifest, or an empty one if none has been written yet.
    pub fn manifest(&self) -> Result<ArtifactManifest> {
        ArtifactManifest::load_or_new(self.manifest_path())
    }

    /// Writes every rendered file and records it in the manifest.
    ///
    /// # Errors
    ///
    /// Any I/O failure is returned as
    /// [`IoError`](crate::ArtifactError::IoError); files written before the
    /// failure are left in place.
    pub fn write(&self, rendered: &RenderedArtifacts) -> Result<WriteReport> {
        let files = rendered.paths();
        if !self.enabled {
            debug!(entity = %rendered.entity, "artifact output disabled, skipping write");
            return Ok(WriteReport {
                files,
                modified: Vec::new(),
                written: false,
            });
        }

        let mut manifest = self.manifest()?;
        let modified = manifest.modified_files(&self.output_dir, &rendered.entity)?;
        for path in &modified {
            warn!(entity = %rendered.entity, path = %path, "overwriting manually modified artifact");
        }

        std::fs::create_dir_all(self.output_dir.join(&rendered.module))?;
        let mut entry = EntityArtifacts::new(&rendered.table_name, &rendered.module);
        for file in &rendered.files {
            std::fs::write(self.output_dir.join(&file.path), &file.contents)?;
            entry
                .files
                .insert(file.path.clone(), checksum_bytes(file.contents.as_bytes()));
        }

        manifest.update_entry(&rendered.entity, entry);
        manifest.save(self.manifest_path())?;

        debug!(entity = %rendered.entity, count = files.len(), "artifacts written");
        Ok(WriteReport {
            files,
            modified,
            written: true,
        })
    }

    /// Removes an entity's artifact directory and manifest entry.
    ///
    /// Missing directories are not an error.
    pub fn remove(&self, entity: &str) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let mut manifest = self.manifest()?;
        let module = manifest
            .remove_entry(entity)
            .map(|entry| entry.module)
            .unwrap_or_else(|| module_name(entity));
        self.remove_dir(&module)?;

        if self.manifest_path().exists() {
            manifest.save(self.manifest_path())?;
        }
        debug!(entity = %entity, "artifacts removed");
        Ok(())
    }

    fn remove_dir(&self, module: &str) -> Result<()> {
        let dir = self.output_dir.join(module);
        if dir.exists() {
            std::fs::remove_dir_all(dir)?;
        }
        Ok(())
    }
}
