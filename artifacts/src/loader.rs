//! Loading entity definitions from disk.
//!
//! Definitions are written in the wire shape ([`EntityInput`]) as JSON or
//! YAML. A file holds either a single definition or a list of them.
//! [`DefinitionSet`] collects them by entity name and can order them so that
//! relation targets are applied before the entities that point at them.
//!
//! ```no_run
//! use entity_schema_artifacts::DefinitionSet;
//!
//! let set = DefinitionSet::from_dir("definitions/").unwrap();
//! for input in set.dependency_order() {
//!     println!("{}", input.name);
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use entity_schema_core::EntityInput;
use serde::Deserialize;

use crate::error::{ArtifactError, Result};

#[derive(Deserialize)]
#[serde(untagged)]
enum DefinitionFile {
    Many(Vec<EntityInput>),
    One(Box<EntityInput>),
}

/// Definitions keyed by entity name.
#[derive(Debug, Clone, Default)]
pub struct DefinitionSet {
    inputs: BTreeMap<String, EntityInput>,
}

impl DefinitionSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every `*.json`, `*.yaml` and `*.yml` file in a directory.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::IoError`] if the directory cannot be read,
    /// [`ArtifactError::InvalidDefinitionFile`] if a file cannot be parsed, or
    /// [`ArtifactError::DuplicateDefinition`] if two files declare the same
    /// entity.
    pub fn from_dir(path: impl AsRef<Path>) -> Result<Self> {
        let mut paths: Vec<_> = std::fs::read_dir(path.as_ref())?
            .collect::<std::io::Result<Vec<_>>>()?
            .into_iter()
            .map(|entry| entry.path())
            .filter(|p| matches!(extension(p), Some("json" | "yaml" | "yml")))
            .collect();
        paths.sort();

        let mut set = Self::new();
        for file in paths {
            set.load_file(&file)?;
        }
        Ok(set)
    }

    /// Loads a single definition file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let mut set = Self::new();
        set.load_file(path.as_ref())?;
        Ok(set)
    }

    fn load_file(&mut self, path: &Path) -> Result<()> {
        let text = std::fs::read_to_string(path)?;
        let parsed: std::result::Result<DefinitionFile, String> = match extension(path) {
            Some("yaml" | "yml") => serde_yaml::from_str(&text).map_err(|e| e.to_string()),
            _ => serde_json::from_str(&text).map_err(|e| e.to_string()),
        };
        let parsed = parsed.map_err(|message| ArtifactError::InvalidDefinitionFile {
            path: path.to_path_buf(),
            message,
        })?;

        let inputs = match parsed {
            DefinitionFile::Many(inputs) => inputs,
            DefinitionFile::One(input) => vec![*input],
        };
        for input in inputs {
            self.insert(input)?;
        }
        Ok(())
    }

    /// Adds a definition, rejecting a second one with the same name.
    pub fn insert(&mut self, input: EntityInput) -> Result<()> {
        if self.inputs.contains_key(&input.name) {
            return Err(ArtifactError::DuplicateDefinition(input.name));
        }
        self.inputs.insert(input.name.clone(), input);
        Ok(())
    }

    /// Looks up a definition by entity name.
    pub fn get(&self, name: &str) -> Option<&EntityInput> {
        self.inputs.get(name)
    }

    /// Returns `true` if the set contains `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.inputs.contains_key(name)
    }

    /// Returns the number of definitions.
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    /// Returns `true` if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Entity names in alphabetical order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.inputs.keys().map(|s| s.as_str())
    }

    /// Definitions ordered so that relation targets in the set come first.
    ///
    /// Self-references and targets outside the set are ignored. Entities on
    /// a relation cycle are emitted alphabetically once nothing else can be
    /// placed.
    pub fn dependency_order(&self) -> Vec<&EntityInput> {
        let mut pending: BTreeMap<&str, BTreeSet<&str>> = self
            .inputs
            .values()
            .map(|input| {
                let deps = input
                    .fields
                    .iter()
                    .filter_map(|f| f.relation.as_ref())
                    .map(|r| r.target.as_str())
                    .filter(|t| *t != input.name && self.inputs.contains_key(*t))
                    .collect();
                (input.name.as_str(), deps)
            })
            .collect();

        let mut ordered = Vec::with_capacity(pending.len());
        while !pending.is_empty() {
            let ready = pending
                .iter()
                .find(|(_, deps)| deps.is_empty())
                .or_else(|| pending.iter().next())
                .map(|(name, _)| *name);
            let Some(name) = ready else { break };

            pending.remove(name);
            for deps in pending.values_mut() {
                deps.remove(name);
            }
            if let Some(input) = self.inputs.get(name) {
                ordered.push(input);
            }
        }
        ordered
    }
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|e| e.to_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, contents: &str) {
        std::fs::write(dir.join(name), contents).unwrap();
    }

    #[test]
    fn test_from_dir_reads_json_and_yaml() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "employee.json",
            r#"{"name": "Employee", "fields": [{"name": "name", "type": "string"}]}"#,
        );
        write(
            dir.path(),
            "catalog.yaml",
            "- name: Skill\n  fields:\n    - name: title\n      type: string\n- name: Department\n",
        );
        write(dir.path(), "notes.txt", "ignored");

        let set = DefinitionSet::from_dir(dir.path()).unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.names().collect::<Vec<_>>(), vec!["Department", "Employee", "Skill"]);
        assert_eq!(set.get("Skill").unwrap().fields[0].name, "title");
    }

    #[test]
    fn test_invalid_file_names_path() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "broken.json", "{not json");

        let err = DefinitionSet::from_dir(dir.path()).unwrap_err();
        match err {
            ArtifactError::InvalidDefinitionFile { path, .. } => {
                assert!(path.ends_with("broken.json"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_definition_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.json", r#"{"name": "Skill"}"#);
        write(dir.path(), "b.json", r#"{"name": "Skill"}"#);

        assert!(matches!(
            DefinitionSet::from_dir(dir.path()),
            Err(ArtifactError::DuplicateDefinition(name)) if name == "Skill"
        ));
    }

    #[test]
    fn test_dependency_order_places_targets_first() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "defs.json",
            r#"[
                {"name": "Assignment", "fields": [
                    {"name": "employee", "relation": {"type": "many-to-one", "target": "Employee"}},
                    {"name": "project", "relation": {"type": "many-to-one", "target": "Project"}}
                ]},
                {"name": "Employee", "fields": [
                    {"name": "manager", "relation": {"type": "many-to-one", "target": "Employee"}},
                    {"name": "skills", "relation": {"type": "many-to-many", "target": "Skill"}},
                    {"name": "badge", "relation": {"type": "one-to-one", "target": "Badge"}}
                ]},
                {"name": "Project"},
                {"name": "Skill"}
            ]"#,
        );

        let set = DefinitionSet::from_dir(dir.path()).unwrap();
        let order: Vec<&str> = set.dependency_order().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(order, vec!["Project", "Skill", "Employee", "Assignment"]);
    }

    #[test]
    fn test_dependency_order_breaks_cycles() {
        let mut set = DefinitionSet::new();
        for (name, target) in [("Alpha", "Beta"), ("Beta", "Alpha")] {
            let input: EntityInput = serde_json::from_value(serde_json::json!({
                "name": name,
                "fields": [{"name": "peer", "relation": {"type": "many-to-one", "target": target}}]
            }))
            .unwrap();
            set.insert(input).unwrap();
        }

        let order: Vec<&str> = set.dependency_order().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(order, vec!["Alpha", "Beta"]);
    }
}
