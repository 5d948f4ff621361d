//! The generation orchestrator.
//!
//! [`EntityGenerator`] sequences the registry, the schema synchronizer, the
//! artifact writer and the relation maintainer for `generate`, `update` and
//! `delete`, and owns the failure policy:
//!
//! - validation, conflicts and unknown entities are rejected before any side
//!   effect;
//! - DDL and artifact I/O failures abort the operation without committing
//!   the definition;
//! - relation targets that are not registered only produce warnings.
//!
//! Every mutation holds the [`GenerationGate`] and walks through the
//! [`Phase`]s, which are logged and observable through
//! [`EntityGenerator::phase`].
//!
//! # Example
//!
//! ```no_run
//! use entity_schema_artifacts::ArtifactWriter;
//! use entity_schema_core::{EntityDefinition, FieldDefinition, RelationSpec, ScalarType};
//! use entity_schema_sqlite::{EntityGenerator, GenerateOptions};
//! use rusqlite::Connection;
//!
//! let conn = Connection::open("entities.db").unwrap();
//! let mut generator =
//!     EntityGenerator::new(conn, "eg_", ArtifactWriter::new("generated", true)).unwrap();
//!
//! let skill = EntityDefinition::new("Skill", "skills")
//!     .with_field(FieldDefinition::scalar("title", ScalarType::String));
//! generator.generate(skill, GenerateOptions::default()).unwrap();
//!
//! let employee = EntityDefinition::new("Employee", "employees")
//!     .with_field(FieldDefinition::scalar("name", ScalarType::String))
//!     .with_field(FieldDefinition::relation(
//!         "skills",
//!         RelationSpec::many_to_many("Skill", "skills"),
//!     ));
//! let result = generator.generate(employee, GenerateOptions::default()).unwrap();
//! println!("{}: {:?}", result.message, result.files);
//!
//! // The maintainer wrote the inverse side.
//! assert!(generator.get("Skill").unwrap().has_field("employees"));
//! ```

use std::cell::Cell;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::PathBuf;

use entity_schema_artifacts::{ArtifactRenderer, ArtifactWriter, DefinitionSet, GeneratorConfig};
use entity_schema_core::relations::{self, InverseEdit};
use entity_schema_core::{
    EntityDefinition, EntityInput, EntitySummary, FieldDefinition, IncomingRelation,
    carry_over_join_sides, diff_fields, naming, validate_definition,
};
use rusqlite::Connection;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::ddl;
use crate::error::{GenerationWarning, GeneratorError, Result};
use crate::gate::GenerationGate;
use crate::maintainer::{MaintenanceReport, RelationMaintainer, merge_reports};
use crate::schema::validate_prefix;
use crate::store::{Registry, RegistryStatus};
use crate::synchronizer::{ExistingTable, SchemaSynchronizer};

/// Step of a generation operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    #[default]
    Idle,
    Validating,
    SyncingSchema,
    WritingArtifacts,
    ReconcilingRelations,
    Committing,
    /// The last operation failed; cleared when the next one starts.
    Failed,
}

impl Phase {
    /// Returns the phase name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Validating => "validating",
            Phase::SyncingSchema => "syncing-schema",
            Phase::WritingArtifacts => "writing-artifacts",
            Phase::ReconcilingRelations => "reconciling-relations",
            Phase::Committing => "committing",
            Phase::Failed => "failed",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for [`EntityGenerator::generate`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Keep a physical table that already exists instead of failing with
    /// [`GeneratorError::Conflict`]. Used to resume after a partial failure.
    pub adopt_existing_table: bool,
}

/// Result of a successful `generate` or `update`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedEntity {
    pub message: String,
    /// Entity name.
    pub entity: String,
    /// Artifact paths relative to the output directory.
    pub files: Vec<String>,
    /// Other entities whose definitions were edited to keep relations
    /// consistent.
    pub updated_entities: Vec<String>,
    pub warnings: Vec<GenerationWarning>,
}

/// Result of a successful `delete`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletedEntity {
    pub message: String,
    pub entity: String,
    /// Whether the physical table was dropped.
    pub table_dropped: bool,
    /// Other entities whose definitions were edited.
    pub updated_entities: Vec<String>,
}

/// What [`EntityGenerator::plan`] would do with a definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlanAction {
    /// Not registered yet; the table would be created.
    Create,
    /// Registered under the same name and table; altered in place.
    Alter,
    /// Registered under a different name or table; deleted and regenerated.
    Recreate,
}

/// Dry-run result of [`EntityGenerator::plan`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationPlan {
    pub entity: String,
    pub table_name: String,
    pub action: PlanAction,
    /// DDL in execution order.
    pub statements: Vec<String>,
    /// Cross-entity edits the maintainer would apply.
    pub relation_edits: Vec<InverseEdit>,
    pub warnings: Vec<GenerationWarning>,
}

/// Snapshot returned by [`EntityGenerator::status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratorStatus {
    pub registry: RegistryStatus,
    pub phase: Phase,
    pub generation_active: bool,
    pub output_dir: PathBuf,
    pub artifacts_enabled: bool,
}

/// Façade over the registry, synchronizer, maintainer and artifact writer.
pub struct EntityGenerator {
    conn: Connection,
    prefix: String,
    renderer: ArtifactRenderer,
    writer: ArtifactWriter,
    system_entities: Vec<String>,
    gate: GenerationGate,
    phase: Cell<Phase>,
}

impl EntityGenerator {
    /// Creates a generator and makes sure the registry tables exist.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::InvalidPrefix`] if the prefix is invalid,
    /// or a database error if the registry cannot be created.
    pub fn new(conn: Connection, prefix: impl Into<String>, writer: ArtifactWriter) -> Result<Self> {
        let prefix = prefix.into();
        validate_prefix(&prefix)?;
        Registry::new(&conn, prefix.as_str())?.up()?;

        Ok(Self {
            conn,
            prefix,
            renderer: ArtifactRenderer::new()?,
            writer,
            system_entities: Vec::new(),
            gate: GenerationGate::new(),
            phase: Cell::new(Phase::Idle),
        })
    }

    /// Opens the configured database and artifact directory.
    pub fn from_config(config: &GeneratorConfig) -> Result<Self> {
        let conn = Connection::open(&config.database.path)?;
        let writer = ArtifactWriter::new(&config.artifacts.output_dir, config.artifacts.enabled);
        Ok(Self::new(conn, config.database.table_prefix.as_str(), writer)?
            .with_system_entities(config.system_entities.clone()))
    }

    /// Sets the fixed entities excluded from [`list`](Self::list).
    pub fn with_system_entities(mut self, names: Vec<String>) -> Self {
        self.system_entities = names;
        self
    }

    /// Shares an externally created gate, e.g. one a file watcher observes.
    pub fn with_gate(mut self, gate: GenerationGate) -> Self {
        self.gate = gate;
        self
    }

    /// The gate held during mutations.
    pub fn gate(&self) -> &GenerationGate {
        &self.gate
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase.get()
    }

    /// Returns the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Returns the registry.
    pub fn registry(&self) -> Registry<'_> {
        Registry::from_validated(&self.conn, &self.prefix)
    }

    fn synchronizer(&self) -> SchemaSynchronizer<'_> {
        SchemaSynchronizer::new(&self.conn)
    }

    fn maintainer(&self) -> RelationMaintainer<'_> {
        RelationMaintainer::new(self.registry())
    }

    /// Normalizes a wire definition, resolving relation target tables
    /// against the registry.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::InvalidDefinition`] for unknown scalar or
    /// relation types and misplaced `onDelete` actions.
    pub fn normalize(&self, input: &EntityInput) -> Result<EntityDefinition> {
        let mut tables: HashMap<String, String> = self
            .registry()
            .list()?
            .into_iter()
            .map(|s| (s.name, s.table_name))
            .collect();
        let own_table = input
            .table_name
            .clone()
            .unwrap_or_else(|| naming::entity_to_table(&input.name));
        tables.insert(input.name.clone(), own_table);

        input
            .normalize(|target| tables.get(target).cloned())
            .map_err(|e| GeneratorError::invalid(&input.name, e))
    }

    /// Generates a new entity: table, artifacts, inverse relations and the
    /// registry entry.
    pub fn generate(
        &mut self,
        def: EntityDefinition,
        options: GenerateOptions,
    ) -> Result<GeneratedEntity> {
        let name = def.name.clone();
        self.guarded("generate", &name, |g| g.generate_inner(def, options))
    }

    /// Replaces the definition of `name`.
    ///
    /// With the same name and table, the table is altered in place by the
    /// field diff. Otherwise the old entity is deleted and the new one
    /// generated.
    pub fn update(&mut self, name: &str, def: EntityDefinition) -> Result<GeneratedEntity> {
        self.guarded("update", name, |g| g.update_inner(name, def))
    }

    /// Deletes an entity, its relations on other entities, its artifacts
    /// and, when `drop_table` is set, its table and junctions.
    pub fn delete(&mut self, name: &str, drop_table: bool) -> Result<DeletedEntity> {
        self.guarded("delete", name, |g| g.delete_inner(name, drop_table))
    }

    /// Generates or updates every definition in `set`, relation targets
    /// first.
    ///
    /// Stops at the first failure; entities processed before it stay
    /// committed.
    pub fn apply(&mut self, set: &DefinitionSet) -> Result<Vec<GeneratedEntity>> {
        self.guarded("apply", "*", |g| {
            let mut results = Vec::with_capacity(set.len());
            for input in set.dependency_order() {
                let def = g.normalize(input)?;
                let result = if g.registry().contains(&input.name)? {
                    g.update_inner(&input.name, def)?
                } else {
                    g.generate_inner(def, GenerateOptions::default())?
                };
                results.push(result);
            }
            Ok(results)
        })
    }

    /// Loads a definition.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::NotFound`] if no such entity is registered.
    pub fn get(&self, name: &str) -> Result<EntityDefinition> {
        self.registry()
            .get(name)?
            .ok_or_else(|| GeneratorError::NotFound(name.to_string()))
    }

    /// Summaries of the registered entities, excluding system entities.
    pub fn list(&self) -> Result<Vec<EntitySummary>> {
        Ok(self
            .registry()
            .list()?
            .into_iter()
            .filter(|s| !self.system_entities.contains(&s.name))
            .collect())
    }

    /// Relations on other entities that point at `name`.
    pub fn incoming(&self, name: &str) -> Result<Vec<IncomingRelation>> {
        self.registry().list_incoming(name)
    }

    /// Validates `def` and returns the DDL and relation edits that
    /// generating (or updating) it would perform, without side effects.
    pub fn plan(&self, def: &EntityDefinition) -> Result<GenerationPlan> {
        self.validate(def)?;
        let registry = self.registry();
        let warnings = self.unresolved_targets(def)?;

        let Some(old) = registry.get(&def.name)? else {
            if let Some(owner) = registry.table_owner(&def.table_name)? {
                return Err(table_conflict(&def.table_name, &owner));
            }
            return Ok(GenerationPlan {
                entity: def.name.clone(),
                table_name: def.table_name.clone(),
                action: PlanAction::Create,
                statements: ddl::plan_create_table(def).statements(),
                relation_edits: relations::plan_add_inverses(def, &def.fields)
                    .into_iter()
                    .chain(relations::plan_incoming_inverses(def, &registry.all()?))
                    .collect(),
                warnings,
            });
        };

        if old.table_name != def.table_name {
            let others = registry.all()?;
            let mut statements =
                ddl::plan_drop_table(&old.table_name, &relations::owned_junctions(&old));
            statements.extend(ddl::plan_create_table(def).statements());
            let mut relation_edits = relations::plan_delete_cleanup(&old, &others);
            relation_edits.extend(relations::plan_add_inverses(def, &def.fields));
            return Ok(GenerationPlan {
                entity: def.name.clone(),
                table_name: def.table_name.clone(),
                action: PlanAction::Recreate,
                statements,
                relation_edits,
                warnings,
            });
        }

        let mut new = def.clone();
        self.prepare_update(&old, &mut new)?;
        let diff = diff_fields(&old.fields, &new.fields);
        let orphaned = relations::plan_orphaned_junctions(&old.table_name, &old.fields, &new.fields);

        let mut statements = ddl::plan_alter_table(&new.table_name, &diff.added, &diff.removed);
        statements.extend(orphaned.iter().filter_map(|edit| match edit {
            InverseEdit::DropJunction { table } => Some(format!("DROP TABLE IF EXISTS {table}")),
            _ => None,
        }));
        let mut relation_edits = relations::plan_remove_inverses(&new, &diff.removed);
        relation_edits.extend(relations::plan_add_inverses(&new, &diff.added));

        Ok(GenerationPlan {
            entity: new.name.clone(),
            table_name: new.table_name.clone(),
            action: PlanAction::Alter,
            statements,
            relation_edits,
            warnings,
        })
    }

    /// Returns a snapshot of the registry and generator state.
    pub fn status(&self) -> Result<GeneratorStatus> {
        Ok(GeneratorStatus {
            registry: self.registry().status()?,
            phase: self.phase(),
            generation_active: self.gate.is_active(),
            output_dir: self.writer.output_dir().to_path_buf(),
            artifacts_enabled: self.writer.is_enabled(),
        })
    }

    fn guarded<T>(
        &self,
        operation: &str,
        entity: &str,
        op: impl FnOnce(&Self) -> Result<T>,
    ) -> Result<T> {
        let _guard = self.gate.acquire()?;
        info!(operation, entity = %entity, "generation started");
        let result = op(self);
        match &result {
            Ok(_) => {
                self.enter(Phase::Idle);
                info!(operation, entity = %entity, "generation finished");
            }
            Err(err) => {
                self.enter(Phase::Failed);
                warn!(operation, entity = %entity, error = %err, "generation failed");
            }
        }
        result
    }

    fn enter(&self, phase: Phase) {
        debug!(from = %self.phase.get(), to = %phase, "phase transition");
        self.phase.set(phase);
    }

    fn generate_inner(
        &self,
        mut def: EntityDefinition,
        options: GenerateOptions,
    ) -> Result<GeneratedEntity> {
        self.enter(Phase::Validating);
        self.validate(&def)?;
        let registry = self.registry();
        if registry.contains(&def.name)? {
            return Err(GeneratorError::Conflict(format!(
                "entity '{}' already exists",
                def.name
            )));
        }
        if let Some(owner) = registry.table_owner(&def.table_name)? {
            return Err(table_conflict(&def.table_name, &owner));
        }
        if !options.adopt_existing_table && self.synchronizer().table_exists(&def.table_name)? {
            return Err(GeneratorError::Conflict(format!(
                "table '{}' already exists",
                def.table_name
            )));
        }
        let mut warnings = self.unresolved_targets(&def)?;

        self.enter(Phase::SyncingSchema);
        let existing = if options.adopt_existing_table {
            ExistingTable::Adopt
        } else {
            ExistingTable::Reject
        };
        self.synchronizer().create_table(&def, existing)?;

        self.enter(Phase::WritingArtifacts);
        let mut files = self.write_artifacts(&def, &mut warnings)?;

        self.enter(Phase::ReconcilingRelations);
        let fields = def.fields.clone();
        let maintainer = self.maintainer();
        let report = merge_reports([
            maintainer.add_inverses(&mut def, &fields)?,
            maintainer.add_incoming_inverses(&mut def)?,
        ]);
        if report.local_changed {
            files = self.write_artifacts(&def, &mut warnings)?;
        }
        for warning in &report.warnings {
            push_warning(&mut warnings, warning.clone());
        }
        let updated_entities = self.refresh_edited(&report, &def.name, &mut warnings)?;

        self.enter(Phase::Committing);
        registry.put(&def)?;

        Ok(GeneratedEntity {
            message: format!("Entity '{}' generated successfully", def.name),
            entity: def.name,
            files,
            updated_entities,
            warnings,
        })
    }

    fn update_inner(&self, name: &str, mut def: EntityDefinition) -> Result<GeneratedEntity> {
        self.enter(Phase::Validating);
        let registry = self.registry();
        let old = registry
            .get(name)?
            .ok_or_else(|| GeneratorError::NotFound(name.to_string()))?;
        self.validate(&def)?;

        if def.name != old.name || def.table_name != old.table_name {
            if def.name != old.name && registry.contains(&def.name)? {
                return Err(GeneratorError::Conflict(format!(
                    "entity '{}' already exists",
                    def.name
                )));
            }
            if let Some(owner) = registry.table_owner(&def.table_name)? {
                if owner != old.name {
                    return Err(table_conflict(&def.table_name, &owner));
                }
            }
            if def.table_name != old.table_name
                && self.synchronizer().table_exists(&def.table_name)?
            {
                return Err(GeneratorError::Conflict(format!(
                    "table '{}' already exists",
                    def.table_name
                )));
            }
            info!(from = %old.name, to = %def.name, "name or table changed, recreating entity");
            let dropped = self.authored_relations_to(&old.name)?;
            self.delete_inner(name, true)?;
            let mut result = self.generate_inner(def, GenerateOptions::default())?;
            result.message = format!("Entity '{}' updated successfully", result.entity);
            for warning in dropped {
                push_warning(&mut result.warnings, warning);
            }
            return Ok(result);
        }

        self.prepare_update(&old, &mut def)?;
        let diff = diff_fields(&old.fields, &def.fields);
        let mut warnings = self.unresolved_targets(&def)?;
        debug!(
            entity = %name,
            added = diff.added.len(),
            removed = diff.removed.len(),
            "field diff"
        );

        self.enter(Phase::SyncingSchema);
        self.synchronizer()
            .alter_table(&def.table_name, &diff.added, &diff.removed)?;

        self.enter(Phase::WritingArtifacts);
        let mut files = self.write_artifacts(&def, &mut warnings)?;

        self.enter(Phase::ReconcilingRelations);
        let maintainer = self.maintainer();
        let report = merge_reports([
            maintainer.remove_inverses(&mut def, &diff.removed)?,
            maintainer.add_inverses(&mut def, &diff.added)?,
            maintainer.cleanup_orphaned_junctions(&def.table_name, &old.fields, &def.fields)?,
        ]);
        if report.local_changed {
            files = self.write_artifacts(&def, &mut warnings)?;
        }
        for warning in &report.warnings {
            push_warning(&mut warnings, warning.clone());
        }
        let updated_entities = self.refresh_edited(&report, &def.name, &mut warnings)?;

        self.enter(Phase::Committing);
        registry.put(&def)?;

        Ok(GeneratedEntity {
            message: format!("Entity '{}' updated successfully", def.name),
            entity: def.name,
            files,
            updated_entities,
            warnings,
        })
    }

    /// Owning relations declared by other entities that target `name`.
    /// Deleting `name` strips them, and recreating it does not restore them.
    fn authored_relations_to(&self, name: &str) -> Result<Vec<GenerationWarning>> {
        let mut dropped = Vec::new();
        for other in self.registry().all()? {
            if other.name == name {
                continue;
            }
            for field in &other.fields {
                if field.as_relation().is_some_and(|r| r.target == name && r.kind.is_owning()) {
                    warn!(entity = %other.name, field = %field.name, "relation dropped with recreated target");
                    dropped.push(GenerationWarning::RelationDropped {
                        entity: other.name.clone(),
                        field: field.name.clone(),
                    });
                }
            }
        }
        Ok(dropped)
    }

    fn delete_inner(&self, name: &str, drop_table: bool) -> Result<DeletedEntity> {
        self.enter(Phase::Validating);
        let registry = self.registry();
        let old = registry
            .get(name)?
            .ok_or_else(|| GeneratorError::NotFound(name.to_string()))?;

        self.enter(Phase::ReconcilingRelations);
        let report = self.maintainer().cleanup_on_delete(&old)?;
        let mut warnings = Vec::new();
        let updated_entities = self.refresh_edited(&report, &old.name, &mut warnings)?;

        if drop_table {
            self.enter(Phase::SyncingSchema);
            self.synchronizer()
                .drop_table(&old.table_name, &relations::owned_junctions(&old))?;
        }

        self.enter(Phase::WritingArtifacts);
        self.writer.remove(&old.name)?;

        self.enter(Phase::Committing);
        registry.remove(&old.name)?;

        Ok(DeletedEntity {
            message: format!("Entity '{}' deleted successfully", old.name),
            entity: old.name,
            table_dropped: drop_table,
            updated_entities,
        })
    }

    fn validate(&self, def: &EntityDefinition) -> Result<()> {
        let errors = validate_definition(def);
        if errors.is_empty() {
            return Ok(());
        }
        Err(GeneratorError::InvalidDefinition {
            entity: def.name.clone(),
            errors,
        })
    }

    /// Restores what a resubmitted definition cannot express: the stored
    /// join sides of unchanged relations, and the inverse fields the
    /// maintainer wrote for relations that still exist.
    fn prepare_update(&self, old: &EntityDefinition, new: &mut EntityDefinition) -> Result<()> {
        carry_over_join_sides(&old.fields, &mut new.fields);

        let mut kept = Vec::new();
        for field in &old.fields {
            if new.has_field(&field.name) {
                continue;
            }
            let Some(relation) = field.as_relation() else {
                continue;
            };
            let Some(mirror) = relation.inverse_name.as_deref() else {
                continue;
            };
            if relation.kind.is_owning() {
                continue;
            }
            let owner = if relation.target == old.name {
                Some(new.clone())
            } else {
                self.registry().get(&relation.target)?
            };
            let still_owned = owner
                .as_ref()
                .and_then(|o| o.find_field(mirror))
                .and_then(FieldDefinition::as_relation)
                .is_some_and(|r| r.kind.is_owning() && r.target == old.name);
            if still_owned {
                kept.push(field.clone());
            }
        }
        new.fields.extend(kept);
        Ok(())
    }

    fn unresolved_targets(&self, def: &EntityDefinition) -> Result<Vec<GenerationWarning>> {
        let registry = self.registry();
        let mut warnings = Vec::new();
        for (field, relation) in def.relation_fields() {
            if relation.target == def.name || registry.contains(&relation.target)? {
                continue;
            }
            warn!(
                entity = %def.name,
                field = %field.name,
                target = %relation.target,
                "relation target not registered"
            );
            push_warning(
                &mut warnings,
                GenerationWarning::RelationTargetUnresolved {
                    field: field.name.clone(),
                    target: relation.target.clone(),
                },
            );
        }
        Ok(warnings)
    }

    fn write_artifacts(
        &self,
        def: &EntityDefinition,
        warnings: &mut Vec<GenerationWarning>,
    ) -> Result<Vec<String>> {
        let rendered = self.renderer.render(def)?;
        let report = self.writer.write(&rendered)?;
        for path in report.modified {
            push_warning(warnings, GenerationWarning::ArtifactModified { path });
        }
        Ok(report.files)
    }

    /// Re-renders the artifacts of entities the maintainer edited.
    fn refresh_edited(
        &self,
        report: &MaintenanceReport,
        skip: &str,
        warnings: &mut Vec<GenerationWarning>,
    ) -> Result<Vec<String>> {
        let registry = self.registry();
        let mut updated = BTreeSet::new();
        for name in report.edited.iter().filter(|n| n.as_str() != skip) {
            if let Some(def) = registry.get(name)? {
                self.write_artifacts(&def, warnings)?;
                updated.insert(name.clone());
            }
        }
        Ok(updated.into_iter().collect())
    }
}

fn table_conflict(table: &str, owner: &str) -> GeneratorError {
    GeneratorError::Conflict(format!("table '{table}' is already used by entity '{owner}'"))
}

fn push_warning(warnings: &mut Vec<GenerationWarning>, warning: GenerationWarning) {
    if !warnings.contains(&warning) {
        warnings.push(warning);
    }
}
