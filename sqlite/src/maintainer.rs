//! Keeping bidirectional relations consistent across stored entities.
//!
//! The planning half lives in [`entity_schema_core::relations`]; this module
//! applies the planned [`InverseEdit`]s one at a time against the registry
//! and the database. Each edit is idempotent, so re-running an operation
//! after a partial failure converges on the same state.

use std::collections::BTreeSet;

use entity_schema_core::relations::{self, EditOutcome, InverseEdit};
use entity_schema_core::{EntityDefinition, FieldDefinition};
use tracing::{debug, info, warn};

use crate::error::{GenerationWarning, Result};
use crate::store::Registry;
use crate::synchronizer::SchemaSynchronizer;

/// Outcome of applying a batch of edits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaintenanceReport {
    /// Stored entities whose definitions changed.
    pub edited: BTreeSet<String>,
    /// Whether the in-memory definition passed to the call changed.
    pub local_changed: bool,
    /// Non-fatal conditions met along the way.
    pub warnings: Vec<GenerationWarning>,
}

impl MaintenanceReport {
    fn merge(&mut self, other: MaintenanceReport) {
        self.edited.extend(other.edited);
        self.local_changed |= other.local_changed;
        for warning in other.warnings {
            self.warn(warning);
        }
    }

    fn warn(&mut self, warning: GenerationWarning) {
        if !self.warnings.contains(&warning) {
            self.warnings.push(warning);
        }
    }

    fn note_collision(&mut self, edit: &InverseEdit, outcome: EditOutcome) {
        if let (InverseEdit::AddField { entity, field }, EditOutcome::Collision) = (edit, outcome) {
            self.warn(GenerationWarning::InverseNameTaken {
                entity: entity.clone(),
                field: field.name.clone(),
                source_field: declaring_field(field),
            });
        }
    }
}

/// Applies inverse-field and storage edits.
pub struct RelationMaintainer<'a> {
    registry: Registry<'a>,
    sync: SchemaSynchronizer<'a>,
}

impl<'a> RelationMaintainer<'a> {
    /// Creates a maintainer writing through `registry` and its connection.
    pub fn new(registry: Registry<'a>) -> Self {
        let sync = SchemaSynchronizer::new(registry.connection());
        Self { registry, sync }
    }

    /// Adds the inverses of `fields`, declared on `source`.
    ///
    /// Inverses addressed to `source` itself (self-references) are applied
    /// to `source` in memory; the caller stores it.
    pub fn add_inverses(
        &self,
        source: &mut EntityDefinition,
        fields: &[FieldDefinition],
    ) -> Result<MaintenanceReport> {
        let edits = relations::plan_add_inverses(source, fields);
        self.apply(&edits, Some(source))
    }

    /// Adds to `target` the inverses of relations stored entities declared
    /// before `target` existed. `target` is changed in memory only.
    pub fn add_incoming_inverses(&self, target: &mut EntityDefinition) -> Result<MaintenanceReport> {
        let others = self.registry.all()?;
        let edits = relations::plan_incoming_inverses(target, &others);
        if !edits.is_empty() {
            info!(entity = %target.name, edits = edits.len(), "restoring inverses of earlier relations");
        }
        self.apply(&edits, Some(target))
    }

    /// Removes the inverses of `fields`, which were removed from `source`.
    pub fn remove_inverses(
        &self,
        source: &mut EntityDefinition,
        fields: &[FieldDefinition],
    ) -> Result<MaintenanceReport> {
        let edits = relations::plan_remove_inverses(source, fields);
        self.apply(&edits, Some(source))
    }

    /// Strips every reference to `deleted` from the other stored entities.
    pub fn cleanup_on_delete(&self, deleted: &EntityDefinition) -> Result<MaintenanceReport> {
        let others = self.registry.all()?;
        let edits = relations::plan_delete_cleanup(deleted, &others);
        info!(entity = %deleted.name, edits = edits.len(), "cleaning up relations");
        self.apply(&edits, None)
    }

    /// Drops junctions owned by `old` that `new` no longer declares.
    pub fn cleanup_orphaned_junctions(
        &self,
        table: &str,
        old: &[FieldDefinition],
        new: &[FieldDefinition],
    ) -> Result<MaintenanceReport> {
        let edits = relations::plan_orphaned_junctions(table, old, new);
        self.apply(&edits, None)
    }

    /// Applies `edits` in order.
    ///
    /// Definition edits addressed to `local` change it in memory; all others
    /// load the stored definition, apply the edit and store it back. A
    /// missing target entity is reported as
    /// [`GenerationWarning::RelationTargetUnresolved`] for additions and
    /// ignored for removals.
    pub fn apply(
        &self,
        edits: &[InverseEdit],
        mut local: Option<&mut EntityDefinition>,
    ) -> Result<MaintenanceReport> {
        let mut report = MaintenanceReport::default();

        for edit in edits {
            match edit {
                InverseEdit::DropColumn { table, column } => {
                    self.sync.drop_column(table, column)?;
                }
                InverseEdit::DropJunction { table } => {
                    self.sync.drop_junction(table)?;
                }
                InverseEdit::AddField { entity, .. }
                | InverseEdit::RemoveField { entity, .. }
                | InverseEdit::StripField { entity, .. } => {
                    if let Some(def) = local.as_deref_mut().filter(|d| d.name == *entity) {
                        let outcome = edit.apply_to(def);
                        log_outcome(edit, outcome);
                        report.local_changed |= outcome == EditOutcome::Applied;
                        report.note_collision(edit, outcome);
                        continue;
                    }

                    let Some(mut stored) = self.registry.get(entity)? else {
                        if let InverseEdit::AddField { field, .. } = edit {
                            warn!(entity = %entity, "relation target not registered, inverse skipped");
                            let warning = GenerationWarning::RelationTargetUnresolved {
                                field: declaring_field(field),
                                target: entity.clone(),
                            };
                            report.warn(warning);
                        }
                        continue;
                    };

                    let outcome = edit.apply_to(&mut stored);
                    log_outcome(edit, outcome);
                    report.note_collision(edit, outcome);
                    if outcome == EditOutcome::Applied {
                        self.registry.put(&stored)?;
                        report.edited.insert(stored.name);
                    }
                }
            }
        }

        Ok(report)
    }
}

/// Name of the relation field an inverse mirrors.
fn declaring_field(inverse: &FieldDefinition) -> String {
    inverse
        .as_relation()
        .and_then(|r| r.inverse_name.clone())
        .unwrap_or_else(|| inverse.name.clone())
}

fn log_outcome(edit: &InverseEdit, outcome: EditOutcome) {
    match (edit, outcome) {
        (InverseEdit::AddField { entity, field }, EditOutcome::Applied) => {
            info!(entity = %entity, field = %field.name, "inverse field added");
        }
        (InverseEdit::AddField { entity, field }, EditOutcome::Collision) => {
            warn!(
                entity = %entity,
                field = %field.name,
                "field name already taken, inverse not added"
            );
        }
        (InverseEdit::RemoveField { entity, field, .. }, EditOutcome::Applied) => {
            info!(entity = %entity, field = %field, "inverse field removed");
        }
        (InverseEdit::StripField { entity, field, source }, EditOutcome::Applied) => {
            info!(entity = %entity, field = %field, target = %source, "relation to deleted entity removed");
        }
        (edit, _) => {
            debug!(entity = ?edit.entity(), "edit already in effect");
        }
    }
}

/// Merges maintenance reports.
pub(crate) fn merge_reports(reports: impl IntoIterator<Item = MaintenanceReport>) -> MaintenanceReport {
    let mut merged = MaintenanceReport::default();
    for report in reports {
        merged.merge(report);
    }
    merged
}

#[cfg(test)]
mod tests {
    use entity_schema_core::{RelationSpec, ScalarType};
    use rusqlite::Connection;

    use super::*;
    use crate::synchronizer::ExistingTable;

    fn setup(conn: &Connection) -> Registry<'_> {
        let registry = Registry::new(conn, "eg_").unwrap();
        registry.up().unwrap();
        registry
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
    fn test_add_inverse_twice_writes_one_field() {
        let conn = Connection::open_in_memory().unwrap();
        let registry = setup(&conn);
        registry
            .put(&EntityDefinition::new("Skill", "skills")
                .with_field(FieldDefinition::scalar("title", ScalarType::String)))
            .unwrap();
        let maintainer = RelationMaintainer::new(Registry::new(&conn, "eg_").unwrap());

        let mut emp = employee();
        let fields = emp.fields.clone();
        let first = maintainer.add_inverses(&mut emp, &fields).unwrap();
        let second = maintainer.add_inverses(&mut emp, &fields).unwrap();

        assert_eq!(first.edited.into_iter().collect::<Vec<_>>(), vec!["Skill"]);
        assert!(second.edited.is_empty());
        let skill = registry.get("Skill").unwrap().unwrap();
        assert_eq!(skill.fields.iter().filter(|f| f.name == "employees").count(), 1);
    }

    #[test]
    fn test_missing_target_is_a_warning() {
        let conn = Connection::open_in_memory().unwrap();
        let maintainer = RelationMaintainer::new(setup(&conn));

        let mut emp = employee();
        let fields = emp.fields.clone();
        let report = maintainer.add_inverses(&mut emp, &fields).unwrap();

        assert_eq!(
            report.warnings,
            vec![GenerationWarning::RelationTargetUnresolved {
                field: "skills".to_string(),
                target: "Skill".to_string(),
            }]
        );
        assert!(report.edited.is_empty());
    }

    #[test]
    fn test_self_reference_applies_locally() {
        let conn = Connection::open_in_memory().unwrap();
        let maintainer = RelationMaintainer::new(setup(&conn));

        let mut emp = EntityDefinition::new("Employee", "employees").with_field(
            FieldDefinition::relation("manager", RelationSpec::many_to_one("Employee", "employees")),
        );
        let fields = emp.fields.clone();
        let report = maintainer.add_inverses(&mut emp, &fields).unwrap();

        assert!(report.local_changed);
        assert!(report.warnings.is_empty());
        assert!(emp.has_field("employees"));
    }

    #[test]
    fn test_cleanup_on_delete_strips_references_and_storage() {
        let conn = Connection::open_in_memory().unwrap();
        let registry = setup(&conn);
        let sync = SchemaSynchronizer::new(&conn);

        let skill = EntityDefinition::new("Skill", "skills")
            .with_field(FieldDefinition::scalar("title", ScalarType::String));
        let review = EntityDefinition::new("Review", "reviews").with_field(
            FieldDefinition::relation("subject", RelationSpec::many_to_one("Employee", "employees")),
        );
        for def in [&skill, &review, &employee()] {
            sync.create_table(def, ExistingTable::Reject).unwrap();
            registry.put(def).unwrap();
        }
        let maintainer = RelationMaintainer::new(Registry::new(&conn, "eg_").unwrap());
        let mut emp = employee();
        let fields = emp.fields.clone();
        maintainer.add_inverses(&mut emp, &fields).unwrap();

        let report = maintainer.cleanup_on_delete(&emp).unwrap();

        assert!(report.edited.contains("Skill"));
        assert!(report.edited.contains("Review"));
        assert!(!registry.get("Skill").unwrap().unwrap().has_field("employees"));
        assert!(!registry.get("Review").unwrap().unwrap().has_field("subject"));
        assert!(!sync.column_names("reviews").unwrap().contains(&"subject_id".to_string()));

        let again = maintainer.cleanup_on_delete(&emp).unwrap();
        assert!(again.edited.is_empty());
    }

    #[test]
    fn test_incoming_inverses_added_to_new_target() {
        let conn = Connection::open_in_memory().unwrap();
        let registry = setup(&conn);
        registry.put(&employee()).unwrap();
        let maintainer = RelationMaintainer::new(Registry::new(&conn, "eg_").unwrap());

        let mut skill = EntityDefinition::new("Skill", "skills")
            .with_field(FieldDefinition::scalar("title", ScalarType::String));
        let report = maintainer.add_incoming_inverses(&mut skill).unwrap();

        assert!(report.local_changed);
        assert!(report.edited.is_empty());
        assert!(skill.has_field("employees"));
        assert!(registry.get("Skill").unwrap().is_none());
    }

    #[test]
    fn test_collision_reported_as_warning() {
        let conn = Connection::open_in_memory().unwrap();
        let registry = setup(&conn);
        let authored = EntityDefinition::new("Skill", "skills").with_field(FieldDefinition::relation(
            "employees",
            RelationSpec::many_to_many("Employee", "employees"),
        ));
        registry.put(&authored).unwrap();
        let maintainer = RelationMaintainer::new(Registry::new(&conn, "eg_").unwrap());

        let mut emp = employee();
        let fields = emp.fields.clone();
        let report = maintainer.add_inverses(&mut emp, &fields).unwrap();

        assert_eq!(
            report.warnings,
            vec![GenerationWarning::InverseNameTaken {
                entity: "Skill".to_string(),
                field: "employees".to_string(),
                source_field: "skills".to_string(),
            }]
        );
        assert!(report.edited.is_empty());
        assert_eq!(registry.get("Skill").unwrap().unwrap(), authored);
    }

    #[test]
    fn test_orphaned_junction_dropped() {
        let conn = Connection::open_in_memory().unwrap();
        let registry = setup(&conn);
        let sync = SchemaSynchronizer::new(&conn);
        let emp = employee();
        sync.create_table(&emp, ExistingTable::Reject).unwrap();
        assert!(sync.table_exists("skills_employees_skills").unwrap());

        let maintainer = RelationMaintainer::new(registry);
        let trimmed = emp.fields[..1].to_vec();
        maintainer
            .cleanup_orphaned_junctions("employees", &emp.fields, &trimmed)
            .unwrap();
        assert!(!sync.table_exists("skills_employees_skills").unwrap());
    }
}
