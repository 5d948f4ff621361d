//! Planning of cross-entity relation edits.
//!
//! A relation declared on one entity is mirrored by an inverse field on its
//! target, and deleting or editing an entity touches the definitions (and
//! sometimes the tables) of other entities. There is no transaction spanning
//! all of them, so the work is split in two phases: the pure functions here
//! compute a list of [`InverseEdit`]s, and the caller applies them one at a
//! time. Every edit is idempotent, so a plan can be re-applied after a
//! partial failure.
//!
//! # Example
//!
//! ```
//! use entity_schema_core::*;
//! use entity_schema_core::relations::{InverseEdit, plan_add_inverses};
//!
//! let employee = EntityDefinition::new("Employee", "employees")
//!     .with_field(FieldDefinition::relation(
//!         "skills",
//!         RelationSpec::many_to_many("Skill", "skills"),
//!     ));
//!
//! let plan = plan_add_inverses(&employee, employee.fields.iter());
//! let InverseEdit::AddField { entity, field } = &plan[0] else { panic!() };
//! assert_eq!(entity, "Skill");
//! assert_eq!(field.name, "employees");
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::diff::removed_junction_relations;
use crate::naming;
use crate::types::{EntityDefinition, FieldDefinition, RelationSpec};

/// A single cross-entity edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "edit", rename_all = "kebab-case")]
pub enum InverseEdit {
    /// Append `field` to `entity` unless a field of that name already exists.
    AddField {
        entity: String,
        field: FieldDefinition,
    },
    /// Remove the field `field` from `entity` if it is a non-owning relation
    /// pointing at `source`.
    RemoveField {
        entity: String,
        field: String,
        source: String,
    },
    /// Remove the field `field` from `entity` if it points at `source`,
    /// whichever side it is on. Used when `source` is deleted.
    StripField {
        entity: String,
        field: String,
        source: String,
    },
    /// Drop a foreign-key column (and its unique index) from `table`.
    DropColumn { table: String, column: String },
    /// Drop a junction table.
    DropJunction { table: String },
}

impl InverseEdit {
    /// Entity whose stored definition this edit changes, if any.
    pub fn entity(&self) -> Option<&str> {
        match self {
            InverseEdit::AddField { entity, .. }
            | InverseEdit::RemoveField { entity, .. }
            | InverseEdit::StripField { entity, .. } => Some(entity),
            InverseEdit::DropColumn { .. } | InverseEdit::DropJunction { .. } => None,
        }
    }

    /// Applies a definition edit to `def` in place.
    ///
    /// Schema edits (`DropColumn`, `DropJunction`) and edits addressed to a
    /// different entity leave `def` untouched and report
    /// [`EditOutcome::Unchanged`].
    pub fn apply_to(&self, def: &mut EntityDefinition) -> EditOutcome {
        match self {
            InverseEdit::AddField { entity, field } if *entity == def.name => {
                match def.find_field(&field.name) {
                    None => {
                        def.fields.push(field.clone());
                        EditOutcome::Applied
                    }
                    Some(existing) if is_same_inverse(existing, field) => EditOutcome::Unchanged,
                    Some(_) => EditOutcome::Collision,
                }
            }
            InverseEdit::RemoveField {
                entity,
                field,
                source,
            } if *entity == def.name => {
                remove_where(def, |f| {
                    f.name == *field
                        && f.targets(source)
                        && f.as_relation().is_some_and(|r| !r.kind.is_owning())
                })
            }
            InverseEdit::StripField {
                entity,
                field,
                source,
            } if *entity == def.name => remove_where(def, |f| f.name == *field && f.targets(source)),
            _ => EditOutcome::Unchanged,
        }
    }
}

/// Result of applying an [`InverseEdit`] to a definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// The definition changed.
    Applied,
    /// Nothing to do; the edit was already in effect.
    Unchanged,
    /// A different field already uses the inverse name.
    Collision,
}

fn remove_where(def: &mut EntityDefinition, matches: impl Fn(&FieldDefinition) -> bool) -> EditOutcome {
    let before = def.fields.len();
    def.fields.retain(|f| !matches(f));
    if def.fields.len() < before {
        EditOutcome::Applied
    } else {
        EditOutcome::Unchanged
    }
}

/// An existing field is the wanted inverse only if it is a non-owning
/// mirror of the same declaring field; a user-authored owning relation with
/// the same name and target is a collision.
fn is_same_inverse(existing: &FieldDefinition, wanted: &FieldDefinition) -> bool {
    match (existing.as_relation(), wanted.as_relation()) {
        (Some(a), Some(b)) => {
            !a.kind.is_owning()
                && a.target == b.target
                && a.kind.relation_type() == b.kind.relation_type()
                && a.inverse_name == b.inverse_name
        }
        _ => false,
    }
}

/// Returns `true` if `field` is expected to have an inverse on its target.
///
/// Only owning sides maintain inverses; a user-authored one-to-many and the
/// inverse sides written by the maintainer do not.
pub fn maintains_inverse(field: &FieldDefinition) -> bool {
    field.as_relation().is_some_and(|r| r.kind.is_owning())
}

/// Name of the inverse field for a relation declared on `source_entity`.
pub fn inverse_name(source_entity: &str, relation: &RelationSpec) -> String {
    relation.inverse_name.clone().unwrap_or_else(|| {
        naming::default_inverse_name(source_entity, relation.kind.inverse().relation_type())
    })
}

/// Builds the inverse field written on the target of `field`.
///
/// Returns `None` for scalar fields and for relations that maintain no
/// inverse. Inverse fields are optional and point back at the declaring
/// field through `inverse_name`.
pub fn inverse_field(source: &EntityDefinition, field: &FieldDefinition) -> Option<FieldDefinition> {
    if !maintains_inverse(field) {
        return None;
    }
    let relation = field.as_relation()?;
    let inverse = RelationSpec::new(&source.name, &source.table_name, relation.kind.inverse())
        .with_inverse_name(&field.name);
    Some(FieldDefinition::relation(&inverse_name(&source.name, relation), inverse).optional())
}

/// Plans the inverse fields to add for `fields` declared on `source`.
pub fn plan_add_inverses<'a>(
    source: &EntityDefinition,
    fields: impl IntoIterator<Item = &'a FieldDefinition>,
) -> Vec<InverseEdit> {
    fields
        .into_iter()
        .filter_map(|field| {
            let relation = field.as_relation()?;
            let inverse = inverse_field(source, field)?;
            Some(InverseEdit::AddField {
                entity: relation.target.clone(),
                field: inverse,
            })
        })
        .collect()
}

/// Plans the inverses that stored entities owe `target`.
///
/// Owning relations declared on `others` whose target did not exist yet
/// were left one-directional; once `target` is created their inverse
/// fields are added to it.
pub fn plan_incoming_inverses(target: &EntityDefinition, others: &[EntityDefinition]) -> Vec<InverseEdit> {
    others
        .iter()
        .filter(|other| other.name != target.name)
        .flat_map(|other| {
            plan_add_inverses(
                other,
                other.fields.iter().filter(|f| f.targets(&target.name)),
            )
        })
        .collect()
}

/// Plans removal of the inverses of `fields`, which were removed from
/// `source`.
pub fn plan_remove_inverses<'a>(
    source: &EntityDefinition,
    fields: impl IntoIterator<Item = &'a FieldDefinition>,
) -> Vec<InverseEdit> {
    fields
        .into_iter()
        .filter(|field| maintains_inverse(field))
        .filter_map(|field| {
            let relation = field.as_relation()?;
            Some(InverseEdit::RemoveField {
                entity: relation.target.clone(),
                field: inverse_name(&source.name, relation),
                source: source.name.clone(),
            })
        })
        .collect()
}

/// Plans the cleanup required before `deleted` is removed.
///
/// First the inverses of every relation `deleted` declares are removed from
/// their targets, then every field of another entity that still targets
/// `deleted` is stripped. A stripped field that owned storage also has its
/// `_id` column or junction table dropped, so no foreign key is left
/// pointing at the dropped table.
pub fn plan_delete_cleanup(deleted: &EntityDefinition, others: &[EntityDefinition]) -> Vec<InverseEdit> {
    let mut edits = Vec::new();
    let mut seen: HashSet<(String, String)> = HashSet::new();

    for edit in plan_remove_inverses(deleted, deleted.fields.iter()) {
        if let InverseEdit::RemoveField { entity, field, .. } = &edit {
            if *entity == deleted.name {
                continue;
            }
            if !seen.insert((entity.clone(), field.clone())) {
                continue;
            }
        }
        edits.push(edit);
    }

    for other in others.iter().filter(|o| o.name != deleted.name) {
        for (field, relation) in other.relation_fields() {
            if relation.target != deleted.name {
                continue;
            }
            if relation.kind.is_owning() {
                edits.push(InverseEdit::StripField {
                    entity: other.name.clone(),
                    field: field.name.clone(),
                    source: deleted.name.clone(),
                });
            } else if seen.insert((other.name.clone(), field.name.clone())) {
                edits.push(InverseEdit::RemoveField {
                    entity: other.name.clone(),
                    field: field.name.clone(),
                    source: deleted.name.clone(),
                });
            }
            if relation.kind.owns_column() {
                edits.push(InverseEdit::DropColumn {
                    table: other.table_name.clone(),
                    column: naming::foreign_key_column(&field.name),
                });
            } else if relation.kind.owns_junction() {
                edits.push(InverseEdit::DropJunction {
                    table: naming::junction_table_name(
                        &field.name,
                        &other.table_name,
                        &relation.target_table,
                    ),
                });
            }
        }
    }

    edits
}

/// Plans dropping the junctions orphaned by replacing `old` with `new` on
/// `table`.
pub fn plan_orphaned_junctions(
    table: &str,
    old: &[FieldDefinition],
    new: &[FieldDefinition],
) -> Vec<InverseEdit> {
    removed_junction_relations(old, new)
        .into_iter()
        .filter_map(|field| {
            let relation = field.as_relation()?;
            Some(InverseEdit::DropJunction {
                table: naming::junction_table_name(&field.name, table, &relation.target_table),
            })
        })
        .collect()
}

/// Junction tables owned by `def`.
pub fn owned_junctions(def: &EntityDefinition) -> Vec<String> {
    def.relation_fields()
        .filter(|(_, r)| r.kind.owns_junction())
        .map(|(f, r)| naming::junction_table_name(&f.name, &def.table_name, &r.target_table))
        .collect()
}
