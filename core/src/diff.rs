//! Field-set diffing between two versions of an entity definition.
//!
//! Fields are matched by identity key, not by position: `(name, scalar type)`
//! for scalar fields and `(name, relation type, target)` for relation fields.
//! A rename therefore shows up as one removal plus one addition, and changes
//! to `required`, `unique` or `default_value` alone are not reported.
//!
//! # Example
//!
//! ```
//! use entity_schema_core::*;
//!
//! let old = vec![
//!     FieldDefinition::scalar("name", ScalarType::String),
//!     FieldDefinition::scalar("age", ScalarType::Number),
//! ];
//! let new = vec![
//!     FieldDefinition::scalar("name", ScalarType::String),
//!     FieldDefinition::scalar("age", ScalarType::Text),
//! ];
//!
//! let diff = diff_fields(&old, &new);
//! assert_eq!(diff.added.len(), 1);
//! assert_eq!(diff.removed.len(), 1);
//! assert_eq!(diff.removed[0].scalar_type(), Some(ScalarType::Number));
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::types::{FieldDefinition, FieldType, RelationType, ScalarType};

/// Identity of a field for diffing purposes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldKey {
    /// A scalar column.
    Scalar { name: String, scalar: ScalarType },
    /// A relation; the kind payload (join side, `on_delete`) is not part of
    /// the key.
    Relation {
        name: String,
        relation_type: RelationType,
        target: String,
    },
}

impl FieldKey {
    /// Computes the identity key of a field.
    pub fn of(field: &FieldDefinition) -> Self {
        match &field.field_type {
            FieldType::Scalar(scalar) => FieldKey::Scalar {
                name: field.name.clone(),
                scalar: *scalar,
            },
            FieldType::Relation(relation) => FieldKey::Relation {
                name: field.name.clone(),
                relation_type: relation.kind.relation_type(),
                target: relation.target.clone(),
            },
        }
    }

    /// Field name part of the key.
    pub fn name(&self) -> &str {
        match self {
            FieldKey::Scalar { name, .. } | FieldKey::Relation { name, .. } => name,
        }
    }
}

/// Result of [`diff_fields`].
///
/// Both lists preserve the order in which the fields were declared.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldDiff {
    /// Fields present in the new set but not in the old one.
    pub added: Vec<FieldDefinition>,
    /// Fields present in the old set but not in the new one.
    pub removed: Vec<FieldDefinition>,
}

impl FieldDiff {
    /// Returns `true` if nothing was added or removed.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// Relation fields among the added fields.
    pub fn added_relations(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.added.iter().filter(|f| f.is_relation())
    }

    /// Relation fields among the removed fields.
    pub fn removed_relations(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.removed.iter().filter(|f| f.is_relation())
    }
}

/// Computes the fields added and removed between two field sets.
///
/// Pure and order-independent with respect to the inputs: permuting either
/// slice only permutes the output lists.
pub fn diff_fields(old: &[FieldDefinition], new: &[FieldDefinition]) -> FieldDiff {
    let old_keys: HashSet<FieldKey> = old.iter().map(FieldKey::of).collect();
    let new_keys: HashSet<FieldKey> = new.iter().map(FieldKey::of).collect();

    FieldDiff {
        added: new
            .iter()
            .filter(|f| !old_keys.contains(&FieldKey::of(f)))
            .cloned()
            .collect(),
        removed: old
            .iter()
            .filter(|f| !new_keys.contains(&FieldKey::of(f)))
            .cloned()
            .collect(),
    }
}

/// Owning many-to-many fields of `old` whose `(name, target)` pair is absent
/// from `new`.
///
/// Their junction tables are orphaned by the update and must be dropped.
pub fn removed_junction_relations<'a>(
    old: &'a [FieldDefinition],
    new: &[FieldDefinition],
) -> Vec<&'a FieldDefinition> {
    let kept: HashSet<(&str, &str)> = new
        .iter()
        .filter_map(|f| {
            f.as_relation()
                .filter(|r| r.kind.relation_type() == RelationType::ManyToMany)
                .map(|r| (f.name.as_str(), r.target.as_str()))
        })
        .collect();

    old.iter()
        .filter(|f| {
            f.as_relation().is_some_and(|r| {
                r.kind.owns_junction() && !kept.contains(&(f.name.as_str(), r.target.as_str()))
            })
        })
        .collect()
}

/// Copies the stored join side onto relations of `new` that are unchanged
/// by identity key.
///
/// The wire shape cannot express that a field is the non-owning side of a
/// many-to-many or one-to-one relation, so a definition resubmitted for an
/// update would otherwise claim ownership of storage it never had.
pub fn carry_over_join_sides(old: &[FieldDefinition], new: &mut [FieldDefinition]) {
    for field in new.iter_mut() {
        let key = FieldKey::of(field);
        let Some(previous) = old.iter().find(|o| FieldKey::of(o) == key) else {
            continue;
        };
        let (Some(prev_rel), FieldType::Relation(relation)) =
            (previous.as_relation(), &mut field.field_type)
        else {
            continue;
        };
        relation.kind = relation.kind.with_side(prev_rel.kind.side());
        if relation.inverse_name.is_none() {
            relation.inverse_name = prev_rel.inverse_name.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{JoinSide, OnDelete, RelationKind, RelationSpec};

    fn set_a() -> Vec<FieldDefinition> {
        vec![
            FieldDefinition::scalar("name", ScalarType::String),
            FieldDefinition::scalar("email", ScalarType::Email),
            FieldDefinition::relation("skills", RelationSpec::many_to_many("Skill", "skills")),
            FieldDefinition::relation(
                "department",
                RelationSpec::many_to_one("Department", "departments"),
            ),
        ]
    }

    fn set_b() -> Vec<FieldDefinition> {
        vec![
            FieldDefinition::scalar("email", ScalarType::Email),
            FieldDefinition::scalar("fullName", ScalarType::String),
            FieldDefinition::relation("skills", RelationSpec::many_to_many("Skill", "skills")),
            FieldDefinition::relation(
                "department",
                RelationSpec::many_to_one("Division", "divisions"),
            ),
        ]
    }

    fn keys(fields: &[FieldDefinition]) -> HashSet<FieldKey> {
        fields.iter().map(FieldKey::of).collect()
    }

    #[test]
    fn test_diff_of_identical_sets_is_empty() {
        assert!(diff_fields(&set_a(), &set_a()).is_empty());
        assert!(diff_fields(&[], &[]).is_empty());
    }

    #[test]
    fn test_diff_partitions_key_sets() {
        let (a, b) = (set_a(), set_b());
        let diff = diff_fields(&a, &b);
        let common: HashSet<FieldKey> = keys(&a).intersection(&keys(&b)).cloned().collect();

        let mut added_plus_common = keys(&diff.added);
        added_plus_common.extend(common.iter().cloned());
        assert_eq!(added_plus_common, keys(&b));

        let mut removed_plus_common = keys(&diff.removed);
        removed_plus_common.extend(common);
        assert_eq!(removed_plus_common, keys(&a));
    }

    #[test]
    fn test_diff_is_order_independent() {
        let mut a = set_a();
        let mut b = set_b();
        let forward = diff_fields(&a, &b);
        a.reverse();
        b.reverse();
        let reversed = diff_fields(&a, &b);
        assert_eq!(keys(&forward.added), keys(&reversed.added));
        assert_eq!(keys(&forward.removed), keys(&reversed.removed));
    }

    #[test]
    fn test_retarget_is_remove_plus_add() {
        let diff = diff_fields(&set_a(), &set_b());
        let removed: Vec<&str> = diff.removed_relations().map(|f| f.name.as_str()).collect();
        let added: Vec<&str> = diff.added_relations().map(|f| f.name.as_str()).collect();
        assert_eq!(removed, vec!["department"]);
        assert_eq!(added, vec!["department"]);
    }

    #[test]
    fn test_required_only_change_is_invisible() {
        let old = vec![FieldDefinition::scalar("name", ScalarType::String)];
        let new = vec![FieldDefinition::scalar("name", ScalarType::String).optional().unique()];
        assert!(diff_fields(&old, &new).is_empty());
    }

    #[test]
    fn test_on_delete_change_is_invisible() {
        let old = vec![FieldDefinition::relation(
            "manager",
            RelationSpec::many_to_one("Employee", "employees"),
        )];
        let new = vec![FieldDefinition::relation(
            "manager",
            RelationSpec::many_to_one("Employee", "employees").with_on_delete(OnDelete::Cascade),
        )];
        assert!(diff_fields(&old, &new).is_empty());
    }

    #[test]
    fn test_removed_junction_relations() {
        let old = set_a();
        let new = vec![FieldDefinition::scalar("name", ScalarType::String)];
        let removed = removed_junction_relations(&old, &new);
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].name, "skills");

        assert!(removed_junction_relations(&old, &set_b()).is_empty());
    }

    #[test]
    fn test_inverse_many_to_many_has_no_junction() {
        let old = vec![FieldDefinition::relation(
            "employees",
            RelationSpec::new(
                "Employee",
                "employees",
                RelationKind::ManyToMany {
                    side: JoinSide::Inverse,
                },
            ),
        )];
        assert!(removed_junction_relations(&old, &[]).is_empty());
    }

    #[test]
    fn test_carry_over_join_sides() {
        let old = vec![FieldDefinition::relation(
            "employees",
            RelationSpec::new(
                "Employee",
                "employees",
                RelationKind::ManyToMany {
                    side: JoinSide::Inverse,
                },
            )
            .with_inverse_name("skills"),
        )];
        let mut new = vec![
            FieldDefinition::relation("employees", RelationSpec::many_to_many("Employee", "employees")),
            FieldDefinition::relation("mentors", RelationSpec::many_to_many("Employee", "employees")),
        ];

        carry_over_join_sides(&old, &mut new);

        let kept = new[0].as_relation().unwrap();
        assert_eq!(kept.kind.side(), JoinSide::Inverse);
        assert_eq!(kept.inverse_name.as_deref(), Some("skills"));
        assert_eq!(new[1].as_relation().unwrap().kind.side(), JoinSide::Owner);
    }
}
