//! External (camelCase JSON) shape of an entity definition.
//!
//! Operators and transports submit definitions in this loose shape: types are
//! plain strings, flags are optional, and a relation's target table may be
//! omitted. [`EntityInput::normalize`] turns it into a strongly typed
//! [`EntityDefinition`], reporting unknown names as [`ValidationError`]s.
//!
//! # Example
//!
//! ```
//! use entity_schema_core::*;
//!
//! let input: EntityInput = serde_json::from_str(r#"{
//!     "name": "Employee",
//!     "tableName": "employees",
//!     "fields": [
//!         {"name": "name", "type": "string"},
//!         {"name": "skills", "type": "relation",
//!          "relation": {"type": "many-to-many", "target": "Skill"}}
//!     ]
//! }"#).unwrap();
//!
//! let def = input.normalize(|_| None).unwrap();
//! let skills = def.find_field("skills").unwrap().as_relation().unwrap();
//! assert_eq!(skills.target_table, "skills");
//! assert!(skills.kind.owns_junction());
//! ```

use serde::{Deserialize, Serialize};

use crate::naming;
use crate::types::{
    EntityDefinition, FieldDefinition, FieldType, OnDelete, RelationKind, RelationSpec,
    RelationType, ScalarType,
};
use crate::validate::ValidationError;

/// Entity definition as submitted over the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityInput {
    pub name: String,
    /// Physical table; derived from `name` when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldInput>,
}

/// Field as submitted over the wire.
///
/// A field is relational iff `relation` is present, in which case `type` is
/// ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldInput {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<RelationInput>,
}

/// Relation as submitted over the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationInput {
    #[serde(rename = "type")]
    pub relation_type: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_table: Option<String>,
    /// Name of the inverse field written on the target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inverse_side: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<String>,
}

impl EntityInput {
    /// Parses a definition from JSON text.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Converts the wire shape into a typed definition.
    ///
    /// `resolve_table` maps a relation target to the table of an already
    /// stored entity; when it returns `None` the naming rule is used.
    /// Structural validation (identifiers, duplicates) is left to
    /// [`validate_definition`](crate::validate_definition).
    pub fn normalize<F>(&self, resolve_table: F) -> Result<EntityDefinition, ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let table_name = self
            .table_name
            .clone()
            .unwrap_or_else(|| naming::entity_to_table(&self.name));

        let fields = self
            .fields
            .iter()
            .map(|f| f.normalize(&resolve_table))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(EntityDefinition {
            name: self.name.clone(),
            table_name,
            fields,
        })
    }
}

impl FieldInput {
    fn normalize<F>(&self, resolve_table: &F) -> Result<FieldDefinition, ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let field_type = match &self.relation {
            Some(relation) => FieldType::Relation(relation.normalize(&self.name, resolve_table)?),
            None => {
                let type_name = self.field_type.clone().unwrap_or_default();
                let scalar = ScalarType::parse(&type_name).ok_or_else(|| {
                    ValidationError::UnknownScalarType {
                        field: self.name.clone(),
                        type_name,
                    }
                })?;
                FieldType::Scalar(scalar)
            }
        };

        Ok(FieldDefinition {
            name: self.name.clone(),
            field_type,
            required: self.required.unwrap_or(true),
            unique: self.unique.unwrap_or(false),
            default_value: self.default_value.clone(),
        })
    }
}

impl RelationInput {
    fn normalize<F>(&self, field: &str, resolve_table: &F) -> Result<RelationSpec, ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let relation_type = RelationType::parse(&self.relation_type).ok_or_else(|| {
            ValidationError::UnknownRelationType {
                field: field.to_string(),
                type_name: self.relation_type.clone(),
            }
        })?;

        let on_delete = match &self.on_delete {
            None => OnDelete::default(),
            Some(action) => {
                if !matches!(
                    relation_type,
                    RelationType::ManyToOne | RelationType::OneToOne
                ) {
                    return Err(ValidationError::OnDeleteNotApplicable(field.to_string()));
                }
                OnDelete::parse(action).ok_or_else(|| ValidationError::UnknownOnDelete {
                    field: field.to_string(),
                    action: action.clone(),
                })?
            }
        };

        let target_table = self
            .target_table
            .clone()
            .or_else(|| resolve_table(&self.target))
            .unwrap_or_else(|| naming::entity_to_table(&self.target));

        Ok(RelationSpec {
            target: self.target.clone(),
            target_table,
            inverse_name: self.inverse_side.clone(),
            kind: RelationKind::authored(relation_type, on_delete),
        })
    }
}

impl From<&EntityDefinition> for EntityInput {
    fn from(def: &EntityDefinition) -> Self {
        Self {
            name: def.name.clone(),
            table_name: Some(def.table_name.clone()),
            fields: def.fields.iter().map(FieldInput::from).collect(),
        }
    }
}

impl From<&FieldDefinition> for FieldInput {
    fn from(field: &FieldDefinition) -> Self {
        let (field_type, relation) = match &field.field_type {
            FieldType::Scalar(scalar) => (Some(scalar.as_str().to_string()), None),
            FieldType::Relation(relation) => (
                Some("relation".to_string()),
                Some(RelationInput {
                    relation_type: relation.kind.relation_type().as_str().to_string(),
                    target: relation.target.clone(),
                    target_table: Some(relation.target_table.clone()),
                    inverse_side: relation.inverse_name.clone(),
                    on_delete: relation.kind.on_delete().map(|a| a.as_str().to_string()),
                }),
            ),
        };
        Self {
            name: field.name.clone(),
            field_type,
            required: Some(field.required),
            unique: Some(field.unique),
            default_value: field.default_value.clone(),
            relation,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::types::JoinSide;

    #[test]
    fn test_defaults_applied() {
        let input: EntityInput = serde_json::from_value(json!({
            "name": "OrderItem",
            "fields": [{"name": "quantity", "type": "number"}]
        }))
        .unwrap();
        let def = input.normalize(|_| None).unwrap();

        assert_eq!(def.table_name, "order_items");
        let quantity = &def.fields[0];
        assert!(quantity.required);
        assert!(!quantity.unique);
        assert_eq!(quantity.scalar_type(), Some(ScalarType::Number));
    }

    #[test]
    fn test_required_false_is_respected() {
        let input: EntityInput = serde_json::from_value(json!({
            "name": "Employee",
            "fields": [{"name": "nickname", "type": "string", "required": false}]
        }))
        .unwrap();
        assert!(!input.normalize(|_| None).unwrap().fields[0].required);
    }

    #[test]
    fn test_unknown_scalar_type() {
        let input: EntityInput = serde_json::from_value(json!({
            "name": "Employee",
            "fields": [{"name": "id_card", "type": "uuid"}]
        }))
        .unwrap();
        assert_eq!(
            input.normalize(|_| None),
            Err(ValidationError::UnknownScalarType {
                field: "id_card".to_string(),
                type_name: "uuid".to_string(),
            })
        );
    }

    #[test]
    fn test_missing_scalar_type() {
        let input: EntityInput = serde_json::from_value(json!({
            "name": "Employee",
            "fields": [{"name": "name"}]
        }))
        .unwrap();
        assert!(matches!(
            input.normalize(|_| None),
            Err(ValidationError::UnknownScalarType { .. })
        ));
    }

    #[test]
    fn test_relation_ignores_type_and_resolves_table() {
        let input: EntityInput = serde_json::from_value(json!({
            "name": "Employee",
            "tableName": "employees",
            "fields": [{
                "name": "department",
                "type": "whatever",
                "relation": {"type": "many-to-one", "target": "Department", "onDelete": "cascade"}
            }]
        }))
        .unwrap();
        let def = input
            .normalize(|target| (target == "Department").then(|| "org_units".to_string()))
            .unwrap();
        let relation = def.fields[0].as_relation().unwrap();

        assert_eq!(relation.target_table, "org_units");
        assert_eq!(
            relation.kind,
            RelationKind::ManyToOne {
                on_delete: OnDelete::Cascade
            }
        );
    }

    #[test]
    fn test_on_delete_rejected_for_many_to_many() {
        let input: EntityInput = serde_json::from_value(json!({
            "name": "Employee",
            "fields": [{
                "name": "skills",
                "relation": {"type": "many-to-many", "target": "Skill", "onDelete": "cascade"}
            }]
        }))
        .unwrap();
        assert_eq!(
            input.normalize(|_| None),
            Err(ValidationError::OnDeleteNotApplicable("skills".to_string()))
        );
    }

    #[test]
    fn test_unknown_relation_type() {
        let input: EntityInput = serde_json::from_value(json!({
            "name": "Employee",
            "fields": [{"name": "boss", "relation": {"type": "belongs-to", "target": "Employee"}}]
        }))
        .unwrap();
        assert!(matches!(
            input.normalize(|_| None),
            Err(ValidationError::UnknownRelationType { .. })
        ));
    }

    #[test]
    fn test_definition_to_wire_and_back() {
        let def = EntityDefinition::new("Skill", "skills")
            .with_field(FieldDefinition::scalar("title", ScalarType::String).unique())
            .with_field(FieldDefinition::relation(
                "mentor",
                RelationSpec::one_to_one("Employee", "employees").with_inverse_name("mentee"),
            ));

        let wire = EntityInput::from(&def);
        let json = serde_json::to_value(&wire).unwrap();
        assert_eq!(json["tableName"], "skills");
        assert_eq!(json["fields"][1]["relation"]["inverseSide"], "mentee");
        assert_eq!(json["fields"][1]["relation"]["onDelete"], "set-null");

        let back = wire.normalize(|_| None).unwrap();
        assert_eq!(back, def);
        assert_eq!(back.fields[1].as_relation().unwrap().kind.side(), JoinSide::Owner);
    }
}
