//! Artifact rendering.
//!
//! Turns an [`EntityDefinition`] into source text for a data model, request
//! DTOs, a CRUD service over the entity's table and a controller route
//! table. Rendering is pure: nothing is written here (see
//! [`ArtifactWriter`](crate::ArtifactWriter)).

use entity_schema_core::{EntityDefinition, FieldDefinition, ScalarType, naming};
use serde::Serialize;
use tera::{Context, Tera};

use crate::error::Result;

/// Templates and the file each one renders to.
const TEMPLATES: [(&str, &str); 5] = [
    ("model.rs", include_str!("../templates/model.rs.tera")),
    ("dto.rs", include_str!("../templates/dto.rs.tera")),
    ("service.rs", include_str!("../templates/service.rs.tera")),
    ("controller.rs", include_str!("../templates/controller.rs.tera")),
    ("mod.rs", include_str!("../templates/mod.rs.tera")),
];

const RUST_KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do",
    "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe", "unsized",
    "use", "virtual", "where", "while", "yield",
];

/// A rendered source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
    /// Path relative to the artifact output directory.
    pub path: String,
    pub contents: String,
}

/// Every file rendered for one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArtifacts {
    pub entity: String,
    pub table_name: String,
    /// Output subdirectory (`employee` for `Employee`).
    pub module: String,
    pub files: Vec<RenderedFile>,
}

impl RenderedArtifacts {
    /// Relative paths of the rendered files, in render order.
    pub fn paths(&self) -> Vec<String> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }
}

/// Output subdirectory of an entity's artifacts.
pub fn module_name(entity: &str) -> String {
    naming::to_snake_case(entity)
}

/// Renders entity artifacts from the embedded templates.
///
/// # Examples
///
/// ```
/// use entity_schema_artifacts::ArtifactRenderer;
/// use entity_schema_core::{EntityDefinition, FieldDefinition, ScalarType};
///
/// let renderer = ArtifactRenderer::new().unwrap();
/// let def = EntityDefinition::new("Employee", "employees")
///     .with_field(FieldDefinition::scalar("name", ScalarType::String));
///
/// let rendered = renderer.render(&def).unwrap();
/// assert_eq!(rendered.module, "employee");
/// assert!(rendered.paths().contains(&"employee/model.rs".to_string()));
/// ```
pub struct ArtifactRenderer {
    tera: Tera,
}

impl ArtifactRenderer {
    /// Compiles the embedded templates.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`](crate::ArtifactError::TemplateError) if a
    /// template fails to parse.
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES.to_vec())?;
        Ok(Self { tera })
    }

    /// Renders every artifact of `def`.
    pub fn render(&self, def: &EntityDefinition) -> Result<RenderedArtifacts> {
        let entity = EntityContext::from_definition(def);
        let mut context = Context::new();
        context.insert("entity", &entity);

        let mut files = Vec::with_capacity(TEMPLATES.len());
        for (name, _) in TEMPLATES {
            files.push(RenderedFile {
                path: format!("{}/{name}", entity.module),
                contents: self.tera.render(name, &context)?,
            });
        }

        Ok(RenderedArtifacts {
            entity: def.name.clone(),
            table_name: def.table_name.clone(),
            module: entity.module,
            files,
        })
    }
}

#[derive(Debug, Serialize)]
struct EntityContext {
    name: String,
    module: String,
    table: String,
    route: String,
    select_list: String,
    columns: Vec<ColumnContext>,
    junctions: Vec<JunctionContext>,
    collections: Vec<CollectionContext>,
}

#[derive(Debug, Serialize)]
struct ColumnContext {
    ident: String,
    column: String,
    base_type: String,
    model_type: String,
    create_type: String,
    create_optional: bool,
    references: Option<String>,
}

#[derive(Debug, Serialize)]
struct JunctionContext {
    ident: String,
    field_snake: String,
    table: String,
    source_column: String,
    target_column: String,
    target: String,
}

#[derive(Debug, Serialize)]
struct CollectionContext {
    field: String,
    target: String,
    relation_type: String,
}

impl EntityContext {
    fn from_definition(def: &EntityDefinition) -> Self {
        let mut columns = Vec::new();
        let mut junctions = Vec::new();
        let mut collections = Vec::new();

        for field in &def.fields {
            match field.as_relation() {
                None => {
                    let column = naming::column_name(&field.name);
                    let base = scalar_rust_type(field.scalar_type().unwrap_or(ScalarType::String));
                    columns.push(column_context(field, rust_ident(&column), column, base, None));
                }
                Some(relation) if relation.kind.owns_column() => {
                    let column = naming::foreign_key_column(&field.name);
                    columns.push(column_context(
                        field,
                        column.clone(),
                        column,
                        "i64",
                        Some(relation.target.clone()),
                    ));
                }
                Some(relation) if relation.kind.owns_junction() => {
                    let (source_column, target_column) =
                        naming::junction_columns(&def.table_name, &relation.target_table);
                    let snake = naming::to_snake_case(&field.name);
                    junctions.push(JunctionContext {
                        ident: rust_ident(&snake),
                        field_snake: snake,
                        table: naming::junction_table_name(
                            &field.name,
                            &def.table_name,
                            &relation.target_table,
                        ),
                        source_column,
                        target_column,
                        target: relation.target.clone(),
                    });
                }
                Some(relation) => collections.push(CollectionContext {
                    field: field.name.clone(),
                    target: relation.target.clone(),
                    relation_type: relation.kind.relation_type().to_string(),
                }),
            }
        }

        let select_list = std::iter::once("id")
            .chain(columns.iter().map(|c| c.column.as_str()))
            .chain(["created_at", "updated_at"])
            .collect::<Vec<_>>()
            .join(", ");

        Self {
            name: def.name.clone(),
            module: module_name(&def.name),
            table: def.table_name.clone(),
            route: def.table_name.replace('_', "-"),
            select_list,
            columns,
            junctions,
            collections,
        }
    }
}

fn column_context(
    field: &FieldDefinition,
    ident: String,
    column: String,
    base: &str,
    references: Option<String>,
) -> ColumnContext {
    let nullable = field.is_nullable();
    let create_optional = nullable || field.default_value.is_some();
    ColumnContext {
        ident,
        column,
        base_type: base.to_string(),
        model_type: optional_if(base, nullable),
        create_type: optional_if(base, create_optional),
        create_optional,
        references,
    }
}

fn optional_if(base: &str, optional: bool) -> String {
    if optional {
        format!("Option<{base}>")
    } else {
        base.to_string()
    }
}

fn scalar_rust_type(scalar: ScalarType) -> &'static str {
    match scalar {
        ScalarType::String
        | ScalarType::Text
        | ScalarType::Email
        | ScalarType::Date
        | ScalarType::Datetime => "String",
        ScalarType::Number | ScalarType::Integer => "i64",
        ScalarType::Float => "f64",
        ScalarType::Boolean => "bool",
        ScalarType::Json => "serde_json::Value",
    }
}

/// Makes a snake_case name usable as a Rust field identifier.
fn rust_ident(name: &str) -> String {
    match name {
        "self" | "super" | "crate" => format!("{name}_"),
        _ if RUST_KEYWORDS.contains(&name) => format!("r#{name}"),
        _ => name.to_string(),
    }
}
