//! Naming rules shared by the DDL generator, the relation maintainer and the
//! artifact templates.
//!
//! Entity names: PascalCase → snake_case plural table
//!   `Employee`  → `employees`
//!   `OrderItem` → `order_items`
//!
//! Field names: camelCase or snake_case → snake_case column
//!   `firstName` → `first_name`
//!   `department` (many-to-one) → `department_id`

use crate::types::RelationType;

/// Converts a PascalCase or camelCase identifier to snake_case.
///
/// Runs of capitals are kept together so acronyms stay readable
/// (`HTTPRequest` → `http_request`).
///
/// # Examples
///
/// ```
/// use entity_schema_core::naming::to_snake_case;
///
/// assert_eq!(to_snake_case("OrderItem"), "order_item");
/// assert_eq!(to_snake_case("firstName"), "first_name");
/// assert_eq!(to_snake_case("HTTPRequest"), "http_request");
/// assert_eq!(to_snake_case("already_snake"), "already_snake");
/// ```
pub fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut result = String::with_capacity(name.len() + 4);

    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next.is_some_and(|n| n.is_lowercase()),
                _ => false,
            };
            if boundary && !result.ends_with('_') {
                result.push('_');
            }
            result.extend(ch.to_lowercase());
        } else {
            result.push(ch);
        }
    }

    result
}

/// Converts a snake_case or camelCase identifier to PascalCase.
///
/// ```
/// use entity_schema_core::naming::to_pascal_case;
///
/// assert_eq!(to_pascal_case("order_item"), "OrderItem");
/// assert_eq!(to_pascal_case("firstName"), "FirstName");
/// ```
pub fn to_pascal_case(name: &str) -> String {
    name.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Simple English pluralization.
///
/// ```
/// use entity_schema_core::naming::pluralize;
///
/// assert_eq!(pluralize("employee"), "employees");
/// assert_eq!(pluralize("category"), "categories");
/// assert_eq!(pluralize("address"), "addresses");
/// assert_eq!(pluralize("day"), "days");
/// ```
pub fn pluralize(word: &str) -> String {
    if let Some(stem) = word.strip_suffix('y') {
        if !stem.is_empty() && !stem.ends_with(['a', 'e', 'i', 'o', 'u']) {
            return format!("{stem}ies");
        }
    }
    if word.ends_with('s')
        || word.ends_with('x')
        || word.ends_with('z')
        || word.ends_with("ch")
        || word.ends_with("sh")
    {
        return format!("{word}es");
    }
    format!("{word}s")
}

/// Inverse of [`pluralize`] for the forms it produces.
///
/// ```
/// use entity_schema_core::naming::singularize;
///
/// assert_eq!(singularize("employees"), "employee");
/// assert_eq!(singularize("categories"), "category");
/// assert_eq!(singularize("addresses"), "address");
/// assert_eq!(singularize("staff"), "staff");
/// ```
pub fn singularize(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("ies") {
        if !stem.is_empty() {
            return format!("{stem}y");
        }
    }
    for suffix in ["sses", "xes", "zes", "ches", "shes", "uses"] {
        if word.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }
    if word.ends_with("ss") {
        return word.to_string();
    }
    match word.strip_suffix('s') {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => word.to_string(),
    }
}

/// Derives the conventional table name for an entity.
///
/// ```
/// use entity_schema_core::naming::entity_to_table;
///
/// assert_eq!(entity_to_table("Employee"), "employees");
/// assert_eq!(entity_to_table("OrderItem"), "order_items");
/// ```
pub fn entity_to_table(entity_name: &str) -> String {
    pluralize(&to_snake_case(entity_name))
}

/// Column that stores a scalar field.
pub fn column_name(field_name: &str) -> String {
    to_snake_case(field_name)
}

/// Foreign-key column that stores a many-to-one or owning one-to-one field.
///
/// ```
/// use entity_schema_core::naming::foreign_key_column;
///
/// assert_eq!(foreign_key_column("department"), "department_id");
/// assert_eq!(foreign_key_column("reportsTo"), "reports_to_id");
/// ```
pub fn foreign_key_column(field_name: &str) -> String {
    format!("{}_id", to_snake_case(field_name))
}

/// Junction table for an owning many-to-many field.
///
/// Deterministic in `(field, source table, target table)`.
///
/// ```
/// use entity_schema_core::naming::junction_table_name;
///
/// assert_eq!(
///     junction_table_name("skills", "employees", "skills"),
///     "skills_employees_skills"
/// );
/// ```
pub fn junction_table_name(field_name: &str, source_table: &str, target_table: &str) -> String {
    format!("{}_{source_table}_{target_table}", to_snake_case(field_name))
}

/// Column pair of a junction table: `(source column, target column)`.
///
/// Both are named after the singularized table; a self-referencing junction
/// prefixes the target column with `related_` so the two stay distinct.
///
/// ```
/// use entity_schema_core::naming::junction_columns;
///
/// assert_eq!(
///     junction_columns("employees", "skills"),
///     ("employee_id".to_string(), "skill_id".to_string())
/// );
/// assert_eq!(
///     junction_columns("employees", "employees"),
///     ("employee_id".to_string(), "related_employee_id".to_string())
/// );
/// ```
pub fn junction_columns(source_table: &str, target_table: &str) -> (String, String) {
    let source = format!("{}_id", singularize(source_table));
    let target = format!("{}_id", singularize(target_table));
    if source == target {
        let related = format!("related_{target}");
        (source, related)
    } else {
        (source, target)
    }
}

/// Name of the foreign-key constraint on `table.column`.
pub fn fk_constraint_name(table: &str, column: &str) -> String {
    format!("fk_{table}_{column}")
}

/// Name of the unique index on `table.column`.
pub fn unique_index_name(table: &str, column: &str) -> String {
    format!("uq_{table}_{column}")
}

/// Default name of the inverse field written on a relation's target.
///
/// To-many inverses use the pluralized lowercase source-entity name; to-one
/// inverses use the singular lowercase name.
///
/// ```
/// use entity_schema_core::RelationType;
/// use entity_schema_core::naming::default_inverse_name;
///
/// assert_eq!(default_inverse_name("Employee", RelationType::OneToMany), "employees");
/// assert_eq!(default_inverse_name("Employee", RelationType::ManyToMany), "employees");
/// assert_eq!(default_inverse_name("Employee", RelationType::OneToOne), "employee");
/// ```
pub fn default_inverse_name(source_entity: &str, inverse_type: RelationType) -> String {
    let lower = source_entity.to_lowercase();
    if inverse_type.is_to_many() {
        pluralize(&lower)
    } else {
        lower
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_case_handles_digits_and_acronyms() {
        assert_eq!(to_snake_case("Address2Line"), "address2_line");
        assert_eq!(to_snake_case("userID"), "user_id");
        assert_eq!(to_snake_case("URL"), "url");
    }

    #[test]
    fn test_pluralize_singularize_pairs() {
        for word in ["employee", "skill", "category", "branch", "box", "status"] {
            assert_eq!(singularize(&pluralize(word)), word, "{word}");
        }
    }

    #[test]
    fn test_singularize_keeps_short_words() {
        assert_eq!(singularize("s"), "s");
        assert_eq!(singularize("ss"), "ss");
    }

    #[test]
    fn test_constraint_names() {
        assert_eq!(
            fk_constraint_name("employees", "department_id"),
            "fk_employees_department_id"
        );
        assert_eq!(unique_index_name("employees", "email"), "uq_employees_email");
    }
}
