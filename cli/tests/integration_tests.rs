use std::fs;
use std::path::{Path, PathBuf};
use std::process::Output;

use serde_json::Value;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Runs `entity-gen` against a database and output directory inside `dir`.
fn entity_gen(dir: &TempDir, args: &[&str]) -> Output {
    let db = dir.path().join("entities.db");
    let output = dir.path().join("generated");
    std::process::Command::new(env!("CARGO_BIN_EXE_entity-gen"))
        .arg("--db")
        .arg(&db)
        .arg("--output")
        .arg(&output)
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to run entity-gen")
}

/// Runs a command that must succeed and parses its stdout as JSON.
fn entity_gen_json(dir: &TempDir, args: &[&str]) -> Value {
    let output = entity_gen(dir, args);
    assert!(
        output.status.success(),
        "entity-gen {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}

fn write_definition(dir: &Path, name: &str, json: Value) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, serde_json::to_string_pretty(&json).unwrap()).unwrap();
    path
}

fn skill_definition(dir: &Path) -> PathBuf {
    write_definition(
        dir,
        "skill.json",
        serde_json::json!({
            "name": "Skill",
            "fields": [{"name": "title", "type": "string"}]
        }),
    )
}

fn employee_definition(dir: &Path) -> PathBuf {
    write_definition(
        dir,
        "employee.json",
        serde_json::json!({
            "name": "Employee",
            "tableName": "employees",
            "fields": [
                {"name": "name", "type": "string"},
                {"name": "skills", "relation": {"type": "many-to-many", "target": "Skill"}}
            ]
        }),
    )
}

fn field_names(definition: &Value) -> Vec<String> {
    definition["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap().to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// generate / get / list
// ---------------------------------------------------------------------------

#[test]
fn generate_writes_registry_and_artifacts() {
    let dir = TempDir::new().unwrap();
    let file = skill_definition(dir.path());

    let result = entity_gen_json(&dir, &["generate", "--file", file.to_str().unwrap()]);

    assert_eq!(result["message"], "Entity 'Skill' generated successfully");
    assert_eq!(result["entity"], "Skill");
    assert!(dir.path().join("generated/skill/model.rs").exists());

    let def = entity_gen_json(&dir, &["get", "--name", "Skill"]);
    assert_eq!(def["table_name"], "skills");
    assert_eq!(field_names(&def), vec!["title"]);

    let list = entity_gen_json(&dir, &["list"]);
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["name"], "Skill");
}

#[test]
fn generate_with_relation_writes_inverse() {
    let dir = TempDir::new().unwrap();
    let skill = skill_definition(dir.path());
    let employee = employee_definition(dir.path());
    entity_gen_json(&dir, &["generate", "--file", skill.to_str().unwrap()]);

    let result = entity_gen_json(&dir, &["generate", "--file", employee.to_str().unwrap()]);
    assert_eq!(result["updated_entities"], serde_json::json!(["Skill"]));

    let skill = entity_gen_json(&dir, &["get", "--name", "Skill"]);
    assert_eq!(field_names(&skill), vec!["title", "employees"]);

    let incoming = entity_gen_json(&dir, &["incoming", "--name", "Skill"]);
    assert_eq!(incoming[0]["source_entity"], "Employee");
    assert_eq!(incoming[0]["field_name"], "skills");
}

#[test]
fn invalid_definition_exits_with_error() {
    let dir = TempDir::new().unwrap();
    let file = write_definition(
        dir.path(),
        "dup.json",
        serde_json::json!({
            "name": "Skill",
            "fields": [
                {"name": "title", "type": "string"},
                {"name": "title", "type": "text"}
            ]
        }),
    );

    let output = entity_gen(&dir, &["generate", "--file", file.to_str().unwrap()]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error:"), "stderr: {stderr}");
    assert!(stderr.contains("title"), "stderr: {stderr}");
    assert!(!dir.path().join("generated/skill").exists());

    let list = entity_gen_json(&dir, &["list"]);
    assert!(list.as_array().unwrap().is_empty());
}

#[test]
fn get_unknown_entity_fails() {
    let dir = TempDir::new().unwrap();
    let output = entity_gen(&dir, &["get", "--name", "Ghost"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Ghost"));
}

// ---------------------------------------------------------------------------
// update / delete / plan
// ---------------------------------------------------------------------------

#[test]
fn update_and_delete_keep_relations_consistent() {
    let dir = TempDir::new().unwrap();
    let skill = skill_definition(dir.path());
    let employee = employee_definition(dir.path());
    entity_gen_json(&dir, &["generate", "--file", skill.to_str().unwrap()]);
    entity_gen_json(&dir, &["generate", "--file", employee.to_str().unwrap()]);

    let without_skills = write_definition(
        dir.path(),
        "employee-v2.json",
        serde_json::json!({
            "name": "Employee",
            "tableName": "employees",
            "fields": [
                {"name": "name", "type": "string"},
                {"name": "email", "type": "email", "unique": true}
            ]
        }),
    );
    let result = entity_gen_json(
        &dir,
        &["update", "--name", "Employee", "--file", without_skills.to_str().unwrap()],
    );
    assert_eq!(result["message"], "Entity 'Employee' updated successfully");
    let skill_def = entity_gen_json(&dir, &["get", "--name", "Skill"]);
    assert_eq!(field_names(&skill_def), vec!["title"]);

    let deleted = entity_gen_json(&dir, &["delete", "--name", "Employee"]);
    assert_eq!(deleted["table_dropped"], true);
    assert!(!dir.path().join("generated/employee").exists());

    let output = entity_gen(&dir, &["get", "--name", "Employee"]);
    assert!(!output.status.success());
}

#[test]
fn delete_keep_table_reports_it() {
    let dir = TempDir::new().unwrap();
    let skill = skill_definition(dir.path());
    entity_gen_json(&dir, &["generate", "--file", skill.to_str().unwrap()]);

    let deleted = entity_gen_json(&dir, &["delete", "--name", "Skill", "--keep-table"]);
    assert_eq!(deleted["table_dropped"], false);

    let output = entity_gen(&dir, &["generate", "--file", skill.to_str().unwrap()]);
    assert!(!output.status.success(), "table still exists");

    entity_gen_json(
        &dir,
        &["generate", "--file", skill.to_str().unwrap(), "--adopt-existing"],
    );
}

#[test]
fn plan_does_not_mutate() {
    let dir = TempDir::new().unwrap();
    let skill = skill_definition(dir.path());

    let plan = entity_gen_json(&dir, &["plan", "--file", skill.to_str().unwrap()]);

    assert_eq!(plan["action"], "create");
    let statements = plan["statements"].as_array().unwrap();
    assert!(statements[0].as_str().unwrap().starts_with("CREATE TABLE skills"));
    let list = entity_gen_json(&dir, &["list"]);
    assert!(list.as_array().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// apply / status / config
// ---------------------------------------------------------------------------

#[test]
fn apply_directory_orders_targets_first() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("definitions");
    fs::create_dir_all(&source).unwrap();
    employee_definition(&source);
    skill_definition(&source);

    let results = entity_gen_json(&dir, &["apply", "--source", source.to_str().unwrap()]);
    let entities: Vec<&str> = results
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["entity"].as_str().unwrap())
        .collect();
    assert_eq!(entities, vec!["Skill", "Employee"]);

    let again = entity_gen_json(&dir, &["apply", "--source", source.to_str().unwrap()]);
    assert_eq!(again.as_array().unwrap().len(), 2);
    let skill = entity_gen_json(&dir, &["get", "--name", "Skill"]);
    assert_eq!(field_names(&skill), vec!["title", "employees"]);

    let status = entity_gen_json(&dir, &["status"]);
    assert_eq!(status["registry"]["entity_count"], 2);
    assert_eq!(status["phase"], "idle");
    assert_eq!(status["generation_active"], false);
}

#[test]
fn config_file_hides_system_entities() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("entity-gen.yml");
    fs::write(
        &config,
        "version: \"1.0\"\nartifacts:\n  enabled: false\nsystem_entities:\n  - Skill\n",
    )
    .unwrap();
    let skill = skill_definition(dir.path());
    let config_arg = config.to_str().unwrap();

    entity_gen_json(
        &dir,
        &["--config", config_arg, "generate", "--file", skill.to_str().unwrap()],
    );

    assert!(!dir.path().join("generated").exists());
    let list = entity_gen_json(&dir, &["--config", config_arg, "list"]);
    assert!(list.as_array().unwrap().is_empty());
    let def = entity_gen_json(&dir, &["--config", config_arg, "get", "--name", "Skill"]);
    assert_eq!(def["name"], "Skill");
}

#[test]
fn invalid_prefix_is_rejected() {
    let dir = TempDir::new().unwrap();
    let output = entity_gen(&dir, &["--prefix", "bad-prefix", "status"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("error:"));
}
