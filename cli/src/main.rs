use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use entity_schema_artifacts::{ArtifactWriter, DefinitionSet, GeneratorConfig};
use entity_schema_core::EntityInput;
use entity_schema_sqlite::{EntityGenerator, GenerateOptions};
use serde::Serialize;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "entity-gen")]
#[command(about = "Generate entities, keep their tables and relations consistent")]
#[command(version)]
struct Cli {
    /// Configuration file (YAML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// SQLite database file; overrides the configuration.
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Registry table prefix; overrides the configuration.
    #[arg(long, global = true)]
    prefix: Option<String>,
    /// Artifact output directory; overrides the configuration.
    #[arg(long, global = true)]
    output: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create a new entity: table, artifacts, inverse relations.
    Generate(GenerateArgs),
    /// Replace the definition of an existing entity.
    Update(UpdateArgs),
    /// Delete an entity and clean up relations that point at it.
    Delete(DeleteArgs),
    /// Print a stored definition.
    Get(NameArgs),
    /// List stored entities, excluding system entities.
    List,
    /// List relations declared elsewhere that target an entity.
    Incoming(NameArgs),
    /// Show the DDL and relation edits a definition would cause.
    Plan(FileArgs),
    /// Generate or update every definition in a directory.
    Apply(ApplyArgs),
    /// Show registry and generator state.
    Status,
}

#[derive(Debug, Args)]
struct GenerateArgs {
    /// Definition file (JSON or YAML) holding one entity.
    #[arg(long)]
    file: PathBuf,
    /// Take over a table that already exists instead of failing.
    #[arg(long)]
    adopt_existing: bool,
}

#[derive(Debug, Args)]
struct UpdateArgs {
    /// Name of the stored entity.
    #[arg(long)]
    name: String,
    /// Definition file (JSON or YAML) holding one entity.
    #[arg(long)]
    file: PathBuf,
}

#[derive(Debug, Args)]
struct DeleteArgs {
    /// Name of the stored entity.
    #[arg(long)]
    name: String,
    /// Leave the physical table in place.
    #[arg(long)]
    keep_table: bool,
}

#[derive(Debug, Args)]
struct NameArgs {
    /// Entity name.
    #[arg(long)]
    name: String,
}

#[derive(Debug, Args)]
struct FileArgs {
    /// Definition file (JSON or YAML) holding one entity.
    #[arg(long)]
    file: PathBuf,
}

#[derive(Debug, Args)]
struct ApplyArgs {
    /// Directory of definition files.
    #[arg(long)]
    source: PathBuf,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let config = resolve_config(&cli)?;
    let mut generator = open_generator(&config)?;

    match cli.command {
        Command::Generate(args) => {
            let def = generator
                .normalize(&load_single(&args.file)?)
                .map_err(|e| e.to_string())?;
            let options = GenerateOptions {
                adopt_existing_table: args.adopt_existing,
            };
            print_json(&generator.generate(def, options).map_err(|e| e.to_string())?)
        }
        Command::Update(args) => {
            let def = generator
                .normalize(&load_single(&args.file)?)
                .map_err(|e| e.to_string())?;
            print_json(&generator.update(&args.name, def).map_err(|e| e.to_string())?)
        }
        Command::Delete(args) => {
            let result = generator
                .delete(&args.name, !args.keep_table)
                .map_err(|e| e.to_string())?;
            print_json(&result)
        }
        Command::Get(args) => print_json(&generator.get(&args.name).map_err(|e| e.to_string())?),
        Command::List => print_json(&generator.list().map_err(|e| e.to_string())?),
        Command::Incoming(args) => {
            print_json(&generator.incoming(&args.name).map_err(|e| e.to_string())?)
        }
        Command::Plan(args) => {
            let def = generator
                .normalize(&load_single(&args.file)?)
                .map_err(|e| e.to_string())?;
            print_json(&generator.plan(&def).map_err(|e| e.to_string())?)
        }
        Command::Apply(args) => {
            let set = DefinitionSet::from_dir(&args.source).map_err(|e| {
                format!("Failed to load definitions from '{}': {e}", args.source.display())
            })?;
            if set.is_empty() {
                warn!(source = %args.source.display(), "no definitions found");
            }
            print_json(&generator.apply(&set).map_err(|e| e.to_string())?)
        }
        Command::Status => print_json(&generator.status().map_err(|e| e.to_string())?),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Loads the configuration file, if any, and applies flag overrides.
fn resolve_config(cli: &Cli) -> Result<GeneratorConfig, String> {
    let mut config = match &cli.config {
        Some(path) => GeneratorConfig::load(path)
            .map_err(|e| format!("Failed to load config '{}': {e}", path.display()))?,
        None => GeneratorConfig::default(),
    };
    if let Some(db) = &cli.db {
        config.database.path = db.clone();
    }
    if let Some(prefix) = &cli.prefix {
        config.database.table_prefix = prefix.clone();
    }
    if let Some(output) = &cli.output {
        config.artifacts.output_dir = output.clone();
    }
    Ok(config)
}

fn open_generator(config: &GeneratorConfig) -> Result<EntityGenerator, String> {
    debug!(
        db = %config.database.path.display(),
        prefix = %config.database.table_prefix,
        output = %config.artifacts.output_dir.display(),
        "opening generator"
    );
    let conn = rusqlite::Connection::open(&config.database.path).map_err(|e| {
        format!(
            "Failed to open database '{}': {e}",
            config.database.path.display()
        )
    })?;
    let writer = ArtifactWriter::new(&config.artifacts.output_dir, config.artifacts.enabled);
    let generator = EntityGenerator::new(conn, config.database.table_prefix.as_str(), writer)
        .map_err(|e| format!("Failed to initialize registry: {e}"))?;
    Ok(generator.with_system_entities(config.system_entities.clone()))
}

/// Reads a definition file that must hold exactly one entity.
fn load_single(path: &Path) -> Result<EntityInput, String> {
    let set = DefinitionSet::from_file(path)
        .map_err(|e| format!("Failed to load '{}': {e}", path.display()))?;
    match set.len() {
        0 => Err(format!("'{}' holds no entity definition", path.display())),
        1 => set
            .dependency_order()
            .first()
            .map(|input| (*input).clone())
            .ok_or_else(|| format!("'{}' holds no entity definition", path.display())),
        n => Err(format!(
            "'{}' holds {n} definitions; use `apply` for several",
            path.display()
        )),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize output: {e}"))?;
    println!("{json}");
    Ok(())
}
