//! Objrel CLI - Command-line interface for object relationships

use clap::{Parser, Subcommand};
use objrel::config::{self, ObjrelConfig};
use objrel::storage::RelationshipStore;
use objrel::ui::{self, Icons};
use objrel::{EventKind, MetaCascade, MetaStore, SqliteMetaStore};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "objrel")]
#[command(version)]
#[command(about = "Bidirectional relationships between typed objects")]
#[command(long_about = r#"
Objrel records relationships between arbitrary typed objects (a post and a
user, a comment and a taxonomy term) in a dedicated SQLite table. A
relationship A→B is the same relationship as B→A.

Example usage:
  objrel init
  objrel create 1 post user 2
  objrel exists 2 user post 1
  objrel related 1 post user
  objrel meta add 1 role '"author"'
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON instead of human-readable output
    #[arg(long, global = true)]
    json: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the database file (overrides the config)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a config file and create the database
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,

        /// Extra object types to register
        #[arg(short = 't', long = "type")]
        types: Vec<String>,
    },

    /// Create a relationship (returns the existing id if already related)
    Create {
        left_id: String,
        left_type: String,
        right_type: String,
        right_id: String,
    },

    /// Check whether two objects are related, in either orientation
    Exists {
        left_id: String,
        left_type: String,
        right_type: String,
        right_id: String,
    },

    /// Delete the relationship between two objects
    Delete {
        left_id: String,
        left_type: String,
        right_type: String,
        right_id: String,
    },

    /// List the IDs of objects related to an object
    Related {
        object_id: String,
        left_type: String,
        right_type: String,
    },

    /// Show a relationship by id
    Get { id: i64 },

    /// List all relationships
    List,

    /// Show the recognized object types
    Types,

    /// Show statistics about the relationship table
    Stats,

    /// Run a JSON file of operations
    Batch { file: PathBuf },

    /// Manage relationship metadata
    #[command(subcommand)]
    Meta(MetaCommand),
}

#[derive(Subcommand)]
enum MetaCommand {
    /// Add a value under a key
    Add {
        relationship_id: i64,
        key: String,
        /// JSON value (bare text is stored as a string)
        value: String,
        /// Refuse if the key already has a value
        #[arg(long)]
        unique: bool,
    },

    /// Replace the values under a key
    Update {
        relationship_id: i64,
        key: String,
        value: String,
        /// Only replace values equal to this one
        #[arg(long)]
        prev: Option<String>,
    },

    /// Delete a key, or one value under it
    Delete {
        relationship_id: i64,
        key: String,
        #[arg(long)]
        value: Option<String>,
    },

    /// Show metadata (all keys when none is given)
    Get {
        relationship_id: i64,
        key: Option<String>,
        /// Only the first value
        #[arg(long)]
        single: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

impl OutputMode {
    fn is_human(self) -> bool {
        self == OutputMode::Human
    }
}

fn emit_success(mode: OutputMode, command: &str, data: Value) -> anyhow::Result<()> {
    if mode == OutputMode::Json {
        let envelope = serde_json::json!({ "ok": true, "command": command, "data": data });
        println!("{}", serde_json::to_string_pretty(&envelope)?);
    }
    Ok(())
}

fn emit_error(mode: OutputMode, err: &anyhow::Error) {
    match mode {
        OutputMode::Json => {
            let mut error = serde_json::json!({ "message": err.to_string() });
            if let Some(param) = err.downcast_ref::<objrel::Error>().and_then(objrel::Error::param) {
                error["param"] = Value::from(param.as_str());
                error["position"] = Value::from(param.position());
            }
            println!("{}", serde_json::json!({ "ok": false, "error": error }));
        }
        OutputMode::Human => ui::error(&format!("{:#}", err)),
    }
}

/// Bare text becomes a JSON string
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

struct App {
    config: ObjrelConfig,
    database: PathBuf,
    meta_database: PathBuf,
}

impl App {
    fn load(cli: &Cli) -> anyhow::Result<Self> {
        let config = config::load_config(cli.config.as_deref())?.unwrap_or_default();
        let database = cli.database.clone().unwrap_or_else(|| config.database_path());
        let meta_database = match (&cli.database, &config.meta_database) {
            (_, Some(meta)) => PathBuf::from(meta),
            (Some(db), None) => db.clone(),
            (None, None) => config.meta_database_path(),
        };
        Ok(Self { config, database, meta_database })
    }

    fn meta(&self) -> anyhow::Result<Arc<SqliteMetaStore>> {
        config::ensure_db_dir(&self.meta_database)?;
        Ok(Arc::new(SqliteMetaStore::open(&self.meta_database)?))
    }

    /// Store wired with the config's types and the metadata cascade
    fn store(&self) -> anyhow::Result<RelationshipStore> {
        config::ensure_db_dir(&self.database)?;
        let ctx = self.config.context();
        MetaCascade::install(&ctx.hooks, self.meta()?);
        Ok(RelationshipStore::open(&self.database, ctx)?)
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let mode = if cli.json { OutputMode::Json } else { OutputMode::Human };
    if let Err(err) = run(cli, mode) {
        emit_error(mode, &err);
        std::process::exit(1);
    }
}

fn run(cli: Cli, mode: OutputMode) -> anyhow::Result<()> {
    let app = App::load(&cli)?;

    match cli.command {
        Commands::Init { force, types } => {
            let path = cli.config.clone().unwrap_or_else(config::default_config_path);
            let mut new_config = app.config.clone();
            new_config.database = Some(app.database.display().to_string());
            for object_type in types {
                if !new_config.object_types.contains(&object_type) {
                    new_config.object_types.push(object_type);
                }
            }

            config::write_config(&path, &new_config, force)?;
            config::ensure_db_dir(&app.database)?;
            RelationshipStore::open(&app.database, new_config.context())?;
            SqliteMetaStore::open(&new_config.meta_database_path())?;
            if let Some(root) = path.parent() {
                let root = if root.as_os_str().is_empty() { std::path::Path::new(".") } else { root };
                config::ensure_gitignore(root)?;
            }

            if mode.is_human() {
                ui::success(&format!("Wrote {}", path.display()));
                ui::info("Database", &app.database.display().to_string());
            } else {
                emit_success(mode, "init", serde_json::json!({
                    "config": path.display().to_string(),
                    "database": app.database.display().to_string(),
                }))?;
            }
        }

        Commands::Create { left_id, left_type, right_type, right_id } => {
            let mut store = app.store()?;
            let (id, kind) = store.create_with_outcome(&left_id, &left_type, &right_type, &right_id)?;
            let created = kind == EventKind::Added;

            if mode.is_human() {
                if created {
                    println!("{} Created relationship #{}", Icons::NEW, id);
                } else {
                    println!("{} Already related as #{}", Icons::LINK, id);
                }
            } else {
                emit_success(mode, "create", serde_json::json!({ "id": id, "created": created }))?;
            }
        }

        Commands::Exists { left_id, left_type, right_type, right_id } => {
            let store = app.store()?;
            let id = store.exists(&left_id, &left_type, &right_type, &right_id)?;

            if mode.is_human() {
                match id {
                    Some(id) => println!("{} Related as #{}", Icons::LINK, id),
                    None => println!("{} Not related", Icons::EMPTY),
                }
            } else {
                emit_success(mode, "exists", serde_json::json!({ "id": id }))?;
            }
        }

        Commands::Delete { left_id, left_type, right_type, right_id } => {
            let mut store = app.store()?;
            let id = store.delete(&left_id, &left_type, &right_type, &right_id)?;

            if mode.is_human() {
                match id {
                    Some(id) => println!("{} Deleted relationship #{}", Icons::DEL, id),
                    None => println!("{} Nothing to delete", Icons::EMPTY),
                }
            } else {
                emit_success(mode, "delete", serde_json::json!({ "id": id }))?;
            }
        }

        Commands::Related { object_id, left_type, right_type } => {
            let store = app.store()?;
            let ids = store.related_ids(&object_id, &left_type, &right_type)?;

            if mode.is_human() {
                ui::header(&format!("{} {} -> {}", left_type, object_id, right_type));
                if ids.is_empty() {
                    println!("{} No related objects found.", Icons::EMPTY);
                } else {
                    for id in &ids {
                        println!("  - {}:{}", right_type, id);
                    }
                }
            } else {
                emit_success(mode, "related", serde_json::json!({ "ids": ids }))?;
            }
        }

        Commands::Get { id } => {
            let store = app.store()?;
            let rel = store.get(id)?;

            if mode.is_human() {
                match &rel {
                    Some(rel) => {
                        ui::relationship(rel);
                        let metas = app.meta()?.get_all(rel.id)?;
                        if !metas.is_empty() {
                            ui::section("Metadata");
                            for (key, values) in metas {
                                ui::summary_row(&key, &serde_json::to_string(&values)?);
                            }
                        }
                    }
                    None => println!("{} No relationship #{}", Icons::EMPTY, id),
                }
            } else {
                emit_success(mode, "get", serde_json::to_value(&rel)?)?;
            }
        }

        Commands::List => {
            let store = app.store()?;
            let relationships = store.list()?;

            if mode.is_human() {
                if relationships.is_empty() {
                    println!("{} No relationships stored.", Icons::EMPTY);
                } else {
                    println!("{}", ui::relationships_table(&relationships));
                }
            } else {
                emit_success(mode, "list", serde_json::to_value(&relationships)?)?;
            }
        }

        Commands::Types => {
            let types = app.config.context().types.recognized();

            if mode.is_human() {
                ui::header("Recognized object types");
                for object_type in &types {
                    println!("  {} {}", Icons::TAG, object_type);
                }
            } else {
                emit_success(mode, "types", serde_json::json!({ "types": types }))?;
            }
        }

        Commands::Stats => {
            let store = app.store()?;
            let stats = store.stats()?;

            if mode.is_human() {
                println!("{} Objrel Statistics ({})", Icons::STATS, app.database.display());
                let mut rows = vec![
                    ("Relationships", stats.relationships.to_string()),
                    ("Last id", stats.last_id.to_string()),
                ];
                for (object_type, count) in &stats.endpoints_by_type {
                    rows.push((object_type.as_str(), count.to_string()));
                }
                println!("{}", ui::stats_table(&rows));
            } else {
                emit_success(mode, "stats", serde_json::to_value(&stats)?)?;
            }
        }

        Commands::Batch { file } => {
            let contents = std::fs::read_to_string(&file)?;
            let ops = objrel::batch::parse(&contents)?;
            let mut store = app.store()?;
            let outcomes = objrel::batch::run(&mut store, &ops);
            let failed = outcomes.iter().filter(|o| !o.ok).count();

            if mode.is_human() {
                ui::header(&format!("Batch {} ({} operations)", file.display(), outcomes.len()));
                for outcome in &outcomes {
                    match (&outcome.result, &outcome.error) {
                        (_, Some(error)) => println!("  {} [{}] {}: {}", Icons::CROSS, outcome.index, outcome.op, error),
                        (Some(result), None) => println!("  {} [{}] {}: {}", Icons::CHECK, outcome.index, outcome.op, result),
                        (None, None) => println!("  {} [{}] {}", Icons::CHECK, outcome.index, outcome.op),
                    }
                }
                if failed > 0 {
                    ui::warn(&format!("{} of {} operations failed", failed, outcomes.len()));
                }
            } else {
                emit_success(mode, "batch", serde_json::json!({ "failed": failed, "outcomes": outcomes }))?;
            }
        }

        Commands::Meta(command) => run_meta(&app, command, mode)?,
    }

    Ok(())
}

fn run_meta(app: &App, command: MetaCommand, mode: OutputMode) -> anyhow::Result<()> {
    let meta = app.meta()?;

    match command {
        MetaCommand::Add { relationship_id, key, value, unique } => {
            let added = meta.add(relationship_id, &key, &parse_value(&value), unique)?;
            if mode.is_human() {
                match added {
                    Some(_) => ui::success(&format!("Added '{}' to #{}", key, relationship_id)),
                    None => ui::warn(&format!("'{}' already set on #{}", key, relationship_id)),
                }
            } else {
                emit_success(mode, "meta.add", serde_json::json!({ "meta_id": added }))?;
            }
        }

        MetaCommand::Update { relationship_id, key, value, prev } => {
            let prev = prev.as_deref().map(parse_value);
            let changed = meta.update(relationship_id, &key, &parse_value(&value), prev.as_ref())?;
            if mode.is_human() {
                if changed {
                    ui::success(&format!("Updated '{}' on #{}", key, relationship_id));
                } else {
                    println!("{} '{}' unchanged", Icons::EMPTY, key);
                }
            } else {
                emit_success(mode, "meta.update", serde_json::json!({ "changed": changed }))?;
            }
        }

        MetaCommand::Delete { relationship_id, key, value } => {
            let value = value.as_deref().map(parse_value);
            let removed = meta.delete(relationship_id, &key, value.as_ref())?;
            if mode.is_human() {
                if removed {
                    println!("{} Removed '{}' from #{}", Icons::DEL, key, relationship_id);
                } else {
                    println!("{} Nothing to remove", Icons::EMPTY);
                }
            } else {
                emit_success(mode, "meta.delete", serde_json::json!({ "removed": removed }))?;
            }
        }

        MetaCommand::Get { relationship_id, key, single } => {
            let data = match (&key, single) {
                (Some(key), true) => serde_json::to_value(meta.get_single(relationship_id, key)?)?,
                (Some(key), false) => serde_json::to_value(meta.get(relationship_id, key)?)?,
                (None, _) => serde_json::to_value(meta.get_all(relationship_id)?)?,
            };
            if mode.is_human() {
                ui::header(&format!("Metadata of #{}", relationship_id));
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                emit_success(mode, "meta.get", data)?;
            }
        }
    }

    Ok(())
}
