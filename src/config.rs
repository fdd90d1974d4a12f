use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::context::RelationshipContext;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ObjrelConfig {
    /// Relationship database file
    pub database: Option<String>,
    /// Metadata database file (defaults to the relationship database)
    pub meta_database: Option<String>,
    /// Object types registered on top of the built-ins
    #[serde(default)]
    pub object_types: Vec<String>,
}

impl ObjrelConfig {
    pub fn database_path(&self) -> PathBuf {
        self.database
            .as_deref()
            .map(PathBuf::from)
            .unwrap_or_else(default_database_path)
    }

    pub fn meta_database_path(&self) -> PathBuf {
        self.meta_database
            .as_deref()
            .map(PathBuf::from)
            .unwrap_or_else(|| self.database_path())
    }

    /// Build a context with this config's object types registered
    pub fn context(&self) -> RelationshipContext {
        RelationshipContext::with_types(self.object_types.iter().cloned())
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("objrel.toml")
}

pub fn default_database_path() -> PathBuf {
    default_database_path_in(Path::new("."))
}

pub fn default_database_path_in(base: &Path) -> PathBuf {
    base.join(".objrel").join("objrel.db")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<ObjrelConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: ObjrelConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &ObjrelConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

pub fn ensure_gitignore(project_root: &Path) -> anyhow::Result<()> {
    let gitignore_path = project_root.join(".gitignore");
    let entry = ".objrel/";

    let mut content = String::new();
    if gitignore_path.exists() {
        content = std::fs::read_to_string(&gitignore_path)?;
        if content.lines().any(|line| line.trim() == entry) {
            return Ok(());
        }
        if !content.is_empty() && !content.ends_with('\n') {
            content.push('\n');
        }
    }
    content.push_str(entry);
    content.push('\n');
    std::fs::write(&gitignore_path, content)?;
    Ok(())
}
