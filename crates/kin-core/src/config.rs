use crate::model::RelationshipType;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory holding the project database and config.
pub const KIN_DIR: &str = ".kin";

const DEFAULT_DB_FILE: &str = "kin.sqlite3";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub tree: TreeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database file, relative to the `.kin` directory unless absolute.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Tag applied when a link command omits `--type`.
    #[serde(default)]
    pub default_relationship_type: RelationshipType,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub output: Option<String>,
}

impl ProjectConfig {
    /// Absolute database location for a project rooted at `project_root`.
    #[must_use]
    pub fn database_path(&self, project_root: &Path) -> PathBuf {
        if self.database.path.is_absolute() {
            self.database.path.clone()
        } else {
            project_root.join(KIN_DIR).join(&self.database.path)
        }
    }

    #[must_use]
    pub const fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.database.busy_timeout_ms)
    }
}

/// Load `.kin/config.toml` under `project_root`, or defaults when absent.
pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(KIN_DIR).join("config.toml");
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load `<config_dir>/kin/config.toml`, or defaults when absent.
pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };

    load_user_config_from(&config_dir.join("kin/config.toml"))
}

fn load_user_config_from(path: &Path) -> Result<UserConfig> {
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Write the default project config, leaving an existing file untouched.
///
/// Returns `true` when a new file was written.
pub fn write_default_project_config(project_root: &Path) -> Result<bool> {
    let dir = project_root.join(KIN_DIR);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let path = dir.join("config.toml");
    if path.exists() {
        return Ok(false);
    }

    let content =
        toml::to_string_pretty(&ProjectConfig::default()).context("serialize default config")?;
    std::fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(true)
}

/// Walk up from `start` looking for a directory that contains `.kin/`.
#[must_use]
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(KIN_DIR).is_dir())
        .map(Path::to_path_buf)
}

fn default_db_path() -> PathBuf {
    PathBuf::from(DEFAULT_DB_FILE)
}

const fn default_busy_timeout_ms() -> u64 {
    5_000
}
