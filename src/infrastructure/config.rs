use crate::domain::{config::SerialMonConfig, error::{SerialMonError, SerialMonResult}};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

const PROJECT_DIR: &str = ".serialmon";
const CONFIG_FILE: &str = "config.toml";
const GLOBAL_TABLE: &str = "global";

/// Configuration manager
pub struct ConfigManager {
    global_config_path: PathBuf,
    project_config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Create new configuration manager
    pub fn new() -> SerialMonResult<Self> {
        let global_config_path = Self::default_global_config_path()?;
        let project_config_path = std::env::current_dir()
            .ok()
            .and_then(|dir| Self::find_project_config_path(&dir));

        Ok(Self {
            global_config_path,
            project_config_path,
        })
    }

    /// Manager rooted at explicit paths
    pub fn with_paths(global_config_path: PathBuf, project_config_path: Option<PathBuf>) -> Self {
        Self {
            global_config_path,
            project_config_path,
        }
    }

    /// Load configuration from files.
    ///
    /// Keys in a project file are merged over the global file, table by
    /// table, so a checked-in board setup only overrides what it names.
    /// `[global]` (log level and log file) only comes from the global file.
    pub fn load_config(&self) -> SerialMonResult<SerialMonConfig> {
        let mut merged = toml::Table::new();

        if self.global_config_path.exists() {
            merged = self.read_table(&self.global_config_path)?;
        }

        if let Some(project_path) = &self.project_config_path {
            if project_path.exists() {
                let mut project = self.read_table(project_path)?;
                if project.remove(GLOBAL_TABLE).is_some() {
                    warn!(
                        "Ignoring [{}] in project config {}",
                        GLOBAL_TABLE,
                        project_path.display()
                    );
                }
                merge_tables(&mut merged, project);
            }
        }

        toml::Value::Table(merged)
            .try_into::<SerialMonConfig>()
            .map_err(|e| SerialMonError::config(format!("Invalid merged configuration: {}", e)))
    }

    /// Read a config file as a raw table, checking it stands alone as a config
    fn read_table(&self, path: &Path) -> SerialMonResult<toml::Table> {
        let content = fs::read_to_string(path).map_err(|e| {
            SerialMonError::config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        let parse_error =
            |e: &dyn std::fmt::Display| SerialMonError::config(format!("Failed to parse config file {}: {}", path.display(), e));

        let table: toml::Table = toml::from_str(&content).map_err(|e| parse_error(&e))?;
        toml::Value::Table(table.clone())
            .try_into::<SerialMonConfig>()
            .map_err(|e| parse_error(&e))?;
        Ok(table)
    }

    /// Global configuration path
    fn default_global_config_path() -> SerialMonResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .ok_or_else(|| SerialMonError::config("Could not determine configuration directory"))?;

        Ok(config_dir.join("serialmon").join(CONFIG_FILE))
    }

    /// Find project configuration path by walking up directory tree
    pub fn find_project_config_path(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(PROJECT_DIR).join(CONFIG_FILE))
            .find(|path| path.exists())
    }

    /// Load configuration from specific path
    pub fn load_config_from_path(&self, path: &Path) -> SerialMonResult<SerialMonConfig> {
        let content = fs::read_to_string(path).map_err(|e| {
            SerialMonError::config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        toml::from_str(&content).map_err(|e| {
            SerialMonError::config(format!("Failed to parse config file {}: {}", path.display(), e))
        })
    }

    /// Save configuration to specific path
    pub fn save_config_to_path(&self, path: &Path, config: &SerialMonConfig) -> SerialMonResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SerialMonError::config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(config)
            .map_err(|e| SerialMonError::config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, content).map_err(|e| {
            SerialMonError::config(format!("Failed to write config file {}: {}", path.display(), e))
        })
    }

    /// Write a default project configuration under `path`.
    ///
    /// Only the board sections are written; `[global]` stays per user.
    pub fn init_project_config(&self, path: &Path) -> SerialMonResult<PathBuf> {
        let config_file = path.join(PROJECT_DIR).join(CONFIG_FILE);

        if config_file.exists() {
            return Err(SerialMonError::config("Project configuration already exists"));
        }

        let mut table = toml::Table::try_from(SerialMonConfig::default())
            .map_err(|e| SerialMonError::config(format!("Failed to serialize config: {}", e)))?;
        table.remove(GLOBAL_TABLE);

        if let Some(parent) = config_file.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SerialMonError::config(format!("Failed to create config directory: {}", e))
            })?;
        }
        let content = toml::to_string_pretty(&table)
            .map_err(|e| SerialMonError::config(format!("Failed to serialize config: {}", e)))?;
        fs::write(&config_file, content).map_err(|e| {
            SerialMonError::config(format!("Failed to write config file {}: {}", config_file.display(), e))
        })?;

        Ok(config_file)
    }

    /// Get the current project config path (if any)
    pub fn project_config_path(&self) -> Option<&PathBuf> {
        self.project_config_path.as_ref()
    }

    /// Get the global config path
    pub fn global_config_path(&self) -> &PathBuf {
        &self.global_config_path
    }
}

/// Overlay `overlay` onto `base`, recursing into nested tables
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(nested)) => {
                merge_tables(existing, nested);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
