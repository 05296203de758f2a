use std::collections::HashMap;
use std::path::PathBuf;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::KurosawaError;

const DEFAULT_CONFIG: &str = include_str!("../../../config/default.toml");

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub warehouse: WarehouseConfig,
    pub tmdb: TmdbConfig,
    /// Operator-provided `file name -> external id` overrides for the
    /// manual linking path.
    #[serde(default)]
    pub manual_external_ids: HashMap<String, u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WarehouseConfig {
    /// Directory holding the movie rips.
    pub directory: String,
    /// Where warehouse content dumps are written.
    pub dump_directory: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TmdbConfig {
    pub api_key: String,
}

impl AppConfig {
    /// Load config: the user file if it exists, built-in defaults
    /// otherwise.
    pub fn load() -> Result<Self, KurosawaError> {
        let defaults: AppConfig =
            toml::from_str(DEFAULT_CONFIG).map_err(|e| KurosawaError::Config(e.to_string()))?;

        let user_path = Self::config_path();
        if user_path.exists() {
            let user_str = std::fs::read_to_string(&user_path)
                .map_err(|e| KurosawaError::Config(e.to_string()))?;
            let user: AppConfig =
                toml::from_str(&user_str).map_err(|e| KurosawaError::Config(e.to_string()))?;
            Ok(user)
        } else {
            Ok(defaults)
        }
    }

    /// Save current config to the user config file.
    pub fn save(&self) -> Result<(), KurosawaError> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| KurosawaError::Config(e.to_string()))?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Path to the user config file (XDG on Linux, AppData on Windows).
    pub fn config_path() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Path to the database file.
    pub fn db_path() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.data_dir().join("kurosawa.db"))
            .unwrap_or_else(|| PathBuf::from("kurosawa.db"))
    }

    /// Ensure the data directory exists and return the DB path.
    pub fn ensure_db_path() -> Result<PathBuf, KurosawaError> {
        let path = Self::db_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(path)
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("dev", "kurosawa", "kurosawa")
    }
}
