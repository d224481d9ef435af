/// Headless application configuration
use crate::error::{AppError, Result};
use longplay_session::SessionConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file read from the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "longplay.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default = "default_storage")]
    pub storage: StorageSettings,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default = "default_output")]
    pub output: OutputSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageSettings {
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Keep running on an in-memory store when the database cannot be opened
    #[serde(default = "default_fallback_to_memory")]
    pub fallback_to_memory: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputSettings {
    /// Print snapshots as JSON instead of a one-line summary
    #[serde(default)]
    pub json: bool,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// `path` must exist when given explicitly; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        // Override with environment variables, e.g. LONGPLAY_STORAGE__DATABASE_URL
        settings = settings.add_source(
            config::Environment::with_prefix("LONGPLAY")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| AppError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.storage.database_url.trim().is_empty() {
            return Err(AppError::Config(
                "database URL is required (set LONGPLAY_STORAGE__DATABASE_URL)".to_string(),
            ));
        }

        self.session
            .validate()
            .map_err(|e| AppError::Config(e.to_string()))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: default_storage(),
            session: SessionConfig::default(),
            output: default_output(),
        }
    }
}

// Default values
fn default_storage() -> StorageSettings {
    StorageSettings {
        database_url: default_database_url(),
        fallback_to_memory: default_fallback_to_memory(),
    }
}

fn default_database_url() -> String {
    "sqlite://longplay.db".to_string()
}

fn default_fallback_to_memory() -> bool {
    true
}

fn default_output() -> OutputSettings {
    OutputSettings { json: false }
}
