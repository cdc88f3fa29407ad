//! # triage-config
//!
//! Layered configuration loading for Triage using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`TRIAGE_*` prefix, `__` as separator)
//! 2. Project-level `.triage/config.toml`
//! 3. User-level `~/.config/triage/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `TRIAGE_AUDIT__SECRET` -> `audit.secret`,
//! `TRIAGE_DATABASE__PATH` -> `database.path`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use triage_config::TriageConfig;
//!
//! let config = TriageConfig::load_with_dotenv().expect("config");
//!
//! if config.audit.is_configured() {
//!     println!("audit digests enabled");
//! }
//! ```

mod audit;
mod database;
mod error;
mod general;

pub use audit::AuditConfig;
pub use database::DatabaseConfig;
pub use error::ConfigError;
pub use general::GeneralConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Project-relative directory holding local config and the database.
pub const PROJECT_DIR: &str = ".triage";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TriageConfig {
    #[serde(default)]
    pub audit: AuditConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub general: GeneralConfig,
}

impl TriageConfig {
    /// Load configuration from all sources, relative to the current directory.
    ///
    /// Does NOT call `dotenvy`; use [`Self::load_with_dotenv`] for `.env` support.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a source fails to parse or a value is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new("."))
    }

    /// Load configuration with `project_root` as the base for
    /// `.triage/config.toml` and a relative database path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a source fails to parse or a value is invalid.
    pub fn load_from(project_root: &Path) -> Result<Self, ConfigError> {
        let mut config: Self = Self::figment_for(project_root).extract()?;
        config.validate()?;
        let db_path = Path::new(&config.database.path);
        if !config.database.is_in_memory() && db_path.is_relative() {
            config.database.path = project_root.join(db_path).to_string_lossy().into_owned();
        }
        Ok(config)
    }

    /// Load configuration with `.env` file support.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a source fails to parse or a value is invalid.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Build the figment provider chain rooted at the current directory.
    pub fn figment() -> Figment {
        Self::figment_for(Path::new("."))
    }

    fn figment_for(project_root: &Path) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = project_root.join(PROJECT_DIR).join("config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed("TRIAGE_").split("__"))
    }

    /// Reject values that parse but cannot be used.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.general.default_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "general.default_limit".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.database.path.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "database.path".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("triage").join("config.toml"))
    }
}
