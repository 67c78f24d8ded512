//! # Configuration
//!
//! Process-wide static configuration, loaded once at startup from a JSON
//! file. Every field has a default, so an empty object (or no file at all)
//! yields a working local setup. There is no reload.

mod errors;
mod layers;

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::catalog::is_safe_identifier;
use crate::http_server::HttpServerConfig;

pub use errors::{ConfigError, ConfigResult};
pub use layers::{LayerAttributes, LayerRegistry};

/// Overrides `database.password` when set.
pub const PASSWORD_ENV: &str = "GEOPORTAL_DB_PASSWORD";

/// Spatial database connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_host")]
    pub host: String,

    #[serde(default = "default_db_port")]
    pub port: u16,

    #[serde(default = "default_db_user")]
    pub user: String,

    #[serde(default)]
    pub password: String,

    #[serde(default = "default_dbname")]
    pub dbname: String,

    /// Schema the spatial catalog is scoped to (default: "public")
    #[serde(default = "default_schema")]
    pub schema: String,

    /// Geometry column excluded from feature properties (default: "geom")
    #[serde(default = "default_geometry_column")]
    pub geometry_column: String,
}

fn default_db_host() -> String {
    "localhost".to_string()
}
fn default_db_port() -> u16 {
    5432
}
fn default_db_user() -> String {
    "postgres".to_string()
}
fn default_dbname() -> String {
    "GIS_CRPF".to_string()
}
fn default_schema() -> String {
    "public".to_string()
}
fn default_geometry_column() -> String {
    "geom".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: default_db_host(),
            port: default_db_port(),
            user: default_db_user(),
            password: String::new(),
            dbname: default_dbname(),
            schema: default_schema(),
            geometry_column: default_geometry_column(),
        }
    }
}

/// Top-level configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: HttpServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub layers: LayerRegistry,
}

impl AppConfig {
    /// Load configuration from file, apply environment overrides, validate.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config = Self::from_json(&content)?;
        config.apply_password_override(std::env::var(PASSWORD_ENV).ok());
        config.validate()?;

        Ok(config)
    }

    /// Defaults plus environment overrides, for running without a file.
    pub fn from_env() -> ConfigResult<Self> {
        let mut config = Self::default();
        config.apply_password_override(std::env::var(PASSWORD_ENV).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(content: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn apply_password_override(&mut self, password: Option<String>) {
        if let Some(password) = password {
            self.database.password = password;
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.server.port == 0 {
            return Err(ConfigError::invalid("server.port must be > 0"));
        }
        if self.database.port == 0 {
            return Err(ConfigError::invalid("database.port must be > 0"));
        }
        if !is_safe_identifier(&self.database.schema) {
            return Err(ConfigError::invalid(format!(
                "Invalid database.schema: '{}'",
                self.database.schema
            )));
        }
        if !is_safe_identifier(&self.database.geometry_column) {
            return Err(ConfigError::invalid(format!(
                "Invalid database.geometry_column: '{}'",
                self.database.geometry_column
            )));
        }
        self.layers.validate()
    }
}
