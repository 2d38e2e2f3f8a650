use std::{env, fs, path::Path};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ConfigError, Result};

/// Driver used when no `type` is configured.
pub const DEFAULT_DB_TYPE: &str = "sqlite";

/// Application's configuration
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Config {
    /// Enables debug behaviour, including query logging.
    /// Default: false
    pub debug: Option<bool>,

    /// Database connection settings.
    #[serde(default)]
    pub db: DbConfig,
}

/// Connection settings for the underlying database.
///
/// Every field can be overridden by the matching `DB_*` environment variable.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct DbConfig {
    /// Database driver.
    /// Default: sqlite
    #[serde(rename = "type")]
    pub db_type: Option<String>,

    /// Database name, or the file path for sqlite (`:memory:` is accepted).
    pub database: Option<String>,

    pub host: Option<String>,

    pub username: Option<String>,

    pub password: Option<String>,

    pub charset: Option<String>,

    pub collation: Option<String>,

    pub port: Option<u16>,

    /// Prefix prepended to every table name.
    pub prefix: Option<String>,

    /// Keep an in-memory log of the executed queries.
    /// Default: false
    pub logging: Option<bool>,
}

impl DbConfig {
    pub fn db_type(&self) -> &str {
        self.db_type.as_deref().unwrap_or(DEFAULT_DB_TYPE)
    }

    pub fn prefix(&self) -> &str {
        self.prefix.as_deref().unwrap_or_default()
    }

    pub fn logging(&self) -> bool {
        self.logging.unwrap_or(false)
    }
}

impl Config {
    /// Reads the configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config = toml::from_str(&content)?;
        debug!("loaded configuration from {}", path.as_ref().display());
        Ok(config)
    }

    /// Builds the configuration from the environment only.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Loads the configuration file when one is given, then overlays the
    /// environment on top of it.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        if config.db.logging.is_none() {
            config.db.logging = config.debug;
        }

        if config.db.database.is_none() {
            warn!("no database configured, falling back to an in-memory database");
        }

        Ok(config)
    }

    pub fn debug(&self) -> bool {
        self.debug.unwrap_or(false)
    }

    /// Overrides fields with the `DB_*` and `DEBUG` environment variables.
    pub fn apply_env(&mut self) -> Result<()> {
        let db = &mut self.db;
        overlay(&mut db.db_type, "DB_TYPE");
        overlay(&mut db.database, "DB_DATABASE");
        overlay(&mut db.host, "DB_HOST");
        overlay(&mut db.username, "DB_USERNAME");
        overlay(&mut db.password, "DB_PASSWORD");
        overlay(&mut db.charset, "DB_CHARSET");
        overlay(&mut db.collation, "DB_COLLATION");
        overlay(&mut db.prefix, "DB_PREFIX");

        if let Ok(port) = env::var("DB_PORT") {
            let parsed = port.parse().map_err(|_| ConfigError::InvalidValue {
                key: "DB_PORT".into(),
                value: port.clone(),
            })?;
            db.port = Some(parsed);
        }

        if let Ok(debug) = env::var("DEBUG") {
            let enabled = debug == "true";
            self.debug = Some(enabled);
            self.db.logging = Some(enabled);
        }

        Ok(())
    }
}

fn overlay(field: &mut Option<String>, key: &str) {
    if let Ok(value) = env::var(key) {
        *field = Some(value);
    }
}
