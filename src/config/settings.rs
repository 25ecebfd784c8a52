//! TOML-based configuration for autojoin.
//!
//! Supports a config file (autojoin.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! dialect = "postgres"
//!
//! [schema]
//! allowed_schemas = ["public", "sales"]
//! blocked_tables = ["audit_log"]
//! derived_prefix = "u_"
//! include_derived = false
//!
//! [query]
//! default_limit = 500
//!
//! [database]
//! path = "${DATA_DIR}/app.db"
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::sql::dialect::{Dialect, UnknownDialect};

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error(transparent)]
    UnknownDialect(#[from] UnknownDialect),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// SQL dialect statements are rendered for.
    pub dialect: Dialect,

    /// Which introspected tables become part of the graph.
    pub schema: SchemaSettings,

    /// Request defaults.
    pub query: QuerySettings,

    /// Database the CLI executes against.
    pub database: DatabaseSettings,
}

/// Metadata filtering and derived-table naming.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SchemaSettings {
    /// Schemas to keep; empty keeps all. Unqualified tables count as `public`.
    pub allowed_schemas: Vec<String>,

    /// Tables never exposed, by bare or qualified name.
    pub blocked_tables: Vec<String>,

    /// Name prefix of derived tables.
    pub derived_prefix: String,

    /// Expose previously saved derived tables at startup.
    pub include_derived: bool,
}

impl Default for SchemaSettings {
    fn default() -> Self {
        Self {
            allowed_schemas: Vec::new(),
            blocked_tables: Vec::new(),
            derived_prefix: "u_".to_string(),
            include_derived: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct QuerySettings {
    /// LIMIT applied to requests that set none.
    pub default_limit: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// SQLite database path (supports ${ENV_VAR} expansion).
    pub path: Option<String>,
}

impl DatabaseSettings {
    /// The database path with environment variables expanded.
    pub fn resolved_path(&self) -> Result<Option<PathBuf>, SettingsError> {
        self.path
            .as_deref()
            .map(|p| expand_env_vars(p).map(PathBuf::from))
            .transpose()
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `AUTOJOIN_CONFIG`
    /// 2. `./autojoin.toml`
    /// 3. `~/.config/autojoin/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        // Check environment variable first
        if let Ok(path) = env::var("AUTOJOIN_CONFIG") {
            return Self::from_file(&path);
        }

        // Check local directory
        let local_config = PathBuf::from("autojoin.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        // Check user config directory
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("autojoin").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        // Return defaults if no config file found
        Ok(Settings::default())
    }

    /// Apply `AUTOJOIN_*` environment overrides.
    ///
    /// List variables are comma-separated.
    pub fn apply_env(mut self) -> Result<Self, SettingsError> {
        if let Ok(dialect) = env::var("AUTOJOIN_DIALECT") {
            self.dialect = dialect.parse()?;
        }
        if let Ok(schemas) = env::var("AUTOJOIN_ALLOWED_SCHEMAS") {
            self.schema.allowed_schemas = split_list(&schemas);
        }
        if let Ok(tables) = env::var("AUTOJOIN_BLOCKED_TABLES") {
            self.schema.blocked_tables = split_list(&tables);
        }
        Ok(self)
    }
}

fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let var_name: String = if chars.peek() == Some(&'{') {
            chars.next(); // consume '{'
            chars.by_ref().take_while(|ch| *ch != '}').collect()
        } else {
            // $VAR (ends at non-alphanumeric/underscore)
            let mut name = String::new();
            while let Some(ch) = chars.next_if(|ch| ch.is_alphanumeric() || *ch == '_') {
                name.push(ch);
            }
            if name.is_empty() {
                // Just a lone $, keep it
                result.push('$');
                continue;
            }
            name
        };

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
