//! Configuration module for autojoin.
//!
//! Handles the TOML settings file and environment overrides.

mod settings;

pub use settings::{
    expand_env_vars, DatabaseSettings, QuerySettings, SchemaSettings, Settings, SettingsError,
};
