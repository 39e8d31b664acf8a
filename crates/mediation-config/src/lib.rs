//! Configuration management for the mediation engine.
//!
//! Supports loading configuration from:
//! - YAML files under `config/`
//! - `MEDIATION__`-prefixed environment variables
//! - Runtime overrides via `Settings::validate`
//!
//! Layering and validation: `config/default` + `config/<env>` +
//! environment, then `try_deserialize` then `validate`.

pub mod settings;

pub use settings::{
    PersistenceConfig, ProviderBootstrapConfig, RuntimeEnvironment, ServerConfig, Settings,
    load_settings,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("environment error: {0}")]
    Environment(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
