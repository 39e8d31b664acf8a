//! Main settings module.

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Runtime environment, controlling how strictly `Settings::validate` runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    #[default]
    Development,
    Staging,
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

/// ScyllaDB persistence configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    #[serde(default = "default_scylla_hosts")]
    pub scylla_hosts: Vec<String>,
    #[serde(default = "default_scylla_keyspace")]
    pub keyspace: String,
    #[serde(default = "default_replication_factor")]
    pub replication_factor: u8,
}

fn default_scylla_hosts() -> Vec<String> {
    std::env::var("SCYLLA_HOSTS")
        .map(|s| s.split(',').map(|h| h.trim().to_string()).collect())
        .unwrap_or_else(|_| vec!["127.0.0.1:9042".to_string()])
}

fn default_scylla_keyspace() -> String {
    std::env::var("SCYLLA_KEYSPACE").unwrap_or_else(|_| "mediation".to_string())
}

fn default_replication_factor() -> u8 {
    1
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            scylla_hosts: default_scylla_hosts(),
            keyspace: default_scylla_keyspace(),
            replication_factor: default_replication_factor(),
        }
    }
}

/// Bootstrap provider configuration: one optional API key per provider
/// family, a symmetric encryption key, and the cloud-secret-manager flag.
/// Consulted only when the durable registry has no row for a given
/// provider key yet (see `bootstrap_from_config`'s precedence rule).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProviderBootstrapConfig {
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default)]
    pub anthropic_api_key: Option<String>,
    #[serde(default)]
    pub google_api_key: Option<String>,
    #[serde(default)]
    pub cohere_api_key: Option<String>,
    #[serde(default)]
    pub ollama_base_url: Option<String>,
    /// Symmetric key used to construct the credential cipher at startup.
    /// `None` means credentials are stored in plain text — the caller must
    /// log this as an insecure configuration.
    #[serde(default)]
    pub encryption_key: Option<String>,
    #[serde(default)]
    pub use_secret_manager: bool,
}

/// Server (thin ingress) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Main application settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub persistence: PersistenceConfig,
    #[serde(default)]
    pub providers: ProviderBootstrapConfig,
    /// Inactivity window (seconds) before an automatic teacher notification
    /// fires for an escalation-worthy session (default 5 minutes).
    #[serde(default = "default_inactivity_notification_secs")]
    pub inactivity_notification_secs: u64,
    /// Per-session lock acquisition timeout (suggested 30s).
    #[serde(default = "default_session_lock_timeout_secs")]
    pub session_lock_timeout_secs: u64,
}

fn default_inactivity_notification_secs() -> u64 {
    300
}

fn default_session_lock_timeout_secs() -> u64 {
    30
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "port must be nonzero".to_string(),
            });
        }
        if self.persistence.scylla_hosts.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "persistence.scylla_hosts".to_string(),
                message: "at least one ScyllaDB host is required".to_string(),
            });
        }
        if self.persistence.replication_factor == 0 {
            return Err(ConfigError::InvalidValue {
                field: "persistence.replication_factor".to_string(),
                message: "replication factor must be at least 1".to_string(),
            });
        }
        if self.inactivity_notification_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "inactivity_notification_secs".to_string(),
                message: "must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Load layered settings: `config/default` then `config/<env>` then
/// `MEDIATION__`-prefixed environment variables, then validate.
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("MEDIATION")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    if settings.providers.encryption_key.is_none() {
        tracing::warn!(
            "no encryption key configured; provider credentials will be stored in plain text"
        );
    }

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_validate() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8080);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn zero_port_is_rejected() {
        let mut settings = Settings::default();
        settings.server.port = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn zero_replication_factor_is_rejected() {
        let mut settings = Settings::default();
        settings.persistence.replication_factor = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn environment_strictness() {
        assert!(!RuntimeEnvironment::Development.is_strict());
        assert!(RuntimeEnvironment::Production.is_strict());
    }
}
