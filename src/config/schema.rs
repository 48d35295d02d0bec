//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files.
//! Keys not claimed by a framework section are kept in
//! [`PlantConfig::settings`] for the application itself.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::loader::{ConfigError, DEFAULT_ENV};
use crate::http::context::DEFAULT_BODY_LIMIT;

/// Root configuration of a plant application.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PlantConfig {
    /// Environment this configuration was resolved for.
    #[serde(skip)]
    pub env: String,

    /// HTTP server settings.
    pub server: ServerConfig,

    /// Log output settings.
    pub logging: LoggingConfig,

    /// Application-defined settings.
    #[serde(flatten)]
    pub settings: toml::Table,
}

impl Default for PlantConfig {
    fn default() -> Self {
        Self {
            env: DEFAULT_ENV.to_string(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            settings: toml::Table::new(),
        }
    }
}

impl PlantConfig {
    /// Deserialize an application setting.
    ///
    /// Returns `Ok(None)` when the key is absent.
    pub fn setting<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        self.settings
            .get(key)
            .cloned()
            .map(|value| {
                value.try_into().map_err(|source| ConfigError::Setting {
                    key: key.to_string(),
                    source,
                })
            })
            .transpose()
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind (e.g., "127.0.0.1").
    pub hostname: String,

    /// Port to bind.
    pub port: u16,

    /// Total time allowed per request, enforced by the transport layer.
    /// `None` disables the timeout.
    pub request_timeout_secs: Option<u64>,

    /// Maximum request body size buffered by `Context::body_bytes`.
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            hostname: "127.0.0.1".to_string(),
            port: 7001,
            request_timeout_secs: None,
            max_body_size: DEFAULT_BODY_LIMIT,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output for development.
    #[default]
    Pretty,
    /// One JSON object per line for production.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set.
    pub level: String,

    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}
