//! Configuration resolution from disk.
//!
//! An application directory may contain:
//!
//! ```text
//! config/config.default.toml   base settings
//! config/config.<env>.toml     overlay for one environment
//! config/env                   name of the current environment
//! ```
//!
//! The environment is taken from `config/env`, then `PLANT_ENV`, then
//! defaults to `prod`. Every file is optional.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::schema::PlantConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment used when none is configured.
pub const DEFAULT_ENV: &str = "prod";

/// Environment variable naming the current environment.
pub const ENV_VAR: &str = "PLANT_ENV";

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("parse error in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {source}")]
    Schema {
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid setting '{key}': {source}")]
    Setting {
        key: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Resolve the configuration of the application in `app_dir`.
pub fn resolve(app_dir: &Path) -> Result<PlantConfig, ConfigError> {
    resolve_with_env(app_dir, std::env::var(ENV_VAR).ok())
}

/// Like [`resolve`], with the value of `PLANT_ENV` passed explicitly.
pub fn resolve_with_env(
    app_dir: &Path,
    env_var: Option<String>,
) -> Result<PlantConfig, ConfigError> {
    let config_dir = app_dir.join("config");

    let mut merged = read_table(&config_dir.join("config.default.toml"))?.unwrap_or_default();

    let env = current_env(&config_dir, env_var)?;
    if let Some(overlay) = read_table(&config_dir.join(format!("config.{env}.toml")))? {
        merge_tables(&mut merged, overlay);
    }

    let config = finish(merged, env)?;
    tracing::debug!(
        app_dir = %app_dir.display(),
        env = %config.env,
        "Configuration resolved"
    );
    Ok(config)
}

fn current_env(config_dir: &Path, env_var: Option<String>) -> Result<String, ConfigError> {
    let env_file = config_dir.join("env");
    let from_file = match fs::read_to_string(&env_file) {
        Ok(content) => Some(content.trim().to_string()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(source) => {
            return Err(ConfigError::Io {
                path: env_file,
                source,
            })
        }
    };

    Ok([from_file, env_var.map(|v| v.trim().to_string())]
        .into_iter()
        .flatten()
        .find(|env| !env.is_empty())
        .unwrap_or_else(|| DEFAULT_ENV.to_string()))
}

fn read_table(path: &Path) -> Result<Option<toml::Table>, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    toml::from_str(&content)
        .map(Some)
        .map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

/// Merge `overlay` into `base`; nested tables merge, other values replace.
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

fn finish(table: toml::Table, env: String) -> Result<PlantConfig, ConfigError> {
    let mut config: PlantConfig = toml::Value::Table(table)
        .try_into()
        .map_err(|source| ConfigError::Schema { source })?;
    config.env = env;

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}
