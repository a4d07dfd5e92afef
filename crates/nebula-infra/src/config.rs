//! Configuration loading for Nebula.
//!
//! Reads an optional `config.toml` (missing file falls back to defaults,
//! malformed file logs a warning and falls back), then applies
//! environment overrides. Credentials come only from the environment and
//! are wrapped in [`SecretString`] so they never appear in logs.
//!
//! Environment variables:
//! - `NEBULA_WEAVIATE_SCHEME`, `NEBULA_WEAVIATE_HOST`, `NEBULA_WEAVIATE_PORT`
//! - `NEBULA_VECTOR_SOURCE` (`external` | `store`)
//! - `WEAVIATE_API_KEY` (optional; anonymous access without it)
//! - `GOOGLE_API_KEY` (required when the vector source is `external`)

use std::path::{Path, PathBuf};

use secrecy::SecretString;

use nebula_types::config::{NebulaConfig, VectorSource};
use nebula_types::error::ConfigError;

const WEAVIATE_API_KEY_VAR: &str = "WEAVIATE_API_KEY";
const GOOGLE_API_KEY_VAR: &str = "GOOGLE_API_KEY";

/// Resolve the data directory: `NEBULA_DATA_DIR`, then `~/.nebula`,
/// then `./.nebula` as a last resort.
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("NEBULA_DATA_DIR") {
        return PathBuf::from(dir);
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".nebula");
    }
    PathBuf::from(".nebula")
}

/// Load configuration from `{data_dir}/config.toml` plus env overrides.
pub async fn load_config(data_dir: &Path) -> Result<NebulaConfig, ConfigError> {
    let config_path = data_dir.join("config.toml");

    let mut config = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => match toml::from_str::<NebulaConfig>(&content) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(
                    "Failed to parse {}: {err}, using defaults",
                    config_path.display()
                );
                NebulaConfig::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(
                "No config.toml found at {}, using defaults",
                config_path.display()
            );
            NebulaConfig::default()
        }
        Err(err) => {
            tracing::warn!(
                "Failed to read {}: {err}, using defaults",
                config_path.display()
            );
            NebulaConfig::default()
        }
    };

    apply_env_overrides(&mut config)?;
    Ok(config)
}

/// Environment variables override file values. Malformed values are
/// fatal: a typo'd port should not silently fall back to a default.
fn apply_env_overrides(config: &mut NebulaConfig) -> Result<(), ConfigError> {
    if let Ok(scheme) = std::env::var("NEBULA_WEAVIATE_SCHEME") {
        config.weaviate.scheme = scheme;
    }
    if let Ok(host) = std::env::var("NEBULA_WEAVIATE_HOST") {
        config.weaviate.host = host;
    }
    if let Ok(port) = std::env::var("NEBULA_WEAVIATE_PORT") {
        config.weaviate.port = port.parse().map_err(|_| ConfigError::InvalidValue {
            key: "NEBULA_WEAVIATE_PORT".to_string(),
            message: format!("'{port}' is not a valid port number"),
        })?;
    }
    if let Ok(source) = std::env::var("NEBULA_VECTOR_SOURCE") {
        config.vector_source =
            source
                .parse::<VectorSource>()
                .map_err(|message| ConfigError::InvalidValue {
                    key: "NEBULA_VECTOR_SOURCE".to_string(),
                    message,
                })?;
    }
    Ok(())
}

/// The store API key, if one is configured. Anonymous access otherwise.
pub fn weaviate_api_key() -> Option<SecretString> {
    std::env::var(WEAVIATE_API_KEY_VAR)
        .ok()
        .map(SecretString::from)
}

/// The embedding API key. Required before any network call is made when
/// vectors are computed externally; absence fails fast with a
/// descriptive error.
pub fn google_api_key() -> Result<SecretString, ConfigError> {
    std::env::var(GOOGLE_API_KEY_VAR)
        .map(SecretString::from)
        .map_err(|_| ConfigError::MissingCredential(GOOGLE_API_KEY_VAR))
}
