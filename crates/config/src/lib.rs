//! Configuration loading and management for Tidepool.
//!
//! Loads configuration from `~/.tidepool/config.toml` with environment
//! variable overrides (`TIDEPOOL_API_KEY`, `TIDEPOOL_MODEL`).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use tidepool_core::error::Error;

/// The root configuration structure.
///
/// Maps directly to `~/.tidepool/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the completion collaborator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default model, used when a workspace sets none
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default sampling temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Directory holding the persisted collections
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_model() -> String {
    "anthropic/claude-sonnet-4".into()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_data_dir() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".tidepool").join("state")
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_model: default_model(),
            default_temperature: default_temperature(),
            data_dir: default_data_dir(),
        }
    }
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("data_dir", &self.data_dir)
            .finish()
    }
}

impl AppConfig {
    /// Default config file location: `~/.tidepool/config.toml`.
    pub fn default_path() -> PathBuf {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".tidepool").join("config.toml")
    }

    /// Load configuration from a TOML file, then apply environment
    /// overrides. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let mut config = match std::fs::read_to_string(path) {
            Ok(raw) => toml::from_str(&raw).map_err(|e| Error::Config {
                message: format!("Failed to parse {}: {e}", path.display()),
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using defaults");
                Self::default()
            }
            Err(e) => {
                return Err(Error::Config {
                    message: format!("Failed to read {}: {e}", path.display()),
                });
            }
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides on top of file values.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("TIDEPOOL_API_KEY") {
            if !key.is_empty() {
                self.api_key = Some(key);
            }
        }
        if let Ok(model) = std::env::var("TIDEPOOL_MODEL") {
            if !model.is_empty() {
                self.default_model = model;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_sensible() {
        let config = AppConfig::default();
        assert!(config.api_key.is_none());
        assert_eq!(config.default_model, "anthropic/claude-sonnet-4");
        assert!((config.default_temperature - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn loads_partial_toml_with_defaults() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, r#"api_key = "sk-test""#).unwrap();
        writeln!(tmp, r#"default_model = "mock-model""#).unwrap();

        let config = AppConfig::load(tmp.path()).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.default_model, "mock-model");
        // unspecified fields fall back to defaults
        assert!((config.default_temperature - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = AppConfig::load(Path::new("/nonexistent/tidepool.toml")).unwrap();
        assert!(config.api_key.is_none());
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "api_key = [broken").unwrap();
        assert!(AppConfig::load(tmp.path()).is_err());
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = AppConfig {
            api_key: Some("sk-secret".into()),
            ..Default::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
