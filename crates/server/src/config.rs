//! # Application Configuration
//!
//! This module defines the configuration structure for the `syncscript-server`
//! and the logic for loading it from an optional `config.yml` file layered
//! under environment variables.

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use regex::Regex;
use serde::Deserialize;
use std::env;
use std::fs;
use thiserror::Error;
use tracing::info;

/// A custom error type for configuration issues.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Indicates an error from the underlying `config` crate.
    #[error("Configuration error: {0}")]
    General(String),
    /// Indicates an explicitly requested configuration file was not found.
    #[error("{0}")]
    NotFound(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::General(err.to_string())
    }
}

/// The root configuration structure, mapping directly to `config.yml`.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// The port for the server to listen on. Loaded from `PORT` env var.
    #[serde(default = "default_port")]
    pub port: u16,
    /// The path to the SQLite database file. Loaded from `DB_URL` env var.
    #[serde(default = "default_db_url")]
    pub db_url: String,
    /// HMAC secret for session tokens. Loaded from `JWT_SECRET` env var.
    #[serde(default)]
    pub jwt_secret: Option<String>,
    /// Session token lifetime in seconds. Loaded from `JWT_TTL_SECS` env var.
    #[serde(default = "default_jwt_ttl_secs")]
    pub jwt_ttl_secs: u64,
    #[serde(default)]
    pub uploads: UploadsConfig,
    /// The citation model. Citations use the fallback format when absent.
    #[serde(default)]
    pub citation: Option<CitationConfig>,
}

fn default_port() -> u16 {
    9090
}

fn default_db_url() -> String {
    "db/syncscript.db".to_string()
}

/// Thirty days.
fn default_jwt_ttl_secs() -> u64 {
    30 * 24 * 60 * 60
}

/// Limits on registered PDF uploads.
#[derive(Debug, Deserialize, Clone)]
pub struct UploadsConfig {
    #[serde(default = "default_max_upload_bytes")]
    pub max_bytes: u64,
    #[serde(default = "default_allowed_content_types")]
    pub allowed_content_types: Vec<String>,
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_upload_bytes(),
            allowed_content_types: default_allowed_content_types(),
        }
    }
}

fn default_max_upload_bytes() -> u64 {
    10 * 1024 * 1024
}

fn default_allowed_content_types() -> Vec<String> {
    vec!["application/pdf".to_string()]
}

/// An OpenAI-compatible chat completions endpoint used for citations.
#[derive(Debug, Deserialize, Clone)]
pub struct CitationConfig {
    pub api_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    /// Sent as `HTTP-Referer`, which OpenRouter uses for attribution.
    #[serde(default)]
    pub referer: Option<String>,
}

// Helper to read a file, substitute env vars, and return its content.
// Returns Ok(None) if the file does not exist, or an error if it fails to read.
fn read_and_substitute(path: &str) -> Result<Option<String>, ConfigError> {
    if !std::path::Path::new(path).exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)
        .map_err(|e| ConfigError::General(format!("Failed to read config file '{path}': {e}")))?;

    let re = Regex::new(r"\$\{(?P<var>[A-Z0-9_]+)\}")
        .map_err(|e| ConfigError::General(e.to_string()))?;
    let expanded_content = re.replace_all(&content, |caps: &regex::Captures| {
        let var_name = &caps["var"];
        env::var(var_name).unwrap_or_default()
    });

    Ok(Some(expanded_content.to_string()))
}

/// Loads the application configuration from a file and environment variables.
///
/// - An explicit `config_path_override` must exist; otherwise `config.yml`
///   next to the crate manifest is loaded when present.
/// - Top-level keys like `port` and `db_url` are overridden by `PORT` and `DB_URL`.
/// - Nested keys are overridden by `SYNCSCRIPT_...` variables (e.g.,
///   `SYNCSCRIPT_UPLOADS__MAX_BYTES` or `SYNCSCRIPT_CITATION__API_KEY`).
pub fn get_config(config_path_override: Option<&str>) -> Result<AppConfig, ConfigError> {
    let mut builder = ConfigBuilder::builder();

    let main_content = match config_path_override {
        Some(path) => Some(read_and_substitute(path)?.ok_or_else(|| {
            ConfigError::NotFound(format!("Config file not found at '{path}'."))
        })?),
        None => {
            let default_path = format!("{}/config.yml", env!("CARGO_MANIFEST_DIR"));
            let content = read_and_substitute(&default_path)?;
            if content.is_some() {
                info!("Loading configuration from '{default_path}'.");
            }
            content
        }
    };
    if let Some(content) = main_content {
        builder = builder.add_source(File::from_str(&content, FileFormat::Yaml));
    }

    let settings = builder
        // Top-level keys like PORT.
        .add_source(Environment::default())
        // Prefixed variables for nested keys.
        .add_source(
            Environment::with_prefix("SYNCSCRIPT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("uploads.allowed_content_types"),
        )
        .build()?;

    let mut config: AppConfig = settings.try_deserialize()?;

    // An unset `${JWT_SECRET}` substitution leaves an empty string behind.
    if config.jwt_secret.as_deref().is_some_and(|s| s.trim().is_empty()) {
        config.jwt_secret = None;
    }

    Ok(config)
}
