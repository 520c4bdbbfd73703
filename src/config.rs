//! Configuration file support for artifact-graph.
//!
//! Provides YAML-based configuration through `artifact-graph.config.yml` files,
//! including data structures, file loading, validation and the defaults used
//! when a key is absent.

use anyhow::Context;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::application::services::SweeperSettings;
use crate::shared::error::AnalysisError;
use crate::shared::security::{read_bounded_file, MAX_CONFIG_SIZE};
use crate::shared::Result;

pub const CONFIG_FILENAME: &str = "artifact-graph.config.yml";

pub const DEFAULT_REPOSITORY_URL: &str = "https://repo.maven.apache.org/maven2";
pub const DEFAULT_SEARCH_URL: &str = "https://search.maven.org/solrsearch/select";
pub const DEFAULT_STORE_PATH: &str = "artifact-graph.store.json";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 5;
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Top-level configuration file schema.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    pub repository_url: Option<String>,
    pub search_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
    pub store_path: Option<PathBuf>,
    pub sweeper: Option<SweeperSection>,
    /// Captures unknown fields for warnings.
    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_yaml_ng::Value>,
}

/// The `sweeper:` block of the configuration file.
#[derive(Debug, Deserialize, Default)]
pub struct SweeperSection {
    pub batch_size: Option<usize>,
    pub concurrency: Option<usize>,
    pub max_retries: Option<u32>,
    pub idle_interval_secs: Option<u64>,
    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_yaml_ng::Value>,
}

/// Effective settings after applying defaults to the configuration file.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub repository_url: String,
    pub search_url: String,
    pub request_timeout: Duration,
    pub max_retries: u32,
    pub store_path: PathBuf,
    pub sweeper: SweeperSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            repository_url: DEFAULT_REPOSITORY_URL.to_string(),
            search_url: DEFAULT_SEARCH_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            sweeper: SweeperSettings::default(),
        }
    }
}

impl Settings {
    /// Applies the values present in `config` over the defaults.
    pub fn from_config(config: Option<ConfigFile>) -> Self {
        let defaults = Self::default();
        let Some(config) = config else {
            return defaults;
        };

        let sweeper = config.sweeper.unwrap_or_default();
        let default_sweeper = defaults.sweeper;
        Self {
            repository_url: config.repository_url.unwrap_or(defaults.repository_url),
            search_url: config.search_url.unwrap_or(defaults.search_url),
            request_timeout: config
                .request_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            max_retries: config.max_retries.unwrap_or(defaults.max_retries),
            store_path: config.store_path.unwrap_or(defaults.store_path),
            sweeper: SweeperSettings {
                batch_size: sweeper.batch_size.unwrap_or(default_sweeper.batch_size),
                concurrency: sweeper.concurrency.unwrap_or(default_sweeper.concurrency),
                max_retries: sweeper.max_retries.unwrap_or(default_sweeper.max_retries),
                idle_interval: sweeper
                    .idle_interval_secs
                    .map(Duration::from_secs)
                    .unwrap_or(default_sweeper.idle_interval),
            },
        }
    }
}

/// Load config from an explicit path. Returns an error if the file is not found.
pub fn load_config_from_path(path: &Path) -> Result<ConfigFile> {
    let content = read_bounded_file(path, "config file", MAX_CONFIG_SIZE).with_context(|| {
        format!(
            "Failed to read config file: {}\n\n💡 Hint: Check that the file exists and is readable.",
            path.display()
        )
    })?;

    let config: ConfigFile = serde_yaml_ng::from_str(&content).with_context(|| {
        format!(
            "Failed to parse config file: {}\n\n💡 Hint: Ensure the file contains valid YAML syntax.",
            path.display()
        )
    })?;

    validate_config(&config)?;
    warn_unknown_fields(&config);

    Ok(config)
}

/// Auto-discover config in a directory. Returns `None` silently if not found.
pub fn discover_config(dir: &Path) -> Result<Option<ConfigFile>> {
    let config_path = dir.join(CONFIG_FILENAME);

    if !config_path.exists() {
        return Ok(None);
    }

    let config = load_config_from_path(&config_path)?;
    Ok(Some(config))
}

fn invalid_config(message: String) -> anyhow::Error {
    AnalysisError::validation(format!("Invalid config: {}", message)).into()
}

/// Validate the loaded configuration.
fn validate_config(config: &ConfigFile) -> Result<()> {
    for (key, url) in [
        ("repository_url", &config.repository_url),
        ("search_url", &config.search_url),
    ] {
        if let Some(url) = url {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(invalid_config(format!(
                    "{} must be an http(s) URL, got '{}'",
                    key, url
                )));
            }
        }
    }

    if config.request_timeout_secs == Some(0) {
        return Err(invalid_config(
            "request_timeout_secs must be positive".to_string(),
        ));
    }
    if config.max_retries == Some(0) {
        return Err(invalid_config("max_retries must be positive".to_string()));
    }

    if let Some(sweeper) = &config.sweeper {
        let positive = [
            ("sweeper.batch_size", sweeper.batch_size.map(|v| v as u64)),
            ("sweeper.concurrency", sweeper.concurrency.map(|v| v as u64)),
            ("sweeper.max_retries", sweeper.max_retries.map(u64::from)),
            ("sweeper.idle_interval_secs", sweeper.idle_interval_secs),
        ];
        for (key, value) in positive {
            if value == Some(0) {
                return Err(invalid_config(format!("{} must be positive", key)));
            }
        }
    }
    Ok(())
}

/// Warn about unknown fields in the config file.
fn warn_unknown_fields(config: &ConfigFile) {
    for key in config.unknown_fields.keys() {
        warn!(field = %key, "Unknown config field will be ignored");
    }
    if let Some(sweeper) = &config.sweeper {
        for key in sweeper.unknown_fields.keys() {
            warn!(field = %format!("sweeper.{}", key), "Unknown config field will be ignored");
        }
    }
}
