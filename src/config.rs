//! Client and batch configuration, with optional TOML file and environment overrides.
//!
//! # Configuration File Format
//!
//! ```toml
//! email = "you@example.org"
//!
//! [client]
//! api_base_url = "https://api.unpaywall.org/v2"
//! connect_timeout_secs = 10
//! read_timeout_secs = 60
//! token_seed = 42
//!
//! [batch]
//! workers = 5
//! ```

use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use url::Url;

/// Default lookup endpoint.
pub const DEFAULT_API_BASE_URL: &str = "https://api.unpaywall.org/v2";

/// Default HTTP connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default HTTP read timeout (documents can be large).
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 60;

/// Default batch worker count.
pub const DEFAULT_WORKERS: usize = 5;

/// Smallest accepted worker count.
pub const MIN_WORKERS: usize = 1;

/// Largest accepted worker count.
pub const MAX_WORKERS: usize = 100;

const MAX_TIMEOUT_SECS: u64 = 3600;

/// Errors from loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Path of the config file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`FileConfig`].
    #[error("failed to parse config: {source}")]
    Parse {
        /// The underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// A value is outside its accepted range.
    #[error("invalid config value for `{field}`: {value}. Expected {expected}")]
    Invalid {
        /// Field name.
        field: &'static str,
        /// Offending value, rendered.
        value: String,
        /// Human-readable accepted range.
        expected: &'static str,
    },
}

/// Transport settings for a [`Client`](crate::Client).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Lookup endpoint; the identifier is appended as a path segment.
    pub api_base_url: String,
    /// HTTP connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// HTTP total request timeout in seconds.
    pub read_timeout_secs: u64,
    /// Overrides the default User-Agent header.
    pub user_agent: Option<String>,
    /// Seed for filename tokens; entropy-seeded when absent.
    pub token_seed: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            read_timeout_secs: DEFAULT_READ_TIMEOUT_SECS,
            user_agent: None,
            token_seed: None,
        }
    }
}

impl ClientConfig {
    /// Returns a default config pointed at another endpoint (mock servers, mirrors).
    #[must_use]
    pub fn with_base_url(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            ..Self::default()
        }
    }

    /// Validates URL and timeout ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if Url::parse(&self.api_base_url).is_err() {
            return Err(ConfigError::Invalid {
                field: "api_base_url",
                value: self.api_base_url.clone(),
                expected: "an absolute http(s) URL",
            });
        }
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("read_timeout_secs", self.read_timeout_secs)?;
        Ok(())
    }
}

/// Pool settings for a [`BatchCoordinator`](crate::BatchCoordinator).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    /// Number of concurrent workers.
    pub workers: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
        }
    }
}

impl BatchConfig {
    /// Validates the worker range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when `workers` is outside 1..=100.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if (MIN_WORKERS..=MAX_WORKERS).contains(&self.workers) {
            Ok(())
        } else {
            Err(ConfigError::Invalid {
                field: "workers",
                value: self.workers.to_string(),
                expected: "range 1..=100",
            })
        }
    }
}

/// Everything that can be set from the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Credential used for lookups.
    pub email: Option<String>,
    /// `[client]` table.
    pub client: ClientConfig,
    /// `[batch]` table.
    pub batch: BatchConfig,
}

impl FileConfig {
    /// Parses and validates TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown keys, and
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw).map_err(|source| ConfigError::Parse { source })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read, otherwise the
    /// errors of [`FileConfig::from_toml_str`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Validates both tables.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError::Invalid`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.client.validate()?;
        self.batch.validate()
    }

    /// Applies `UNPAYWALL_EMAIL`, `UNPAYWALL_WORKERS` and `UNPAYWALL_API_BASE_URL`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when an override is malformed.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides_from(|key| env::var(key).ok())
    }

    /// Applies overrides from an arbitrary variable lookup; empty values are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when an override is malformed.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(email) = lookup("UNPAYWALL_EMAIL") {
            self.email = Some(email);
        }
        if let Some(base_url) = lookup("UNPAYWALL_API_BASE_URL") {
            self.client.api_base_url = base_url;
        }
        if let Some(workers) = lookup("UNPAYWALL_WORKERS") {
            self.batch.workers = workers.trim().parse().map_err(|_| ConfigError::Invalid {
                field: "UNPAYWALL_WORKERS",
                value: workers.clone(),
                expected: "an integer in range 1..=100",
            })?;
        }
        self.validate()
    }
}

fn validate_timeout_secs(field: &'static str, value: u64) -> Result<(), ConfigError> {
    if (1..=MAX_TIMEOUT_SECS).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            value: value.to_string(),
            expected: "range 1..=3600",
        })
    }
}

/// Resolves the default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/unpaywall/config.toml`
/// 2. `$HOME/.config/unpaywall/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("unpaywall")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("unpaywall")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads the config from the default path, or defaults when no file exists.
/// Environment overrides are applied in both cases.
///
/// # Errors
///
/// Returns [`ConfigError`] when the file exists but is unreadable or invalid,
/// or when an environment override is malformed.
pub fn load_default_file_config() -> Result<FileConfig, ConfigError> {
    let mut config = match resolve_default_config_path() {
        Some(path) if path.exists() => FileConfig::load(&path)?,
        _ => FileConfig::default(),
    };
    config.apply_env_overrides()?;
    Ok(config)
}
