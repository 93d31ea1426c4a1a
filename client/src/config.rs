//! Configuration for the grievance client.
//!
//! Values come from `GRIEVANCE_*` environment variables, with defaults that
//! match a locally running backend.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Default backend address.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default location of the durable session file.
pub const DEFAULT_STORAGE_PATH: &str = ".grievance/session.json";

/// Default `tracing` filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,grievance_session=debug,grievance_client=debug";

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed.
    #[error("Invalid value for {name}: {value}")]
    InvalidValue {
        /// Variable name
        name: &'static str,
        /// Raw value
        value: String,
    },
}

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Backend base URL (`GRIEVANCE_API_URL`).
    pub api_base_url: String,
    /// Per-request timeout (`GRIEVANCE_REQUEST_TIMEOUT_SECS`).
    pub request_timeout: Duration,
    /// Durable session file (`GRIEVANCE_STORAGE_PATH`).
    pub storage_path: PathBuf,
    /// Log filter used when `RUST_LOG` is unset (`GRIEVANCE_LOG`).
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if the timeout is not a whole
    /// number of seconds.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value.
    ///
    /// # Errors
    ///
    /// See [`Self::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let request_timeout = match lookup("GRIEVANCE_REQUEST_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::InvalidValue {
                    name: "GRIEVANCE_REQUEST_TIMEOUT_SECS",
                    value: raw,
                })?,
            None => defaults.request_timeout,
        };

        Ok(Self {
            api_base_url: lookup("GRIEVANCE_API_URL").unwrap_or(defaults.api_base_url),
            request_timeout,
            storage_path: lookup("GRIEVANCE_STORAGE_PATH")
                .map_or(defaults.storage_path, PathBuf::from),
            log_filter: lookup("GRIEVANCE_LOG").unwrap_or(defaults.log_filter),
        })
    }
}
