//! Client configuration: built-in defaults plus environment overrides.
//!
//! Resolution order is CLI flag > environment variable > default. This module
//! covers the last two; the binary applies its flags on top of the result.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::transport::TransportKind;

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://jsonplaceholder.typicode.com";

/// Default resource path appended to the base URL.
pub const DEFAULT_RESOURCE: &str = "/posts";

/// Default connect timeout (5 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 5;

/// Default whole-request timeout for the blocking transports (10 seconds).
pub const READ_TIMEOUT_SECS: u64 = 10;

/// Default response timeout for the non-blocking transport and downloads (5 seconds).
///
/// Applies to the wait for response headers; body streaming is bounded per chunk
/// by the same value.
pub const RESPONSE_TIMEOUT_SECS: u64 = 5;

/// Directory name created under the platform temp directory for downloads.
pub const STORAGE_DIR_NAME: &str = "downloads";

pub const ENV_BASE_URL: &str = "APILINK_BASE_URL";
pub const ENV_RESOURCE: &str = "APILINK_RESOURCE";
pub const ENV_TRANSPORT: &str = "APILINK_TRANSPORT";
pub const ENV_CONNECT_TIMEOUT: &str = "APILINK_CONNECT_TIMEOUT_SECS";
pub const ENV_READ_TIMEOUT: &str = "APILINK_READ_TIMEOUT_SECS";
pub const ENV_RESPONSE_TIMEOUT: &str = "APILINK_RESPONSE_TIMEOUT_SECS";
pub const ENV_STORAGE_DIR: &str = "APILINK_STORAGE_DIR";

/// Errors raised while resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A setting was present but could not be used.
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        /// Setting name (environment variable or flag).
        key: String,
        /// The rejected raw value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl ConfigError {
    /// Creates an invalid-value error.
    pub fn invalid_value(
        key: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            key: key.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// Timeouts applied by every transport and by the download client.
///
/// Every blocking transport call is bounded by `connect_timeout` and
/// `read_timeout`, so no worker thread is held indefinitely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpSettings {
    /// Time allowed to establish a TCP/TLS connection.
    pub connect_timeout: Duration,
    /// Whole-request bound for blocking transports.
    pub read_timeout: Duration,
    /// Bound on waiting for a response (headers, then each body chunk) on async paths.
    pub response_timeout: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            read_timeout: Duration::from_secs(READ_TIMEOUT_SECS),
            response_timeout: Duration::from_secs(RESPONSE_TIMEOUT_SECS),
        }
    }
}

/// Complete client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub resource: String,
    pub http: HttpSettings,
    pub transport: TransportKind,
    pub storage_root: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            resource: DEFAULT_RESOURCE.to_string(),
            http: HttpSettings::default(),
            transport: TransportKind::default(),
            storage_root: default_storage_root(),
        }
    }
}

impl ClientConfig {
    /// Resolves configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves configuration through an arbitrary lookup function.
    ///
    /// Unset or blank values keep the default.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a value is set but cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(base_url) = get(ENV_BASE_URL) {
            config.base_url = base_url;
        }
        if let Some(resource) = get(ENV_RESOURCE) {
            config.resource = resource;
        }
        if let Some(raw) = get(ENV_TRANSPORT) {
            config.transport = TransportKind::from_str(raw.trim())
                .map_err(|reason| ConfigError::invalid_value(ENV_TRANSPORT, &raw, reason))?;
        }
        if let Some(raw) = get(ENV_CONNECT_TIMEOUT) {
            config.http.connect_timeout = parse_timeout(ENV_CONNECT_TIMEOUT, &raw)?;
        }
        if let Some(raw) = get(ENV_READ_TIMEOUT) {
            config.http.read_timeout = parse_timeout(ENV_READ_TIMEOUT, &raw)?;
        }
        if let Some(raw) = get(ENV_RESPONSE_TIMEOUT) {
            config.http.response_timeout = parse_timeout(ENV_RESPONSE_TIMEOUT, &raw)?;
        }
        if let Some(dir) = get(ENV_STORAGE_DIR) {
            config.storage_root = PathBuf::from(dir);
        }

        debug!(?config, "resolved client configuration");
        Ok(config)
    }
}

/// Platform temp directory joined with [`STORAGE_DIR_NAME`].
#[must_use]
pub fn default_storage_root() -> PathBuf {
    std::env::temp_dir().join(STORAGE_DIR_NAME)
}

/// Parses a positive whole number of seconds.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] for non-numeric or zero values.
pub fn parse_timeout(key: &str, raw: &str) -> Result<Duration, ConfigError> {
    let secs: u64 = raw
        .trim()
        .parse()
        .map_err(|_| ConfigError::invalid_value(key, raw, "expected whole seconds"))?;
    if secs == 0 {
        return Err(ConfigError::invalid_value(
            key,
            raw,
            "timeout must be at least 1 second",
        ));
    }
    Ok(Duration::from_secs(secs))
}
