//! Client configuration.
//!
//! Built with the builder methods or read from the environment:
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `UISTREAM_BASE_URL` | Backend base URL | `http://localhost:8000` |
//! | `UISTREAM_MODE` | `lite`, `base` or `net` | `lite` |
//! | `UISTREAM_BATCH` | Text batching cap in bytes, `0` emits every chunk | `32` |
//!
//! ```ignore
//! use uistream::config::ClientConfig;
//!
//! let config = ClientConfig::default()
//!     .with_base_url("http://10.0.0.5:8000")
//!     .with_mode(ChatMode::Net);
//! ```

use std::time::Duration;

use crate::client::ChatMode;
use crate::error::ConfigError;
use crate::stream::BatchPolicy;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

pub const ENV_BASE_URL: &str = "UISTREAM_BASE_URL";
pub const ENV_MODE: &str = "UISTREAM_MODE";
pub const ENV_BATCH: &str = "UISTREAM_BATCH";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend base URL, without trailing slash
    pub base_url: String,
    /// Mode used when a send does not name one
    pub mode: ChatMode,
    /// Pending-text cap for the stream parser
    pub batch_max_pending: usize,
    pub connect_timeout: Duration,
    /// Whole-request timeout, body included. `None` lets long answers stream
    /// for as long as they take.
    pub request_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            mode: ChatMode::default(),
            batch_max_pending: BatchPolicy::DEFAULT_MAX_PENDING,
            connect_timeout: Duration::from_secs(10),
            request_timeout: None,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_mode(mut self, mode: ChatMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_batch_max_pending(mut self, max_pending: usize) -> Self {
        self.batch_max_pending = max_pending;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn batch_policy(&self) -> BatchPolicy {
        BatchPolicy::new(self.batch_max_pending)
    }

    /// Check values a builder cannot reject on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.base_url.to_ascii_lowercase();
        let has_host = url
            .strip_prefix("http://")
            .or_else(|| url.strip_prefix("https://"))
            .is_some_and(|rest| !rest.is_empty());
        if !has_host {
            return Err(ConfigError::InvalidBaseUrl {
                value: self.base_url.clone(),
            });
        }
        Ok(())
    }

    /// Defaults overridden by `UISTREAM_*` variables. Unset or blank
    /// variables keep their default.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(url) = get(ENV_BASE_URL) {
            config = config.with_base_url(url.trim());
        }
        if let Some(mode) = get(ENV_MODE) {
            config = config.with_mode(mode.parse()?);
        }
        if let Some(batch) = get(ENV_BATCH) {
            let max_pending = batch
                .trim()
                .parse::<usize>()
                .map_err(|_| ConfigError::InvalidNumber {
                    key: ENV_BATCH.to_string(),
                    value: batch.clone(),
                })?;
            config = config.with_batch_max_pending(max_pending);
        }

        config.validate()?;
        tracing::debug!(base_url = %config.base_url, mode = %config.mode, "Loaded client config");
        Ok(config)
    }
}
