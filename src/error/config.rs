//! Configuration errors.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid base URL '{value}': must start with http:// or https://")]
    InvalidBaseUrl { value: String },

    #[error("Unknown chat mode '{value}' (expected lite, base or net)")]
    InvalidMode { value: String },

    #[error("{key} must be a non-negative integer, got '{value}'")]
    InvalidNumber { key: String, value: String },

    #[error("Failed to build HTTP client: {message}")]
    HttpClient { message: String },
}

impl ConfigError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ConfigError::InvalidBaseUrl { .. } => "E_CFG_URL",
            ConfigError::InvalidMode { .. } => "E_CFG_MODE",
            ConfigError::InvalidNumber { .. } => "E_CFG_NUMBER",
            ConfigError::HttpClient { .. } => "E_CFG_HTTP",
        }
    }
}
