//! Unified error type.

use thiserror::Error;

use super::category::ErrorCategory;
use super::config::ConfigError;
use super::network::NetworkError;
use super::session::SessionError;
use super::stream::StreamError;

/// Every error this crate returns, with uniform categorization and
/// user messaging.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UiStreamError {
    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Stream(#[from] StreamError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl UiStreamError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            UiStreamError::Network(NetworkError::HttpStatus { status, .. }) if *status >= 500 => {
                ErrorCategory::Server
            }
            UiStreamError::Network(NetworkError::HttpStatus { .. })
            | UiStreamError::Network(NetworkError::InvalidResponse { .. }) => ErrorCategory::Client,
            UiStreamError::Network(NetworkError::InvalidUrl { .. }) => ErrorCategory::Configuration,
            UiStreamError::Network(_) => ErrorCategory::Network,
            UiStreamError::Stream(StreamError::BackendError { .. }) => ErrorCategory::Server,
            UiStreamError::Stream(StreamError::RequestFailed(err)) => {
                UiStreamError::Network(err.clone()).category()
            }
            UiStreamError::Stream(StreamError::ConnectionLost { .. }) => ErrorCategory::Network,
            UiStreamError::Stream(StreamError::ReceiverDropped) => ErrorCategory::Client,
            UiStreamError::Session(SessionError::NoActiveJob { .. }) => ErrorCategory::Client,
            UiStreamError::Session(_) => ErrorCategory::User,
            UiStreamError::Config(_) => ErrorCategory::Configuration,
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            UiStreamError::Network(err) => err.is_retryable(),
            UiStreamError::Stream(err) => err.is_retryable(),
            // Retryable once the cool-down passes, but not right now
            UiStreamError::Session(_) | UiStreamError::Config(_) => false,
        }
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            UiStreamError::Network(err) => err.user_message(),
            UiStreamError::Stream(err) => err.user_message(),
            UiStreamError::Session(err) => err.user_message(),
            UiStreamError::Config(err) => err.to_string(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            UiStreamError::Network(err) => err.error_code(),
            UiStreamError::Stream(err) => err.error_code(),
            UiStreamError::Session(err) => err.error_code(),
            UiStreamError::Config(err) => err.error_code(),
        }
    }

    pub fn recovery_hint(&self) -> &'static str {
        self.category().recovery_hint()
    }
}
