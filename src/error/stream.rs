//! Failures observed while a generation is streaming.

use thiserror::Error;

use super::network::NetworkError;

/// Stream-specific error variants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    /// The generate request never produced a body.
    #[error("Generate request failed: {0}")]
    RequestFailed(NetworkError),

    /// The body broke off after `received_bytes` bytes.
    #[error("Stream lost after {received_bytes} bytes: {message}")]
    ConnectionLost {
        message: String,
        received_bytes: usize,
    },

    /// The backend reported a pipeline failure with an `ERROR` event.
    #[error("Backend error: {message}")]
    BackendError { message: String },

    /// The update channel closed while the read loop was running.
    #[error("Stream receiver dropped")]
    ReceiverDropped,
}

impl StreamError {
    pub fn is_retryable(&self) -> bool {
        match self {
            StreamError::RequestFailed(err) => err.is_retryable(),
            StreamError::ConnectionLost { .. } => true,
            StreamError::BackendError { .. } | StreamError::ReceiverDropped => false,
        }
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            StreamError::RequestFailed(err) => err.user_message(),
            StreamError::ConnectionLost { .. } => {
                "Connection to the server was lost. The partial answer was kept.".to_string()
            }
            StreamError::BackendError { message } => message.clone(),
            StreamError::ReceiverDropped => "The conversation was closed.".to_string(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            StreamError::RequestFailed(_) => "E_STREAM_REQUEST",
            StreamError::ConnectionLost { .. } => "E_STREAM_LOST",
            StreamError::BackendError { .. } => "E_STREAM_BACKEND",
            StreamError::ReceiverDropped => "E_STREAM_CLOSED",
        }
    }
}
