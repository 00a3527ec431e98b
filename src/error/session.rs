//! Errors returned by [`crate::session::ChatSession`] operations.

use std::time::Duration;
use thiserror::Error;

use crate::client::ChatMode;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The backend asked us to back off for this mode.
    #[error("{mode} mode is rate limited for another {}s", .retry_after.as_secs())]
    RateLimited {
        mode: ChatMode,
        retry_after: Duration,
        provider: Option<String>,
    },

    #[error("Question is empty")]
    EmptyQuestion,

    #[error("No active generation for session {session_id}")]
    NoActiveJob { session_id: String },
}

impl SessionError {
    pub fn user_message(&self) -> String {
        match self {
            SessionError::RateLimited {
                retry_after,
                provider,
                ..
            } => {
                // Round up so "0 seconds" is never shown while still blocked
                let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
                match provider {
                    Some(p) => format!("{} is rate limited. Try again in {} seconds.", p, secs),
                    None => format!("Rate limited. Try again in {} seconds.", secs),
                }
            }
            SessionError::EmptyQuestion => "Type a question first.".to_string(),
            SessionError::NoActiveJob { .. } => "Nothing is generating right now.".to_string(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            SessionError::RateLimited { .. } => "E_SESSION_RATE",
            SessionError::EmptyQuestion => "E_SESSION_EMPTY",
            SessionError::NoActiveJob { .. } => "E_SESSION_IDLE",
        }
    }
}
