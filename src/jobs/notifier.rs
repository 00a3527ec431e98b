//! Remote abort notification.
//!
//! Notifying the backend is best-effort: the local token is already
//! cancelled by the time a notifier runs, and nothing waits on the result.

use crate::client::ChatClient;

/// Tells the backend to stop work for a session.
///
/// `notify` must not block and must not fail outward.
pub trait AbortNotifier: Send + Sync {
    fn notify(&self, session_id: &str, reason: Option<&str>);
}

/// Posts to `/abort/` on a detached tokio task.
#[derive(Debug, Clone)]
pub struct HttpAbortNotifier {
    client: ChatClient,
}

impl HttpAbortNotifier {
    pub fn new(client: ChatClient) -> Self {
        Self { client }
    }
}

impl AbortNotifier for HttpAbortNotifier {
    fn notify(&self, session_id: &str, reason: Option<&str>) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(session_id, "No tokio runtime, abort notification skipped");
            return;
        };

        let client = self.client.clone();
        let session_id = session_id.to_string();
        let reason = reason.map(str::to_string);

        runtime.spawn(async move {
            match client.notify_abort(&session_id, reason.as_deref()).await {
                Ok(()) => {
                    tracing::info!(session_id = %session_id, reason = ?reason, "Backend acknowledged abort");
                }
                Err(e) => {
                    tracing::warn!(
                        session_id = %session_id,
                        error_code = e.error_code(),
                        "Abort notification failed: {}",
                        e
                    );
                }
            }
        });
    }
}

/// Does nothing. For offline use and for callers that abort remotely some
/// other way.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAbortNotifier;

impl AbortNotifier for NoopAbortNotifier {
    fn notify(&self, session_id: &str, reason: Option<&str>) {
        tracing::debug!(session_id, reason, "Abort notification disabled");
    }
}
