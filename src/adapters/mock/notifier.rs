//! Recording abort notifier for testing.

use std::sync::{Arc, Mutex};

use crate::jobs::AbortNotifier;

/// One recorded `notify` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbortCall {
    pub session_id: String,
    pub reason: Option<String>,
}

/// Records every notification instead of sending it. Clones share the log.
#[derive(Debug, Clone, Default)]
pub struct RecordingAbortNotifier {
    calls: Arc<Mutex<Vec<AbortCall>>>,
}

impl RecordingAbortNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<AbortCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls recorded for `session_id`.
    pub fn calls_for(&self, session_id: &str) -> Vec<AbortCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.session_id == session_id)
            .collect()
    }
}

impl AbortNotifier for RecordingAbortNotifier {
    fn notify(&self, session_id: &str, reason: Option<&str>) {
        self.calls.lock().unwrap().push(AbortCall {
            session_id: session_id.to_string(),
            reason: reason.map(str::to_string),
        });
    }
}
