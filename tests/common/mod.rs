//! Common test utilities for integration tests.
//!
//! ```ignore
//! mod common;
//! use common::{mock_session, wait_for_requests};
//! ```

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use uistream::adapters::mock::{MockHttpClient, RecordingAbortNotifier};
use uistream::protocol::{encode_event, UiEvent};
use uistream::session::ChatSession;
use uistream::{ChatClient, JobManager, SessionSignal};
use wiremock::{MockServer, Request};

pub const BASE_URL: &str = "http://backend.test";
pub const SESSION_ID: &str = "s1";

/// A session over an in-memory transport that records abort notifications.
pub struct MockSession {
    pub session: ChatSession,
    pub http: MockHttpClient,
    pub notifier: RecordingAbortNotifier,
}

pub fn mock_session() -> MockSession {
    let http = MockHttpClient::new();
    let notifier = RecordingAbortNotifier::new();
    let client = ChatClient::with_http(Arc::new(http.clone()), BASE_URL);
    let jobs = JobManager::new(Arc::new(notifier.clone()));
    MockSession {
        session: ChatSession::with_session_id(SESSION_ID, client, jobs),
        http,
        notifier,
    }
}

pub fn chat_url() -> String {
    format!("{}/chat/", BASE_URL)
}

/// Wire form of an event, marker and newline included.
pub fn event_line(event: UiEvent) -> String {
    encode_event(&event).expect("events always serialize")
}

/// Apply updates until the session has no open generation.
pub async fn drive(session: &mut ChatSession) -> Vec<SessionSignal> {
    let mut signals = Vec::new();
    while session.is_generating() {
        let update = tokio::time::timeout(Duration::from_secs(5), session.next_update())
            .await
            .expect("timed out waiting for a stream update")
            .expect("update channel closed");
        signals.extend(session.handle_update(update));
    }
    signals
}

/// Poll `server` until it has seen `count` requests to `path`.
///
/// Abort notifications are sent from a detached task, so tests wait for
/// them instead of asserting right away.
pub async fn wait_for_requests(server: &MockServer, path: &str, count: usize) -> Vec<Request> {
    for _ in 0..100 {
        let matching: Vec<Request> = server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r.url.path() == path)
            .collect();
        if matching.len() >= count {
            return matching;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("expected {} request(s) to {}", count, path);
}
