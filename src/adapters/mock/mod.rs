//! Test doubles.
//!
//! - [`MockHttpClient`] - scripted HTTP responses and streams, request log
//! - [`RecordingAbortNotifier`] - records abort notifications

pub mod http;
pub mod notifier;

pub use http::{MockHttpClient, MockResponse, RecordedRequest};
pub use notifier::{AbortCall, RecordingAbortNotifier};
