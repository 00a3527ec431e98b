//! Trait abstractions for dependency injection and testability.
//!
//! - [`HttpClient`] - HTTP transport (GET, POST, streaming POST)
//!
//! The abort-notification seam lives with the job manager, see
//! [`crate::jobs::AbortNotifier`].

pub mod http;

pub use http::{ByteStream, Headers, HttpClient, HttpError, Response};
