//! Concrete implementations of trait abstractions.
//!
//! - [`ReqwestHttpClient`] - production HTTP client using reqwest
//!
//! The [`mock`] submodule provides the test doubles used by unit and
//! integration tests.

pub mod mock;
pub mod reqwest_http;

pub use mock::{MockHttpClient, MockResponse, RecordingAbortNotifier};
pub use reqwest_http::ReqwestHttpClient;
