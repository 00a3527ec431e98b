//! Error handling.
//!
//! - **Error Categories**: high-level classification for retry and messaging
//! - **Domain errors**: network, stream, session and config
//! - **Unified type**: [`UiStreamError`] wraps all of them
//! - **Result alias**: [`UiStreamResult`]
//!
//! The parser and the event decoder have no error type: malformed input
//! degrades to text. Abort notifications never surface an error either.
//!
//! | Category | Examples | Retryable |
//! |----------|----------|-----------|
//! | Network | connect refused, timeout, body reset | Yes |
//! | Server | HTTP 5xx, `ERROR` event | Yes |
//! | Client | HTTP 4xx, bad JSON response | No |
//! | User | rate-limit cool-down, empty question | No |
//! | Configuration | bad base URL, unknown mode | No |

mod category;
mod config;
mod network;
mod result;
mod session;
mod stream;
mod uistream_error;

pub use category::ErrorCategory;
pub use config::ConfigError;
pub use network::NetworkError;
pub use result::UiStreamResult;
pub use session::SessionError;
pub use stream::StreamError;
pub use uistream_error::UiStreamError;
