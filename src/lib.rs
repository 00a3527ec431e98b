//! uistream - streaming core for a document-QA chat client
//!
//! The backend answers with a single byte stream that interleaves answer
//! text with structured UI events (`__UI_EVENT__{json}\n`). This crate
//! splits that stream into frames, applies them to chat messages, and runs
//! at most one generation per session with cooperative cancellation.
//!
//! This library exposes modules for use in integration tests and the CLI.

pub mod adapters;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod jobs;
pub mod message;
pub mod protocol;
pub mod session;
pub mod stream;
pub mod traits;

pub use client::{ChatClient, ChatMode, GenerateRequest};
pub use config::ClientConfig;
pub use error::{UiStreamError, UiStreamResult};
pub use jobs::{JobId, JobManager};
pub use message::{Message, MessageStatus};
pub use protocol::UiEvent;
pub use session::{ChatSession, SessionSignal, StreamUpdate};
pub use stream::{Frame, FrameParser};
