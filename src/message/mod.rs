//! Message lifecycle.
//!
//! A message moves `Typing → Streaming → {Done | Error}` (or starts in
//! `Progress`). Terminal messages never change again, so frames that arrive
//! late are dropped here even if the caller's epoch check missed them.
//!
//! # Module structure
//! - `model` - [`Message`] and its status/role types
//! - `lifecycle` - [`Message::apply_frame`] and [`FrameEffect`]
//! - `rate_limit` - [`RateLimitGate`]

mod lifecycle;
mod model;
mod rate_limit;

pub use lifecycle::{FrameEffect, METADATA_REQUIRED_MESSAGE};
pub use model::{AnswerConfidence, Message, MessageRole, MessageStatus, StageInfo};
pub use rate_limit::RateLimitGate;
