//! Chat session: wires jobs, read loops and messages together.
//!
//! # Module structure
//! - `chat` - [`ChatSession`], the single owner of job and message state
//! - `driver` - [`run_generation`], the per-job read loop, and [`StreamUpdate`]

mod chat;
mod driver;

pub use chat::{ChatSession, SessionSignal};
pub use driver::{run_generation, StreamUpdate};
