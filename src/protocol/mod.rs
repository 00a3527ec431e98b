//! UI event protocol carried inline in the generation stream.
//!
//! The generate endpoint returns a plain-text chunked body. Most of it is
//! model output, but the backend interleaves control events, each on its own
//! line:
//!
//! ```text
//! __UI_EVENT__{"type":"PROGRESS","value":50}\n
//! ```
//!
//! A line is a candidate event iff it starts with [`UI_EVENT_MARKER`]. After
//! optional whitespace the remainder must be a JSON object whose `type` is one
//! of the [`UiEvent`] variants. Anything else is ordinary text.
//!
//! # Module structure
//! - `events` - The closed [`UiEvent`] sum type
//! - `payloads` - Nested payload shapes and value normalization
//! - `decoder` - [`decode_line`] / [`encode_event`]

mod decoder;
mod events;
mod payloads;

pub use decoder::{decode_line, encode_event, is_candidate};
pub use events::{UiEvent, UI_EVENT_MARKER};
pub use payloads::{
    ConfidenceLevel, MetadataField, SourceRef, DEFAULT_CONFIRMED_MESSAGE, MAX_RETRY_AFTER_SECS,
};
