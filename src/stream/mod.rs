//! Incremental demultiplexing of the generation stream.
//!
//! The response body arrives in chunks whose boundaries carry no meaning:
//! a chunk may end in the middle of a word, a UTF-8 sequence, the event
//! marker, or an event's JSON. [`FrameParser`] turns that into an ordered
//! sequence of [`Frame`]s without dropping, duplicating or reordering bytes.
//!
//! # Module structure
//! - `frame` - The [`Frame`] output type
//! - `batch` - [`BatchPolicy`], when pending text is emitted
//! - `utf8` - [`Utf8Decoder`], byte chunks to text
//! - `parser` - [`FrameParser`]

mod batch;
mod frame;
mod parser;
mod utf8;

pub use batch::BatchPolicy;
pub use frame::{collect_text, Frame};
pub use parser::FrameParser;
pub use utf8::Utf8Decoder;
