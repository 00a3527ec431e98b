//! Parser output.

use crate::protocol::UiEvent;

/// One classified unit of the stream: literal text or a decoded event.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Text(String),
    Event(UiEvent),
}

impl Frame {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Frame::Text(text) => Some(text),
            Frame::Event(_) => None,
        }
    }

    pub fn as_event(&self) -> Option<&UiEvent> {
        match self {
            Frame::Event(event) => Some(event),
            Frame::Text(_) => None,
        }
    }

    pub fn is_event(&self) -> bool {
        matches!(self, Frame::Event(_))
    }
}

/// Concatenate the text frames of `frames`, in order.
pub fn collect_text(frames: &[Frame]) -> String {
    frames.iter().filter_map(Frame::as_text).collect()
}
