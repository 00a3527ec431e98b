//! Applying stream frames to a message.

use std::time::Duration;

use crate::protocol::{MetadataField, UiEvent};
use crate::stream::Frame;

use super::model::{AnswerConfidence, Message, MessageStatus, StageInfo};

/// Shown when the backend stops to ask for metadata before any answer text.
pub const METADATA_REQUIRED_MESSAGE: &str = "Document metadata is required before answering.";

/// What applying a frame means for the caller.
///
/// Most frames only mutate the message. The rest ask the caller to do
/// something the message cannot do on its own.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameEffect {
    /// The message changed; nothing else to do
    Applied,
    /// The message is terminal; the frame was dropped
    Ignored,
    /// Show `text` as a separate system message
    SystemNotice(String),
    /// Abort the job and collect these fields from the user
    MetadataRequested(Vec<MetadataField>),
    /// Gate further sends for `retry_after`
    RateLimited {
        retry_after: Duration,
        provider: Option<String>,
    },
    /// The backend reported an error; the message is now terminal
    Failed(String),
}

impl Message {
    /// Apply one parser frame.
    ///
    /// Terminal messages ignore everything. Content already accumulated is
    /// never discarded, whatever the frame.
    pub fn apply_frame(&mut self, frame: Frame) -> FrameEffect {
        if self.is_terminal() {
            return FrameEffect::Ignored;
        }

        match frame {
            Frame::Text(text) => {
                self.content.push_str(&text);
                self.begin_streaming();
                FrameEffect::Applied
            }
            Frame::Event(event) => self.apply_event(event),
        }
    }

    fn apply_event(&mut self, event: UiEvent) -> FrameEffect {
        match event {
            UiEvent::Progress { value, label } => {
                self.progress = Some(value);
                if label.is_some() {
                    self.progress_label = label;
                }
                self.begin_streaming();
                FrameEffect::Applied
            }
            UiEvent::ModelStage {
                stage,
                message,
                model,
            } => {
                self.stage = Some(StageInfo {
                    stage,
                    message,
                    model,
                });
                self.begin_streaming();
                FrameEffect::Applied
            }
            UiEvent::Sources { data } => {
                self.sources = data;
                self.begin_streaming();
                FrameEffect::Applied
            }
            UiEvent::AnswerConfidence { confidence, level } => {
                self.confidence = Some(AnswerConfidence {
                    score: confidence,
                    level,
                });
                self.begin_streaming();
                FrameEffect::Applied
            }
            UiEvent::SystemMessage { text } => {
                self.begin_streaming();
                FrameEffect::SystemNotice(text)
            }
            UiEvent::MetadataConfirmed { message } => {
                self.begin_streaming();
                FrameEffect::SystemNotice(message)
            }
            UiEvent::RequestMetadata { fields } => {
                self.begin_streaming();
                FrameEffect::MetadataRequested(fields)
            }
            UiEvent::NetRateLimited {
                retry_after_sec,
                provider,
            } => {
                self.begin_streaming();
                FrameEffect::RateLimited {
                    retry_after: Duration::from_secs(retry_after_sec),
                    provider,
                }
            }
            UiEvent::Error { message } => {
                self.fail(message.clone());
                FrameEffect::Failed(message)
            }
        }
    }

    fn begin_streaming(&mut self) {
        if matches!(self.status, MessageStatus::Typing | MessageStatus::Progress) {
            self.status = MessageStatus::Streaming;
        }
    }

    /// Commit the message as `Done`. Returns false if it was already terminal.
    pub fn finish(&mut self) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.status = MessageStatus::Done;
        true
    }

    /// Move to `Error`, keeping partial content. Returns false if it was
    /// already terminal.
    pub fn fail(&mut self, reason: impl Into<String>) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.status = MessageStatus::Error;
        self.error = Some(reason.into());
        true
    }

    /// Finalize after the backend paused for metadata: `Done` if an answer
    /// had started, `Error` otherwise.
    pub fn finish_after_metadata_request(&mut self) -> bool {
        if self.has_content() {
            self.finish()
        } else {
            self.fail(METADATA_REQUIRED_MESSAGE)
        }
    }
}
