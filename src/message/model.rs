use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::protocol::{ConfidenceLevel, SourceRef};

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

/// Lifecycle state of a message.
///
/// `Typing → Streaming → {Done | Error}`, with `Progress` as an alternate
/// starting state. `Done` and `Error` are terminal.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Typing,
    Streaming,
    Progress,
    Done,
    Error,
}

impl MessageStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, MessageStatus::Done | MessageStatus::Error)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStatus::Typing => "typing",
            MessageStatus::Streaming => "streaming",
            MessageStatus::Progress => "progress",
            MessageStatus::Done => "done",
            MessageStatus::Error => "error",
        }
    }
}

/// Confidence badge attached to an answer
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AnswerConfidence {
    pub score: f64,
    pub level: ConfidenceLevel,
}

/// Pipeline stage reported by `MODEL_STAGE`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StageInfo {
    pub stage: String,
    pub message: Option<String>,
    pub model: Option<String>,
}

/// A chat message and everything the stream attached to it.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Message {
    pub id: Uuid,
    pub role: MessageRole,
    /// Accumulated text. Kept on stop and on error.
    pub content: String,
    pub status: MessageStatus,
    /// Determinate progress, 0..=100
    pub progress: Option<u8>,
    pub progress_label: Option<String>,
    pub stage: Option<StageInfo>,
    pub sources: Vec<SourceRef>,
    pub confidence: Option<AnswerConfidence>,
    /// Why the message ended in `Error`
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    fn new(role: MessageRole, content: String, status: MessageStatus) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content,
            status,
            progress: None,
            progress_label: None,
            stage: None,
            sources: Vec::new(),
            confidence: None,
            error: None,
            created_at: Utc::now(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(MessageRole::User, text.into(), MessageStatus::Done)
    }

    /// Empty assistant message waiting for the first frame.
    pub fn assistant() -> Self {
        Self::new(MessageRole::Assistant, String::new(), MessageStatus::Typing)
    }

    /// Assistant message whose progress is known upfront.
    pub fn assistant_with_progress(label: Option<String>) -> Self {
        let mut message = Self::new(MessageRole::Assistant, String::new(), MessageStatus::Progress);
        message.progress = Some(0);
        message.progress_label = label;
        message
    }

    /// Informational bubble, already final.
    pub fn system(text: impl Into<String>) -> Self {
        Self::new(MessageRole::System, text.into(), MessageStatus::Done)
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn has_content(&self) -> bool {
        !self.content.is_empty()
    }
}
