//! The closed set of UI events the backend may emit.

use serde::{Deserialize, Serialize};

use super::payloads::{self, ConfidenceLevel, MetadataField, SourceRef};

/// Literal prefix identifying a line as a candidate UI event.
pub const UI_EVENT_MARKER: &str = "__UI_EVENT__";

/// Typed UI events, keyed on the JSON `type` field.
///
/// Unknown `type` values fail deserialization, which the decoder turns into
/// "not an event". The set is closed on purpose: a backend that starts
/// sending a new kind degrades to visible text instead of being silently
/// swallowed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UiEvent {
    /// Informational message rendered as its own system bubble
    SystemMessage { text: String },
    /// The backend needs document metadata before it can answer
    RequestMetadata { fields: Vec<MetadataField> },
    /// Metadata was accepted
    MetadataConfirmed {
        #[serde(
            default = "payloads::default_confirmed_message",
            deserialize_with = "payloads::confirmed_message"
        )]
        message: String,
    },
    /// Determinate progress for long-running work, 0..=100
    Progress {
        #[serde(deserialize_with = "payloads::percent")]
        value: u8,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    /// Live pipeline stage (intent, retrieval, reranking, generation)
    ModelStage {
        #[serde(deserialize_with = "payloads::stage_name")]
        stage: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        model: Option<String>,
    },
    /// Pipeline failure reported by the backend
    Error { message: String },
    /// A cloud model is rate-limited; sends on that model must wait
    NetRateLimited {
        #[serde(rename = "retryAfterSec", deserialize_with = "payloads::retry_after")]
        retry_after_sec: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        provider: Option<String>,
    },
    /// Retrieved passages backing the answer
    Sources { data: Vec<SourceRef> },
    /// Confidence badge for the generated answer
    AnswerConfidence {
        #[serde(deserialize_with = "payloads::unit_interval")]
        confidence: f64,
        level: ConfidenceLevel,
    },
}

impl UiEvent {
    /// Returns the wire `type` tag, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            UiEvent::SystemMessage { .. } => "SYSTEM_MESSAGE",
            UiEvent::RequestMetadata { .. } => "REQUEST_METADATA",
            UiEvent::MetadataConfirmed { .. } => "METADATA_CONFIRMED",
            UiEvent::Progress { .. } => "PROGRESS",
            UiEvent::ModelStage { .. } => "MODEL_STAGE",
            UiEvent::Error { .. } => "ERROR",
            UiEvent::NetRateLimited { .. } => "NET_RATE_LIMITED",
            UiEvent::Sources { .. } => "SOURCES",
            UiEvent::AnswerConfidence { .. } => "ANSWER_CONFIDENCE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_serialized_tag() {
        let events = vec![
            UiEvent::SystemMessage {
                text: "hi".to_string(),
            },
            UiEvent::RequestMetadata { fields: vec![] },
            UiEvent::MetadataConfirmed {
                message: "ok".to_string(),
            },
            UiEvent::Progress {
                value: 10,
                label: None,
            },
            UiEvent::ModelStage {
                stage: "retrieval".to_string(),
                message: None,
                model: None,
            },
            UiEvent::Error {
                message: "boom".to_string(),
            },
            UiEvent::NetRateLimited {
                retry_after_sec: 5,
                provider: None,
            },
            UiEvent::Sources { data: vec![] },
            UiEvent::AnswerConfidence {
                confidence: 0.5,
                level: ConfidenceLevel::Medium,
            },
        ];

        for event in events {
            let json = serde_json::to_value(&event).unwrap();
            assert_eq!(json["type"], event.kind());
        }
    }

    #[test]
    fn test_rate_limited_uses_camel_case_field() {
        let event = UiEvent::NetRateLimited {
            retry_after_sec: 12,
            provider: Some("groq".to_string()),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["retryAfterSec"], 12);
        assert_eq!(json["provider"], "groq");
    }
}
