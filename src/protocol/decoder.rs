//! Line-level decoding of UI events.

use super::events::{UiEvent, UI_EVENT_MARKER};

/// Returns true if `line` starts with the event marker.
pub fn is_candidate(line: &str) -> bool {
    line.starts_with(UI_EVENT_MARKER)
}

/// Decode one line (without its trailing newline) into a [`UiEvent`].
///
/// Returns `None` for anything that is not a well-formed event: missing
/// marker, a body that is not a JSON object, invalid JSON, an unknown `type`,
/// or missing/mistyped required fields. Never panics.
pub fn decode_line(line: &str) -> Option<UiEvent> {
    let body = line.strip_prefix(UI_EVENT_MARKER)?.trim_start();
    if !body.starts_with('{') {
        return None;
    }

    match serde_json::from_str::<UiEvent>(body) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::debug!(error = %e, len = line.len(), "Rejected UI event candidate");
            None
        }
    }
}

/// Encode an event in its wire form, newline included.
pub fn encode_event(event: &UiEvent) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(event)?;
    Ok(format!("{}{}\n", UI_EVENT_MARKER, json))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{ConfidenceLevel, DEFAULT_CONFIRMED_MESSAGE};

    #[test]
    fn test_decode_progress() {
        let event = decode_line(r#"__UI_EVENT__{"type":"PROGRESS","value":50}"#).unwrap();
        assert_eq!(
            event,
            UiEvent::Progress {
                value: 50,
                label: None
            }
        );
    }

    #[test]
    fn test_decode_allows_whitespace_after_marker() {
        let event = decode_line("__UI_EVENT__   \t{\"type\":\"ERROR\",\"message\":\"x\"}").unwrap();
        assert_eq!(
            event,
            UiEvent::Error {
                message: "x".to_string()
            }
        );
    }

    #[test]
    fn test_decode_requires_exact_marker() {
        assert!(decode_line(r#"__ui_event__{"type":"ERROR","message":"x"}"#).is_none());
        assert!(decode_line(r#" __UI_EVENT__{"type":"ERROR","message":"x"}"#).is_none());
        assert!(decode_line(r#"__UI_EVENT{"type":"ERROR","message":"x"}"#).is_none());
    }

    #[test]
    fn test_decode_rejects_non_object_body() {
        assert!(decode_line("__UI_EVENT__").is_none());
        assert!(decode_line("__UI_EVENT__ hello").is_none());
        assert!(decode_line(r#"__UI_EVENT__["PROGRESS"]"#).is_none());
    }

    #[test]
    fn test_decode_rejects_invalid_json() {
        assert!(decode_line("__UI_EVENT__{not valid json}").is_none());
        assert!(decode_line(r#"__UI_EVENT__{"type":"PROGRESS","value":5"#).is_none());
    }

    #[test]
    fn test_decode_rejects_unknown_type() {
        assert!(decode_line(r#"__UI_EVENT__{"type":"TEXT","content":"hi"}"#).is_none());
        assert!(decode_line(r#"__UI_EVENT__{"value":5}"#).is_none());
    }

    #[test]
    fn test_decode_rejects_missing_required_fields() {
        assert!(decode_line(r#"__UI_EVENT__{"type":"SYSTEM_MESSAGE"}"#).is_none());
        assert!(decode_line(r#"__UI_EVENT__{"type":"PROGRESS"}"#).is_none());
        assert!(decode_line(r#"__UI_EVENT__{"type":"MODEL_STAGE"}"#).is_none());
        assert!(decode_line(r#"__UI_EVENT__{"type":"NET_RATE_LIMITED"}"#).is_none());
        assert!(decode_line(r#"__UI_EVENT__{"type":"SOURCES"}"#).is_none());
        assert!(decode_line(r#"__UI_EVENT__{"type":"ANSWER_CONFIDENCE","confidence":0.4}"#).is_none());
        assert!(decode_line(r#"__UI_EVENT__{"type":"REQUEST_METADATA","fields":[{"key":"a"}]}"#).is_none());
    }

    #[test]
    fn test_decode_rejects_mistyped_fields() {
        assert!(decode_line(r#"__UI_EVENT__{"type":"SYSTEM_MESSAGE","text":5}"#).is_none());
        assert!(decode_line(r#"__UI_EVENT__{"type":"PROGRESS","value":"fifty"}"#).is_none());
        assert!(decode_line(r#"__UI_EVENT__{"type":"ERROR","message":null}"#).is_none());
        assert!(decode_line(
            r#"__UI_EVENT__{"type":"ANSWER_CONFIDENCE","confidence":0.4,"level":"certain"}"#
        )
        .is_none());
    }

    #[test]
    fn test_decode_clamps_values() {
        assert_eq!(
            decode_line(r#"__UI_EVENT__{"type":"PROGRESS","value":140,"label":"Embedding"}"#),
            Some(UiEvent::Progress {
                value: 100,
                label: Some("Embedding".to_string())
            })
        );
        assert_eq!(
            decode_line(r#"__UI_EVENT__{"type":"PROGRESS","value":-3}"#),
            Some(UiEvent::Progress {
                value: 0,
                label: None
            })
        );
        assert_eq!(
            decode_line(r#"__UI_EVENT__{"type":"PROGRESS","value":33.6}"#),
            Some(UiEvent::Progress {
                value: 34,
                label: None
            })
        );
        assert_eq!(
            decode_line(r#"__UI_EVENT__{"type":"NET_RATE_LIMITED","retryAfterSec":0}"#),
            Some(UiEvent::NetRateLimited {
                retry_after_sec: 1,
                provider: None
            })
        );
        assert_eq!(
            decode_line(r#"__UI_EVENT__{"type":"NET_RATE_LIMITED","retryAfterSec":1e30}"#),
            Some(UiEvent::NetRateLimited {
                retry_after_sec: crate::protocol::MAX_RETRY_AFTER_SECS,
                provider: None
            })
        );
        assert_eq!(
            decode_line(r#"__UI_EVENT__{"type":"ANSWER_CONFIDENCE","confidence":1.7,"level":"high"}"#),
            Some(UiEvent::AnswerConfidence {
                confidence: 1.0,
                level: ConfidenceLevel::High
            })
        );
    }

    #[test]
    fn test_decode_normalizes_stage_and_nulls() {
        let event = decode_line(
            r#"__UI_EVENT__{"type":"MODEL_STAGE","stage":"  Retrieval ","message":null,"model":"bge-m3"}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            UiEvent::ModelStage {
                stage: "retrieval".to_string(),
                message: None,
                model: Some("bge-m3".to_string()),
            }
        );
    }

    #[test]
    fn test_decode_metadata_confirmed_default_message() {
        for line in [
            r#"__UI_EVENT__{"type":"METADATA_CONFIRMED"}"#,
            r#"__UI_EVENT__{"type":"METADATA_CONFIRMED","message":null}"#,
            r#"__UI_EVENT__{"type":"METADATA_CONFIRMED","message":""}"#,
        ] {
            assert_eq!(
                decode_line(line),
                Some(UiEvent::MetadataConfirmed {
                    message: DEFAULT_CONFIRMED_MESSAGE.to_string()
                })
            );
        }
    }

    #[test]
    fn test_decode_request_metadata() {
        let line = r#"__UI_EVENT__{"type":"REQUEST_METADATA","fields":[{"key":"company_document_id","label":"Company Document Id","placeholder":"Enter Company Document Id","reason":"Missing or low confidence"}]}"#;
        match decode_line(line) {
            Some(UiEvent::RequestMetadata { fields }) => {
                assert_eq!(fields.len(), 1);
                assert_eq!(fields[0].key, "company_document_id");
                assert_eq!(fields[0].reason.as_deref(), Some("Missing or low confidence"));
            }
            other => panic!("Expected RequestMetadata, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_ignores_extra_fields() {
        let event = decode_line(
            r#"__UI_EVENT__{"type":"SYSTEM_MESSAGE","text":"Thinking…","seq":4}"#,
        );
        assert_eq!(
            event,
            Some(UiEvent::SystemMessage {
                text: "Thinking…".to_string()
            })
        );
    }

    #[test]
    fn test_encode_then_decode() {
        let event = UiEvent::SystemMessage {
            text: "Responding…".to_string(),
        };
        let wire = encode_event(&event).unwrap();
        assert!(wire.starts_with(UI_EVENT_MARKER));
        assert!(wire.ends_with('\n'));
        assert_eq!(decode_line(wire.trim_end_matches('\n')), Some(event));
    }

    #[test]
    fn test_is_candidate() {
        assert!(is_candidate("__UI_EVENT__{}"));
        assert!(!is_candidate("text __UI_EVENT__{}"));
    }
}
