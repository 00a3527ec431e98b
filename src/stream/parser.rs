//! Stateful text/event demultiplexer.

use crate::protocol::{decode_line, UI_EVENT_MARKER};

use super::batch::BatchPolicy;
use super::frame::Frame;
use super::utf8::Utf8Decoder;

/// Splits an append-only stream into ordered [`Frame`]s.
///
/// Two accumulators:
/// - `raw` holds bytes not yet classified: an event candidate still waiting
///   for its newline, or a tail that could be the start of the marker;
/// - `pending` holds text already classified but not yet emitted.
///
/// Text that precedes an event is always emitted before the event. An event
/// line is only decoded once its terminating `\n` has arrived, so one event
/// never spans two frames. A marker line that fails to decode is emitted
/// verbatim, newline included, as text.
#[derive(Debug, Default)]
pub struct FrameParser {
    raw: String,
    pending: String,
    utf8: Utf8Decoder,
    policy: BatchPolicy,
}

impl FrameParser {
    /// Create a parser with the default batching policy.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: BatchPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> BatchPolicy {
        self.policy
    }

    /// Feed a chunk of text, returning every frame that is now complete.
    pub fn push(&mut self, chunk: &str) -> Vec<Frame> {
        let mut frames = Vec::new();
        if chunk.is_empty() {
            return frames;
        }
        self.raw.push_str(chunk);
        self.drain(&mut frames);
        frames
    }

    /// Feed raw response bytes. Characters split across chunks are held
    /// until complete.
    pub fn push_bytes(&mut self, chunk: &[u8]) -> Vec<Frame> {
        if chunk.is_empty() {
            return Vec::new();
        }
        let text = self.utf8.decode(chunk);
        self.push(&text)
    }

    /// Drain everything at stream end.
    ///
    /// Emits pending text first, then whatever is left in the lookahead
    /// buffer: as an event if it is a complete event line that merely lacks
    /// its final newline, otherwise as literal text. Leaves the parser empty.
    pub fn flush(&mut self) -> Vec<Frame> {
        let mut frames = Vec::new();

        let tail = self.utf8.finish();
        if !tail.is_empty() {
            self.raw.push_str(&tail);
            self.drain(&mut frames);
        }

        self.emit_pending(&mut frames);

        if !self.raw.is_empty() {
            let rest = std::mem::take(&mut self.raw);
            let line = rest.strip_suffix('\r').unwrap_or(&rest);
            match decode_line(line) {
                Some(event) => frames.push(Frame::Event(event)),
                None => frames.push(Frame::Text(rest)),
            }
        }

        frames
    }

    /// Drop all buffered state, emitting nothing.
    ///
    /// The read loop builds a fresh parser per job, so it never needs this;
    /// it is for callers that reuse one parser across streams.
    pub fn reset(&mut self) {
        self.raw.clear();
        self.pending.clear();
        self.utf8.reset();
    }

    /// True when nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty() && self.pending.is_empty() && self.utf8.is_empty()
    }

    fn drain(&mut self, frames: &mut Vec<Frame>) {
        loop {
            let Some(offset) = self.raw.find(UI_EVENT_MARKER) else {
                // Keep a possible marker prefix at the tail; classify the rest
                let hold = partial_marker_len(&self.raw);
                let split = self.raw.len() - hold;
                self.pending.push_str(&self.raw[..split]);
                self.raw.drain(..split);
                if self.policy.should_flush(&self.pending) {
                    self.emit_pending(frames);
                }
                return;
            };

            if offset > 0 {
                self.pending.push_str(&self.raw[..offset]);
                self.raw.drain(..offset);
            }
            // Whatever preceded the marker goes out before the event
            self.emit_pending(frames);

            let Some(newline) = self.raw.find('\n') else {
                // Incomplete candidate, wait for more data
                return;
            };

            let line: String = self.raw.drain(..=newline).collect();
            let body = line.strip_suffix('\n').unwrap_or(&line);
            let body = body.strip_suffix('\r').unwrap_or(body);
            match decode_line(body) {
                Some(event) => {
                    tracing::debug!(kind = event.kind(), "Decoded UI event");
                    frames.push(Frame::Event(event));
                }
                None => frames.push(Frame::Text(line)),
            }
        }
    }

    fn emit_pending(&mut self, frames: &mut Vec<Frame>) {
        if !self.pending.is_empty() {
            frames.push(Frame::Text(std::mem::take(&mut self.pending)));
        }
    }
}

/// Length of the longest proper prefix of the marker that `buf` ends with.
fn partial_marker_len(buf: &str) -> usize {
    (1..UI_EVENT_MARKER.len())
        .rev()
        .find(|&len| buf.ends_with(&UI_EVENT_MARKER[..len]))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::UiEvent;
    use crate::stream::collect_text;

    fn feed_all(parser: &mut FrameParser, chunks: &[&str]) -> Vec<Frame> {
        let mut frames = Vec::new();
        for chunk in chunks {
            frames.extend(parser.push(chunk));
        }
        frames.extend(parser.flush());
        frames
    }

    fn progress(value: u8) -> Frame {
        Frame::Event(UiEvent::Progress { value, label: None })
    }

    #[test]
    fn test_plain_text_passes_through() {
        let mut parser = FrameParser::new();
        let frames = feed_all(&mut parser, &["Hello, ", "world"]);
        assert_eq!(collect_text(&frames), "Hello, world");
        assert!(parser.is_empty());
    }

    #[test]
    fn test_scenario_split_text_then_event() {
        let mut parser = FrameParser::new();
        let frames = feed_all(
            &mut parser,
            &[
                "Hello ",
                "wor",
                "ld__UI_EVENT__{\"type\":\"PROGRESS\",\"value\":50}\n",
                " End.",
            ],
        );

        let event_at = frames.iter().position(Frame::is_event).unwrap();
        assert_eq!(frames[event_at], progress(50));
        assert_eq!(collect_text(&frames[..event_at]), "Hello world");
        assert_eq!(collect_text(&frames[event_at + 1..]), " End.");
        assert_eq!(frames.iter().filter(|f| f.is_event()).count(), 1);
    }

    #[test]
    fn test_batching_holds_partial_word() {
        let mut parser = FrameParser::new();
        assert_eq!(parser.push("Hello "), vec![Frame::Text("Hello ".to_string())]);
        assert!(parser.push("wor").is_empty());
        assert_eq!(parser.flush(), vec![Frame::Text("wor".to_string())]);
    }

    #[test]
    fn test_immediate_policy_emits_every_push() {
        let mut parser = FrameParser::with_policy(BatchPolicy::immediate());
        assert_eq!(parser.push("wor"), vec![Frame::Text("wor".to_string())]);
    }

    #[test]
    fn test_marker_and_body_in_separate_chunks() {
        let mut parser = FrameParser::new();
        assert!(parser.push("__UI_EVENT__").is_empty());
        let frames = parser.push("{\"type\":\"PROGRESS\",\"value\":7}\n");
        assert_eq!(frames, vec![progress(7)]);
        assert!(parser.flush().is_empty());
    }

    #[test]
    fn test_marker_split_mid_token() {
        let mut parser = FrameParser::with_policy(BatchPolicy::immediate());
        let mut frames = parser.push("abc__UI_");
        assert_eq!(frames, vec![Frame::Text("abc".to_string())]);
        frames.extend(parser.push("EVENT__{\"type\":\"PROGRESS\",\"value\":1}\nxyz"));
        frames.extend(parser.flush());
        assert_eq!(
            frames,
            vec![
                Frame::Text("abc".to_string()),
                progress(1),
                Frame::Text("xyz".to_string()),
            ]
        );
    }

    #[test]
    fn test_held_marker_prefix_released_when_not_a_marker() {
        let mut parser = FrameParser::with_policy(BatchPolicy::immediate());
        let mut frames = parser.push("snake__");
        frames.extend(parser.push("case"));
        frames.extend(parser.flush());
        assert_eq!(collect_text(&frames), "snake__case");
    }

    #[test]
    fn test_invalid_event_falls_back_to_text() {
        let mut parser = FrameParser::new();
        let frames = parser.push("__UI_EVENT__{not valid json}\n");
        assert_eq!(
            frames,
            vec![Frame::Text("__UI_EVENT__{not valid json}\n".to_string())]
        );
    }

    #[test]
    fn test_unknown_event_kind_falls_back_to_text() {
        let mut parser = FrameParser::new();
        let line = "__UI_EVENT__{\"type\":\"TELEMETRY\",\"n\":1}\n";
        assert_eq!(parser.push(line), vec![Frame::Text(line.to_string())]);
    }

    #[test]
    fn test_crlf_event_line() {
        let mut parser = FrameParser::new();
        let frames = parser.push("__UI_EVENT__{\"type\":\"PROGRESS\",\"value\":2}\r\n");
        assert_eq!(frames, vec![progress(2)]);
    }

    #[test]
    fn test_consecutive_events_in_one_chunk() {
        let mut parser = FrameParser::new();
        let frames = parser.push(concat!(
            "__UI_EVENT__{\"type\":\"PROGRESS\",\"value\":10}\n",
            "__UI_EVENT__{\"type\":\"PROGRESS\",\"value\":20}\n",
            "mid ",
            "__UI_EVENT__{\"type\":\"ERROR\",\"message\":\"boom\"}\n",
        ));
        assert_eq!(
            frames,
            vec![
                progress(10),
                progress(20),
                Frame::Text("mid ".to_string()),
                Frame::Event(UiEvent::Error {
                    message: "boom".to_string()
                }),
            ]
        );
    }

    #[test]
    fn test_pending_text_emitted_before_event_at_offset_zero() {
        let mut parser = FrameParser::new();
        assert!(parser.push("abc").is_empty());
        let frames = parser.push("__UI_EVENT__{\"type\":\"PROGRESS\",\"value\":3}\n");
        assert_eq!(frames, vec![Frame::Text("abc".to_string()), progress(3)]);
    }

    #[test]
    fn test_flush_decodes_unterminated_event() {
        let mut parser = FrameParser::new();
        assert!(parser
            .push("tail __UI_EVENT__{\"type\":\"PROGRESS\",\"value\":99}")
            .iter()
            .all(|f| !f.is_event()));
        let frames = parser.flush();
        assert_eq!(frames.last(), Some(&progress(99)));
        assert!(parser.is_empty());
    }

    #[test]
    fn test_flush_emits_unterminated_garbage_as_text() {
        let mut parser = FrameParser::new();
        assert!(parser.push("__UI_EVENT__{\"type\":").is_empty());
        assert_eq!(
            parser.flush(),
            vec![Frame::Text("__UI_EVENT__{\"type\":".to_string())]
        );
    }

    #[test]
    fn test_flush_orders_pending_before_raw() {
        let mut parser = FrameParser::new();
        parser.push("ab");
        parser.push("__UI_");
        let frames = parser.flush();
        assert_eq!(collect_text(&frames), "ab__UI_");
    }

    #[test]
    fn test_flush_twice_is_empty() {
        let mut parser = FrameParser::new();
        parser.push("partial");
        assert!(!parser.flush().is_empty());
        assert!(parser.flush().is_empty());
    }

    #[test]
    fn test_empty_inputs() {
        let mut parser = FrameParser::new();
        assert!(parser.push("").is_empty());
        assert!(parser.push_bytes(&[]).is_empty());
        assert!(parser.flush().is_empty());
    }

    #[test]
    fn test_reset_discards_partial_state() {
        let mut parser = FrameParser::new();
        parser.push("stale");
        parser.push("__UI_EVENT__{\"type\":\"PRO");
        parser.reset();
        assert!(parser.is_empty());
        let frames = feed_all(&mut parser, &["fresh"]);
        assert_eq!(frames, vec![Frame::Text("fresh".to_string())]);
    }

    #[test]
    fn test_push_bytes_split_utf8() {
        let mut parser = FrameParser::with_policy(BatchPolicy::immediate());
        let bytes = "naïve …".as_bytes();
        let mut frames = Vec::new();
        for b in bytes {
            frames.extend(parser.push_bytes(&[*b]));
        }
        frames.extend(parser.flush());
        assert_eq!(collect_text(&frames), "naïve …");
    }

    #[test]
    fn test_marker_inside_prose_without_newline_is_text() {
        let mut parser = FrameParser::new();
        let frames = feed_all(&mut parser, &["see __UI_EVENT__ docs"]);
        assert_eq!(collect_text(&frames), "see __UI_EVENT__ docs");
    }

    #[test]
    fn test_output_independent_of_chunk_boundaries() {
        let input = concat!(
            "Intro text, ",
            "__UI_EVENT__{\"type\":\"MODEL_STAGE\",\"stage\":\"Search\",\"message\":\"m\"}\n",
            "more__UI_EVENT__{broken}\n",
            "__UI_EVENT__{\"type\":\"PROGRESS\",\"value\":40}\r\n",
            "end__",
        );

        let mut whole = FrameParser::new();
        let expected = feed_all(&mut whole, &[input]);
        let expected_text = collect_text(&expected);
        let expected_events: Vec<_> = expected.iter().filter_map(Frame::as_event).collect();
        assert_eq!(expected_events.len(), 2);

        for split in 1..input.len() {
            let (a, b) = input.split_at(split);
            let mut parser = FrameParser::new();
            let frames = feed_all(&mut parser, &[a, b]);
            assert_eq!(collect_text(&frames), expected_text, "split at {split}");
            let events: Vec<_> = frames.iter().filter_map(Frame::as_event).collect();
            assert_eq!(events, expected_events, "split at {split}");
        }
    }

    #[test]
    fn test_byte_at_a_time_matches_whole_input() {
        let input = concat!(
            "Grüße, naïve café ",
            "__UI_EVENT__{\"type\":\"SYSTEM_MESSAGE\",\"text\":\"Índice listo ✓\"}\n",
            "数据 ",
            "__UI_EVENT__{\"type\":\"PROGRESS\",\"value\":80}\n",
            "fin 🚀",
        );

        let mut whole = FrameParser::new();
        let mut expected = whole.push_bytes(input.as_bytes());
        expected.extend(whole.flush());
        let expected_text = collect_text(&expected);
        let expected_events: Vec<_> = expected.iter().filter_map(Frame::as_event).collect();
        assert_eq!(expected_events.len(), 2);
        assert_eq!(expected_text, "Grüße, naïve café 数据 fin 🚀");

        let mut parser = FrameParser::new();
        let mut frames = Vec::new();
        for byte in input.as_bytes() {
            frames.extend(parser.push_bytes(std::slice::from_ref(byte)));
        }
        frames.extend(parser.flush());

        assert_eq!(collect_text(&frames), expected_text);
        let events: Vec<_> = frames.iter().filter_map(Frame::as_event).collect();
        assert_eq!(events, expected_events);
        assert!(parser.is_empty());
    }

    #[test]
    fn test_partial_marker_len() {
        assert_eq!(partial_marker_len("abc"), 0);
        assert_eq!(partial_marker_len("abc_"), 1);
        assert_eq!(partial_marker_len("abc__UI_EVENT_"), UI_EVENT_MARKER.len() - 1);
        assert_eq!(partial_marker_len(""), 0);
    }
}
