//! Terminal rendering of a streaming answer.
//!
//! Answer text goes to `out` as it arrives; everything else (stages,
//! notices, sources) goes to `err` so that `uistream "q" > answer.txt`
//! captures only the answer.

use std::io::{self, Write};

use crate::message::{Message, MessageStatus};
use crate::session::{ChatSession, SessionSignal};

/// Prints one assistant message incrementally.
#[derive(Debug)]
pub struct AnswerPrinter {
    index: usize,
    printed: usize,
    stage: Option<String>,
    progress: Option<u8>,
}

impl AnswerPrinter {
    /// Track `messages()[index]`.
    pub fn new(index: usize) -> Self {
        Self {
            index,
            printed: 0,
            stage: None,
            progress: None,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn show<O: Write, E: Write>(
        &mut self,
        session: &ChatSession,
        signal: &SessionSignal,
        out: &mut O,
        err: &mut E,
    ) -> io::Result<()> {
        match signal {
            SessionSignal::MessageUpdated { index } if *index == self.index => {
                if let Some(message) = session.message(*index) {
                    self.show_update(message, out, err)?;
                }
            }
            SessionSignal::MessageUpdated { .. } => {}
            SessionSignal::SystemNotice { text, .. } => {
                writeln!(err, "[notice] {}", text)?;
            }
            SessionSignal::MetadataRequested { fields, .. } => {
                writeln!(err, "[metadata] the backend needs more information:")?;
                for field in fields {
                    match &field.reason {
                        Some(reason) => writeln!(err, "  - {} ({})", field.label, reason)?,
                        None => writeln!(err, "  - {}", field.label)?,
                    }
                }
            }
            SessionSignal::RateLimited {
                mode,
                retry_after,
                provider,
            } => {
                let by = provider
                    .as_deref()
                    .map(|p| format!(" by {}", p))
                    .unwrap_or_default();
                writeln!(
                    err,
                    "[rate limited] {} mode limited{}; retry in {}s",
                    mode,
                    by,
                    retry_after.as_secs()
                )?;
            }
            SessionSignal::Completed { index, status, .. } if *index == self.index => {
                if let Some(message) = session.message(*index) {
                    self.show_update(message, out, err)?;
                    self.show_summary(message, *status, out, err)?;
                }
            }
            SessionSignal::Completed { .. } => {}
        }
        out.flush()?;
        err.flush()
    }

    fn show_update<O: Write, E: Write>(
        &mut self,
        message: &Message,
        out: &mut O,
        err: &mut E,
    ) -> io::Result<()> {
        if let Some(stage) = &message.stage {
            if self.stage.as_deref() != Some(stage.stage.as_str()) {
                self.stage = Some(stage.stage.clone());
                match &stage.message {
                    Some(text) => writeln!(err, "[{}] {}", stage.stage, text)?,
                    None => writeln!(err, "[{}]", stage.stage)?,
                }
            }
        }

        if message.progress != self.progress {
            if let Some(value) = message.progress {
                let label = message.progress_label.as_deref().unwrap_or("progress");
                writeln!(err, "[{}] {}%", label, value)?;
            }
            self.progress = message.progress;
        }

        // Content only ever grows
        if let Some(delta) = message.content.get(self.printed..) {
            if !delta.is_empty() {
                out.write_all(delta.as_bytes())?;
                self.printed = message.content.len();
            }
        }
        Ok(())
    }

    fn show_summary<O: Write, E: Write>(
        &self,
        message: &Message,
        status: MessageStatus,
        out: &mut O,
        err: &mut E,
    ) -> io::Result<()> {
        if self.printed > 0 && !message.content.ends_with('\n') {
            writeln!(out)?;
        }
        if !message.sources.is_empty() {
            writeln!(err, "Sources:")?;
            for (n, source) in message.sources.iter().enumerate() {
                writeln!(err, "  [{}] {} p.{}", n + 1, source.filename, source.page)?;
            }
        }
        if let Some(confidence) = &message.confidence {
            writeln!(
                err,
                "Confidence: {} ({:.2})",
                confidence.level.as_str(),
                confidence.score
            )?;
        }
        if status == MessageStatus::Error {
            let reason = message.error.as_deref().unwrap_or("generation failed");
            writeln!(err, "error: {}", reason)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::MockHttpClient;
    use crate::client::ChatClient;
    use crate::jobs::JobManager;
    use std::sync::Arc;

    fn session() -> ChatSession {
        let client = ChatClient::with_http(Arc::new(MockHttpClient::new()), "http://backend.test");
        ChatSession::with_session_id("s1", client, JobManager::default())
    }

    #[test]
    fn test_notices_go_to_stderr() {
        let session = session();
        let mut printer = AnswerPrinter::new(1);
        let (mut out, mut err) = (Vec::new(), Vec::new());

        printer
            .show(
                &session,
                &SessionSignal::SystemNotice {
                    index: 2,
                    text: "Metadata updated successfully.".to_string(),
                },
                &mut out,
                &mut err,
            )
            .unwrap();

        assert!(out.is_empty());
        assert_eq!(
            String::from_utf8(err).unwrap(),
            "[notice] Metadata updated successfully.\n"
        );
    }

    #[test]
    fn test_other_message_updates_ignored() {
        let session = session();
        let mut printer = AnswerPrinter::new(1);
        let (mut out, mut err) = (Vec::new(), Vec::new());

        printer
            .show(
                &session,
                &SessionSignal::MessageUpdated { index: 7 },
                &mut out,
                &mut err,
            )
            .unwrap();
        assert!(out.is_empty());
        assert!(err.is_empty());
    }
}
