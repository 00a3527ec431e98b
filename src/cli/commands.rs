//! Command handlers.

use std::io::{self, Write};

use color_eyre::eyre::eyre;
use color_eyre::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::client::{ChatClient, ChatMode};
use crate::error::SessionError;
use crate::jobs::JobId;
use crate::session::ChatSession;

use super::output::AnswerPrinter;

/// Interrupt requests from the Ctrl+C handler.
pub type Interrupts = mpsc::UnboundedReceiver<()>;

/// `abort <SESSION>`
pub async fn handle_abort_command(
    client: &ChatClient,
    session_id: &str,
    reason: Option<&str>,
) -> Result<()> {
    client.notify_abort(session_id, reason).await?;
    println!("Abort requested for {}", session_id);
    Ok(())
}

/// `status <SESSION>`
pub async fn handle_status_command(client: &ChatClient, session_id: &str) -> Result<()> {
    let status = client.abort_status(session_id).await?;
    let state = if status.aborted { "aborted" } else { "not aborted" };
    println!("{}: {}", status.session_id, state);
    Ok(())
}

/// `reset <SESSION>`
pub async fn handle_reset_command(client: &ChatClient, session_id: &str) -> Result<()> {
    client.reset_abort(session_id).await?;
    println!("Abort flag cleared for {}", session_id);
    Ok(())
}

/// Ask one question and stream the answer to stdout.
///
/// The first interrupt stops the generation; the answer read so far is
/// kept and printed.
pub async fn ask(
    session: &mut ChatSession,
    question: &str,
    mode: Option<ChatMode>,
    progress_label: Option<&str>,
    interrupts: &mut Interrupts,
) -> Result<(), SessionError> {
    let job_id = match progress_label {
        Some(label) => session.send_with_progress(question, mode, Some(label.to_string()))?,
        None => session.send(question, mode)?,
    };
    let index = session
        .message_index(job_id)
        .unwrap_or(session.messages().len() - 1);
    tracing::debug!(job = %job_id, index, "Asking");

    let mut printer = AnswerPrinter::new(index);
    let mut stopping = false;
    let stdout = io::stdout();
    let stderr = io::stderr();

    while session.is_generating() {
        tokio::select! {
            update = session.next_update() => {
                let Some(update) = update else { break };
                for signal in session.handle_update(update) {
                    let shown = printer.show(session, &signal, &mut stdout.lock(), &mut stderr.lock());
                    if let Err(e) = shown {
                        tracing::warn!("Failed to write output: {}", e);
                    }
                }
            }
            Some(()) = interrupts.recv(), if !stopping => {
                stopping = true;
                stop(session, job_id);
            }
        }
    }
    Ok(())
}

fn stop(session: &mut ChatSession, job_id: JobId) {
    match session.stop() {
        Ok(stopped) => {
            eprintln!();
            eprintln!("[stopped]");
            tracing::debug!(job = %stopped, asked = %job_id, "Stopped by user");
        }
        Err(e) => tracing::debug!("Nothing to stop: {}", e),
    }
}

/// Read questions from stdin until EOF or an interrupt at the prompt.
pub async fn handle_interactive(
    session: &mut ChatSession,
    mode: Option<ChatMode>,
    progress_label: Option<&str>,
    interrupts: &mut Interrupts,
) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    eprintln!("Session {}. Empty line or Ctrl+D to quit.", session.session_id());

    loop {
        eprint!("> ");
        io::stderr().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = interrupts.recv() => None,
        };
        let Some(line) = line else { break };
        let question = line.trim();
        if question.is_empty() {
            break;
        }

        match ask(session, question, mode, progress_label, interrupts).await {
            Ok(()) => {}
            Err(e @ SessionError::RateLimited { .. }) => eprintln!("{}", e.user_message()),
            Err(e) => return Err(eyre!(e.user_message())),
        }
    }

    session.shutdown();
    Ok(())
}
