//! The read loop of one generation.

use futures_util::StreamExt;
use tokio::sync::mpsc;

use crate::client::{ChatClient, GenerateRequest};
use crate::error::StreamError;
use crate::jobs::{JobHandle, JobId};
use crate::stream::{BatchPolicy, Frame, FrameParser};

/// Messages from a read loop to the session that owns its job.
///
/// Every update carries the epoch of the job that produced it; the session
/// drops updates from jobs that are no longer live.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamUpdate {
    /// Frames in parser order
    Frames { job_id: JobId, frames: Vec<Frame> },
    /// The body ended normally
    Finished { job_id: JobId, received_bytes: usize },
    /// The job's token was cancelled; already-read bytes were flushed first
    Cancelled { job_id: JobId },
    /// The request or the body read failed
    Failed { job_id: JobId, error: StreamError },
}

impl StreamUpdate {
    pub fn job_id(&self) -> JobId {
        match self {
            StreamUpdate::Frames { job_id, .. }
            | StreamUpdate::Finished { job_id, .. }
            | StreamUpdate::Cancelled { job_id }
            | StreamUpdate::Failed { job_id, .. } => *job_id,
        }
    }

    /// True for the last update a read loop sends.
    pub fn is_final(&self) -> bool {
        !matches!(self, StreamUpdate::Frames { .. })
    }
}

enum Outcome {
    Finished,
    Cancelled,
    Failed(StreamError),
}

/// Stream one generation into `updates`.
///
/// Checks the job's token at every suspension point. Whatever way the loop
/// ends, the parser is flushed before the final update so bytes already
/// read are never lost. Never retries.
pub async fn run_generation(
    client: ChatClient,
    request: GenerateRequest,
    job: JobHandle,
    policy: BatchPolicy,
    updates: mpsc::UnboundedSender<StreamUpdate>,
) {
    let job_id = job.id;

    let response = tokio::select! {
        biased;
        _ = job.token.cancelled() => {
            tracing::debug!(job = %job_id, "Cancelled before the response started");
            let _ = updates.send(StreamUpdate::Cancelled { job_id });
            return;
        }
        response = client.generate(&request) => response,
    };

    let mut body = match response {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(job = %job_id, error_code = e.error_code(), "Generate request failed: {}", e);
            let _ = updates.send(StreamUpdate::Failed {
                job_id,
                error: StreamError::RequestFailed(e),
            });
            return;
        }
    };

    let mut parser = FrameParser::with_policy(policy);
    let mut received_bytes = 0usize;

    let outcome = loop {
        tokio::select! {
            biased;
            _ = job.token.cancelled() => break Outcome::Cancelled,
            chunk = body.next() => match chunk {
                Some(Ok(bytes)) => {
                    received_bytes += bytes.len();
                    let frames = parser.push_bytes(&bytes);
                    if !frames.is_empty()
                        && updates.send(StreamUpdate::Frames { job_id, frames }).is_err()
                    {
                        break Outcome::Failed(StreamError::ReceiverDropped);
                    }
                }
                Some(Err(e)) => {
                    break Outcome::Failed(StreamError::ConnectionLost {
                        message: e.to_string(),
                        received_bytes,
                    });
                }
                None => break Outcome::Finished,
            },
        }
    };

    // Closes the connection before the tail is handed over
    drop(body);

    let tail = parser.flush();
    if !tail.is_empty() {
        let _ = updates.send(StreamUpdate::Frames {
            job_id,
            frames: tail,
        });
    }

    let last = match outcome {
        Outcome::Finished => {
            tracing::info!(job = %job_id, received_bytes, "Stream finished");
            StreamUpdate::Finished {
                job_id,
                received_bytes,
            }
        }
        Outcome::Cancelled => {
            tracing::info!(job = %job_id, received_bytes, "Stream cancelled");
            StreamUpdate::Cancelled { job_id }
        }
        Outcome::Failed(error) => {
            tracing::warn!(job = %job_id, received_bytes, "Stream failed: {}", error);
            StreamUpdate::Failed { job_id, error }
        }
    };
    let _ = updates.send(last);
}
