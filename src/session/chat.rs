//! One conversation: its messages, its jobs and its send gate.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::client::{ChatClient, ChatMode, GenerateRequest};
use crate::config::ClientConfig;
use crate::error::{ConfigError, SessionError, StreamError};
use crate::jobs::{
    HttpAbortNotifier, JobId, JobManager, REASON_METADATA_REQUIRED, REASON_SHUTDOWN,
    REASON_TRANSPORT_ERROR, REASON_USER_STOP,
};
use crate::message::{FrameEffect, Message, MessageStatus, RateLimitGate};
use crate::protocol::MetadataField;
use crate::stream::{BatchPolicy, Frame};

use super::driver::{run_generation, StreamUpdate};

/// What the caller should react to after an update was applied.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionSignal {
    /// `messages()[index]` changed
    MessageUpdated { index: usize },
    /// A system message was appended at `index`
    SystemNotice { index: usize, text: String },
    /// The backend needs metadata; the job has been aborted
    MetadataRequested {
        job_id: JobId,
        fields: Vec<MetadataField>,
    },
    /// Sends in `mode` are blocked for `retry_after`
    RateLimited {
        mode: ChatMode,
        retry_after: Duration,
        provider: Option<String>,
    },
    /// The message of `job_id` reached a terminal state
    Completed {
        job_id: JobId,
        index: usize,
        status: MessageStatus,
    },
}

#[derive(Debug, Clone, Copy)]
struct Generation {
    message_index: usize,
    mode: ChatMode,
    /// Stopped by the user; waiting for the read loop's flushed tail
    draining: bool,
}

/// Owner of all job and message state for one session id.
///
/// Mutated only through `&mut self` from a single task. Read loops run on
/// spawned tasks and talk back through [`StreamUpdate`]s, which the owner
/// feeds to [`handle_update`](Self::handle_update).
///
/// `send` spawns onto the current tokio runtime.
#[derive(Debug)]
pub struct ChatSession {
    session_id: String,
    client: ChatClient,
    jobs: JobManager,
    messages: Vec<Message>,
    generations: HashMap<JobId, Generation>,
    rate_limits: RateLimitGate,
    default_mode: ChatMode,
    policy: BatchPolicy,
    updates_tx: mpsc::UnboundedSender<StreamUpdate>,
    updates_rx: mpsc::UnboundedReceiver<StreamUpdate>,
}

impl ChatSession {
    /// A session with a fresh random id.
    pub fn new(client: ChatClient, jobs: JobManager) -> Self {
        Self::with_session_id(Uuid::new_v4().to_string(), client, jobs)
    }

    pub fn with_session_id(session_id: impl Into<String>, client: ChatClient, jobs: JobManager) -> Self {
        let (updates_tx, updates_rx) = mpsc::unbounded_channel();
        Self {
            session_id: session_id.into(),
            client,
            jobs,
            messages: Vec::new(),
            generations: HashMap::new(),
            rate_limits: RateLimitGate::new(),
            default_mode: ChatMode::default(),
            policy: BatchPolicy::default(),
            updates_tx,
            updates_rx,
        }
    }

    /// Production wiring: reqwest transport, HTTP abort notifications.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let client = ChatClient::from_config(config)?;
        let jobs = JobManager::new(Arc::new(HttpAbortNotifier::new(client.clone())));
        Ok(Self::new(client, jobs)
            .with_mode(config.mode)
            .with_policy(config.batch_policy()))
    }

    /// Use a caller-chosen session id instead of the generated one.
    pub fn with_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    pub fn with_mode(mut self, mode: ChatMode) -> Self {
        self.default_mode = mode;
        self
    }

    pub fn with_policy(mut self, policy: BatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn client(&self) -> &ChatClient {
        &self.client
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn message(&self, index: usize) -> Option<&Message> {
        self.messages.get(index)
    }

    pub fn rate_limits(&self) -> &RateLimitGate {
        &self.rate_limits
    }

    pub fn active_job(&self) -> Option<JobId> {
        self.jobs.active_job(&self.session_id)
    }

    pub fn has_active_job(&self) -> bool {
        self.jobs.has_active_job(&self.session_id)
    }

    /// True while any read loop of this session may still send updates that
    /// will be applied.
    pub fn is_generating(&self) -> bool {
        !self.generations.is_empty()
    }

    /// Index of the message `job_id` writes into.
    pub fn message_index(&self, job_id: JobId) -> Option<usize> {
        self.generations.get(&job_id).map(|g| g.message_index)
    }

    /// Ask a question. Supersedes any generation still running.
    pub fn send(&mut self, question: &str, mode: Option<ChatMode>) -> Result<JobId, SessionError> {
        self.start(question, mode, Message::assistant())
    }

    /// Like [`send`](Self::send), with the answer starting in `Progress`.
    pub fn send_with_progress(
        &mut self,
        question: &str,
        mode: Option<ChatMode>,
        label: Option<String>,
    ) -> Result<JobId, SessionError> {
        self.start(question, mode, Message::assistant_with_progress(label))
    }

    fn start(
        &mut self,
        question: &str,
        mode: Option<ChatMode>,
        answer: Message,
    ) -> Result<JobId, SessionError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(SessionError::EmptyQuestion);
        }
        let mode = mode.unwrap_or(self.default_mode);
        self.rate_limits.check(mode, Instant::now())?;

        // Never let two jobs write at once
        self.settle_open_generations();

        self.messages.push(Message::user(question));
        self.messages.push(answer);
        let message_index = self.messages.len() - 1;

        let job = self.jobs.start_job(&self.session_id);
        self.generations.insert(
            job.id,
            Generation {
                message_index,
                mode,
                draining: false,
            },
        );

        let request = GenerateRequest::new(self.session_id.clone(), question, mode);
        tokio::spawn(run_generation(
            self.client.clone(),
            request,
            job.clone(),
            self.policy,
            self.updates_tx.clone(),
        ));

        Ok(job.id)
    }

    /// Finalize every open message as `Done`, keeping its content.
    fn settle_open_generations(&mut self) {
        for (job_id, generation) in self.generations.drain() {
            if let Some(message) = self.messages.get_mut(generation.message_index) {
                if message.finish() {
                    tracing::debug!(job = %job_id, "Finalized superseded message");
                }
            }
        }
    }

    /// Stop the live generation.
    ///
    /// The backend is notified now; the message is finalized when the read
    /// loop reports back with whatever it had already read.
    pub fn stop(&mut self) -> Result<JobId, SessionError> {
        let job_id = self
            .jobs
            .abort_job(&self.session_id, Some(REASON_USER_STOP))
            .ok_or_else(|| SessionError::NoActiveJob {
                session_id: self.session_id.clone(),
            })?;
        if let Some(generation) = self.generations.get_mut(&job_id) {
            generation.draining = true;
        }
        Ok(job_id)
    }

    /// Abort everything and finalize open messages. For process exit.
    pub fn shutdown(&mut self) {
        let aborted = self.jobs.abort_all(Some(REASON_SHUTDOWN));
        if !aborted.is_empty() {
            tracing::info!(count = aborted.len(), "Aborted jobs on shutdown");
        }
        self.settle_open_generations();
    }

    /// Wait for the next update from any read loop of this session.
    pub async fn next_update(&mut self) -> Option<StreamUpdate> {
        self.updates_rx.recv().await
    }

    /// Apply one update. Updates from jobs that are no longer live are
    /// dropped.
    pub fn handle_update(&mut self, update: StreamUpdate) -> Vec<SessionSignal> {
        match update {
            StreamUpdate::Frames { job_id, frames } => self.apply_frames(job_id, frames),
            StreamUpdate::Finished { job_id, .. } => {
                self.jobs.finish_job(&self.session_id, job_id);
                self.complete(job_id, |message| message.finish())
            }
            StreamUpdate::Cancelled { job_id } => {
                self.complete(job_id, |message| message.finish())
            }
            StreamUpdate::Failed { job_id, error } => {
                if self.jobs.active_job(&self.session_id) == Some(job_id) {
                    match error {
                        // The backend may still be generating
                        StreamError::ConnectionLost { .. } => {
                            self.jobs
                                .abort_job(&self.session_id, Some(REASON_TRANSPORT_ERROR));
                        }
                        _ => {
                            self.jobs.finish_job(&self.session_id, job_id);
                        }
                    }
                }
                let reason = error.user_message();
                self.complete(job_id, move |message| message.fail(reason))
            }
        }
    }

    fn accepts(&self, job_id: JobId) -> Option<Generation> {
        let generation = *self.generations.get(&job_id)?;
        if generation.draining || self.jobs.is_live(job_id) {
            Some(generation)
        } else {
            None
        }
    }

    fn apply_frames(&mut self, job_id: JobId, frames: Vec<Frame>) -> Vec<SessionSignal> {
        let Some(generation) = self.accepts(job_id) else {
            tracing::debug!(job = %job_id, count = frames.len(), "Dropping frames from stale job");
            return Vec::new();
        };
        let index = generation.message_index;

        let mut signals = Vec::new();
        let mut touched = false;

        for frame in frames {
            let Some(message) = self.messages.get_mut(index) else {
                break;
            };
            match message.apply_frame(frame) {
                FrameEffect::Applied => touched = true,
                FrameEffect::Ignored => {}
                FrameEffect::SystemNotice(text) => {
                    touched = true;
                    self.messages.push(Message::system(text.clone()));
                    signals.push(SessionSignal::SystemNotice {
                        index: self.messages.len() - 1,
                        text,
                    });
                }
                FrameEffect::RateLimited {
                    retry_after,
                    provider,
                } => {
                    touched = true;
                    self.rate_limits.record(
                        generation.mode,
                        retry_after,
                        provider.clone(),
                        Instant::now(),
                    );
                    signals.push(SessionSignal::RateLimited {
                        mode: generation.mode,
                        retry_after,
                        provider,
                    });
                }
                FrameEffect::MetadataRequested(fields) => {
                    tracing::info!(job = %job_id, fields = fields.len(), "Backend requested metadata");
                    self.jobs
                        .abort_job(&self.session_id, Some(REASON_METADATA_REQUIRED));
                    message.finish_after_metadata_request();
                    let status = message.status;
                    self.generations.remove(&job_id);
                    signals.push(SessionSignal::MetadataRequested { job_id, fields });
                    signals.push(SessionSignal::Completed {
                        job_id,
                        index,
                        status,
                    });
                    touched = true;
                    break;
                }
                FrameEffect::Failed(reason) => {
                    tracing::warn!(job = %job_id, "Backend reported error: {}", reason);
                    touched = true;
                    signals.push(SessionSignal::Completed {
                        job_id,
                        index,
                        status: MessageStatus::Error,
                    });
                }
            }
        }

        if touched {
            signals.insert(0, SessionSignal::MessageUpdated { index });
        }
        signals
    }

    fn complete(&mut self, job_id: JobId, finalize: impl FnOnce(&mut Message) -> bool) -> Vec<SessionSignal> {
        let Some(generation) = self.generations.remove(&job_id) else {
            return Vec::new();
        };
        let index = generation.message_index;
        match self.messages.get_mut(index) {
            Some(message) => {
                if finalize(message) {
                    vec![SessionSignal::Completed {
                        job_id,
                        index,
                        status: message.status,
                    }]
                } else {
                    Vec::new()
                }
            }
            None => Vec::new(),
        }
    }
}
