//! Session-keyed single-flight job registry.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use super::notifier::{AbortNotifier, NoopAbortNotifier};

static NEXT_JOB_ID: AtomicU64 = AtomicU64::new(1);

/// Process-wide monotonically increasing job epoch. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(u64);

impl JobId {
    fn next() -> Self {
        JobId(NEXT_JOB_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

/// What the read loop of a job needs.
#[derive(Debug, Clone)]
pub struct JobHandle {
    pub id: JobId,
    pub session_id: String,
    /// Cancelled when the job is aborted or superseded
    pub token: CancellationToken,
}

impl JobHandle {
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

#[derive(Debug)]
struct Job {
    id: JobId,
    token: CancellationToken,
    started_at: Instant,
}

/// At most one live job per session.
///
/// Owned by one task and mutated through `&mut self`; read loops only ever
/// see their [`JobHandle`]. Remote notification goes through the injected
/// [`AbortNotifier`] and never blocks or fails the caller.
pub struct JobManager {
    jobs: HashMap<String, Job>,
    notifier: Arc<dyn AbortNotifier>,
}

impl fmt::Debug for JobManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobManager")
            .field("jobs", &self.jobs)
            .finish_non_exhaustive()
    }
}

impl Default for JobManager {
    fn default() -> Self {
        Self::new(Arc::new(NoopAbortNotifier))
    }
}

impl JobManager {
    pub fn new(notifier: Arc<dyn AbortNotifier>) -> Self {
        Self {
            jobs: HashMap::new(),
            notifier,
        }
    }

    /// Register a new job for `session_id`, aborting the one already live.
    pub fn start_job(&mut self, session_id: &str) -> JobHandle {
        if let Some(previous) = self.abort_job(session_id, Some(super::REASON_SUPERSEDED)) {
            tracing::info!(session_id, superseded = %previous, "Superseding live job");
        }

        let id = JobId::next();
        let token = CancellationToken::new();
        self.jobs.insert(
            session_id.to_string(),
            Job {
                id,
                token: token.clone(),
                started_at: Instant::now(),
            },
        );
        tracing::info!(session_id, job = %id, "Job started");

        JobHandle {
            id,
            session_id: session_id.to_string(),
            token,
        }
    }

    /// Cancel the live job for `session_id` and notify the backend.
    ///
    /// Returns the aborted job, or `None` (and does nothing) when the
    /// session is idle.
    pub fn abort_job(&mut self, session_id: &str, reason: Option<&str>) -> Option<JobId> {
        let job = self.jobs.remove(session_id)?;
        job.token.cancel();
        self.notifier.notify(session_id, reason);
        tracing::info!(
            session_id,
            job = %job.id,
            reason,
            elapsed_ms = job.started_at.elapsed().as_millis() as u64,
            "Job aborted"
        );
        Some(job.id)
    }

    /// Clear the record of a job that ended on its own. No remote call.
    ///
    /// Returns false if `job_id` is not the live job for `session_id`; the
    /// live job is then left untouched.
    pub fn finish_job(&mut self, session_id: &str, job_id: JobId) -> bool {
        match self.jobs.get(session_id) {
            Some(job) if job.id == job_id => {
                if let Some(job) = self.jobs.remove(session_id) {
                    tracing::info!(
                        session_id,
                        job = %job.id,
                        elapsed_ms = job.started_at.elapsed().as_millis() as u64,
                        "Job finished"
                    );
                }
                true
            }
            _ => {
                tracing::debug!(session_id, job = %job_id, "Ignoring finish for stale job");
                false
            }
        }
    }

    pub fn has_active_job(&self, session_id: &str) -> bool {
        self.jobs.contains_key(session_id)
    }

    pub fn has_any_active_job(&self) -> bool {
        !self.jobs.is_empty()
    }

    pub fn active_job(&self, session_id: &str) -> Option<JobId> {
        self.jobs.get(session_id).map(|job| job.id)
    }

    /// Whether `job_id` is the live job of some session.
    pub fn is_live(&self, job_id: JobId) -> bool {
        self.jobs.values().any(|job| job.id == job_id)
    }

    /// How long the live job of `session_id` has been running.
    pub fn elapsed(&self, session_id: &str) -> Option<Duration> {
        self.jobs.get(session_id).map(|job| job.started_at.elapsed())
    }

    /// Abort every live job. Returns the aborted ids.
    pub fn abort_all(&mut self, reason: Option<&str>) -> Vec<JobId> {
        let sessions: Vec<String> = self.jobs.keys().cloned().collect();
        sessions
            .iter()
            .filter_map(|session_id| self.abort_job(session_id, reason))
            .collect()
    }
}
