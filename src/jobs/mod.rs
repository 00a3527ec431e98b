//! Single-flight generation jobs.
//!
//! A session has at most one live job. Starting a job supersedes the live
//! one; aborting cancels its [`CancellationToken`](tokio_util::sync::CancellationToken)
//! and fires a best-effort notification to the backend. Finishing only
//! clears local state.
//!
//! # Module structure
//! - `manager` - [`JobManager`], [`JobHandle`], [`JobId`]
//! - `notifier` - the [`AbortNotifier`] seam and its implementations

mod manager;
mod notifier;

pub use manager::{JobHandle, JobId, JobManager};
pub use notifier::{AbortNotifier, HttpAbortNotifier, NoopAbortNotifier};

/// A newer send on the same session replaced the job.
pub const REASON_SUPERSEDED: &str = "superseded";
/// The user pressed stop.
pub const REASON_USER_STOP: &str = "user_stop";
/// The backend asked for document metadata mid-stream.
pub const REASON_METADATA_REQUIRED: &str = "metadata_required";
/// The read loop failed.
pub const REASON_TRANSPORT_ERROR: &str = "transport_error";
/// The process is exiting.
pub const REASON_SHUTDOWN: &str = "shutdown";
