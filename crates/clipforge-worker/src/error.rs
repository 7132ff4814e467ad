//! Worker error types.

use clipforge_analysis::AnalysisError;
use clipforge_capability::CapabilityError;
use clipforge_models::JobId;
use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    /// Source video is malformed or unreadable. Permanent, fails the job.
    #[error("Ingest failed: {0}")]
    Ingest(String),

    /// An analysis stage failed.
    #[error("Analysis failed: {0}")]
    Analysis(#[from] AnalysisError),

    /// An external capability call failed (after retries).
    #[error("Capability failed: {0}")]
    Capability(#[from] CapabilityError),

    /// Checkpoint storage I/O failed.
    #[error("Checkpoint I/O failed: {0}")]
    CheckpointIo(#[from] std::io::Error),

    /// Checkpoint contents could not be decoded.
    #[error("Checkpoint corrupt: {0}")]
    CheckpointCorrupt(#[from] serde_json::Error),

    /// Every clip's sub-tasks failed permanently.
    #[error("No usable clips: {0}")]
    NoUsableClips(String),

    /// The job was cancelled before reaching this point.
    #[error("Job cancelled")]
    Cancelled,

    #[error("Job not found: {0}")]
    JobNotFound(JobId),

    /// The requested operation conflicts with the job's current state.
    #[error("Job {job_id} is {state}: {reason}")]
    InvalidState {
        job_id: JobId,
        state: String,
        reason: String,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl WorkerError {
    pub fn invalid_state(
        job_id: JobId,
        state: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidState {
            job_id,
            state: state.into(),
            reason: reason.into(),
        }
    }
}
