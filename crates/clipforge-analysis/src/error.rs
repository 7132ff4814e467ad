//! Analysis error types.

use clipforge_models::PeakWindow;
use thiserror::Error;

pub type AnalysisResult<T> = Result<T, AnalysisError>;

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// ASR timestamps are inconsistent with the declared source duration.
    /// Permanent: indicates malformed ASR input, never retried.
    #[error("Alignment failed: {0}")]
    Alignment(String),

    /// Too little signal for the requested clip count. Non-fatal at the job
    /// level: the windows found so far are carried in the error.
    #[error("Insufficient signal: found {found} of {requested} requested windows")]
    InsufficientSignal {
        found: usize,
        requested: usize,
        windows: Vec<PeakWindow>,
    },

    /// A clip's time range contains no aligned words. The job treats this as
    /// a caption-less clip, not a hard failure.
    #[error("Empty transcript for range {start:.2}s..{end:.2}s")]
    EmptyTranscript { start: f64, end: f64 },
}

impl AnalysisError {
    pub fn alignment(msg: impl Into<String>) -> Self {
        Self::Alignment(msg.into())
    }

    /// Whether this error permanently fails the whole job.
    pub fn is_permanent(&self) -> bool {
        matches!(self, AnalysisError::Alignment(_))
    }
}
