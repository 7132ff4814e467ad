//! Job records and the pipeline state machine.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use crate::{Clip, ClipArtifact, ClipFailure, SourceVideo};

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pipeline stage for a job.
///
/// Shared stages run sequentially; `ClipProcessing` fans out per-clip work.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum JobStage {
    Ingesting,
    Transcribing,
    Scoring,
    Detecting,
    Refining,
    ClipProcessing,
    Finalized,
    Failed,
    Cancelled,
}

impl JobStage {
    /// The next stage in the happy path, if any.
    pub fn next(&self) -> Option<JobStage> {
        match self {
            JobStage::Ingesting => Some(JobStage::Transcribing),
            JobStage::Transcribing => Some(JobStage::Scoring),
            JobStage::Scoring => Some(JobStage::Detecting),
            JobStage::Detecting => Some(JobStage::Refining),
            JobStage::Refining => Some(JobStage::ClipProcessing),
            JobStage::ClipProcessing => Some(JobStage::Finalized),
            JobStage::Finalized | JobStage::Failed | JobStage::Cancelled => None,
        }
    }

    /// Whether the stage is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStage::Finalized | JobStage::Failed | JobStage::Cancelled
        )
    }

    /// All non-terminal stages in pipeline order.
    pub fn pipeline() -> &'static [JobStage] {
        &[
            JobStage::Ingesting,
            JobStage::Transcribing,
            JobStage::Scoring,
            JobStage::Detecting,
            JobStage::Refining,
            JobStage::ClipProcessing,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStage::Ingesting => "ingesting",
            JobStage::Transcribing => "transcribing",
            JobStage::Scoring => "scoring",
            JobStage::Detecting => "detecting",
            JobStage::Refining => "refining",
            JobStage::ClipProcessing => "clip_processing",
            JobStage::Finalized => "finalized",
            JobStage::Failed => "failed",
            JobStage::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status of one pipeline stage within a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// Stage has not started
    #[default]
    Pending,
    /// Stage is currently running
    Running,
    /// Stage completed successfully
    Complete,
    /// Stage failed
    Failed,
}

/// A job record. Created on submission, mutated only by the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Job {
    /// Unique job ID
    pub id: JobId,

    /// Source video being processed
    pub video: SourceVideo,

    /// Current stage
    pub stage: JobStage,

    /// Per-stage status
    #[serde(default)]
    pub stage_status: BTreeMap<JobStage, StageStatus>,

    /// Clips produced by the job (populated during ClipProcessing)
    #[serde(default)]
    pub clips: Vec<Clip>,

    /// Per-clip sub-task failures (non-empty on partial success)
    #[serde(default)]
    pub failures: Vec<ClipFailure>,

    /// Error that terminated the job (if failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Create a new job for a source video.
    pub fn new(video: SourceVideo) -> Self {
        let now = Utc::now();
        let mut stage_status = BTreeMap::new();
        for stage in JobStage::pipeline() {
            stage_status.insert(*stage, StageStatus::Pending);
        }

        Self {
            id: JobId::new(),
            video,
            stage: JobStage::Ingesting,
            stage_status,
            clips: Vec::new(),
            failures: Vec::new(),
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Mark a stage as running and make it the current stage.
    pub fn begin_stage(&mut self, stage: JobStage) {
        self.stage = stage;
        self.stage_status.insert(stage, StageStatus::Running);
        self.updated_at = Utc::now();
    }

    /// Make `stage` the current stage.
    ///
    /// An already-completed stage keeps its Complete status; a resumed job
    /// revisits completed stages without demoting them to Running.
    pub fn enter_stage(&mut self, stage: JobStage) {
        if self.stage_complete(stage) {
            self.stage = stage;
            self.updated_at = Utc::now();
        } else {
            self.begin_stage(stage);
        }
    }

    /// Mark a stage complete.
    pub fn complete_stage(&mut self, stage: JobStage) {
        self.stage_status.insert(stage, StageStatus::Complete);
        self.updated_at = Utc::now();
    }

    /// Mark the job failed with the triggering error.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.stage_status.insert(self.stage, StageStatus::Failed);
        self.stage = JobStage::Failed;
        self.error = Some(error.into());
        self.updated_at = Utc::now();
    }

    /// Mark the job cancelled.
    pub fn cancel(&mut self) {
        self.stage = JobStage::Cancelled;
        self.updated_at = Utc::now();
    }

    /// Mark the job finalized.
    pub fn finalize(&mut self) {
        self.complete_stage(JobStage::ClipProcessing);
        self.stage = JobStage::Finalized;
        self.updated_at = Utc::now();
    }

    /// Whether the given stage has already completed.
    pub fn stage_complete(&self, stage: JobStage) -> bool {
        self.stage_status.get(&stage) == Some(&StageStatus::Complete)
    }

    /// Build the user-visible status report.
    ///
    /// Clips are ordered by descending emotion score; only usable clips are
    /// exposed as artifacts.
    pub fn status_report(&self) -> JobStatusReport {
        let mut clips: Vec<&Clip> = self.clips.iter().filter(|c| c.is_usable()).collect();
        clips.sort_by(|a, b| {
            b.emotion_score
                .partial_cmp(&a.emotion_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(
                    a.start
                        .partial_cmp(&b.start)
                        .unwrap_or(std::cmp::Ordering::Equal),
                )
        });

        JobStatusReport {
            job_id: self.id.clone(),
            stage: self.stage,
            stage_status: self.stage_status.clone(),
            clips: clips.iter().map(|c| c.to_artifact()).collect(),
            failures: self.failures.clone(),
            error: self.error.clone(),
            updated_at: self.updated_at,
        }
    }
}

/// User-visible job status.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct JobStatusReport {
    /// Job ID
    pub job_id: JobId,
    /// Current stage (terminal once Finalized/Failed/Cancelled)
    pub stage: JobStage,
    /// Per-stage completion flags
    pub stage_status: BTreeMap<JobStage, StageStatus>,
    /// Successful clip artifacts, ordered by descending emotion score
    pub clips: Vec<ClipArtifact>,
    /// Failed clip sub-tasks with reasons
    pub failures: Vec<ClipFailure>,
    /// Triggering error for failed jobs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_video() -> SourceVideo {
        SourceVideo::new(1200.0, 30.0, 1920, 1080, "audio/main")
    }

    #[test]
    fn test_stage_sequence() {
        let mut stage = JobStage::Ingesting;
        let mut seen = vec![stage];
        while let Some(next) = stage.next() {
            stage = next;
            seen.push(stage);
        }
        assert_eq!(stage, JobStage::Finalized);
        assert_eq!(seen.len(), 7);
        assert!(JobStage::Failed.next().is_none());
    }

    #[test]
    fn test_job_stage_transitions() {
        let mut job = Job::new(test_video());
        assert_eq!(job.stage, JobStage::Ingesting);

        job.begin_stage(JobStage::Transcribing);
        assert_eq!(
            job.stage_status[&JobStage::Transcribing],
            StageStatus::Running
        );

        job.complete_stage(JobStage::Transcribing);
        assert!(job.stage_complete(JobStage::Transcribing));
    }

    #[test]
    fn test_enter_stage_keeps_completed_status() {
        let mut job = Job::new(test_video());
        job.begin_stage(JobStage::Transcribing);
        job.complete_stage(JobStage::Transcribing);
        job.stage = JobStage::Ingesting; // stale, as after a crash

        job.enter_stage(JobStage::Transcribing);
        assert_eq!(job.stage, JobStage::Transcribing);
        assert_eq!(
            job.stage_status[&JobStage::Transcribing],
            StageStatus::Complete
        );

        job.enter_stage(JobStage::Scoring);
        assert_eq!(job.stage, JobStage::Scoring);
        assert_eq!(job.stage_status[&JobStage::Scoring], StageStatus::Running);
    }

    #[test]
    fn test_job_failure() {
        let mut job = Job::new(test_video());
        job.begin_stage(JobStage::Scoring);
        job.fail("alignment error");

        assert_eq!(job.stage, JobStage::Failed);
        assert_eq!(job.stage_status[&JobStage::Scoring], StageStatus::Failed);
        assert!(job.stage.is_terminal());
    }

    #[test]
    fn test_status_report_orders_by_score() {
        let mut job = Job::new(test_video());
        let mut low = Clip::new("low", 0.0, 30.0, 0.3);
        low.crop_status = crate::SubTaskStatus::Completed;
        let mut high = Clip::new("high", 60.0, 90.0, 0.9);
        high.crop_status = crate::SubTaskStatus::Completed;
        let pending = Clip::new("pending", 120.0, 150.0, 0.99);

        job.clips = vec![low, high, pending];
        let report = job.status_report();

        // Pending clip is not usable and is excluded
        assert_eq!(report.clips.len(), 2);
        assert_eq!(report.clips[0].title, "high");
        assert_eq!(report.clips[1].title, "low");
    }
}
