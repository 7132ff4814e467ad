//! Job orchestration.
//!
//! Owns every job's lifecycle: submission spawns the pipeline onto the
//! runtime under a concurrency limit, status queries read the live record,
//! cancellation flips a watch channel the pipeline polls between checkpoints,
//! and resume reloads a persisted job and re-runs it from its last completed
//! stage.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex, Semaphore};
use tracing::{error, info};

use clipforge_capability::{
    AsrCapability, DetectionCapability, MediaProbeCapability, RenderCapability,
};
use clipforge_models::{Job, JobId, JobStatusReport, SourceVideo, StageStatus};

use crate::checkpoint::CheckpointStore;
use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::pipeline::Pipeline;

struct JobHandle {
    job: Arc<Mutex<Job>>,
    cancel: watch::Sender<bool>,
}

pub struct Orchestrator {
    pipeline: Arc<Pipeline>,
    checkpoints: CheckpointStore,
    jobs: Arc<Mutex<HashMap<JobId, JobHandle>>>,
    job_permits: Arc<Semaphore>,
}

impl Orchestrator {
    pub fn new(
        config: WorkerConfig,
        asr: Arc<dyn AsrCapability>,
        probe: Arc<dyn MediaProbeCapability>,
        detector: Arc<dyn DetectionCapability>,
        renderer: Option<Arc<dyn RenderCapability>>,
    ) -> WorkerResult<Self> {
        config.validate()?;
        let checkpoints = CheckpointStore::new(&config.checkpoint_dir);
        let job_permits = Arc::new(Semaphore::new(config.max_concurrent_jobs));

        let mut pipeline = Pipeline::new(config, checkpoints.clone(), asr, probe, detector);
        if let Some(renderer) = renderer {
            pipeline = pipeline.with_renderer(renderer);
        }

        Ok(Self {
            pipeline: Arc::new(pipeline),
            checkpoints,
            jobs: Arc::new(Mutex::new(HashMap::new())),
            job_permits,
        })
    }

    /// Submit a source video for processing.
    ///
    /// Returns the job ID immediately; processing happens asynchronously.
    /// When the job pool is saturated the job queues rather than failing.
    pub async fn submit(&self, video: SourceVideo) -> WorkerResult<JobId> {
        let job = Job::new(video);
        let id = job.id.clone();
        info!(job_id = %id, "job submitted");
        self.spawn_job(job).await;
        Ok(id)
    }

    /// Current status of a job, live or persisted.
    pub async fn status(&self, id: &JobId) -> WorkerResult<JobStatusReport> {
        if let Some(handle) = self.jobs.lock().await.get(id) {
            return Ok(handle.job.lock().await.status_report());
        }
        match self.checkpoints.load_job(id).await? {
            Some(job) => Ok(job.status_report()),
            None => Err(WorkerError::JobNotFound(id.clone())),
        }
    }

    /// Request cooperative cancellation.
    ///
    /// In-flight work finishes its current unit and stops at the next
    /// checkpoint; artifacts persisted so far are retained.
    pub async fn cancel(&self, id: &JobId) -> WorkerResult<()> {
        if let Some(handle) = self.jobs.lock().await.get(id) {
            info!(job_id = %id, "cancellation requested");
            let _ = handle.cancel.send(true);
            return Ok(());
        }

        // Not running here: a crashed job can still be marked cancelled
        match self.checkpoints.load_job(id).await? {
            Some(mut job) if !job.stage.is_terminal() => {
                job.cancel();
                self.checkpoints.save_job(&job).await
            }
            Some(_) => Ok(()),
            None => Err(WorkerError::JobNotFound(id.clone())),
        }
    }

    /// Resume a persisted, non-terminal job from its last completed stage.
    pub async fn resume(&self, id: &JobId) -> WorkerResult<()> {
        {
            let jobs = self.jobs.lock().await;
            if let Some(handle) = jobs.get(id) {
                let job = handle.job.lock().await;
                if !job.stage.is_terminal() {
                    return Err(WorkerError::invalid_state(
                        id.clone(),
                        job.stage.as_str(),
                        "already running",
                    ));
                }
            }
        }

        let mut job = self
            .checkpoints
            .load_job(id)
            .await?
            .ok_or_else(|| WorkerError::JobNotFound(id.clone()))?;

        if job.stage.is_terminal() {
            return Err(WorkerError::invalid_state(
                id.clone(),
                job.stage.as_str(),
                "terminal jobs cannot be resumed",
            ));
        }

        // A crash leaves the interrupted stage marked Running; it reruns
        for status in job.stage_status.values_mut() {
            if *status == StageStatus::Running {
                *status = StageStatus::Pending;
            }
        }

        info!(job_id = %id, stage = %job.stage, "resuming job");
        self.spawn_job(job).await;
        Ok(())
    }

    /// Poll until the job reaches a terminal stage or the timeout elapses.
    pub async fn wait_for_terminal(
        &self,
        id: &JobId,
        timeout: Duration,
    ) -> WorkerResult<JobStatusReport> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let report = self.status(id).await?;
            if report.stage.is_terminal() {
                return Ok(report);
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(WorkerError::invalid_state(
                    id.clone(),
                    report.stage.as_str(),
                    "timed out waiting for terminal state",
                ));
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    async fn spawn_job(&self, job: Job) {
        let id = job.id.clone();
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let job = Arc::new(Mutex::new(job));

        self.jobs.lock().await.insert(
            id.clone(),
            JobHandle {
                job: Arc::clone(&job),
                cancel: cancel_tx,
            },
        );

        let pipeline = Arc::clone(&self.pipeline);
        let permits = Arc::clone(&self.job_permits);
        let jobs = Arc::clone(&self.jobs);
        tokio::spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                return;
            };
            if let Err(err) = pipeline.run(job, cancel_rx).await {
                error!(job_id = %id, error = %err, "job ended with error");
            }
            // Terminal record is already persisted; drop the live handle so
            // the registry does not grow with every submission
            jobs.lock().await.remove(&id);
        });
    }
}
