//! The per-job stage pipeline.
//!
//! Stages run sequentially up to clip fan-out; each stage's output is cached
//! in the checkpoint store under a content fingerprint, so resuming a job or
//! resubmitting an identical one reuses completed work instead of
//! recomputing it.

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::{watch, Mutex, Semaphore};
use tracing::{info, warn};

use clipforge_analysis::{
    align, build_cues, caption_summary, clip_title, detect_peaks, refine_windows, score_signal,
    AnalysisError,
};
use clipforge_capability::{
    call_with_retry, AsrCapability, DetectionCapability, MediaProbeCapability, RenderCapability,
    RetryPolicy,
};
use clipforge_crop::plan_crop;
use clipforge_models::{
    format_seconds, Clip, ClipFailure, Job, JobStage, PeakWindow, ScoreSample, SourceVideo,
    SubTaskStatus, TranscriptSegment,
};

use crate::checkpoint::CheckpointStore;
use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};

pub struct Pipeline {
    config: WorkerConfig,
    checkpoints: CheckpointStore,
    asr: Arc<dyn AsrCapability>,
    probe: Arc<dyn MediaProbeCapability>,
    detector: Arc<dyn DetectionCapability>,
    renderer: Option<Arc<dyn RenderCapability>>,
    clip_permits: Arc<Semaphore>,
}

impl Pipeline {
    pub fn new(
        config: WorkerConfig,
        checkpoints: CheckpointStore,
        asr: Arc<dyn AsrCapability>,
        probe: Arc<dyn MediaProbeCapability>,
        detector: Arc<dyn DetectionCapability>,
    ) -> Self {
        let clip_permits = Arc::new(Semaphore::new(config.clip_pool_size));
        Self {
            config,
            checkpoints,
            asr,
            probe,
            detector,
            renderer: None,
            clip_permits,
        }
    }

    /// Attach a render capability for the post-processing handoff.
    pub fn with_renderer(mut self, renderer: Arc<dyn RenderCapability>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    fn retry_policy(&self) -> RetryPolicy {
        let cfg = &self.config.pipeline;
        RetryPolicy::new(cfg.max_retries, cfg.retry_base_delay, cfg.stage_timeout)
    }

    /// Run the job to a terminal state.
    ///
    /// Failures mark the job `Failed` and are also returned; cancellation
    /// marks it `Cancelled` and returns `Ok`.
    pub async fn run(
        &self,
        job: Arc<Mutex<Job>>,
        cancel: watch::Receiver<bool>,
    ) -> WorkerResult<()> {
        let job_id = { job.lock().await.id.clone() };
        info!(job_id = %job_id, "starting pipeline");

        match self.run_stages(&job, &cancel).await {
            Ok(()) => {
                info!(job_id = %job_id, "pipeline finished");
                Ok(())
            }
            Err(WorkerError::Cancelled) => {
                let mut j = job.lock().await;
                j.cancel();
                let _ = self.checkpoints.save_job(&j).await;
                info!(job_id = %job_id, "job cancelled");
                Ok(())
            }
            Err(err) => {
                let mut j = job.lock().await;
                j.fail(err.to_string());
                let _ = self.checkpoints.save_job(&j).await;
                warn!(job_id = %job_id, error = %err, "job failed");
                Err(err)
            }
        }
    }

    async fn run_stages(
        &self,
        job: &Mutex<Job>,
        cancel: &watch::Receiver<bool>,
    ) -> WorkerResult<()> {
        let video = { job.lock().await.video.clone() };

        guard(cancel)?;
        self.begin(job, JobStage::Ingesting).await;
        video.validate().map_err(WorkerError::Ingest)?;
        self.complete(job, JobStage::Ingesting).await?;

        guard(cancel)?;
        self.begin(job, JobStage::Transcribing).await;
        let segments = self.ensure_transcript(&video).await?;
        self.complete(job, JobStage::Transcribing).await?;

        guard(cancel)?;
        self.begin(job, JobStage::Scoring).await;
        let series = self.ensure_scores(&video, &segments).await?;
        self.complete(job, JobStage::Scoring).await?;

        guard(cancel)?;
        self.begin(job, JobStage::Detecting).await;
        let windows = self.ensure_peaks(&video, &series).await?;
        self.complete(job, JobStage::Detecting).await?;

        guard(cancel)?;
        self.begin(job, JobStage::Refining).await;
        let refined = self.ensure_refined(&video, &windows, &segments).await?;
        {
            let mut j = job.lock().await;
            // A resumed job may already carry clips from an earlier run
            if j.clips.is_empty() {
                let clips: Vec<Clip> = refined
                    .iter()
                    .map(|w| {
                        let mut clip =
                            Clip::new(clip_title(&segments, w.start, w.end), w.start, w.end, w.score);
                        clip.caption = caption_summary(&segments, w.start, w.end);
                        info!(
                            job_id = %j.id,
                            clip_id = %clip.id,
                            start = %format_seconds(w.start),
                            end = %format_seconds(w.end),
                            score = w.score,
                            "clip created"
                        );
                        clip
                    })
                    .collect();
                j.clips = clips;
            }
        }
        self.complete(job, JobStage::Refining).await?;

        guard(cancel)?;
        self.begin(job, JobStage::ClipProcessing).await;
        self.process_clips(job, &video, &segments, cancel).await?;

        let mut j = job.lock().await;
        let usable = j.clips.iter().filter(|c| c.is_usable()).count();
        if usable == 0 {
            let reason = j
                .failures
                .first()
                .map(|f| f.reason.clone())
                .unwrap_or_else(|| "clip processing produced nothing".to_string());
            drop(j);
            return Err(WorkerError::NoUsableClips(reason));
        }
        j.finalize();
        info!(
            job_id = %j.id,
            clips = usable,
            failures = j.failures.len(),
            "job finalized"
        );
        self.checkpoints.save_job(&j).await?;
        Ok(())
    }

    /// Fan clip sub-tasks out over the bounded pool and merge results back.
    async fn process_clips(
        &self,
        job: &Mutex<Job>,
        video: &SourceVideo,
        segments: &[TranscriptSegment],
        cancel: &watch::Receiver<bool>,
    ) -> WorkerResult<()> {
        let clips = { job.lock().await.clips.clone() };

        let tasks = clips.into_iter().map(|clip| {
            let cancel = cancel.clone();
            async move {
                let Ok(_permit) = self.clip_permits.acquire().await else {
                    return (clip, Vec::new());
                };
                if *cancel.borrow() {
                    return (clip, Vec::new());
                }
                self.process_clip(clip, video, segments).await
            }
        });

        let results = join_all(tasks).await;

        let mut j = job.lock().await;
        for (updated, failures) in results {
            if let Some(slot) = j.clips.iter_mut().find(|c| c.id == updated.id) {
                *slot = updated;
            }
            j.failures.extend(failures);
        }
        drop(j);

        guard(cancel)
    }

    /// Run one clip's crop, caption, and render sub-tasks.
    ///
    /// Sub-task failures are local: they mark the sub-task failed and record
    /// a `ClipFailure`, never aborting sibling clips.
    async fn process_clip(
        &self,
        mut clip: Clip,
        video: &SourceVideo,
        segments: &[TranscriptSegment],
    ) -> (Clip, Vec<ClipFailure>) {
        let cfg = &self.config.pipeline;
        let policy = self.retry_policy();
        let mut failures = Vec::new();

        if clip.crop_status != SubTaskStatus::Completed {
            let detector = Arc::clone(&self.detector);
            let (start, end, fps) = (clip.start, clip.end, cfg.crop_sample_fps);
            match call_with_retry(&policy, "detect", move || {
                let detector = Arc::clone(&detector);
                async move { detector.detect(video, start, end, fps).await }
            })
            .await
            {
                Ok(detections) => {
                    clip.crop_path = plan_crop(clip.start, clip.end, &detections, video, cfg);
                    clip.crop_status = SubTaskStatus::Completed;
                }
                Err(err) => {
                    warn!(clip_id = %clip.id, error = %err, "crop sub-task failed");
                    clip.crop_status = SubTaskStatus::Failed;
                    failures.push(ClipFailure::new(clip.id.clone(), "crop", err.to_string()));
                }
            }
        }

        if clip.caption_status != SubTaskStatus::Completed {
            match build_cues(segments, clip.start, clip.end, cfg) {
                Ok(cues) => {
                    clip.cues = cues;
                    clip.caption_status = SubTaskStatus::Completed;
                }
                Err(AnalysisError::EmptyTranscript { .. }) => {
                    // Caption-less clip, not a failure
                    info!(clip_id = %clip.id, "no spoken words in range, skipping captions");
                    clip.cues = Vec::new();
                    clip.caption_status = SubTaskStatus::Completed;
                }
                Err(err) => {
                    clip.caption_status = SubTaskStatus::Failed;
                    failures.push(ClipFailure::new(clip.id.clone(), "captions", err.to_string()));
                }
            }
        }

        if clip.is_usable() && clip.video_url.is_none() {
            if let Some(renderer) = &self.renderer {
                let renderer = Arc::clone(renderer);
                let clip_ref = &clip;
                match call_with_retry(&policy, "render", move || {
                    let renderer = Arc::clone(&renderer);
                    async move { renderer.render(video, clip_ref).await }
                })
                .await
                {
                    Ok(rendered) => {
                        clip.video_url = Some(rendered.video_url);
                        clip.thumbnail = Some(rendered.thumbnail);
                    }
                    Err(err) => {
                        // The clip itself is still usable without the render
                        warn!(clip_id = %clip.id, error = %err, "render handoff failed");
                        failures.push(ClipFailure::new(clip.id.clone(), "render", err.to_string()));
                    }
                }
            }
        }

        (clip, failures)
    }

    async fn ensure_transcript(
        &self,
        video: &SourceVideo,
    ) -> WorkerResult<Vec<TranscriptSegment>> {
        let key = CheckpointStore::fingerprint(
            &video.id,
            JobStage::Transcribing,
            &self.config.pipeline,
        );
        if let Some(cached) = self.checkpoints.load(&key).await? {
            return Ok(cached);
        }

        let asr = Arc::clone(&self.asr);
        let words = call_with_retry(&self.retry_policy(), "asr", move || {
            let asr = Arc::clone(&asr);
            async move { asr.transcribe(video).await }
        })
        .await?;
        let segments = align(&words, video.duration)?;
        self.checkpoints.store(&key, &segments).await?;
        Ok(segments)
    }

    async fn ensure_scores(
        &self,
        video: &SourceVideo,
        segments: &[TranscriptSegment],
    ) -> WorkerResult<Vec<ScoreSample>> {
        let cfg = &self.config.pipeline;
        let key = CheckpointStore::fingerprint(&video.id, JobStage::Scoring, cfg);
        if let Some(cached) = self.checkpoints.load(&key).await? {
            return Ok(cached);
        }

        let probe = Arc::clone(&self.probe);
        let interval = cfg.score_interval;
        let energy = call_with_retry(&self.retry_policy(), "probe", move || {
            let probe = Arc::clone(&probe);
            async move { probe.energy_envelope(video, interval).await }
        })
        .await?;
        let series = score_signal(&energy, segments, cfg);
        self.checkpoints.store(&key, &series).await?;
        Ok(series)
    }

    async fn ensure_peaks(
        &self,
        video: &SourceVideo,
        series: &[ScoreSample],
    ) -> WorkerResult<Vec<PeakWindow>> {
        let cfg = &self.config.pipeline;
        let key = CheckpointStore::fingerprint(&video.id, JobStage::Detecting, cfg);
        if let Some(cached) = self.checkpoints.load(&key).await? {
            return Ok(cached);
        }

        let windows = match detect_peaks(series, cfg) {
            Ok(windows) => windows,
            Err(AnalysisError::InsufficientSignal {
                found,
                requested,
                windows,
            }) if found > 0 => {
                // Degrade to fewer clips rather than failing the job
                warn!(found, requested, "insufficient signal, proceeding with fewer clips");
                windows
            }
            Err(err) => return Err(err.into()),
        };
        self.checkpoints.store(&key, &windows).await?;
        Ok(windows)
    }

    async fn ensure_refined(
        &self,
        video: &SourceVideo,
        windows: &[PeakWindow],
        segments: &[TranscriptSegment],
    ) -> WorkerResult<Vec<PeakWindow>> {
        let cfg = &self.config.pipeline;
        let key = CheckpointStore::fingerprint(&video.id, JobStage::Refining, cfg);
        if let Some(cached) = self.checkpoints.load(&key).await? {
            return Ok(cached);
        }

        let refined = refine_windows(windows, segments, cfg);
        self.checkpoints.store(&key, &refined).await?;
        Ok(refined)
    }

    async fn begin(&self, job: &Mutex<Job>, stage: JobStage) {
        job.lock().await.enter_stage(stage);
    }

    async fn complete(&self, job: &Mutex<Job>, stage: JobStage) -> WorkerResult<()> {
        let mut j = job.lock().await;
        j.complete_stage(stage);
        self.checkpoints.save_job(&j).await
    }
}

fn guard(cancel: &watch::Receiver<bool>) -> WorkerResult<()> {
    if *cancel.borrow() {
        Err(WorkerError::Cancelled)
    } else {
        Ok(())
    }
}
