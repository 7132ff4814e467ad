//! File-backed checkpoint store.
//!
//! Stage outputs are cached keyed by a fingerprint of (source video identity,
//! stage, stage configuration), so resubmitting an identical job or resuming
//! after a crash skips completed stages. Job records are persisted alongside
//! under their job ID.

use std::path::PathBuf;

use clipforge_models::{Job, JobId, JobStage, PipelineConfig, VideoId};
use serde::{de::DeserializeOwned, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::WorkerResult;

#[derive(Debug, Clone)]
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Content fingerprint for one stage's output.
    ///
    /// Hashing the serialized config means any tunable change invalidates
    /// the cache, which is what keeps cached outputs consistent with what a
    /// fresh run would produce.
    pub fn fingerprint(video: &VideoId, stage: JobStage, config: &PipelineConfig) -> String {
        let mut hasher = Sha256::new();
        hasher.update(video.as_str().as_bytes());
        hasher.update(stage.as_str().as_bytes());
        // PipelineConfig serialization is stable (no maps with unstable order)
        if let Ok(cfg) = serde_json::to_vec(config) {
            hasher.update(&cfg);
        }
        format!("{:x}", hasher.finalize())
    }

    /// Load a cached stage output, if present and decodable.
    ///
    /// A corrupt checkpoint is treated as a miss: the stage reruns and
    /// overwrites it.
    pub async fn load<T: DeserializeOwned>(&self, key: &str) -> WorkerResult<Option<T>> {
        let path = self.dir.join(format!("{key}.json"));
        match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(value) => {
                    debug!(key, "checkpoint hit");
                    Ok(Some(value))
                }
                Err(err) => {
                    debug!(key, %err, "checkpoint unreadable, treating as miss");
                    Ok(None)
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Persist a stage output under its fingerprint.
    pub async fn store<T: Serialize>(&self, key: &str, value: &T) -> WorkerResult<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(format!("{key}.json"));
        let bytes = serde_json::to_vec(value)?;
        tokio::fs::write(&path, bytes).await?;
        debug!(key, "checkpoint stored");
        Ok(())
    }

    /// Persist the job record.
    pub async fn save_job(&self, job: &Job) -> WorkerResult<()> {
        let dir = self.dir.join("jobs");
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join(format!("{}.json", job.id));
        let bytes = serde_json::to_vec_pretty(job)?;
        tokio::fs::write(&path, bytes).await?;
        Ok(())
    }

    /// Load a persisted job record.
    pub async fn load_job(&self, id: &JobId) -> WorkerResult<Option<Job>> {
        let path = self.dir.join("jobs").join(format!("{id}.json"));
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipforge_models::{ScoreSample, SourceVideo};

    #[tokio::test]
    async fn test_store_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());

        let series = vec![ScoreSample::new(0.0, 0.5), ScoreSample::new(1.0, 0.7)];
        store.store("abc", &series).await.unwrap();

        let loaded: Option<Vec<ScoreSample>> = store.load("abc").await.unwrap();
        assert_eq!(loaded.unwrap(), series);
    }

    #[tokio::test]
    async fn test_missing_key_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        let loaded: Option<Vec<ScoreSample>> = store.load("nope").await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_corrupt_checkpoint_is_miss() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        tokio::fs::write(dir.path().join("bad.json"), b"{not json")
            .await
            .unwrap();
        let loaded: Option<Vec<ScoreSample>> = store.load("bad").await.unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_fingerprint_sensitivity() {
        let video = VideoId::from_string("vid-1");
        let other = VideoId::from_string("vid-2");
        let config = PipelineConfig::default();
        let mut tweaked = config.clone();
        tweaked.clip_count = 5;

        let base = CheckpointStore::fingerprint(&video, JobStage::Scoring, &config);
        assert_eq!(
            base,
            CheckpointStore::fingerprint(&video, JobStage::Scoring, &config)
        );
        assert_ne!(
            base,
            CheckpointStore::fingerprint(&other, JobStage::Scoring, &config)
        );
        assert_ne!(
            base,
            CheckpointStore::fingerprint(&video, JobStage::Detecting, &config)
        );
        assert_ne!(
            base,
            CheckpointStore::fingerprint(&video, JobStage::Scoring, &tweaked)
        );
    }

    #[tokio::test]
    async fn test_job_record_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());

        let job = Job::new(SourceVideo::new(600.0, 30.0, 1920, 1080, "audio/main"));
        store.save_job(&job).await.unwrap();

        let loaded = store.load_job(&job.id).await.unwrap().unwrap();
        assert_eq!(loaded.id, job.id);
        assert_eq!(loaded.stage, job.stage);
    }
}
