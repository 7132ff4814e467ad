//! Worker configuration.

use std::path::PathBuf;

use clipforge_models::PipelineConfig;

use crate::error::{WorkerError, WorkerResult};

/// Configuration for the worker process.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Pipeline tunables (shared with the analysis/crop crates)
    pub pipeline: PipelineConfig,

    /// Concurrent per-clip sub-tasks across all jobs
    pub clip_pool_size: usize,

    /// Concurrent jobs
    pub max_concurrent_jobs: usize,

    /// Directory for checkpoints and job records
    pub checkpoint_dir: PathBuf,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            pipeline: PipelineConfig::default(),
            clip_pool_size: 4,
            max_concurrent_jobs: 2,
            checkpoint_dir: PathBuf::from("/tmp/clipforge/checkpoints"),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            pipeline: PipelineConfig::from_env(),
            clip_pool_size: env_parse("CLIPFORGE_CLIP_POOL_SIZE", d.clip_pool_size),
            max_concurrent_jobs: env_parse("CLIPFORGE_MAX_CONCURRENT_JOBS", d.max_concurrent_jobs),
            checkpoint_dir: std::env::var("CLIPFORGE_CHECKPOINT_DIR")
                .map(PathBuf::from)
                .unwrap_or(d.checkpoint_dir),
        }
    }

    /// Validate invariants between options.
    pub fn validate(&self) -> WorkerResult<()> {
        self.pipeline.validate().map_err(WorkerError::Config)?;
        if self.clip_pool_size == 0 {
            return Err(WorkerError::Config(
                "clip_pool_size must be at least 1".to_string(),
            ));
        }
        if self.max_concurrent_jobs == 0 {
            return Err(WorkerError::Config(
                "max_concurrent_jobs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(WorkerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_pool_rejected() {
        let cfg = WorkerConfig {
            clip_pool_size: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }
}
