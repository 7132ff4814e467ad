//! Pipeline configuration.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Aggregation applied to the score samples inside a sliding window.
///
/// The windowed mean avoids single-spike bias; max and percentile are
/// available as tunables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum WindowAggregate {
    /// Mean of all samples in the window
    #[default]
    Mean,
    /// Maximum sample in the window
    Max,
    /// Percentile of samples in the window (0.0-1.0)
    Percentile(f64),
}

/// Configuration for the full clip pipeline.
///
/// Stage outputs are pure functions of their inputs plus this configuration,
/// so it participates in checkpoint fingerprints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PipelineConfig {
    /// Target clip count K
    pub clip_count: usize,

    /// Minimum clip duration in seconds
    pub min_clip_duration: f64,

    /// Maximum clip duration in seconds
    pub max_clip_duration: f64,

    /// Minimum gap between clips in seconds
    pub min_clip_gap: f64,

    /// Score series sampling interval in seconds
    pub score_interval: f64,

    /// Moving-average smoothing window length in samples (forced odd)
    pub smoothing_window: usize,

    /// Blend weight for acoustic energy vs sentiment (1.0 = energy only)
    pub energy_weight: f64,

    /// Aggregation used for windowed peak scores
    #[serde(default)]
    pub peak_aggregate: WindowAggregate,

    /// Minimum aggregate score for a window to qualify as a peak
    pub min_window_score: f64,

    /// Silence gap treated as a sentence boundary, in seconds
    pub silence_boundary_gap: f64,

    /// Exponential smoothing factor for crop centers (0-1, higher = snappier)
    pub crop_smoothing_factor: f64,

    /// Maximum crop center displacement per second, as a fraction of frame width
    pub crop_motion_budget: f64,

    /// Minimum face confidence for subject selection
    pub min_face_confidence: f64,

    /// Crop sampling rate in frames per second
    pub crop_sample_fps: f64,

    /// Maximum caption cue duration in seconds
    pub max_cue_duration: f64,

    /// Maximum characters per caption cue
    pub max_cue_chars: usize,

    /// Per-stage timeout
    pub stage_timeout: Duration,

    /// Retry count for transient capability failures
    pub max_retries: u32,

    /// Base delay for exponential backoff
    pub retry_base_delay: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            clip_count: 3,
            min_clip_duration: 20.0,
            max_clip_duration: 90.0,
            min_clip_gap: 10.0,
            score_interval: 1.0,
            smoothing_window: 5,
            energy_weight: 0.6,
            peak_aggregate: WindowAggregate::Mean,
            min_window_score: 0.3,
            silence_boundary_gap: 0.8,
            crop_smoothing_factor: 0.3,
            crop_motion_budget: 0.25,
            min_face_confidence: 0.5,
            crop_sample_fps: 2.0,
            max_cue_duration: 3.5,
            max_cue_chars: 42,
            stage_timeout: Duration::from_secs(300),
            max_retries: 3,
            retry_base_delay: Duration::from_millis(200),
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            clip_count: env_parse("CLIPFORGE_CLIP_COUNT", d.clip_count),
            min_clip_duration: env_parse("CLIPFORGE_MIN_CLIP_DURATION", d.min_clip_duration),
            max_clip_duration: env_parse("CLIPFORGE_MAX_CLIP_DURATION", d.max_clip_duration),
            min_clip_gap: env_parse("CLIPFORGE_MIN_CLIP_GAP", d.min_clip_gap),
            score_interval: env_parse("CLIPFORGE_SCORE_INTERVAL", d.score_interval),
            smoothing_window: env_parse("CLIPFORGE_SMOOTHING_WINDOW", d.smoothing_window),
            energy_weight: env_parse("CLIPFORGE_ENERGY_WEIGHT", d.energy_weight),
            peak_aggregate: d.peak_aggregate,
            min_window_score: env_parse("CLIPFORGE_MIN_WINDOW_SCORE", d.min_window_score),
            silence_boundary_gap: env_parse("CLIPFORGE_SILENCE_GAP", d.silence_boundary_gap),
            crop_smoothing_factor: env_parse("CLIPFORGE_CROP_SMOOTHING", d.crop_smoothing_factor),
            crop_motion_budget: env_parse("CLIPFORGE_CROP_MOTION_BUDGET", d.crop_motion_budget),
            min_face_confidence: env_parse("CLIPFORGE_MIN_FACE_CONF", d.min_face_confidence),
            crop_sample_fps: env_parse("CLIPFORGE_CROP_SAMPLE_FPS", d.crop_sample_fps),
            max_cue_duration: env_parse("CLIPFORGE_MAX_CUE_DURATION", d.max_cue_duration),
            max_cue_chars: env_parse("CLIPFORGE_MAX_CUE_CHARS", d.max_cue_chars),
            stage_timeout: Duration::from_secs(env_parse(
                "CLIPFORGE_STAGE_TIMEOUT_SECS",
                d.stage_timeout.as_secs(),
            )),
            max_retries: env_parse("CLIPFORGE_MAX_RETRIES", d.max_retries),
            retry_base_delay: Duration::from_millis(env_parse(
                "CLIPFORGE_RETRY_BASE_MS",
                d.retry_base_delay.as_millis() as u64,
            )),
        }
    }

    /// Validate invariants between options.
    pub fn validate(&self) -> Result<(), String> {
        if self.clip_count == 0 {
            return Err("clip_count must be at least 1".to_string());
        }
        if self.min_clip_duration <= 0.0 || self.max_clip_duration < self.min_clip_duration {
            return Err(format!(
                "invalid clip duration bounds [{}, {}]",
                self.min_clip_duration, self.max_clip_duration
            ));
        }
        if self.min_clip_gap < 0.0 {
            return Err("min_clip_gap must be non-negative".to_string());
        }
        if self.score_interval <= 0.0 {
            return Err("score_interval must be positive".to_string());
        }
        if !(0.0..=1.0).contains(&self.energy_weight) {
            return Err("energy_weight must be within [0,1]".to_string());
        }
        if !(0.0..=1.0).contains(&self.crop_smoothing_factor) {
            return Err("crop_smoothing_factor must be within [0,1]".to_string());
        }
        if self.crop_motion_budget <= 0.0 {
            return Err("crop_motion_budget must be positive".to_string());
        }
        if !(0.0..=1.0).contains(&self.min_window_score) {
            return Err("min_window_score must be within [0,1]".to_string());
        }
        if let WindowAggregate::Percentile(p) = self.peak_aggregate {
            if !(0.0..=1.0).contains(&p) {
                return Err(format!("percentile {} out of range", p));
            }
        }
        if self.max_cue_duration <= 0.0 || self.max_cue_chars == 0 {
            return Err("caption cue limits must be positive".to_string());
        }
        Ok(())
    }

    /// The smoothing window, forced to an odd sample count.
    pub fn odd_smoothing_window(&self) -> usize {
        let w = self.smoothing_window.max(1);
        if w % 2 == 0 {
            w + 1
        } else {
            w
        }
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
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_bounds() {
        let cfg = PipelineConfig {
            min_clip_duration: 60.0,
            max_clip_duration: 30.0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = PipelineConfig {
            clip_count: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_invalid_percentile() {
        let cfg = PipelineConfig {
            peak_aggregate: WindowAggregate::Percentile(1.5),
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_odd_smoothing_window() {
        let cfg = PipelineConfig {
            smoothing_window: 4,
            ..Default::default()
        };
        assert_eq!(cfg.odd_smoothing_window(), 5);

        let cfg = PipelineConfig {
            smoothing_window: 5,
            ..Default::default()
        };
        assert_eq!(cfg.odd_smoothing_window(), 5);
    }
}
