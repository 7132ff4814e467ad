//! Emotion-intensity score series and peak windows.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A single sample of the emotion-intensity time series.
///
/// Samples are produced at a fixed interval by the signal scorer and are
/// owned exclusively by its output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScoreSample {
    /// Timestamp in seconds (source-relative)
    pub time: f64,
    /// Scalar intensity in [0,1]
    pub intensity: f64,
}

impl ScoreSample {
    pub fn new(time: f64, intensity: f64) -> Self {
        Self {
            time,
            intensity: intensity.clamp(0.0, 1.0),
        }
    }
}

/// A candidate clip window selected by the peak detector.
///
/// The score is a windowed aggregate over the score series, not a single
/// sample. Windows for the same job never overlap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PeakWindow {
    /// Start time in seconds (source-relative)
    pub start: f64,
    /// End time in seconds (source-relative)
    pub end: f64,
    /// Aggregate score in [0,1]
    pub score: f64,
    /// 1-based rank by descending score
    pub rank: u32,
}

impl PeakWindow {
    pub fn new(start: f64, end: f64, score: f64, rank: u32) -> Self {
        Self {
            start,
            end,
            score,
            rank,
        }
    }

    /// Window duration in seconds.
    pub fn duration(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }

    /// Whether this window overlaps another, requiring at least `min_gap`
    /// seconds of separation.
    pub fn conflicts_with(&self, other: &PeakWindow, min_gap: f64) -> bool {
        self.start < other.end + min_gap && other.start < self.end + min_gap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_clamped() {
        assert_eq!(ScoreSample::new(0.0, 1.5).intensity, 1.0);
        assert_eq!(ScoreSample::new(0.0, -0.5).intensity, 0.0);
    }

    #[test]
    fn test_window_conflicts() {
        let a = PeakWindow::new(0.0, 30.0, 0.9, 1);
        let b = PeakWindow::new(35.0, 65.0, 0.8, 2);

        // 5s apart, gap of 10 required
        assert!(a.conflicts_with(&b, 10.0));
        // gap of 5 satisfied
        assert!(!a.conflicts_with(&b, 5.0));
        // direct overlap always conflicts
        let c = PeakWindow::new(20.0, 50.0, 0.7, 3);
        assert!(a.conflicts_with(&c, 0.0));
    }
}
