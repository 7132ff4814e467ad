//! Source video metadata.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a source video.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct VideoId(pub String);

impl VideoId {
    /// Generate a new random video ID.
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

impl Default for VideoId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An ingested source video. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SourceVideo {
    /// Unique video ID
    pub id: VideoId,

    /// Duration in seconds
    pub duration: f64,

    /// Frame rate
    pub fps: f64,

    /// Frame width in pixels
    pub width: u32,

    /// Frame height in pixels
    pub height: u32,

    /// Reference to the audio stream (opaque to the pipeline)
    pub audio_ref: String,
}

impl SourceVideo {
    /// Create a new source video.
    pub fn new(duration: f64, fps: f64, width: u32, height: u32, audio_ref: impl Into<String>) -> Self {
        Self {
            id: VideoId::new(),
            duration,
            fps,
            width,
            height,
            audio_ref: audio_ref.into(),
        }
    }

    /// Check that the metadata describes a processable video.
    ///
    /// Returns a human-readable reason when the source is malformed.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.duration.is_finite() && self.duration > 0.0) {
            return Err(format!("invalid duration: {}", self.duration));
        }
        if !(self.fps.is_finite() && self.fps > 0.0) {
            return Err(format!("invalid frame rate: {}", self.fps));
        }
        if self.width == 0 || self.height == 0 {
            return Err(format!("invalid resolution: {}x{}", self.width, self.height));
        }
        if self.audio_ref.is_empty() {
            return Err("missing audio stream reference".to_string());
        }
        Ok(())
    }

    /// Source aspect ratio (width / height).
    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_video() {
        let video = SourceVideo::new(1200.0, 30.0, 1920, 1080, "audio/main");
        assert!(video.validate().is_ok());
        assert!((video.aspect_ratio() - 16.0 / 9.0).abs() < 0.001);
    }

    #[test]
    fn test_invalid_duration() {
        let video = SourceVideo::new(0.0, 30.0, 1920, 1080, "audio/main");
        assert!(video.validate().is_err());

        let video = SourceVideo::new(f64::NAN, 30.0, 1920, 1080, "audio/main");
        assert!(video.validate().is_err());
    }

    #[test]
    fn test_invalid_resolution() {
        let video = SourceVideo::new(60.0, 30.0, 0, 1080, "audio/main");
        assert!(video.validate().is_err());
    }

    #[test]
    fn test_missing_audio_ref() {
        let video = SourceVideo::new(60.0, 30.0, 1920, 1080, "");
        assert!(video.validate().is_err());
    }
}
