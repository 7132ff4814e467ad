//! Clip metadata and the downstream artifact schema.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::{CaptionCue, CropPath};

/// Unique identifier for a clip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ClipId(pub String);

impl ClipId {
    /// Generate a new random clip ID.
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

impl Default for ClipId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status of one per-clip sub-task (crop planning or caption building).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubTaskStatus {
    /// Sub-task has not run yet
    #[default]
    Pending,
    /// Sub-task completed successfully
    Completed,
    /// Sub-task failed permanently
    Failed,
}

/// A failure of one clip's sub-task, reported in job status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClipFailure {
    /// Clip the failure belongs to
    pub clip_id: ClipId,
    /// Which sub-task failed ("crop", "captions", "render")
    pub task: String,
    /// Human-readable reason
    pub reason: String,
}

impl ClipFailure {
    pub fn new(clip_id: ClipId, task: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            clip_id,
            task: task.into(),
            reason: reason.into(),
        }
    }
}

/// A finalized clip owned by its job.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Clip {
    /// Unique clip ID
    pub id: ClipId,

    /// Human-readable title derived from the transcript
    pub title: String,

    /// Refined start time in seconds (source-relative, sentence-aligned)
    pub start: f64,

    /// Refined end time in seconds (source-relative, sentence-aligned)
    pub end: f64,

    /// Emotion score copied from the clip's peak window, in [0,1]
    pub emotion_score: f64,

    /// Short caption summary (distinct from the cue list)
    pub caption: String,

    /// Crop path reference (filled by the crop sub-task)
    #[serde(default)]
    pub crop_path: CropPath,

    /// Caption cue list (filled by the caption sub-task)
    #[serde(default)]
    pub cues: Vec<CaptionCue>,

    /// Crop sub-task status
    #[serde(default)]
    pub crop_status: SubTaskStatus,

    /// Caption sub-task status
    #[serde(default)]
    pub caption_status: SubTaskStatus,

    /// Rendered video URL (filled on render handoff)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,

    /// Thumbnail URL (filled on render handoff)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

impl Clip {
    /// Create a new clip from a refined window.
    pub fn new(title: impl Into<String>, start: f64, end: f64, emotion_score: f64) -> Self {
        Self {
            id: ClipId::new(),
            title: title.into(),
            start,
            end,
            emotion_score,
            caption: String::new(),
            crop_path: CropPath::default(),
            cues: Vec::new(),
            crop_status: SubTaskStatus::Pending,
            caption_status: SubTaskStatus::Pending,
            video_url: None,
            thumbnail: None,
        }
    }

    /// Clip duration in seconds.
    pub fn duration(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }

    /// Whether at least one sub-task completed (the clip is usable).
    pub fn is_usable(&self) -> bool {
        self.crop_status == SubTaskStatus::Completed
    }

    /// Produce the stable artifact shape consumed downstream.
    pub fn to_artifact(&self) -> ClipArtifact {
        ClipArtifact {
            id: self.id.to_string(),
            title: self.title.clone(),
            thumbnail: self.thumbnail.clone().unwrap_or_default(),
            video_url: self.video_url.clone().unwrap_or_default(),
            start_time: self.start,
            end_time: self.end,
            emotion_score: self.emotion_score,
            caption: self.caption.clone(),
        }
    }
}

/// Stable JSON shape consumed by downstream rendering/UI.
///
/// `startTime`/`endTime` are seconds from source start; `emotionScore` is in
/// [0,1]; `caption` is a short summary string, not the cue list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClipArtifact {
    pub id: String,
    pub title: String,
    pub thumbnail: String,
    pub video_url: String,
    pub start_time: f64,
    pub end_time: f64,
    pub emotion_score: f64,
    pub caption: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_field_names() {
        let clip = Clip::new("Breakthrough Moment", 120.0, 180.0, 0.95);
        let artifact = clip.to_artifact();
        let json = serde_json::to_value(&artifact).unwrap();

        assert!(json.get("videoUrl").is_some());
        assert!(json.get("startTime").is_some());
        assert!(json.get("endTime").is_some());
        assert!(json.get("emotionScore").is_some());
        assert_eq!(json["startTime"], 120.0);
        assert_eq!(json["emotionScore"], 0.95);
    }

    #[test]
    fn test_clip_usable() {
        let mut clip = Clip::new("Test", 0.0, 30.0, 0.5);
        assert!(!clip.is_usable());
        clip.crop_status = SubTaskStatus::Completed;
        assert!(clip.is_usable());
    }

    #[test]
    fn test_clip_duration() {
        let clip = Clip::new("Test", 10.0, 45.0, 0.5);
        assert!((clip.duration() - 35.0).abs() < 1e-9);
    }
}
