//! Shared data models for the ClipForge pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Source videos and jobs
//! - Transcript segments and score series
//! - Peak windows, clips and the downstream artifact schema
//! - Crop paths and caption cues
//! - Pipeline configuration

pub mod caption;
pub mod clip;
pub mod config;
pub mod crop;
pub mod job;
pub mod score;
pub mod timestamp;
pub mod transcript;
pub mod video;

// Re-export common types
pub use caption::CaptionCue;
pub use clip::{Clip, ClipArtifact, ClipFailure, ClipId, SubTaskStatus};
pub use config::{PipelineConfig, WindowAggregate};
pub use crop::{BoundingBox, CropKeyframe, CropPath, CropRect, FaceDetection, FrameDetections};
pub use job::{Job, JobId, JobStage, JobStatusReport, StageStatus};
pub use score::{PeakWindow, ScoreSample};
pub use timestamp::format_seconds;
pub use transcript::{AsrWord, TranscriptSegment};
pub use video::{SourceVideo, VideoId};
