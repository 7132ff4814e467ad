//! External capability interfaces.
//!
//! The pipeline consumes three expensive external collaborators: speech
//! recognition, face/saliency detection, and clip rendering, plus a cheap
//! media probe for the audio energy envelope. Each is a trait so the worker
//! can run against real backends in production and in-process fakes in tests.

pub mod error;
pub mod retry;

pub use error::{CapabilityError, CapabilityResult};
pub use retry::{call_with_retry, RetryPolicy};

use async_trait::async_trait;
use clipforge_models::{AsrWord, Clip, FrameDetections, SourceVideo};

/// Speech recognition: audio to word-timed transcript.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AsrCapability: Send + Sync {
    /// Transcribe the source's audio stream into timed words.
    ///
    /// Word ordering is not guaranteed; the aligner sorts and validates.
    async fn transcribe(&self, video: &SourceVideo) -> CapabilityResult<Vec<AsrWord>>;
}

/// Media probing: audio energy envelope at a fixed sampling interval.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaProbeCapability: Send + Sync {
    /// Sample the short-term audio energy every `interval` seconds.
    ///
    /// Values are non-negative and unnormalized; the scorer normalizes.
    async fn energy_envelope(
        &self,
        video: &SourceVideo,
        interval: f64,
    ) -> CapabilityResult<Vec<f64>>;
}

/// Face/saliency detection over a sampled time range.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DetectionCapability: Send + Sync {
    /// Detect faces (and optionally a saliency centroid) at `sample_fps`
    /// over `[start, end]` of the source.
    async fn detect(
        &self,
        video: &SourceVideo,
        start: f64,
        end: f64,
        sample_fps: f64,
    ) -> CapabilityResult<Vec<FrameDetections>>;
}

/// Output of a render handoff for one clip.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedClip {
    /// URL (or path) of the encoded vertical video
    pub video_url: String,
    /// URL (or path) of the thumbnail image
    pub thumbnail: String,
}

/// Rendering: clip range + crop path + cues to an encoded video file.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RenderCapability: Send + Sync {
    /// Render the clip from the source using its crop path and cues.
    async fn render(&self, video: &SourceVideo, clip: &Clip) -> CapabilityResult<RenderedClip>;
}
