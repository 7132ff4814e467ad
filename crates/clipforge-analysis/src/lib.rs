//! Analysis stages of the ClipForge pipeline.
//!
//! Every function in this crate is a pure, deterministic function of its
//! inputs plus configuration, which is what makes checkpoint caching and
//! resubmission idempotence sound.

pub mod aligner;
pub mod captions;
pub mod error;
pub mod peaks;
pub mod refiner;
pub mod scorer;
pub mod summary;

pub use aligner::align;
pub use captions::build_cues;
pub use error::{AnalysisError, AnalysisResult};
pub use peaks::detect_peaks;
pub use refiner::refine_windows;
pub use scorer::score_signal;
pub use summary::{caption_summary, clip_title};
