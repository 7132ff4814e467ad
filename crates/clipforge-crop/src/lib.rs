//! Crop planning for vertical reframing.
//!
//! Turns per-frame face/saliency detections into a smoothed crop path that
//! keeps the active subject centered while staying inside frame bounds and
//! within the configured motion budget.

pub mod planner;
pub mod smoother;
pub mod subject;

pub use planner::plan_crop;
pub use smoother::CenterSmoother;
pub use subject::select_subject;

/// Target aspect ratio for exported clips (9:16 vertical).
pub const TARGET_ASPECT: f64 = 9.0 / 16.0;
