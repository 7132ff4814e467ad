//! Crop path planning.

use clipforge_models::{
    CropKeyframe, CropPath, CropRect, FrameDetections, PipelineConfig, SourceVideo,
};
use tracing::debug;

use crate::smoother::CenterSmoother;
use crate::subject::select_subject;
use crate::TARGET_ASPECT;

/// Plan the crop path for a clip spanning `[clip_start, clip_end]`.
///
/// `detections` holds the sampled face/saliency detections for the source;
/// only samples inside the clip range are used. When the range has no
/// detections at all, the result is a single static centered keyframe
/// spanning the whole clip rather than an error.
pub fn plan_crop(
    clip_start: f64,
    clip_end: f64,
    detections: &[FrameDetections],
    video: &SourceVideo,
    config: &PipelineConfig,
) -> CropPath {
    let (crop_w, crop_h) = crop_size(video.width, video.height);
    let max_speed_px = config.crop_motion_budget * video.width as f64;

    let mut in_range: Vec<&FrameDetections> = detections
        .iter()
        .filter(|d| d.time >= clip_start && d.time <= clip_end)
        .collect();
    in_range.sort_by(|a, b| {
        a.time
            .partial_cmp(&b.time)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let has_signal = in_range
        .iter()
        .any(|d| !d.faces.is_empty() || d.saliency.is_some());

    if !has_signal {
        debug!(clip_start, clip_end, "no detections in range, static centered crop");
        let rect = centered_rect(
            video.width as f64 / 2.0,
            video.height as f64 / 2.0,
            crop_w,
            crop_h,
            video.width,
            video.height,
        );
        return CropPath::new(vec![CropKeyframe::new(clip_start, rect)]);
    }

    let mut smoother = CenterSmoother::new(config.crop_smoothing_factor, max_speed_px);
    let mut keyframes = Vec::with_capacity(in_range.len());
    let mut last_time = f64::NEG_INFINITY;

    for frame in in_range {
        // Duplicate timestamps would break keyframe ordering
        if frame.time <= last_time {
            continue;
        }
        last_time = frame.time;

        let (raw_x, raw_y) = select_subject(
            frame,
            config.min_face_confidence,
            video.width,
            video.height,
        );
        let (cx, cy) = smoother.apply(frame.time, raw_x, raw_y);
        let rect = centered_rect(cx, cy, crop_w, crop_h, video.width, video.height);
        keyframes.push(CropKeyframe::new(frame.time, rect));
    }

    debug!(
        clip_start,
        clip_end,
        keyframes = keyframes.len(),
        "planned crop path"
    );
    CropPath::new(keyframes)
}

/// Crop dimensions for the vertical target aspect, even-sized for codecs.
///
/// A landscape source keeps full height and crops horizontally; a source
/// already narrower than 9:16 keeps full width and crops vertically.
fn crop_size(frame_w: u32, frame_h: u32) -> (i32, i32) {
    let source_aspect = frame_w as f64 / frame_h as f64;
    if source_aspect >= TARGET_ASPECT {
        let w = ((frame_h as f64 * TARGET_ASPECT) as i32).min(frame_w as i32);
        (even(w), even(frame_h as i32))
    } else {
        let h = ((frame_w as f64 / TARGET_ASPECT) as i32).min(frame_h as i32);
        (even(frame_w as i32), even(h))
    }
}

fn even(v: i32) -> i32 {
    v - (v % 2)
}

/// Rectangle of the given size centered on (cx, cy), edge-clamped so it
/// never leaves the frame.
fn centered_rect(cx: f64, cy: f64, w: i32, h: i32, frame_w: u32, frame_h: u32) -> CropRect {
    let max_x = frame_w as i32 - w;
    let max_y = frame_h as i32 - h;
    let x = ((cx - w as f64 / 2.0).round() as i32).clamp(0, max_x.max(0));
    let y = ((cy - h as f64 / 2.0).round() as i32).clamp(0, max_y.max(0));
    CropRect::new(x, y, w, h)
}
