//! Per-frame subject selection.

use clipforge_models::FrameDetections;

/// Pick the subject center for one sampled frame.
///
/// Preference order: highest-confidence face above the threshold, then the
/// saliency centroid, then the frame center. Always yields a center, so the
/// planner never stalls on a detection dropout.
pub fn select_subject(
    frame: &FrameDetections,
    min_confidence: f64,
    frame_width: u32,
    frame_height: u32,
) -> (f64, f64) {
    let best_face = frame
        .faces
        .iter()
        .filter(|f| f.confidence >= min_confidence)
        .max_by(|a, b| {
            a.confidence
                .partial_cmp(&b.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

    if let Some(face) = best_face {
        return (face.bbox.cx(), face.bbox.cy());
    }
    if let Some((x, y)) = frame.saliency {
        return (x, y);
    }
    (frame_width as f64 / 2.0, frame_height as f64 / 2.0)
}
