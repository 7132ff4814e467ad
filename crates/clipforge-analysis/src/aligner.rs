//! Transcript alignment.
//!
//! Raw ASR output arrives as a word list with timestamps in arbitrary order.
//! Alignment sorts it, validates timestamps against the declared source
//! duration, and fills gaps with explicit silence segments so the result
//! covers `[0, duration]` with no holes.

use clipforge_models::{AsrWord, TranscriptSegment};
use tracing::debug;

use crate::error::{AnalysisError, AnalysisResult};

/// Words closer together than this are treated as adjacent, not gapped.
const GAP_EPSILON: f64 = 1e-3;

/// Align raw ASR words against the source duration.
///
/// The output is ordered, non-overlapping, and covers the full duration,
/// with silence modeled as empty-text segments. Timestamps inconsistent
/// with the declared duration are a permanent alignment failure.
pub fn align(words: &[AsrWord], duration: f64) -> AnalysisResult<Vec<TranscriptSegment>> {
    if duration <= 0.0 {
        return Err(AnalysisError::alignment(format!(
            "non-positive source duration {duration}"
        )));
    }

    let mut sorted: Vec<&AsrWord> = words.iter().collect();
    sorted.sort_by(|a, b| {
        a.start
            .partial_cmp(&b.start)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    for w in &sorted {
        if w.start < 0.0 || w.end < w.start {
            return Err(AnalysisError::alignment(format!(
                "word '{}' has invalid span [{:.3}, {:.3}]",
                w.text, w.start, w.end
            )));
        }
        if w.start > duration {
            return Err(AnalysisError::alignment(format!(
                "word '{}' starts at {:.3}s, beyond source duration {:.3}s",
                w.text, w.start, duration
            )));
        }
        if w.end > duration + GAP_EPSILON {
            return Err(AnalysisError::alignment(format!(
                "word '{}' ends at {:.3}s, beyond source duration {:.3}s",
                w.text, w.end, duration
            )));
        }
    }

    let mut segments = Vec::with_capacity(sorted.len() * 2 + 1);
    let mut cursor = 0.0_f64;

    for w in sorted {
        // Mild overlaps from ASR jitter get clipped against the previous word.
        let start = w.start.max(cursor);
        let end = w.end.min(duration).max(start);
        if end <= start && !w.text.is_empty() && w.end <= cursor {
            // Fully swallowed by the previous word; drop it rather than emit
            // a zero-length segment.
            debug!(word = %w.text, "dropping word fully overlapped by predecessor");
            continue;
        }

        if start - cursor > GAP_EPSILON {
            segments.push(TranscriptSegment::silence(cursor, start));
        }
        segments.push(TranscriptSegment::word(
            w.text.clone(),
            start,
            end,
            w.confidence,
        ));
        cursor = end;
    }

    if duration - cursor > GAP_EPSILON {
        segments.push(TranscriptSegment::silence(cursor, duration));
    }

    debug!(
        words = words.len(),
        segments = segments.len(),
        duration,
        "aligned transcript"
    );
    Ok(segments)
}
