//! Clip boundary refinement.
//!
//! Snaps peak windows to sentence boundaries so clips start and end on
//! natural speech breaks, keeping durations within configured bounds and
//! never introducing overlap between refined neighbors.

use clipforge_models::{PeakWindow, PipelineConfig, TranscriptSegment};
use tracing::debug;

/// Refine each window's boundaries against the transcript.
///
/// Start snaps backward and end snaps forward to the nearest sentence
/// boundary; when that would push the duration outside `[min, max]`, the
/// nearest word boundary is used instead, and failing that the original
/// edge is kept. Windows are processed in rank order, each constrained by
/// already-refined neighbors so the no-overlap invariant survives snapping.
pub fn refine_windows(
    windows: &[PeakWindow],
    segments: &[TranscriptSegment],
    config: &PipelineConfig,
) -> Vec<PeakWindow> {
    let sentence = sentence_boundaries(segments, config.silence_boundary_gap);
    let word = word_boundaries(segments);

    let mut by_rank: Vec<&PeakWindow> = windows.iter().collect();
    by_rank.sort_by_key(|w| w.rank);

    let mut refined: Vec<PeakWindow> = Vec::with_capacity(windows.len());
    for w in by_rank {
        let center = (w.start + w.end) / 2.0;

        // Room left by already-refined neighbors, including the required gap.
        let lo = refined
            .iter()
            .filter(|r| (r.start + r.end) / 2.0 < center)
            .map(|r| r.end + config.min_clip_gap)
            .fold(0.0_f64, f64::max);
        let hi = refined
            .iter()
            .filter(|r| (r.start + r.end) / 2.0 > center)
            .map(|r| r.start - config.min_clip_gap)
            .fold(f64::INFINITY, f64::min);

        let (start, end) = snap(w, &sentence, &word, lo, hi, config);
        debug!(
            rank = w.rank,
            original_start = w.start,
            original_end = w.end,
            start,
            end,
            "refined window"
        );
        refined.push(PeakWindow::new(start, end, w.score, w.rank));
    }

    refined.sort_by(|a, b| {
        a.start
            .partial_cmp(&b.start)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    refined
}

fn snap(
    w: &PeakWindow,
    sentence: &[f64],
    word: &[f64],
    lo: f64,
    hi: f64,
    config: &PipelineConfig,
) -> (f64, f64) {
    let (min, max) = (config.min_clip_duration, config.max_clip_duration);

    let fallback = (w.start.max(lo), w.end.min(hi));

    // Candidate edges in preference order: sentence boundary, then word
    // boundary, then the unsnapped edge. The first pair whose joint duration
    // stays in bounds wins.
    let starts: Vec<f64> = [
        snap_down(sentence, w.start, lo),
        snap_down(word, w.start, lo),
        Some(fallback.0),
    ]
    .into_iter()
    .flatten()
    .collect();
    let ends: Vec<f64> = [
        snap_up(sentence, w.end, hi),
        snap_up(word, w.end, hi),
        Some(fallback.1),
    ]
    .into_iter()
    .flatten()
    .collect();

    for &start in &starts {
        for &end in &ends {
            let dur = end - start;
            if dur >= min && dur <= max {
                return (start, end);
            }
        }
    }

    // Nothing snappable within bounds; keep the original edges, shrunk only
    // as far as neighbor clearance demands.
    let (mut start, mut end) = fallback;
    if end - start < min {
        end = (start + min).min(hi.max(end));
        if end - start < min {
            start = (end - min).max(lo.min(start));
        }
    }
    (start, end)
}

/// Largest boundary at or below `t`, not below `lo`.
fn snap_down(bounds: &[f64], t: f64, lo: f64) -> Option<f64> {
    bounds
        .iter()
        .rev()
        .find(|&&b| b <= t + 1e-9 && b >= lo)
        .copied()
}

/// Smallest boundary at or above `t`, not above `hi`.
fn snap_up(bounds: &[f64], t: f64, hi: f64) -> Option<f64> {
    bounds.iter().find(|&&b| b >= t - 1e-9 && b <= hi).copied()
}

/// Times at which a sentence plausibly breaks: after sentence-final
/// punctuation, and at the edges of silence gaps above the threshold.
fn sentence_boundaries(segments: &[TranscriptSegment], silence_gap: f64) -> Vec<f64> {
    let mut bounds = Vec::new();
    for seg in segments {
        if seg.ends_sentence() {
            bounds.push(seg.end);
        }
        if seg.is_silence() && seg.duration() >= silence_gap {
            bounds.push(seg.start);
            bounds.push(seg.end);
        }
    }
    bounds.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    bounds.dedup_by(|a, b| (*a - *b).abs() < 1e-9);
    bounds
}

fn word_boundaries(segments: &[TranscriptSegment]) -> Vec<f64> {
    let mut bounds = Vec::new();
    for seg in segments.iter().filter(|s| !s.is_silence()) {
        bounds.push(seg.start);
        bounds.push(seg.end);
    }
    bounds.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    bounds.dedup_by(|a, b| (*a - *b).abs() < 1e-9);
    bounds
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Transcript with a sentence break every 10 seconds.
    fn sentenced_transcript(duration: usize) -> Vec<TranscriptSegment> {
        let mut segments = Vec::new();
        for t in 0..duration {
            let start = t as f64;
            let end = start + 1.0;
            let text = if t % 10 == 9 { "done." } else { "word" };
            segments.push(TranscriptSegment::word(text, start, end, 0.9));
        }
        segments
    }

    fn config() -> PipelineConfig {
        PipelineConfig {
            min_clip_duration: 20.0,
            max_clip_duration: 90.0,
            min_clip_gap: 10.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_snaps_to_sentence_boundaries() {
        let segments = sentenced_transcript(600);
        // Sentence boundaries at 10, 20, 30, ... (ends of "done." segments)
        let windows = vec![PeakWindow::new(123.0, 178.0, 0.8, 1)];
        let refined = refine_windows(&windows, &segments, &config());

        assert_eq!(refined.len(), 1);
        assert_eq!(refined[0].start, 120.0);
        assert_eq!(refined[0].end, 180.0);
        assert_eq!(refined[0].score, 0.8);
    }

    #[test]
    fn test_duration_stays_within_bounds() {
        let segments = sentenced_transcript(600);
        let cfg = config();
        let windows = vec![
            PeakWindow::new(53.0, 108.0, 0.9, 1),
            PeakWindow::new(203.0, 258.0, 0.7, 2),
        ];
        for r in refine_windows(&windows, &segments, &cfg) {
            let dur = r.duration();
            assert!(dur >= cfg.min_clip_duration && dur <= cfg.max_clip_duration);
        }
    }

    #[test]
    fn test_refined_neighbors_never_overlap() {
        let segments = sentenced_transcript(600);
        let cfg = config();
        // Adjacent windows separated by exactly the minimum gap; snapping
        // outward would collide without the neighbor constraint.
        let windows = vec![
            PeakWindow::new(103.0, 158.0, 0.9, 1),
            PeakWindow::new(168.0, 223.0, 0.8, 2),
        ];
        let refined = refine_windows(&windows, &segments, &cfg);
        assert_eq!(refined.len(), 2);
        assert!(refined[0].end + cfg.min_clip_gap <= refined[1].start + 1e-9);
    }

    #[test]
    fn test_silence_gap_is_a_boundary() {
        let mut segments = vec![TranscriptSegment::word("intro", 0.0, 100.0, 0.9)];
        segments.push(TranscriptSegment::silence(100.0, 101.5));
        segments.push(TranscriptSegment::word("rest", 101.5, 300.0, 0.9));

        let windows = vec![PeakWindow::new(102.0, 157.0, 0.8, 1)];
        let refined = refine_windows(&windows, &segments, &config());
        // Start snaps back to the silence edge
        assert_eq!(refined[0].start, 101.5);
    }

    #[test]
    fn test_word_boundary_fallback() {
        // One giant sentence: no sentence boundary exists anywhere near the
        // window, so sentence snapping would blow past the max duration.
        let segments = sentenced_transcript(600)
            .into_iter()
            .map(|mut s| {
                s.text = "word".to_string();
                s
            })
            .collect::<Vec<_>>();

        let windows = vec![PeakWindow::new(123.4, 178.4, 0.8, 1)];
        let cfg = config();
        let refined = refine_windows(&windows, &segments, &cfg);
        // Word boundaries sit on whole seconds
        assert_eq!(refined[0].start, 123.0);
        assert_eq!(refined[0].end, 179.0);
        assert!(refined[0].duration() <= cfg.max_clip_duration);
    }

    #[test]
    fn test_output_sorted_by_start() {
        let segments = sentenced_transcript(600);
        let windows = vec![
            PeakWindow::new(303.0, 358.0, 0.9, 1),
            PeakWindow::new(103.0, 158.0, 0.8, 2),
        ];
        let refined = refine_windows(&windows, &segments, &config());
        assert!(refined[0].start < refined[1].start);
        assert_eq!(refined[0].rank, 2);
    }
}
