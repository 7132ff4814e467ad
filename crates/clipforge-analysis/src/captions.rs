//! Caption cue construction.
//!
//! Packs the spoken words inside a clip's time range into timed cues on the
//! clip-local timeline, greedily filling each cue until the character or
//! duration limit would be exceeded.

use clipforge_models::{CaptionCue, PipelineConfig, TranscriptSegment};
use tracing::debug;

use crate::error::{AnalysisError, AnalysisResult};

/// Build caption cues for the clip spanning `[clip_start, clip_end]`.
///
/// Cue timestamps are clip-relative. Silent spans produce no cue; a range
/// with zero spoken words is an `EmptyTranscript` error, which callers
/// treat as a caption-less clip rather than a failure.
pub fn build_cues(
    segments: &[TranscriptSegment],
    clip_start: f64,
    clip_end: f64,
    config: &PipelineConfig,
) -> AnalysisResult<Vec<CaptionCue>> {
    let words: Vec<&TranscriptSegment> = segments
        .iter()
        .filter(|s| !s.is_silence() && s.start < clip_end && s.end > clip_start)
        .collect();

    if words.is_empty() {
        return Err(AnalysisError::EmptyTranscript {
            start: clip_start,
            end: clip_end,
        });
    }

    let mut cues = Vec::new();
    let mut text = String::new();
    let mut cue_start = 0.0_f64;
    let mut cue_end = 0.0_f64;

    for word in words {
        // Clamp words straddling the clip edge onto the clip timeline.
        let w_start = (word.start.max(clip_start) - clip_start).max(0.0);
        let w_end = (word.end.min(clip_end) - clip_start).max(w_start);

        if text.is_empty() {
            text = word.text.clone();
            cue_start = w_start;
            cue_end = w_end;
            continue;
        }

        // Character count, not bytes: the limit is a readability bound
        let would_be_len = text.chars().count() + 1 + word.text.chars().count();
        let would_be_dur = w_end - cue_start;
        if would_be_len > config.max_cue_chars || would_be_dur > config.max_cue_duration {
            cues.push(CaptionCue::new(cue_start, cue_end, std::mem::take(&mut text)));
            text = word.text.clone();
            cue_start = w_start;
            cue_end = w_end;
        } else {
            text.push(' ');
            text.push_str(&word.text);
            cue_end = w_end;
        }
    }

    if !text.is_empty() {
        cues.push(CaptionCue::new(cue_start, cue_end, text));
    }

    debug!(cues = cues.len(), clip_start, clip_end, "built caption cues");
    Ok(cues)
}
