//! Transcript word and segment models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A single word from raw ASR output. May arrive in arbitrary order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AsrWord {
    /// Word text
    pub text: String,
    /// Start time in seconds (source-relative)
    pub start: f64,
    /// End time in seconds (source-relative)
    pub end: f64,
    /// Recognition confidence in [0,1]
    pub confidence: f64,
}

impl AsrWord {
    pub fn new(text: impl Into<String>, start: f64, end: f64, confidence: f64) -> Self {
        Self {
            text: text.into(),
            start,
            end,
            confidence,
        }
    }
}

/// An aligned transcript segment.
///
/// After alignment, segments are ordered, non-overlapping, and cover the
/// full source duration. Silence is modeled as a segment with empty text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TranscriptSegment {
    /// Word text (empty for silence)
    pub text: String,
    /// Start time in seconds (source-relative)
    pub start: f64,
    /// End time in seconds (source-relative)
    pub end: f64,
    /// Recognition confidence in [0,1] (1.0 for silence)
    pub confidence: f64,
}

impl TranscriptSegment {
    /// Create a spoken-word segment.
    pub fn word(text: impl Into<String>, start: f64, end: f64, confidence: f64) -> Self {
        Self {
            text: text.into(),
            start,
            end,
            confidence,
        }
    }

    /// Create a silence segment spanning [start, end].
    pub fn silence(start: f64, end: f64) -> Self {
        Self {
            text: String::new(),
            start,
            end,
            confidence: 1.0,
        }
    }

    /// Segment duration in seconds.
    pub fn duration(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }

    /// Whether this segment models silence.
    pub fn is_silence(&self) -> bool {
        self.text.is_empty()
    }

    /// Whether the segment text ends a sentence.
    pub fn ends_sentence(&self) -> bool {
        self.text
            .trim_end()
            .chars()
            .last()
            .map(|c| matches!(c, '.' | '!' | '?'))
            .unwrap_or(false)
    }

    /// Whether the segment contains the given source-relative time.
    pub fn contains(&self, time: f64) -> bool {
        time >= self.start && time < self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_segment() {
        let seg = TranscriptSegment::silence(1.0, 2.5);
        assert!(seg.is_silence());
        assert!(!seg.ends_sentence());
        assert!((seg.duration() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_ends_sentence() {
        assert!(TranscriptSegment::word("done.", 0.0, 0.5, 0.9).ends_sentence());
        assert!(TranscriptSegment::word("really?", 0.0, 0.5, 0.9).ends_sentence());
        assert!(TranscriptSegment::word("wow!", 0.0, 0.5, 0.9).ends_sentence());
        assert!(!TranscriptSegment::word("and", 0.0, 0.5, 0.9).ends_sentence());
    }

    #[test]
    fn test_contains() {
        let seg = TranscriptSegment::word("hello", 1.0, 2.0, 0.9);
        assert!(seg.contains(1.0));
        assert!(seg.contains(1.99));
        assert!(!seg.contains(2.0));
        assert!(!seg.contains(0.5));
    }
}
