//! Clip title and caption summary generation.
//!
//! Derives short human-readable strings from the transcript inside a clip's
//! range. These feed the `title` and `caption` fields of the downstream
//! artifact; the full cue list is produced separately.

use clipforge_models::TranscriptSegment;

const MAX_TITLE_WORDS: usize = 6;
const MAX_SUMMARY_CHARS: usize = 120;

/// Filler words skipped when picking title words.
const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "but", "for", "in", "is", "it", "of", "on", "or", "so", "the", "this",
    "to", "was", "with",
];

/// Build a title from the clip's opening words, title-cased.
///
/// Leading stop words are skipped so titles start on a content word. Falls
/// back to a generic title when the range holds no spoken words.
pub fn clip_title(segments: &[TranscriptSegment], start: f64, end: f64) -> String {
    let words = spoken_words(segments, start, end);

    let content_start = words
        .iter()
        .position(|w| !STOP_WORDS.contains(&normalize(w).as_str()))
        .unwrap_or(0);

    let picked: Vec<String> = words
        .iter()
        .skip(content_start)
        .take(MAX_TITLE_WORDS)
        .map(|w| title_case(&strip_punctuation(w)))
        .filter(|w| !w.is_empty())
        .collect();

    if picked.is_empty() {
        return "Highlight".to_string();
    }
    picked.join(" ")
}

/// Build a one-line caption summary: the clip's first sentence, truncated.
pub fn caption_summary(segments: &[TranscriptSegment], start: f64, end: f64) -> String {
    let mut summary = String::new();
    for seg in segments
        .iter()
        .filter(|s| !s.is_silence() && s.start < end && s.end > start)
    {
        if !summary.is_empty() {
            summary.push(' ');
        }
        summary.push_str(seg.text.trim());
        if seg.ends_sentence() || summary.chars().count() >= MAX_SUMMARY_CHARS {
            break;
        }
    }

    if summary.chars().count() > MAX_SUMMARY_CHARS {
        let cut = summary
            .char_indices()
            .nth(MAX_SUMMARY_CHARS - 1)
            .map(|(i, _)| i)
            .unwrap_or(0);
        summary.truncate(cut);
        summary.push('…');
    }
    summary
}

fn spoken_words(segments: &[TranscriptSegment], start: f64, end: f64) -> Vec<String> {
    segments
        .iter()
        .filter(|s| !s.is_silence() && s.start < end && s.end > start)
        .map(|s| s.text.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

fn normalize(word: &str) -> String {
    word.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect()
}

fn strip_punctuation(word: &str) -> String {
    word.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'')
        .to_string()
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transcript(words: &[(&str, f64, f64)]) -> Vec<TranscriptSegment> {
        words
            .iter()
            .map(|&(t, s, e)| TranscriptSegment::word(t, s, e, 0.9))
            .collect()
    }

    #[test]
    fn test_title_skips_leading_stop_words() {
        let segments = transcript(&[
            ("so", 0.0, 0.2),
            ("the", 0.3, 0.4),
            ("crazy", 0.5, 0.9),
            ("part", 1.0, 1.3),
            ("happened.", 1.4, 2.0),
        ]);
        assert_eq!(clip_title(&segments, 0.0, 5.0), "Crazy Part Happened");
    }

    #[test]
    fn test_title_capped_at_word_limit() {
        let words: Vec<(String, f64, f64)> = (0..12)
            .map(|i| (format!("word{i}"), i as f64, i as f64 + 0.5))
            .collect();
        let refs: Vec<(&str, f64, f64)> = words.iter().map(|(t, s, e)| (t.as_str(), *s, *e)).collect();
        let segments = transcript(&refs);
        let title = clip_title(&segments, 0.0, 20.0);
        assert_eq!(title.split(' ').count(), MAX_TITLE_WORDS);
    }

    #[test]
    fn test_title_fallback_when_silent() {
        let segments = vec![TranscriptSegment::silence(0.0, 30.0)];
        assert_eq!(clip_title(&segments, 0.0, 30.0), "Highlight");
    }

    #[test]
    fn test_summary_stops_at_sentence_end() {
        let segments = transcript(&[
            ("it", 0.0, 0.2),
            ("worked.", 0.3, 0.8),
            ("then", 1.0, 1.3),
            ("more", 1.4, 1.8),
        ]);
        assert_eq!(caption_summary(&segments, 0.0, 5.0), "it worked.");
    }

    #[test]
    fn test_summary_truncated_with_ellipsis() {
        let long: Vec<(String, f64, f64)> = (0..40)
            .map(|i| ("interminable".to_string(), i as f64, i as f64 + 0.5))
            .collect();
        let refs: Vec<(&str, f64, f64)> = long.iter().map(|(t, s, e)| (t.as_str(), *s, *e)).collect();
        let segments = transcript(&refs);
        let summary = caption_summary(&segments, 0.0, 50.0);
        assert!(summary.ends_with('…'));
        assert!(summary.chars().count() <= MAX_SUMMARY_CHARS);
    }

    #[test]
    fn test_summary_truncation_counts_chars_not_bytes() {
        let long: Vec<(String, f64, f64)> = (0..30)
            .map(|i| ("ものすごい".to_string(), i as f64, i as f64 + 0.5))
            .collect();
        let refs: Vec<(&str, f64, f64)> =
            long.iter().map(|(t, s, e)| (t.as_str(), *s, *e)).collect();
        let segments = transcript(&refs);

        let summary = caption_summary(&segments, 0.0, 30.0);
        assert!(summary.ends_with('…'));
        assert_eq!(summary.chars().count(), MAX_SUMMARY_CHARS);
    }
}
