//! Signal scoring.
//!
//! Combines a normalized short-term acoustic energy measure with a
//! sentiment-polarity measure derived from the transcript into a single
//! emotion-intensity series sampled at a fixed interval. Deterministic for
//! identical inputs and configuration.

use clipforge_models::{PipelineConfig, ScoreSample, TranscriptSegment};
use tracing::debug;

/// Small embedded valence lexicon. Enough lexical signal to separate charged
/// speech from neutral narration; anything fancier belongs behind a
/// capability boundary.
const POSITIVE_WORDS: &[&str] = &[
    "amazing",
    "awesome",
    "beautiful",
    "best",
    "brilliant",
    "crazy",
    "excellent",
    "excited",
    "fantastic",
    "favorite",
    "fun",
    "funny",
    "great",
    "happy",
    "hilarious",
    "incredible",
    "insane",
    "love",
    "loved",
    "perfect",
    "unbelievable",
    "wild",
    "win",
    "wonderful",
    "wow",
];

const NEGATIVE_WORDS: &[&str] = &[
    "afraid",
    "angry",
    "awful",
    "bad",
    "broken",
    "disaster",
    "fail",
    "failed",
    "hate",
    "hated",
    "horrible",
    "lost",
    "mad",
    "never",
    "painful",
    "sad",
    "scary",
    "shocking",
    "terrible",
    "worst",
    "wrong",
];

/// Score the blended emotion-intensity series.
///
/// `energy` is the audio energy envelope sampled at `config.score_interval`;
/// sample `i` covers source time `i * interval`. The output series has the
/// same length and sampling.
pub fn score_signal(
    energy: &[f64],
    segments: &[TranscriptSegment],
    config: &PipelineConfig,
) -> Vec<ScoreSample> {
    if energy.is_empty() {
        return Vec::new();
    }

    let max_energy = energy.iter().cloned().fold(0.0_f64, f64::max);

    let interval = config.score_interval;
    let w = config.energy_weight;

    let raw: Vec<f64> = energy
        .iter()
        .enumerate()
        .map(|(i, &e)| {
            let time = i as f64 * interval;
            let energy_norm = if max_energy > 0.0 { e / max_energy } else { 0.0 };
            let sentiment = sentiment_at(segments, time);
            w * energy_norm + (1.0 - w) * sentiment
        })
        .collect();

    let smoothed = moving_average(&raw, config.odd_smoothing_window());

    debug!(
        samples = smoothed.len(),
        window = config.odd_smoothing_window(),
        "scored signal"
    );

    smoothed
        .into_iter()
        .enumerate()
        .map(|(i, v)| ScoreSample::new(i as f64 * interval, v))
        .collect()
}

/// Sentiment in [0,1] for the segment containing `time`.
///
/// Polarity from the valence lexicon is mapped with `(p + 1) / 2`, so neutral
/// speech sits at 0.5. Silence carries no lexical signal and scores 0.0,
/// which pulls window scores down over dead air.
fn sentiment_at(segments: &[TranscriptSegment], time: f64) -> f64 {
    let Some(seg) = segments.iter().find(|s| s.contains(time)) else {
        return 0.0;
    };
    if seg.is_silence() {
        return 0.0;
    }
    (word_polarity(&seg.text) + 1.0) / 2.0
}

fn word_polarity(text: &str) -> f64 {
    let normalized: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect();
    if POSITIVE_WORDS.contains(&normalized.as_str()) {
        1.0
    } else if NEGATIVE_WORDS.contains(&normalized.as_str()) {
        // Charged either way is still emotionally intense; negative words
        // score above neutral but below positive.
        0.6
    } else {
        0.0
    }
}

/// Symmetric moving average with an odd window, edges handled by shrinking
/// the kernel rather than padding.
fn moving_average(values: &[f64], window: usize) -> Vec<f64> {
    if values.is_empty() || window <= 1 {
        return values.to_vec();
    }
    let half = window / 2;
    (0..values.len())
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half + 1).min(values.len());
            let slice = &values[lo..hi];
            slice.iter().sum::<f64>() / slice.len() as f64
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PipelineConfig {
        PipelineConfig::default()
    }

    #[test]
    fn test_empty_energy_yields_empty_series() {
        assert!(score_signal(&[], &[], &config()).is_empty());
    }

    #[test]
    fn test_series_length_matches_energy() {
        let energy = vec![0.2; 60];
        let segments = vec![TranscriptSegment::silence(0.0, 60.0)];
        let series = score_signal(&energy, &segments, &config());
        assert_eq!(series.len(), 60);
        assert!((series[10].time - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_intensity_within_unit_range() {
        let energy: Vec<f64> = (0..120).map(|i| (i as f64 / 10.0).sin().abs()).collect();
        let segments = vec![
            TranscriptSegment::word("this is amazing!", 0.0, 60.0, 0.9),
            TranscriptSegment::silence(60.0, 120.0),
        ];
        for sample in score_signal(&energy, &segments, &config()) {
            assert!((0.0..=1.0).contains(&sample.intensity));
        }
    }

    #[test]
    fn test_charged_speech_scores_above_silence() {
        let energy = vec![0.5; 40];
        let segments = vec![
            TranscriptSegment::word("incredible", 0.0, 20.0, 0.9),
            TranscriptSegment::silence(20.0, 40.0),
        ];
        let series = score_signal(&energy, &segments, &config());
        // Compare away from the smoothing boundary
        assert!(series[10].intensity > series[30].intensity);
    }

    #[test]
    fn test_deterministic() {
        let energy: Vec<f64> = (0..90).map(|i| ((i * 7) % 13) as f64 / 13.0).collect();
        let segments = vec![TranscriptSegment::word("great stuff", 0.0, 90.0, 0.8)];
        let a = score_signal(&energy, &segments, &config());
        let b = score_signal(&energy, &segments, &config());
        assert_eq!(a, b);
    }

    #[test]
    fn test_moving_average_smooths_spike() {
        let mut values = vec![0.0; 11];
        values[5] = 1.0;
        let smoothed = moving_average(&values, 5);
        assert!((smoothed[5] - 0.2).abs() < 1e-9);
        assert!((smoothed[3] - 0.2).abs() < 1e-9);
        assert!((smoothed[2] - 0.0).abs() < 1e-9);
    }

    #[test]
    fn test_word_polarity() {
        assert_eq!(word_polarity("Amazing!"), 1.0);
        assert_eq!(word_polarity("terrible,"), 0.6);
        assert_eq!(word_polarity("the"), 0.0);
    }
}
