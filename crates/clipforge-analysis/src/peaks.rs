//! Peak detection.
//!
//! Slides a clip-length window over the score series, aggregates each
//! position's samples, and greedily selects the top-K non-overlapping
//! windows subject to a minimum inter-clip gap.

use clipforge_models::{PeakWindow, PipelineConfig, ScoreSample, WindowAggregate};
use tracing::{debug, warn};

use crate::error::{AnalysisError, AnalysisResult};

/// Detect up to `config.clip_count` peak windows in the score series.
///
/// Windows never overlap and keep at least `min_clip_gap` seconds apart.
/// Ties prefer the earlier window. When fewer than K windows qualify, the
/// partial result is carried inside `InsufficientSignal` so the job can
/// degrade to fewer clips instead of failing.
pub fn detect_peaks(
    series: &[ScoreSample],
    config: &PipelineConfig,
) -> AnalysisResult<Vec<PeakWindow>> {
    let requested = config.clip_count;
    let interval = config.score_interval;
    let window_secs = (config.min_clip_duration + config.max_clip_duration) / 2.0;
    let window_len = (window_secs / interval).round().max(1.0) as usize;

    if series.len() < window_len {
        warn!(
            samples = series.len(),
            needed = window_len,
            "score series shorter than one clip window"
        );
        return Err(AnalysisError::InsufficientSignal {
            found: 0,
            requested,
            windows: Vec::new(),
        });
    }

    // Prefix sums make the windowed mean O(1) per position.
    let mut prefix = vec![0.0_f64; series.len() + 1];
    for (i, s) in series.iter().enumerate() {
        prefix[i + 1] = prefix[i] + s.intensity;
    }

    let mut candidates: Vec<(f64, usize)> = (0..=series.len() - window_len)
        .map(|i| {
            let score = aggregate(series, &prefix, i, window_len, config.peak_aggregate);
            (score, i)
        })
        .filter(|(score, _)| *score >= config.min_window_score)
        .collect();

    // Descending score, earlier window on ties
    candidates.sort_by(|a, b| {
        b.0.partial_cmp(&a.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.1.cmp(&b.1))
    });

    let mut selected: Vec<PeakWindow> = Vec::with_capacity(requested);
    for (score, i) in candidates {
        if selected.len() == requested {
            break;
        }
        let start = series[i].time;
        let end = start + window_len as f64 * interval;
        let window = PeakWindow::new(start, end, score, selected.len() as u32 + 1);
        if selected.iter().all(|s| !s.conflicts_with(&window, config.min_clip_gap)) {
            selected.push(window);
        }
    }

    debug!(
        found = selected.len(),
        requested,
        window_secs,
        "peak detection complete"
    );

    if selected.len() < requested {
        let found = selected.len();
        return Err(AnalysisError::InsufficientSignal {
            found,
            requested,
            windows: selected,
        });
    }
    Ok(selected)
}

fn aggregate(
    series: &[ScoreSample],
    prefix: &[f64],
    start: usize,
    len: usize,
    mode: WindowAggregate,
) -> f64 {
    match mode {
        WindowAggregate::Mean => (prefix[start + len] - prefix[start]) / len as f64,
        WindowAggregate::Max => series[start..start + len]
            .iter()
            .map(|s| s.intensity)
            .fold(0.0, f64::max),
        WindowAggregate::Percentile(p) => {
            let mut values: Vec<f64> = series[start..start + len].iter().map(|s| s.intensity).collect();
            values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            let idx = ((values.len() - 1) as f64 * p.clamp(0.0, 1.0)).round() as usize;
            values[idx]
        }
    }
}
