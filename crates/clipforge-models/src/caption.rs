//! Caption cue model.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A single timed caption within a clip's local timeline.
///
/// Cues for a clip are ordered, non-overlapping, and each respects the
/// configured duration and character limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CaptionCue {
    /// Start time in seconds (clip-relative)
    pub start: f64,
    /// End time in seconds (clip-relative)
    pub end: f64,
    /// Caption text
    pub text: String,
    /// Style tag for the renderer (e.g. "default", "emphasis")
    #[serde(default = "default_style")]
    pub style: String,
}

fn default_style() -> String {
    "default".to_string()
}

impl CaptionCue {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
            style: default_style(),
        }
    }

    /// Set the style tag.
    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = style.into();
        self
    }

    /// Cue duration in seconds.
    pub fn duration(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cue_duration() {
        let cue = CaptionCue::new(0.5, 2.5, "hello world");
        assert!((cue.duration() - 2.0).abs() < 1e-9);
        assert_eq!(cue.style, "default");
    }

    #[test]
    fn test_cue_style() {
        let cue = CaptionCue::new(0.0, 1.0, "wow").with_style("emphasis");
        assert_eq!(cue.style, "emphasis");
    }
}
