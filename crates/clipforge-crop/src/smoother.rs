//! Temporal smoothing of subject centers.
//!
//! Raw per-frame subject centers jitter with detection noise. An exponential
//! filter damps the jitter, and a motion-budget clamp caps how fast the crop
//! center may travel so panning never becomes jarring.

/// Stateful exponential smoother with a per-second displacement cap.
#[derive(Debug, Clone)]
pub struct CenterSmoother {
    /// Smoothing factor in (0,1]; higher tracks the subject more tightly.
    alpha: f64,
    /// Maximum center displacement in pixels per second.
    max_speed_px: f64,
    last: Option<(f64, f64, f64)>,
}

impl CenterSmoother {
    pub fn new(alpha: f64, max_speed_px: f64) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
            max_speed_px,
            last: None,
        }
    }

    /// Feed the next raw center sample and get the smoothed, clamped center.
    ///
    /// The first sample passes through unchanged and seeds the filter state.
    pub fn apply(&mut self, time: f64, cx: f64, cy: f64) -> (f64, f64) {
        let Some((last_time, last_x, last_y)) = self.last else {
            self.last = Some((time, cx, cy));
            return (cx, cy);
        };

        let mut x = last_x + self.alpha * (cx - last_x);
        let mut y = last_y + self.alpha * (cy - last_y);

        let dt = (time - last_time).max(1e-6);
        let max_step = self.max_speed_px * dt;
        let dx = x - last_x;
        let dy = y - last_y;
        let dist = (dx * dx + dy * dy).sqrt();
        if dist > max_step {
            let scale = max_step / dist;
            x = last_x + dx * scale;
            y = last_y + dy * scale;
        }

        self.last = Some((time, x, y));
        (x, y)
    }

    /// Reset filter state, e.g. at a hard scene cut.
    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sample_passes_through() {
        let mut smoother = CenterSmoother::new(0.3, 480.0);
        assert_eq!(smoother.apply(0.0, 960.0, 540.0), (960.0, 540.0));
    }

    #[test]
    fn test_smoothing_damps_jump() {
        let mut smoother = CenterSmoother::new(0.3, 1e9);
        smoother.apply(0.0, 0.0, 0.0);
        let (x, _) = smoother.apply(1.0, 100.0, 0.0);
        assert!((x - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_motion_budget_clamps_step() {
        let mut smoother = CenterSmoother::new(1.0, 100.0);
        smoother.apply(0.0, 0.0, 0.0);
        // Subject teleports 1000px in 0.5s; clamp allows 50px
        let (x, y) = smoother.apply(0.5, 1000.0, 0.0);
        assert!((x - 50.0).abs() < 1e-9);
        assert_eq!(y, 0.0);
    }

    #[test]
    fn test_converges_to_static_subject() {
        let mut smoother = CenterSmoother::new(0.3, 480.0);
        smoother.apply(0.0, 0.0, 0.0);
        let mut x = 0.0;
        for i in 1..60 {
            (x, _) = smoother.apply(i as f64 * 0.5, 200.0, 0.0);
        }
        assert!((x - 200.0).abs() < 1.0);
    }

    #[test]
    fn test_reset_clears_state() {
        let mut smoother = CenterSmoother::new(0.3, 480.0);
        smoother.apply(0.0, 0.0, 0.0);
        smoother.reset();
        assert_eq!(smoother.apply(10.0, 500.0, 0.0), (500.0, 0.0));
    }
}
