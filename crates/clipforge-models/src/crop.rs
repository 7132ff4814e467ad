//! Crop geometry: detections, rectangles, and crop paths.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Bounding box in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BoundingBox {
    /// Left edge x-coordinate
    pub x: f64,
    /// Top edge y-coordinate
    pub y: f64,
    /// Box width
    pub width: f64,
    /// Box height
    pub height: f64,
}

impl BoundingBox {
    /// Create a new bounding box.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Center x-coordinate.
    #[inline]
    pub fn cx(&self) -> f64 {
        self.x + self.width / 2.0
    }

    /// Center y-coordinate.
    #[inline]
    pub fn cy(&self) -> f64 {
        self.y + self.height / 2.0
    }

    /// Box area in pixels.
    #[inline]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// A face (or salient region) detection within one sampled frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FaceDetection {
    /// Bounding box of the detection
    pub bbox: BoundingBox,
    /// Detection confidence in [0,1]
    pub confidence: f64,
}

impl FaceDetection {
    pub fn new(bbox: BoundingBox, confidence: f64) -> Self {
        Self { bbox, confidence }
    }
}

/// All detections for a single sampled frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FrameDetections {
    /// Timestamp in seconds (source-relative)
    pub time: f64,
    /// Face detections, possibly empty
    pub faces: Vec<FaceDetection>,
    /// Saliency centroid (x, y) fallback when no faces are present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saliency: Option<(f64, f64)>,
}

impl FrameDetections {
    pub fn new(time: f64, faces: Vec<FaceDetection>) -> Self {
        Self {
            time,
            faces,
            saliency: None,
        }
    }

    /// Frame with no detections at all.
    pub fn empty(time: f64) -> Self {
        Self {
            time,
            faces: Vec::new(),
            saliency: None,
        }
    }

    pub fn with_saliency(mut self, x: f64, y: f64) -> Self {
        self.saliency = Some((x, y));
        self
    }
}

/// Integer crop rectangle (pixel coordinates, even dimensions for codecs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CropRect {
    /// Left edge x-coordinate
    pub x: i32,
    /// Top edge y-coordinate
    pub y: i32,
    /// Crop width
    pub width: i32,
    /// Crop height
    pub height: i32,
}

impl CropRect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Center x-coordinate.
    #[inline]
    pub fn cx(&self) -> f64 {
        self.x as f64 + self.width as f64 / 2.0
    }

    /// Center y-coordinate.
    #[inline]
    pub fn cy(&self) -> f64 {
        self.y as f64 + self.height as f64 / 2.0
    }

    /// Whether the rectangle lies fully within a frame of the given size.
    pub fn is_within(&self, frame_width: u32, frame_height: u32) -> bool {
        self.x >= 0
            && self.y >= 0
            && self.width > 0
            && self.height > 0
            && self.x + self.width <= frame_width as i32
            && self.y + self.height <= frame_height as i32
    }
}

/// A timed crop keyframe. Consumers interpolate linearly between keyframes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CropKeyframe {
    /// Timestamp in seconds (source-relative)
    pub time: f64,
    /// Crop rectangle at this time
    pub rect: CropRect,
}

impl CropKeyframe {
    pub fn new(time: f64, rect: CropRect) -> Self {
        Self { time, rect }
    }

    /// Linear interpolation between two keyframes.
    pub fn lerp(a: &CropKeyframe, b: &CropKeyframe, t: f64) -> CropKeyframe {
        CropKeyframe {
            time: a.time + t * (b.time - a.time),
            rect: CropRect {
                x: (a.rect.x as f64 + t * (b.rect.x - a.rect.x) as f64).round() as i32,
                y: (a.rect.y as f64 + t * (b.rect.y - a.rect.y) as f64).round() as i32,
                width: (a.rect.width as f64 + t * (b.rect.width - a.rect.width) as f64).round()
                    as i32,
                height: (a.rect.height as f64 + t * (b.rect.height - a.rect.height) as f64).round()
                    as i32,
            },
        }
    }
}

/// Ordered crop keyframes spanning a clip's duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
pub struct CropPath {
    /// Keyframes ordered by time
    pub keyframes: Vec<CropKeyframe>,
}

impl CropPath {
    pub fn new(keyframes: Vec<CropKeyframe>) -> Self {
        Self { keyframes }
    }

    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    /// Interpolated rectangle at a specific time.
    pub fn rect_at(&self, time: f64) -> Option<CropRect> {
        let first = self.keyframes.first()?;
        if time <= first.time {
            return Some(first.rect);
        }
        let last = self.keyframes.last()?;
        if time >= last.time {
            return Some(last.rect);
        }

        for pair in self.keyframes.windows(2) {
            if pair[0].time <= time && time <= pair[1].time {
                let span = pair[1].time - pair[0].time;
                let t = if span > 0.0 { (time - pair[0].time) / span } else { 0.0 };
                return Some(CropKeyframe::lerp(&pair[0], &pair[1], t).rect);
            }
        }

        None
    }

    /// Validate the crop-path invariants:
    /// every rectangle inside the frame, keyframes strictly ordered, and
    /// center displacement per second within the motion budget.
    pub fn validate(
        &self,
        frame_width: u32,
        frame_height: u32,
        max_center_speed_px: f64,
    ) -> Result<(), String> {
        for kf in &self.keyframes {
            if !kf.rect.is_within(frame_width, frame_height) {
                return Err(format!(
                    "keyframe at {:.3}s outside {}x{} frame: {:?}",
                    kf.time, frame_width, frame_height, kf.rect
                ));
            }
        }

        for pair in self.keyframes.windows(2) {
            let dt = pair[1].time - pair[0].time;
            if dt <= 0.0 {
                return Err(format!(
                    "keyframes out of order at {:.3}s -> {:.3}s",
                    pair[0].time, pair[1].time
                ));
            }
            let dx = pair[1].rect.cx() - pair[0].rect.cx();
            let dy = pair[1].rect.cy() - pair[0].rect.cy();
            let speed = (dx * dx + dy * dy).sqrt() / dt;
            // Rounding to integer pixels can add up to one pixel of center motion
            if speed > max_center_speed_px + 1.0 / dt {
                return Err(format!(
                    "center speed {:.1}px/s exceeds budget {:.1}px/s at {:.3}s",
                    speed, max_center_speed_px, pair[1].time
                ));
            }
        }

        Ok(())
    }
}
