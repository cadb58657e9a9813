//! Streamline smoothing and optional motion prediction.

use kurbo::{Point, Vec2};

/// First-order low-pass over incoming sample positions.
///
/// `smoothed = prev + (input - prev) * (1 - streamline * 0.5)`; the halved
/// factor trades smoothness for responsiveness. `streamline = 0` passes
/// samples through unchanged.
#[derive(Debug, Clone)]
pub struct StreamlineSmoother {
    streamline: f64,
    prev: Option<Point>,
}

impl StreamlineSmoother {
    pub fn new(streamline: f64) -> Self {
        Self {
            streamline: streamline.clamp(0.0, 1.0),
            prev: None,
        }
    }

    pub fn set_streamline(&mut self, streamline: f64) {
        self.streamline = streamline.clamp(0.0, 1.0);
    }

    /// Forget filter state. Call at stroke start.
    pub fn reset(&mut self) {
        self.prev = None;
    }

    pub fn apply(&mut self, input: Point) -> Point {
        let out = match self.prev {
            None => input,
            Some(prev) => {
                let blend = 1.0 - self.streamline * 0.5;
                Point::new(
                    prev.x + (input.x - prev.x) * blend,
                    prev.y + (input.y - prev.y) * blend,
                )
            }
        };
        self.prev = Some(out);
        out
    }
}

/// EMA smoothing factor for the velocity estimate.
const VELOCITY_ALPHA: f64 = 0.4;
/// Prediction lookahead in milliseconds at full confidence.
const LOOKAHEAD_MS: f64 = 8.0;
/// Confidence gain when motion direction stays consistent.
const CONFIDENCE_GAIN: f64 = 0.15;
/// Confidence loss on a direction reversal.
const CONFIDENCE_LOSS: f64 = 0.5;

/// Motion predictor: EMA velocity with confidence blending.
///
/// Present but disabled by default; when enabled it extrapolates each
/// sample along the smoothed velocity, scaled by how confident the
/// recent motion has been.
#[derive(Debug, Clone)]
pub struct MotionPredictor {
    pub enabled: bool,
    velocity: Vec2,
    confidence: f64,
    last: Option<(Point, f64)>,
}

impl Default for MotionPredictor {
    fn default() -> Self {
        Self {
            enabled: false,
            velocity: Vec2::ZERO,
            confidence: 0.0,
            last: None,
        }
    }
}

impl MotionPredictor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.velocity = Vec2::ZERO;
        self.confidence = 0.0;
        self.last = None;
    }

    /// Feed a sample; returns the (possibly extrapolated) position.
    pub fn apply(&mut self, input: Point, timestamp: f64) -> Point {
        let Some((last_point, last_ts)) = self.last else {
            self.last = Some((input, timestamp));
            return input;
        };

        let dt = timestamp - last_ts;
        self.last = Some((input, timestamp));
        if dt <= 0.0 {
            // Clock regression: keep state but do not extrapolate.
            return input;
        }

        let instant = Vec2::new((input.x - last_point.x) / dt, (input.y - last_point.y) / dt);
        let prev_velocity = self.velocity;
        self.velocity = prev_velocity + (instant - prev_velocity) * VELOCITY_ALPHA;

        if prev_velocity.dot(instant) > 0.0 {
            self.confidence = (self.confidence + CONFIDENCE_GAIN).min(1.0);
        } else {
            self.confidence = (self.confidence - CONFIDENCE_LOSS).max(0.0);
        }

        if !self.enabled {
            return input;
        }

        let lead = self.velocity * (LOOKAHEAD_MS * self.confidence);
        Point::new(input.x + lead.x, input.y + lead.y)
    }
}
