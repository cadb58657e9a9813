//! Input conditioning pipeline: prediction, friction, then streamline
//! smoothing, with a raw-mode bypass.

pub mod friction;
pub mod smoother;
pub mod width;

pub use friction::{FrictionFilter, FrictionOutput, FrictionParams};
pub use smoother::{MotionPredictor, StreamlineSmoother};

use crate::stroke::InkPoint;
use kurbo::Point;

/// Result of conditioning one raw sample.
#[derive(Debug, Clone, Copy)]
pub struct ConditionedSample {
    /// The point to append to the active stroke.
    pub point: InkPoint,
    /// Instantaneous velocity in world px/ms.
    pub velocity: f64,
    /// Drag applied by the friction stage, `[0, 0.5]`.
    pub friction: f64,
    /// Cross-grain factor from the friction stage, `[0, 1]`.
    pub grain: f64,
}

/// Per-stroke conditioning state. Reset at every stroke start.
///
/// Raw mode bypasses prediction, friction, and smoothing entirely: samples
/// go through 1:1 at the cost of visible jitter. Velocity is still tracked
/// so audio and haptic feedback keep working.
#[derive(Debug, Clone)]
pub struct InkPipeline {
    pub raw_mode: bool,
    predictor: MotionPredictor,
    friction: FrictionFilter,
    smoother: StreamlineSmoother,
    last_raw: Option<(Point, f64)>,
}

impl InkPipeline {
    pub fn new(streamline: f64, friction_params: FrictionParams) -> Self {
        Self {
            raw_mode: false,
            predictor: MotionPredictor::new(),
            friction: FrictionFilter::new(friction_params),
            smoother: StreamlineSmoother::new(streamline),
            last_raw: None,
        }
    }

    pub fn set_streamline(&mut self, streamline: f64) {
        self.smoother.set_streamline(streamline);
    }

    pub fn set_friction_params(&mut self, params: FrictionParams) {
        self.friction.params = params;
    }

    pub fn set_prediction_enabled(&mut self, enabled: bool) {
        self.predictor.enabled = enabled;
    }

    /// Reset all per-stroke state. Call at stroke start.
    pub fn reset(&mut self) {
        self.predictor.reset();
        self.friction.reset();
        self.smoother.reset();
        self.last_raw = None;
    }

    /// Condition one raw world-space sample.
    pub fn process(
        &mut self,
        x: f64,
        y: f64,
        pressure: f64,
        tilt_x: f64,
        tilt_y: f64,
        timestamp: f64,
    ) -> ConditionedSample {
        let raw = Point::new(x, y);

        // Velocity and direction come from the raw samples so that the
        // filters cannot feed back into their own inputs.
        let (velocity, direction) = match self.last_raw {
            Some((last, last_ts)) => {
                let dt = timestamp - last_ts;
                let dx = raw.x - last.x;
                let dy = raw.y - last.y;
                let v = if dt > 0.0 { dx.hypot(dy) / dt } else { 0.0 };
                (v, dy.atan2(dx))
            }
            None => (0.0, 0.0),
        };
        self.last_raw = Some((raw, timestamp));

        if self.raw_mode {
            return ConditionedSample {
                point: InkPoint::new(x, y, pressure, timestamp).with_tilt(tilt_x, tilt_y),
                velocity,
                friction: 0.0,
                grain: 0.0,
            };
        }

        let predicted = self.predictor.apply(raw, timestamp);
        // Friction expects px per 100 ms.
        let dragged = self
            .friction
            .apply(predicted, pressure, velocity * 100.0, direction);
        let smoothed = self.smoother.apply(dragged.position);

        ConditionedSample {
            point: InkPoint::new(smoothed.x, smoothed.y, pressure, timestamp)
                .with_tilt(tilt_x, tilt_y),
            velocity,
            friction: dragged.friction,
            grain: dragged.grain,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline() -> InkPipeline {
        InkPipeline::new(0.5, FrictionParams::from_texture(0.5))
    }

    #[test]
    fn test_raw_mode_is_identity() {
        let mut p = pipeline();
        p.raw_mode = true;
        p.process(0.0, 0.0, 0.5, 0.0, 0.0, 0.0);
        let out = p.process(13.7, -4.2, 0.5, 0.0, 0.0, 16.0);
        assert!((out.point.x - 13.7).abs() < f64::EPSILON);
        assert!((out.point.y + 4.2).abs() < f64::EPSILON);
    }

    #[test]
    fn test_conditioned_sample_lags_raw() {
        let mut p = pipeline();
        p.process(0.0, 0.0, 0.8, 0.0, 0.0, 0.0);
        let out = p.process(10.0, 0.0, 0.8, 0.0, 0.0, 16.0);
        assert!(out.point.x > 0.0);
        assert!(out.point.x < 10.0);
    }

    #[test]
    fn test_velocity_tracked_in_raw_mode() {
        let mut p = pipeline();
        p.raw_mode = true;
        p.process(0.0, 0.0, 0.5, 0.0, 0.0, 0.0);
        let out = p.process(10.0, 0.0, 0.5, 0.0, 0.0, 10.0);
        assert!((out.velocity - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_clock_regression_yields_zero_velocity() {
        let mut p = pipeline();
        p.process(0.0, 0.0, 0.5, 0.0, 0.0, 100.0);
        let out = p.process(10.0, 0.0, 0.5, 0.0, 0.0, 50.0);
        assert!(out.velocity.abs() < f64::EPSILON);
    }

    #[test]
    fn test_reset_between_strokes() {
        let mut p = pipeline();
        p.process(0.0, 0.0, 0.5, 0.0, 0.0, 0.0);
        p.process(100.0, 0.0, 0.5, 0.0, 0.0, 16.0);
        p.reset();
        // First sample of a fresh stroke passes through unchanged.
        let out = p.process(500.0, 500.0, 0.5, 0.0, 0.0, 1000.0);
        assert!((out.point.x - 500.0).abs() < f64::EPSILON);
        assert!(out.velocity.abs() < f64::EPSILON);
    }
}
