//! Friction simulation: positional drag with a paper-grain direction.

use kurbo::Point;
use std::f64::consts::PI;

/// Tuning parameters for the friction filter. Driven as a set by the
/// engine's `surfaceTexture` control.
#[derive(Debug, Clone, Copy)]
pub struct FrictionParams {
    /// Resistance applied regardless of motion.
    pub base_resistance: f64,
    /// How strongly pen pressure increases drag.
    pub pressure_influence: f64,
    /// How strongly momentum defeats friction.
    pub velocity_damping: f64,
    /// Paper grain direction in radians.
    pub grain_direction: f64,
    /// Extra drag when moving across the grain.
    pub grain_strength: f64,
}

impl Default for FrictionParams {
    fn default() -> Self {
        Self::from_texture(0.5)
    }
}

impl FrictionParams {
    /// Derive friction parameters from the `[0, 1]` surface-texture
    /// control: glass at 0, stone at 1.
    pub fn from_texture(texture: f64) -> Self {
        let t = texture.clamp(0.0, 1.0);
        Self {
            base_resistance: 0.05 + 0.25 * t,
            pressure_influence: 1.0,
            velocity_damping: 0.4,
            grain_direction: PI / 4.0,
            grain_strength: 0.2 * t,
        }
    }
}

/// Result of one friction step.
#[derive(Debug, Clone, Copy)]
pub struct FrictionOutput {
    pub position: Point,
    /// Total drag applied, in `[0, 0.5]`.
    pub friction: f64,
    /// Cross-grain factor: 1 perpendicular to the grain, 0 parallel.
    pub grain: f64,
}

/// Per-sample positional drag. The output position lags the input by a
/// fraction that grows with pressure and cross-grain motion and shrinks
/// with velocity.
#[derive(Debug, Clone)]
pub struct FrictionFilter {
    pub params: FrictionParams,
    last_out: Option<Point>,
}

impl FrictionFilter {
    pub fn new(params: FrictionParams) -> Self {
        Self {
            params,
            last_out: None,
        }
    }

    /// Forget filter state. Call at stroke start.
    pub fn reset(&mut self) {
        self.last_out = None;
    }

    /// Apply drag to one sample.
    ///
    /// `velocity` is in world pixels per 100 ms; `direction` is the motion
    /// angle `atan2(dy, dx)` in radians.
    pub fn apply(
        &mut self,
        input: Point,
        pressure: f64,
        velocity: f64,
        direction: f64,
    ) -> FrictionOutput {
        let Some(last) = self.last_out else {
            self.last_out = Some(input);
            return FrictionOutput {
                position: input,
                friction: 0.0,
                grain: 0.0,
            };
        };

        let p = &self.params;
        let mut friction = p.base_resistance + pressure * p.pressure_influence * 0.2;
        friction *= 1.0 - (velocity / 5.0).min(1.0) * p.velocity_damping;

        // Fold the angle difference into [0, pi/2]: 1 across the grain,
        // 0 along it.
        let folded = (direction - p.grain_direction).rem_euclid(PI);
        let grain = folded.min(PI - folded) / (PI / 2.0);

        friction = (friction + grain * p.grain_strength).clamp(0.0, 0.5);

        let position = Point::new(
            last.x + (input.x - last.x) * (1.0 - friction),
            last.y + (input.y - last.y) * (1.0 - friction),
        );
        self.last_out = Some(position);

        FrictionOutput {
            position,
            friction,
            grain,
        }
    }
}
