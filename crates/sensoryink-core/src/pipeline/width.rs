//! Variable-width model: pressure, velocity, and tilt drive segment width.

use crate::stroke::{InkPoint, StrokeConfig};
use std::f64::consts::PI;

/// Velocity (world px/ms) at which the thinning effect saturates.
const VELOCITY_SATURATION: f64 = 2.5;
/// Tilt magnitude (degrees) at which tilt modulation saturates.
const TILT_SATURATION: f64 = 60.0;
/// Width multiplier for single-point dot strokes.
pub const DOT_TAPER: f64 = 0.4;
/// Maximum number of tapered segments at each stroke end.
const MAX_TAPER: usize = 8;

/// Width for the segment ending at `cur`, clamped to the config bounds.
pub fn segment_width(config: &StrokeConfig, prev: &InkPoint, cur: &InkPoint) -> f64 {
    let p_factor =
        config.pressure_influence * cur.pressure + (1.0 - config.pressure_influence) * 0.5;

    let dx = cur.x - prev.x;
    let dy = cur.y - prev.y;
    let dt = cur.timestamp - prev.timestamp;
    let velocity = if dt > 0.0 { dx.hypot(dy) / dt } else { 0.0 };
    let v_factor = 1.0 - (velocity / VELOCITY_SATURATION).min(1.0) * config.velocity_influence;

    let mut width = config.base_stroke_width * p_factor * v_factor;

    let tilt = cur.tilt_magnitude();
    if tilt > 0.0 {
        let tilt_dir = cur.tilt_y.atan2(cur.tilt_x);
        let stroke_dir = dy.atan2(dx);
        let folded = (tilt_dir - stroke_dir).rem_euclid(PI);
        let n = folded.min(PI - folded) / (PI / 2.0);
        let m = (tilt / TILT_SATURATION).min(1.0);
        // Perpendicular-to-motion broadens up to 1.5x; parallel narrows
        // down to 0.6x; zero tilt leaves the width unchanged.
        width *= 1.0 + (0.6 + 0.9 * n - 1.0) * m;
    }

    width.clamp(config.min_width, config.max_width)
}

/// Width for a single-point dot stroke: pressure response only, then the
/// dot taper.
pub fn dot_width(config: &StrokeConfig, point: &InkPoint) -> f64 {
    let p_factor =
        config.pressure_influence * point.pressure + (1.0 - config.pressure_influence) * 0.5;
    let width = (config.base_stroke_width * p_factor).clamp(config.min_width, config.max_width);
    width * DOT_TAPER
}

/// Number of tapered segments at each end of a stroke with `point_count`
/// points. Zero for strokes too short to taper.
pub fn taper_segments(point_count: usize) -> usize {
    if point_count < 4 {
        return 0;
    }
    MAX_TAPER.min((0.15 * point_count as f64) as usize)
}

/// Quadratic taper ramp for segment `k` of `total` tapered segments,
/// counted from the stroke tip.
pub fn taper_factor(k: usize, total: usize) -> f64 {
    let ramp = (k + 1) as f64 / (total + 1) as f64;
    ramp * ramp
}

/// Per-point widths for a whole stroke, taper applied at both ends.
pub fn stroke_widths(config: &StrokeConfig, points: &[InkPoint]) -> Vec<f64> {
    let n = points.len();
    let mut widths = Vec::with_capacity(n);
    for i in 0..n {
        let prev = if i == 0 { &points[0] } else { &points[i - 1] };
        widths.push(segment_width(config, prev, &points[i]));
    }

    let taper = taper_segments(n);
    for k in 0..taper {
        let factor = taper_factor(k, taper);
        widths[k] *= factor;
        widths[n - 1 - k] *= factor;
    }
    widths
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> StrokeConfig {
        StrokeConfig {
            base_stroke_width: 4.0,
            min_width: 0.5,
            max_width: 10.0,
            pressure_influence: 1.0,
            velocity_influence: 0.5,
            ..StrokeConfig::default()
        }
    }

    fn point(x: f64, t: f64, pressure: f64) -> InkPoint {
        InkPoint::new(x, 0.0, pressure, t)
    }

    #[test]
    fn test_width_clamped() {
        let cfg = config();
        let prev = point(0.0, 0.0, 1.0);
        // Huge velocity and zero pressure still stays above the floor.
        let cur = point(1000.0, 1.0, 0.0);
        let w = segment_width(&cfg, &prev, &cur);
        assert!(w >= cfg.min_width && w <= cfg.max_width);
    }

    #[test]
    fn test_pressure_scales_width() {
        let cfg = config();
        let prev = point(0.0, 0.0, 0.5);
        let light = segment_width(&cfg, &prev, &point(1.0, 100.0, 0.2));
        let heavy = segment_width(&cfg, &prev, &point(1.0, 100.0, 0.9));
        assert!(heavy > light);
    }

    #[test]
    fn test_velocity_thins_width() {
        let cfg = config();
        let prev = point(0.0, 0.0, 0.8);
        let slow = segment_width(&cfg, &prev, &point(1.0, 100.0, 0.8));
        let fast = segment_width(&cfg, &prev, &point(200.0, 100.0, 0.8));
        assert!(fast < slow);
    }

    #[test]
    fn test_perpendicular_tilt_broadens() {
        let cfg = config();
        let prev = point(0.0, 0.0, 0.8);
        // Rightward motion, vertical tilt: perpendicular.
        let perp = segment_width(
            &cfg,
            &prev,
            &InkPoint::new(1.0, 0.0, 0.8, 100.0).with_tilt(0.0, 60.0),
        );
        let flat = segment_width(&cfg, &prev, &point(1.0, 100.0, 0.8));
        assert!(perp > flat);

        // Horizontal tilt, same motion: parallel narrows.
        let para = segment_width(
            &cfg,
            &prev,
            &InkPoint::new(1.0, 0.0, 0.8, 100.0).with_tilt(60.0, 0.0),
        );
        assert!(para < flat);
    }

    #[test]
    fn test_zero_pressure_influence_is_neutral() {
        let mut cfg = config();
        cfg.pressure_influence = 0.0;
        let prev = point(0.0, 0.0, 0.1);
        let a = segment_width(&cfg, &prev, &point(1.0, 100.0, 0.1));
        let b = segment_width(&cfg, &prev, &point(1.0, 100.0, 0.9));
        assert!((a - b).abs() < 1e-12);
    }

    #[test]
    fn test_taper_counts() {
        assert_eq!(taper_segments(3), 0);
        assert_eq!(taper_segments(10), 1);
        assert_eq!(taper_segments(40), 6);
        assert_eq!(taper_segments(400), 8);
    }

    #[test]
    fn test_taper_ramp_monotonic() {
        let total = 5;
        for k in 1..total {
            assert!(taper_factor(k, total) > taper_factor(k - 1, total));
        }
        assert!(taper_factor(total - 1, total) < 1.0);
    }

    #[test]
    fn test_stroke_widths_tapered_ends() {
        let cfg = config();
        let points: Vec<InkPoint> = (0..30).map(|i| point(i as f64, i as f64 * 10.0, 0.7)).collect();
        let widths = stroke_widths(&cfg, &points);
        assert_eq!(widths.len(), 30);
        // Tips are thinner than the middle.
        assert!(widths[0] < widths[15]);
        assert!(widths[29] < widths[15]);
    }

    #[test]
    fn test_dot_width() {
        let cfg = config();
        let w = dot_width(&cfg, &point(0.0, 0.0, 1.0));
        assert!((w - cfg.base_stroke_width * DOT_TAPER).abs() < 1e-12);
    }
}
