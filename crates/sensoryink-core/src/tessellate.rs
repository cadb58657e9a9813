//! Stroke tessellation: Catmull-Rom interpolation through the sample
//! points, flattened to width-carrying line segments.

use crate::pipeline::width::{dot_width, stroke_widths};
use crate::stroke::{InkPoint, Stroke, StrokeConfig};
use kurbo::{CubicBez, ParamCurve, Point};

/// World-pixel chord length per Bezier subdivision step.
const SUBDIV_PIXELS: f64 = 5.0;
/// Subdivision count bounds per Bezier span.
const MIN_SUBDIV: usize = 2;
const MAX_SUBDIV: usize = 8;
/// Width multiplier for short (2-3 point) strokes.
const SHORT_STROKE_FACTOR: f64 = 0.5;

/// One flattened sub-segment with its interpolated width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WidthSegment {
    pub from: Point,
    pub to: Point,
    pub width: f64,
}

/// Flattened geometry for one stroke.
#[derive(Debug, Clone, PartialEq)]
pub enum StrokeGeometry {
    /// A single-point stroke renders as a filled disk.
    Dot { center: Point, radius: f64 },
    /// Everything else renders as a widthed polyline.
    Polyline(Vec<WidthSegment>),
}

/// Tessellate a committed stroke.
pub fn tessellate(stroke: &Stroke) -> StrokeGeometry {
    tessellate_points(&stroke.config, &stroke.points)
}

/// Tessellate a point sequence with the given config.
pub fn tessellate_points(config: &StrokeConfig, points: &[InkPoint]) -> StrokeGeometry {
    match points.len() {
        0 => StrokeGeometry::Polyline(Vec::new()),
        1 => StrokeGeometry::Dot {
            center: points[0].pos(),
            radius: dot_width(config, &points[0]) / 2.0,
        },
        2 | 3 => short_polyline(config, points),
        _ => bezier_polyline(config, points),
    }
}

/// 2-3 point strokes: a constant-width polyline at half the pressure-scaled
/// base width.
fn short_polyline(config: &StrokeConfig, points: &[InkPoint]) -> StrokeGeometry {
    let avg_pressure = points.iter().map(|p| p.pressure).sum::<f64>() / points.len() as f64;
    let p_factor =
        config.pressure_influence * avg_pressure + (1.0 - config.pressure_influence) * 0.5;
    let width = (config.base_stroke_width * p_factor * SHORT_STROKE_FACTOR)
        .clamp(config.min_width, config.max_width);

    let segments = points
        .windows(2)
        .map(|w| WidthSegment {
            from: w[0].pos(),
            to: w[1].pos(),
            width,
        })
        .collect();
    StrokeGeometry::Polyline(segments)
}

/// Catmull-Rom spans converted to cubic Beziers and flattened.
fn bezier_polyline(config: &StrokeConfig, points: &[InkPoint]) -> StrokeGeometry {
    let n = points.len();
    let widths = stroke_widths(config, points);
    // Guard the tension denominator so smoothness = 1 stays finite.
    let k = 6.0 * (1.0 - config.smoothness).max(0.01);

    let mut segments = Vec::new();
    for i in 0..n - 1 {
        let p0 = points[i.saturating_sub(1)].pos();
        let p1 = points[i].pos();
        let p2 = points[i + 1].pos();
        let p3 = points[(i + 2).min(n - 1)].pos();

        let cp1 = Point::new(p1.x + (p2.x - p0.x) / k, p1.y + (p2.y - p0.y) / k);
        let cp2 = Point::new(p2.x - (p3.x - p1.x) / k, p2.y - (p3.y - p1.y) / k);
        let bez = CubicBez::new(p1, cp1, cp2, p2);

        let chord_l1 = (p2.x - p1.x).abs() + (p2.y - p1.y).abs();
        let steps = ((chord_l1 / SUBDIV_PIXELS).ceil() as usize).clamp(MIN_SUBDIV, MAX_SUBDIV);

        let w_from = widths[i];
        let w_to = widths[i + 1];
        let mut prev = p1;
        for step in 1..=steps {
            let t = step as f64 / steps as f64;
            let next = bez.eval(t);
            segments.push(WidthSegment {
                from: prev,
                to: next,
                width: w_from + (w_to - w_from) * t,
            });
            prev = next;
        }
    }
    StrokeGeometry::Polyline(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::width::DOT_TAPER;

    fn points(coords: &[(f64, f64)]) -> Vec<InkPoint> {
        coords
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| InkPoint::new(x, y, 0.6, i as f64 * 16.0))
            .collect()
    }

    #[test]
    fn test_single_point_is_dot() {
        let config = StrokeConfig::default();
        let geometry = tessellate_points(&config, &points(&[(5.0, 5.0)]));
        match geometry {
            StrokeGeometry::Dot { center, radius } => {
                assert!((center.x - 5.0).abs() < f64::EPSILON);
                assert!(radius > 0.0);
                let expected = (config.base_stroke_width
                    * (config.pressure_influence * 0.6
                        + (1.0 - config.pressure_influence) * 0.5))
                    .clamp(config.min_width, config.max_width)
                    * DOT_TAPER
                    / 2.0;
                assert!((radius - expected).abs() < 1e-12);
            }
            _ => panic!("expected a dot"),
        }
    }

    #[test]
    fn test_two_points_constant_width() {
        let config = StrokeConfig::default();
        let geometry = tessellate_points(&config, &points(&[(0.0, 0.0), (10.0, 0.0)]));
        match geometry {
            StrokeGeometry::Polyline(segments) => {
                assert_eq!(segments.len(), 1);
                assert!(segments[0].width >= config.min_width);
            }
            _ => panic!("expected a polyline"),
        }
    }

    #[test]
    fn test_bezier_subdivision_bounds() {
        let config = StrokeConfig::default();
        // Long spans: every Bezier flattens to at most MAX_SUBDIV pieces.
        let geometry = tessellate_points(
            &config,
            &points(&[(0.0, 0.0), (100.0, 0.0), (200.0, 0.0), (300.0, 0.0)]),
        );
        if let StrokeGeometry::Polyline(segments) = geometry {
            assert!(segments.len() <= 3 * MAX_SUBDIV);
            assert!(segments.len() >= 3 * MIN_SUBDIV);
        } else {
            panic!("expected a polyline");
        }
    }

    #[test]
    fn test_flattened_curve_is_continuous() {
        let config = StrokeConfig::default();
        let geometry = tessellate_points(
            &config,
            &points(&[(0.0, 0.0), (10.0, 10.0), (20.0, 0.0), (30.0, 10.0), (40.0, 0.0)]),
        );
        if let StrokeGeometry::Polyline(segments) = geometry {
            for pair in segments.windows(2) {
                assert!((pair[0].to.x - pair[1].from.x).abs() < 1e-9);
                assert!((pair[0].to.y - pair[1].from.y).abs() < 1e-9);
            }
        } else {
            panic!("expected a polyline");
        }
    }

    #[test]
    fn test_widths_stay_clamped() {
        let config = StrokeConfig {
            min_width: 1.0,
            max_width: 4.0,
            ..StrokeConfig::default()
        };
        let coords: Vec<(f64, f64)> = (0..20).map(|i| (i as f64 * 7.0, (i % 3) as f64)).collect();
        let geometry = tessellate_points(&config, &points(&coords));
        if let StrokeGeometry::Polyline(segments) = geometry {
            for segment in &segments {
                // Taper may pull below min_width at the tips, but never
                // above the ceiling.
                assert!(segment.width <= config.max_width + 1e-12);
                assert!(segment.width > 0.0);
            }
        } else {
            panic!("expected a polyline");
        }
    }

    #[test]
    fn test_full_smoothness_stays_finite() {
        let config = StrokeConfig {
            smoothness: 1.0,
            ..StrokeConfig::default()
        };
        let geometry = tessellate_points(
            &config,
            &points(&[(0.0, 0.0), (10.0, 5.0), (20.0, -5.0), (30.0, 0.0)]),
        );
        if let StrokeGeometry::Polyline(segments) = geometry {
            for segment in &segments {
                assert!(segment.from.x.is_finite() && segment.to.y.is_finite());
            }
        } else {
            panic!("expected a polyline");
        }
    }
}
