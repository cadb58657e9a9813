//! Post-stroke gesture recognition: scratch-to-erase and shape snap.
//!
//! Both run once on stroke end, against the raw (unconditioned) samples,
//! before the stroke is committed to the document.

use crate::stroke::InkPoint;
use kurbo::{Point, Rect};
use std::f64::consts::PI;

/// Minimum raw points for a scratch gesture.
const SCRATCH_MIN_POINTS: usize = 15;
/// Horizontal movement below this is ignored when counting reversals.
const SCRATCH_MIN_DX: f64 = 2.0;
/// Required direction reversals.
const SCRATCH_MIN_REVERSALS: usize = 4;
/// Required ratio of path length to bbox diagonal.
const SCRATCH_DENSITY: f64 = 2.5;
/// World-px inflation of the scratch bbox when collecting victims.
const SCRATCH_INFLATE: f64 = 5.0;

/// Dwell required before lift to arm shape snap, in ms.
const SNAP_DWELL_MS: f64 = 250.0;
/// Movement above this breaks the dwell, in world px.
const SNAP_DWELL_TRAVEL: f64 = 2.0;
/// Trailing points within this distance of the lift point are collapsed.
const SNAP_CLUSTER_RADIUS: f64 = 4.0;
/// Endpoint gap below this fraction of the bbox diagonal closes the shape.
const SNAP_CLOSED_GAP: f64 = 0.35;
/// Max perpendicular deviation over chord length for a straight line.
const SNAP_LINE_DEVIATION: f64 = 0.10;
/// Point count for regenerated circles and ellipses (closing point
/// included).
const SNAP_ROUND_POINTS: usize = 65;
/// Steps per rounded-rectangle corner arc.
const SNAP_CORNER_STEPS: usize = 8;

/// Canonical shape recognized from a stroke.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SnappedShape {
    Line,
    Circle,
    Ellipse,
    RoundedRect,
}

/// What to do with a finished stroke.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureOutcome {
    /// Commit the stroke as drawn.
    Keep,
    /// Do not commit; delete strokes touching this world rect instead.
    Scratch(Rect),
    /// Commit with the points replaced by a regenerated canonical shape.
    Snap(SnappedShape, Vec<InkPoint>),
}

/// Classify a finished stroke from its raw samples.
pub fn recognize(raw_points: &[InkPoint]) -> GestureOutcome {
    if let Some(bbox) = detect_scratch(raw_points) {
        return GestureOutcome::Scratch(bbox);
    }
    if let Some((shape, points)) = detect_shape_snap(raw_points) {
        return GestureOutcome::Snap(shape, points);
    }
    GestureOutcome::Keep
}

/// Scratch-to-erase: a dense zig-zag. Returns the inflated bbox to erase
/// under, or `None`.
pub fn detect_scratch(points: &[InkPoint]) -> Option<Rect> {
    if points.len() < SCRATCH_MIN_POINTS {
        return None;
    }

    let mut reversals = 0usize;
    let mut last_sign = 0i8;
    let mut path_length = 0.0;
    for w in points.windows(2) {
        let dx = w[1].x - w[0].x;
        let dy = w[1].y - w[0].y;
        path_length += dx.hypot(dy);

        if dx.abs() > SCRATCH_MIN_DX {
            let sign = if dx > 0.0 { 1 } else { -1 };
            if last_sign != 0 && sign != last_sign {
                reversals += 1;
            }
            last_sign = sign;
        }
    }

    let bbox = points_bounds(points);
    let diagonal = bbox.width().hypot(bbox.height());
    if reversals >= SCRATCH_MIN_REVERSALS && path_length > SCRATCH_DENSITY * diagonal {
        Some(bbox.inflate(SCRATCH_INFLATE, SCRATCH_INFLATE))
    } else {
        None
    }
}

/// Shape snap: requires a pre-lift dwell, then classifies the trajectory
/// as a line, circle, ellipse, or rounded rectangle.
pub fn detect_shape_snap(points: &[InkPoint]) -> Option<(SnappedShape, Vec<InkPoint>)> {
    if points.len() < 4 || !held_still_before_lift(points) {
        return None;
    }

    let filtered = collapse_tail_cluster(points);
    if filtered.len() < 3 {
        return None;
    }

    let pressure = average(points.iter().map(|p| p.pressure));
    let tilt_x = average(points.iter().map(|p| p.tilt_x));
    let tilt_y = average(points.iter().map(|p| p.tilt_y));
    let t0 = points[points.len() - 1].timestamp;
    let stamp = move |positions: Vec<Point>| -> Vec<InkPoint> {
        positions
            .into_iter()
            .enumerate()
            .map(|(i, p)| {
                InkPoint::new(p.x, p.y, pressure, t0 + i as f64).with_tilt(tilt_x, tilt_y)
            })
            .collect()
    };

    let bbox = points_bounds(&filtered);
    let diagonal = bbox.width().hypot(bbox.height());
    let first = filtered[0].pos();
    let last = filtered[filtered.len() - 1].pos();
    let gap = (last.x - first.x).hypot(last.y - first.y);

    if gap < SNAP_CLOSED_GAP * diagonal {
        let (shape, positions) = match classify_closed(&filtered, bbox)? {
            ClosedShape::Circle => {
                let (center, radius) = centroid_radius(&filtered);
                (SnappedShape::Circle, round_points(center, radius, radius))
            }
            ClosedShape::Ellipse => (
                SnappedShape::Ellipse,
                round_points(bbox.center(), bbox.width() / 2.0, bbox.height() / 2.0),
            ),
            ClosedShape::RoundedRect => (SnappedShape::RoundedRect, rounded_rect_points(bbox)),
        };
        Some((shape, stamp(positions)))
    } else {
        let chord = gap.max(f64::EPSILON);
        let max_dev = filtered
            .iter()
            .map(|p| perpendicular_distance(p.pos(), first, last))
            .fold(0.0_f64, f64::max);
        if max_dev / chord < SNAP_LINE_DEVIATION {
            Some((SnappedShape::Line, stamp(line_points(first, last))))
        } else {
            None
        }
    }
}

/// A stroke with at least one point inside the rect. Used to collect
/// scratch-erase victims.
pub fn any_point_inside(points: &[InkPoint], rect: Rect) -> bool {
    points.iter().any(|p| rect.contains(p.pos()))
}

// --- classification ---

/// Shapes a closed trajectory can resolve to.
enum ClosedShape {
    Circle,
    Ellipse,
    RoundedRect,
}

fn held_still_before_lift(points: &[InkPoint]) -> bool {
    let n = points.len();
    let mut start = n - 1;
    while start > 0 {
        let a = &points[start - 1];
        let b = &points[start];
        if (b.x - a.x).hypot(b.y - a.y) > SNAP_DWELL_TRAVEL {
            break;
        }
        start -= 1;
    }
    // A clock regression counts as no dwell at all.
    let dwell = points[n - 1].timestamp - points[start].timestamp;
    dwell >= SNAP_DWELL_MS
}

/// Replace the trailing run of points near the lift position with its
/// first member, so the dwell cluster does not skew classification.
fn collapse_tail_cluster(points: &[InkPoint]) -> Vec<InkPoint> {
    let last = points[points.len() - 1];
    let mut run_start = points.len() - 1;
    while run_start > 0 {
        let p = &points[run_start - 1];
        if (p.x - last.x).hypot(p.y - last.y) > SNAP_CLUSTER_RADIUS {
            break;
        }
        run_start -= 1;
    }
    points[..=run_start].to_vec()
}

fn classify_closed(points: &[InkPoint], bbox: Rect) -> Option<ClosedShape> {
    let w = bbox.width();
    let h = bbox.height();
    let aspect = w.max(h) / w.min(h).max(1.0);

    let (centroid, avg_d) = centroid_radius(points);
    let circle_score = if avg_d > 0.0 {
        let variance = average(points.iter().map(|p| {
            let d = (p.x - centroid.x).hypot(p.y - centroid.y);
            (d - avg_d) * (d - avg_d)
        }));
        variance.sqrt() / avg_d
    } else {
        f64::INFINITY
    };

    let center = bbox.center();
    let rx = (w / 2.0).max(f64::EPSILON);
    let ry = (h / 2.0).max(f64::EPSILON);
    let ellipse_score = average(points.iter().map(|p| {
        let nx = (p.x - center.x) / rx;
        let ny = (p.y - center.y) / ry;
        (nx * nx + ny * ny - 1.0).abs()
    }));

    let edge_band = 0.15 * w.min(h);
    let near_edges = points
        .iter()
        .filter(|p| {
            let d = (p.x - bbox.x0)
                .abs()
                .min((bbox.x1 - p.x).abs())
                .min((p.y - bbox.y0).abs())
                .min((bbox.y1 - p.y).abs());
            d <= edge_band
        })
        .count();
    let rect_score = near_edges as f64 / points.len() as f64;

    tracing::debug!(
        circle_score,
        ellipse_score,
        rect_score,
        aspect,
        "closed-shape classification"
    );

    if circle_score < 0.22 && aspect < 1.4 {
        Some(ClosedShape::Circle)
    } else if rect_score > 0.70 {
        Some(ClosedShape::RoundedRect)
    } else if ellipse_score < 0.20 && aspect >= 1.4 {
        Some(ClosedShape::Ellipse)
    } else if circle_score < 0.38 {
        Some(if aspect < 1.5 {
            ClosedShape::Circle
        } else {
            ClosedShape::Ellipse
        })
    } else if rect_score > 0.50 {
        Some(ClosedShape::RoundedRect)
    } else if ellipse_score < 0.35 {
        Some(ClosedShape::Ellipse)
    } else {
        None
    }
}

// --- regeneration ---

fn round_points(center: Point, rx: f64, ry: f64) -> Vec<Point> {
    (0..SNAP_ROUND_POINTS)
        .map(|k| {
            let angle = k as f64 * 2.0 * PI / (SNAP_ROUND_POINTS - 1) as f64;
            Point::new(center.x + rx * angle.cos(), center.y + ry * angle.sin())
        })
        .collect()
}

fn rounded_rect_points(bbox: Rect) -> Vec<Point> {
    let r = (0.12 * bbox.width().min(bbox.height())).min(20.0);
    let (x0, y0, x1, y1) = (bbox.x0, bbox.y0, bbox.x1, bbox.y1);

    // Corner arc centers and their start angles, walking clockwise from
    // the top edge.
    let corners = [
        (Point::new(x1 - r, y0 + r), -PI / 2.0),
        (Point::new(x1 - r, y1 - r), 0.0),
        (Point::new(x0 + r, y1 - r), PI / 2.0),
        (Point::new(x0 + r, y0 + r), PI),
    ];

    let mut out = vec![Point::new(x0 + r, y0)];
    for (center, start_angle) in corners {
        for step in 0..=SNAP_CORNER_STEPS {
            let angle = start_angle + (step as f64 / SNAP_CORNER_STEPS as f64) * (PI / 2.0);
            out.push(Point::new(
                center.x + r * angle.cos(),
                center.y + r * angle.sin(),
            ));
        }
    }
    out.push(Point::new(x0 + r, y0));
    out
}

fn line_points(from: Point, to: Point) -> Vec<Point> {
    let chord = (to.x - from.x).hypot(to.y - from.y);
    let n = ((chord / 20.0).ceil() as usize).clamp(4, 24);
    (0..n)
        .map(|k| {
            let t = k as f64 / (n - 1) as f64;
            Point::new(from.x + (to.x - from.x) * t, from.y + (to.y - from.y) * t)
        })
        .collect()
}

// --- small helpers ---

fn points_bounds(points: &[InkPoint]) -> Rect {
    let mut min_x = f64::MAX;
    let mut min_y = f64::MAX;
    let mut max_x = f64::MIN;
    let mut max_y = f64::MIN;
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Rect::new(min_x, min_y, max_x, max_y)
}

fn centroid_radius(points: &[InkPoint]) -> (Point, f64) {
    let n = points.len() as f64;
    let cx = points.iter().map(|p| p.x).sum::<f64>() / n;
    let cy = points.iter().map(|p| p.y).sum::<f64>() / n;
    let centroid = Point::new(cx, cy);
    let avg_d = points
        .iter()
        .map(|p| (p.x - cx).hypot(p.y - cy))
        .sum::<f64>()
        / n;
    (centroid, avg_d)
}

fn perpendicular_distance(point: Point, line_start: Point, line_end: Point) -> f64 {
    let dx = line_end.x - line_start.x;
    let dy = line_end.y - line_start.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq < f64::EPSILON {
        return (point.x - line_start.x).hypot(point.y - line_start.y);
    }
    ((point.x - line_start.x) * dy - (point.y - line_start.y) * dx).abs() / len_sq.sqrt()
}

fn average(values: impl Iterator<Item = f64>) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for v in values {
        sum += v;
        count += 1;
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: f64, y: f64, t: f64) -> InkPoint {
        InkPoint::new(x, y, 0.5, t)
    }

    /// Append a 300 ms dwell cluster at the trajectory's final position.
    fn with_dwell(mut points: Vec<InkPoint>) -> Vec<InkPoint> {
        let last = *points.last().unwrap();
        for i in 1..=6 {
            points.push(pt(last.x, last.y, last.timestamp + i as f64 * 50.0));
        }
        points
    }

    #[test]
    fn test_line_snap_scenario() {
        let points = with_dwell(vec![
            pt(0.0, 0.0, 0.0),
            pt(20.0, 1.0, 50.0),
            pt(40.0, 0.0, 100.0),
            pt(60.0, -1.0, 150.0),
            pt(80.0, 0.0, 200.0),
        ]);

        match recognize(&points) {
            GestureOutcome::Snap(SnappedShape::Line, snapped) => {
                assert!(snapped.len() >= 4);
                let first = snapped.first().unwrap();
                let last = snapped.last().unwrap();
                assert!((first.x).abs() < 1e-9 && (first.y).abs() < 1e-9);
                assert!((last.x - 80.0).abs() < 1e-9 && (last.y).abs() < 1e-9);
                // Evenly spaced.
                let step = 80.0 / (snapped.len() - 1) as f64;
                for (i, p) in snapped.iter().enumerate() {
                    assert!((p.x - i as f64 * step).abs() < 1e-9);
                }
            }
            other => panic!("expected line snap, got {other:?}"),
        }
    }

    #[test]
    fn test_circle_snap_scenario() {
        let mut points: Vec<InkPoint> = (0..32)
            .map(|k| {
                let angle = k as f64 * PI / 16.0;
                pt(
                    50.0 + 30.0 * angle.cos(),
                    50.0 + 30.0 * angle.sin(),
                    k as f64 * 20.0,
                )
            })
            .collect();
        let last = *points.last().unwrap();
        points.push(pt(last.x, last.y, last.timestamp + 300.0));

        match recognize(&points) {
            GestureOutcome::Snap(SnappedShape::Circle, snapped) => {
                assert_eq!(snapped.len(), SNAP_ROUND_POINTS);
                for p in &snapped {
                    let d = (p.x - 50.0).hypot(p.y - 50.0);
                    assert!((d - 30.0).abs() < 1.0);
                }
                // The loop closes on itself.
                let first = snapped.first().unwrap();
                let last = snapped.last().unwrap();
                assert!((first.x - last.x).abs() < 1e-9);
            }
            other => panic!("expected circle snap, got {other:?}"),
        }
    }

    #[test]
    fn test_no_snap_without_dwell() {
        let points = vec![
            pt(0.0, 0.0, 0.0),
            pt(20.0, 1.0, 50.0),
            pt(40.0, 0.0, 100.0),
            pt(60.0, -1.0, 150.0),
            pt(80.0, 0.0, 200.0),
        ];
        assert_eq!(recognize(&points), GestureOutcome::Keep);
    }

    #[test]
    fn test_clock_regression_disarms_dwell() {
        let mut points = vec![
            pt(0.0, 0.0, 1000.0),
            pt(20.0, 1.0, 1050.0),
            pt(40.0, 0.0, 1100.0),
            pt(80.0, 0.0, 1150.0),
        ];
        // Still cluster whose timestamps run backwards.
        for i in 1..=6 {
            points.push(pt(80.0, 0.0, 1150.0 - i as f64 * 100.0));
        }
        assert_eq!(recognize(&points), GestureOutcome::Keep);
    }

    fn zigzag(scale: f64) -> Vec<InkPoint> {
        let mut points = Vec::new();
        let mut t = 0.0;
        for cycle in 0..5 {
            for &(x, y) in &[(20.0, -3.0), (80.0, 3.0)] {
                let wobble = cycle as f64 * 0.1;
                points.push(pt(x * scale, (y + wobble) * scale, t * scale));
                t += 15.0;
            }
        }
        points.push(pt(20.0 * scale, 0.0, t * scale));
        points.push(pt(50.0 * scale, 0.0, (t + 15.0) * scale));
        points.push(pt(20.0 * scale, 0.0, (t + 30.0) * scale));
        points.push(pt(50.0 * scale, 0.0, (t + 45.0) * scale));
        points.push(pt(20.0 * scale, 0.0, (t + 60.0) * scale));
        points
    }

    #[test]
    fn test_scratch_detection() {
        let points = zigzag(1.0);
        assert!(points.len() >= SCRATCH_MIN_POINTS);
        match recognize(&points) {
            GestureOutcome::Scratch(bbox) => {
                assert!(bbox.x0 <= 20.0 - SCRATCH_INFLATE + 1e-9);
                assert!(bbox.x1 >= 80.0 + SCRATCH_INFLATE - 1e-9);
            }
            other => panic!("expected scratch, got {other:?}"),
        }
    }

    #[test]
    fn test_scratch_scale_invariance() {
        let base = matches!(recognize(&zigzag(1.0)), GestureOutcome::Scratch(_));
        let doubled = matches!(recognize(&zigzag(2.0)), GestureOutcome::Scratch(_));
        let quadrupled = matches!(recognize(&zigzag(4.0)), GestureOutcome::Scratch(_));
        assert!(base && doubled && quadrupled);
    }

    #[test]
    fn test_short_stroke_is_never_scratch() {
        let points: Vec<InkPoint> = (0..10)
            .map(|i| pt(if i % 2 == 0 { 0.0 } else { 50.0 }, 0.0, i as f64 * 15.0))
            .collect();
        assert!(detect_scratch(&points).is_none());
    }

    #[test]
    fn test_rounded_rect_snap() {
        // Trace a 100x60 rectangle outline densely.
        let mut points = Vec::new();
        let mut t = 0.0;
        let mut push = |x: f64, y: f64, t: &mut f64| {
            points.push(pt(x, y, *t));
            *t += 15.0;
        };
        for i in 0..=10 {
            push(i as f64 * 10.0, 0.0, &mut t);
        }
        for i in 1..=6 {
            push(100.0, i as f64 * 10.0, &mut t);
        }
        for i in (0..10).rev() {
            push(i as f64 * 10.0, 60.0, &mut t);
        }
        for i in (1..6).rev() {
            push(0.0, i as f64 * 10.0, &mut t);
        }
        push(0.0, 2.0, &mut t);
        let points = with_dwell(points);

        match recognize(&points) {
            GestureOutcome::Snap(SnappedShape::RoundedRect, snapped) => {
                let bbox = points_bounds(&snapped);
                assert!((bbox.width() - 100.0).abs() < 1.0);
                assert!((bbox.height() - 60.0).abs() < 1.0);
            }
            other => panic!("expected rounded rect, got {other:?}"),
        }
    }

    #[test]
    fn test_ellipse_snap() {
        // A strongly elongated trace: wide ellipses with points hugging the
        // bbox edges score high on the rounded-rect test, so only clearly
        // eccentric shapes reach the ellipse branch.
        let mut points: Vec<InkPoint> = (0..80)
            .map(|k| {
                let angle = k as f64 * 2.0 * PI / 80.0;
                pt(
                    350.0 + 300.0 * angle.cos(),
                    50.0 + 20.0 * angle.sin(),
                    k as f64 * 20.0,
                )
            })
            .collect();
        let last = *points.last().unwrap();
        points.push(pt(last.x, last.y, last.timestamp + 300.0));

        match recognize(&points) {
            GestureOutcome::Snap(SnappedShape::Ellipse, snapped) => {
                let bbox = points_bounds(&snapped);
                assert!((bbox.width() - 600.0).abs() < 1.0);
                assert!((bbox.height() - 40.0).abs() < 1.0);
            }
            other => panic!("expected ellipse snap, got {other:?}"),
        }
    }

    #[test]
    fn test_snapped_points_preserve_pressure_and_tilt() {
        let mut points: Vec<InkPoint> = vec![
            InkPoint::new(0.0, 0.0, 0.9, 0.0).with_tilt(30.0, 0.0),
            InkPoint::new(30.0, 0.0, 0.9, 50.0).with_tilt(30.0, 0.0),
            InkPoint::new(60.0, 0.0, 0.9, 100.0).with_tilt(30.0, 0.0),
            InkPoint::new(90.0, 0.0, 0.9, 150.0).with_tilt(30.0, 0.0),
        ];
        let last = *points.last().unwrap();
        points.push(InkPoint::new(90.0, 0.0, 0.9, last.timestamp + 300.0).with_tilt(30.0, 0.0));

        if let GestureOutcome::Snap(_, snapped) = recognize(&points) {
            for p in &snapped {
                assert!((p.pressure - 0.9).abs() < 1e-9);
                assert!((p.tilt_x - 30.0).abs() < 1e-9);
            }
            // Synthetic monotonic timestamps.
            for w in snapped.windows(2) {
                assert!(w[1].timestamp > w[0].timestamp);
            }
        } else {
            panic!("expected a snap");
        }
    }
}
