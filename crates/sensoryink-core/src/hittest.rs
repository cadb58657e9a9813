//! Hit-testing and selection queries over stroke geometry.

use crate::document::Document;
use crate::stroke::Stroke;
use kurbo::{Point, Rect, Vec2};

/// Screen-space slop added to a stroke's half width when tapping, divided
/// by zoom before use.
pub const TAP_SLOP: f64 = 12.0;

/// Distance from a point to a line segment (a→b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = Vec2::new(b.x - a.x, b.y - a.y);
    let pv = Vec2::new(point.x - a.x, point.y - a.y);
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = Point::new(a.x + t * seg.x, a.y + t * seg.y);
    ((point.x - proj.x).powi(2) + (point.y - proj.y).powi(2)).sqrt()
}

/// Minimum distance from a point to a polyline.
pub fn point_to_polyline_dist(point: Point, points: &[Point]) -> f64 {
    points
        .windows(2)
        .map(|w| point_to_segment_dist(point, w[0], w[1]))
        .fold(f64::INFINITY, f64::min)
}

/// Test whether a world point hits a stroke.
///
/// `tolerance` is the full slop in world units (typically `12 / zoom`);
/// it is added to the stroke's half width. The bounding box, inflated the
/// same way, pre-filters before per-segment distance tests.
pub fn hit_test_stroke(stroke: &Stroke, point: Point, tolerance: f64) -> bool {
    if stroke.points.is_empty() {
        return false;
    }
    let reach = stroke.config.base_stroke_width / 2.0 + tolerance;

    if !stroke.bounds().inflate(reach, reach).contains(point) {
        return false;
    }

    if stroke.points.len() == 1 {
        let p = stroke.points[0].pos();
        return (point.x - p.x).hypot(point.y - p.y) <= reach;
    }

    stroke.points.windows(2).any(|w| {
        point_to_segment_dist(point, w[0].pos(), w[1].pos()) <= reach
    })
}

/// Find the topmost stroke at a world point, iterating in reverse render
/// order so the stroke painted last wins.
pub fn stroke_at_point(document: &Document, point: Point, tolerance: f64) -> Option<usize> {
    document
        .strokes()
        .iter()
        .enumerate()
        .rev()
        .find(|(_, stroke)| hit_test_stroke(stroke, point, tolerance))
        .map(|(index, _)| index)
}

/// All strokes whose world bounding box overlaps the given rectangle.
/// Overlap, not containment: a stroke partially inside is selected.
pub fn strokes_in_rect(document: &Document, rect: Rect) -> Vec<usize> {
    document
        .strokes()
        .iter()
        .enumerate()
        .filter(|(_, stroke)| {
            let bounds = stroke.bounds();
            rect.x0 <= bounds.x1 && rect.x1 >= bounds.x0 && rect.y0 <= bounds.y1 && rect.y1 >= bounds.y0
        })
        .map(|(index, _)| index)
        .collect()
}

/// All strokes whose bounding-box center lies strictly inside the polygon.
/// Points on the boundary count as outside.
pub fn strokes_in_polygon(document: &Document, polygon: &[Point]) -> Vec<usize> {
    if polygon.len() < 3 {
        return Vec::new();
    }
    document
        .strokes()
        .iter()
        .enumerate()
        .filter(|(_, stroke)| point_in_polygon(stroke.bounds().center(), polygon))
        .map(|(index, _)| index)
        .collect()
}

/// Point-in-polygon via ray casting. Boundary points are outside.
pub fn point_in_polygon(point: Point, polygon: &[Point]) -> bool {
    let mut inside = false;
    let n = polygon.len();
    let mut j = n - 1;
    for i in 0..n {
        let pi = polygon[i];
        let pj = polygon[j];
        if (pi.y > point.y) != (pj.y > point.y) {
            let x_cross = (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x;
            if point.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stroke::{InkPoint, StrokeConfig};

    fn line_stroke(x0: f64, y0: f64, x1: f64, y1: f64) -> Stroke {
        Stroke::from_points(
            StrokeConfig::default(),
            vec![
                InkPoint::new(x0, y0, 0.5, 0.0),
                InkPoint::new(x1, y1, 0.5, 10.0),
            ],
        )
    }

    #[test]
    fn test_segment_distance() {
        let d = point_to_segment_dist(
            Point::new(50.0, 10.0),
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
        );
        assert!((d - 10.0).abs() < 1e-12);

        // Beyond the endpoint the distance is to the endpoint itself.
        let d = point_to_segment_dist(
            Point::new(110.0, 0.0),
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
        );
        assert!((d - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_hit_test_stroke() {
        let stroke = line_stroke(0.0, 0.0, 100.0, 0.0);
        assert!(hit_test_stroke(&stroke, Point::new(50.0, 2.0), 4.0));
        assert!(!hit_test_stroke(&stroke, Point::new(50.0, 30.0), 4.0));
    }

    #[test]
    fn test_topmost_stroke_wins() {
        let mut doc = Document::new();
        doc.commit_stroke(line_stroke(0.0, 0.0, 100.0, 0.0));
        doc.commit_stroke(line_stroke(0.0, 1.0, 100.0, 1.0));

        let hit = stroke_at_point(&doc, Point::new(50.0, 0.5), 5.0);
        assert_eq!(hit, Some(1));
    }

    #[test]
    fn test_rect_overlap_selection() {
        let mut doc = Document::new();
        doc.commit_stroke(line_stroke(0.0, 0.0, 10.0, 10.0));
        doc.commit_stroke(line_stroke(20.0, 20.0, 30.0, 30.0));

        // Overlaps both bounding boxes.
        let hits = strokes_in_rect(&doc, Rect::new(5.0, 5.0, 25.0, 25.0));
        assert_eq!(hits, vec![0, 1]);
    }

    #[test]
    fn test_lasso_boundary_center_is_outside() {
        let mut doc = Document::new();
        doc.commit_stroke(line_stroke(0.0, 0.0, 10.0, 10.0)); // center (5,5)
        doc.commit_stroke(line_stroke(20.0, 20.0, 30.0, 30.0)); // center (25,25)

        let lasso = [
            Point::new(5.0, 5.0),
            Point::new(25.0, 5.0),
            Point::new(25.0, 25.0),
            Point::new(5.0, 25.0),
        ];
        // (5,5) is a vertex and (25,25) lies on the boundary: the ray-cast
        // rule must not select the second stroke.
        let hits = strokes_in_polygon(&doc, &lasso);
        assert!(!hits.contains(&1));
    }

    #[test]
    fn test_point_in_polygon() {
        let square = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ];
        assert!(point_in_polygon(Point::new(5.0, 5.0), &square));
        assert!(!point_in_polygon(Point::new(15.0, 5.0), &square));
    }
}
