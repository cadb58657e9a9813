//! Selection resize handles: eight grips derived from the selection's
//! world bounding box.

use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Handle hit tolerance in screen pixels (divide by zoom before use).
pub const HANDLE_HIT_TOLERANCE: f64 = 12.0;
/// Smallest scale factor a handle drag can produce.
pub const MIN_SCALE: f64 = 0.01;

/// Corner positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Edge midpoint positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

/// Type of selection handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleKind {
    Corner(Corner),
    Edge(Edge),
}

impl HandleKind {
    /// The handle's position on a bounding box.
    pub fn anchor(self, bounds: Rect) -> Point {
        let center = bounds.center();
        match self {
            HandleKind::Corner(Corner::TopLeft) => Point::new(bounds.x0, bounds.y0),
            HandleKind::Corner(Corner::TopRight) => Point::new(bounds.x1, bounds.y0),
            HandleKind::Corner(Corner::BottomLeft) => Point::new(bounds.x0, bounds.y1),
            HandleKind::Corner(Corner::BottomRight) => Point::new(bounds.x1, bounds.y1),
            HandleKind::Edge(Edge::Top) => Point::new(center.x, bounds.y0),
            HandleKind::Edge(Edge::Right) => Point::new(bounds.x1, center.y),
            HandleKind::Edge(Edge::Bottom) => Point::new(center.x, bounds.y1),
            HandleKind::Edge(Edge::Left) => Point::new(bounds.x0, center.y),
        }
    }

    /// The scale pivot: the handle diagonally or directly opposite.
    pub fn opposite(self) -> HandleKind {
        match self {
            HandleKind::Corner(Corner::TopLeft) => HandleKind::Corner(Corner::BottomRight),
            HandleKind::Corner(Corner::TopRight) => HandleKind::Corner(Corner::BottomLeft),
            HandleKind::Corner(Corner::BottomLeft) => HandleKind::Corner(Corner::TopRight),
            HandleKind::Corner(Corner::BottomRight) => HandleKind::Corner(Corner::TopLeft),
            HandleKind::Edge(Edge::Top) => HandleKind::Edge(Edge::Bottom),
            HandleKind::Edge(Edge::Right) => HandleKind::Edge(Edge::Left),
            HandleKind::Edge(Edge::Bottom) => HandleKind::Edge(Edge::Top),
            HandleKind::Edge(Edge::Left) => HandleKind::Edge(Edge::Right),
        }
    }

    /// Which axes this handle scales: corners scale both, edges one.
    pub fn scale_axes(self) -> (bool, bool) {
        match self {
            HandleKind::Corner(_) => (true, true),
            HandleKind::Edge(Edge::Left) | HandleKind::Edge(Edge::Right) => (true, false),
            HandleKind::Edge(Edge::Top) | HandleKind::Edge(Edge::Bottom) => (false, true),
        }
    }
}

/// A handle with its world position.
#[derive(Debug, Clone, Copy)]
pub struct Handle {
    pub position: Point,
    pub kind: HandleKind,
}

/// All eight handles for a selection bounding box.
pub fn selection_handles(bounds: Rect) -> Vec<Handle> {
    use Corner::*;
    use Edge::*;
    [
        HandleKind::Corner(TopLeft),
        HandleKind::Corner(TopRight),
        HandleKind::Corner(BottomLeft),
        HandleKind::Corner(BottomRight),
        HandleKind::Edge(Top),
        HandleKind::Edge(Right),
        HandleKind::Edge(Bottom),
        HandleKind::Edge(Left),
    ]
    .into_iter()
    .map(|kind| Handle {
        position: kind.anchor(bounds),
        kind,
    })
    .collect()
}

/// Find the handle under a world point, if any.
pub fn hit_test_handles(bounds: Rect, point: Point, tolerance: f64) -> Option<HandleKind> {
    selection_handles(bounds).into_iter().find_map(|handle| {
        let dx = point.x - handle.position.x;
        let dy = point.y - handle.position.y;
        (dx * dx + dy * dy <= tolerance * tolerance).then_some(handle.kind)
    })
}

/// Scale factors for dragging `handle` from its anchor to `cursor`, about
/// the opposite handle's anchor. Axes the handle does not control stay at
/// 1; factors are kept away from zero.
pub fn drag_scale(handle: HandleKind, bounds: Rect, cursor: Point) -> (Point, f64, f64) {
    let pivot = handle.opposite().anchor(bounds);
    let anchor = handle.anchor(bounds);
    let (scale_x, scale_y) = handle.scale_axes();

    let sx = if scale_x {
        scaled_factor(anchor.x, pivot.x, cursor.x)
    } else {
        1.0
    };
    let sy = if scale_y {
        scaled_factor(anchor.y, pivot.y, cursor.y)
    } else {
        1.0
    };
    (pivot, sx, sy)
}

fn scaled_factor(anchor: f64, pivot: f64, cursor: f64) -> f64 {
    let base = anchor - pivot;
    if base.abs() < f64::EPSILON {
        return 1.0;
    }
    let s = (cursor - pivot) / base;
    if s.abs() < MIN_SCALE {
        if s < 0.0 {
            -MIN_SCALE
        } else {
            MIN_SCALE
        }
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> Rect {
        Rect::new(10.0, 20.0, 110.0, 80.0)
    }

    #[test]
    fn test_eight_handles() {
        let handles = selection_handles(bounds());
        assert_eq!(handles.len(), 8);
    }

    #[test]
    fn test_opposite_pivot() {
        let kind = HandleKind::Corner(Corner::BottomRight);
        let pivot = kind.opposite().anchor(bounds());
        assert!((pivot.x - 10.0).abs() < f64::EPSILON);
        assert!((pivot.y - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_hit_test() {
        let hit = hit_test_handles(bounds(), Point::new(109.0, 79.0), 5.0);
        assert_eq!(hit, Some(HandleKind::Corner(Corner::BottomRight)));
        assert_eq!(hit_test_handles(bounds(), Point::new(60.0, 50.0), 5.0), None);
    }

    #[test]
    fn test_corner_drag_scales_both_axes() {
        let kind = HandleKind::Corner(Corner::BottomRight);
        let (pivot, sx, sy) = drag_scale(kind, bounds(), Point::new(210.0, 140.0));
        assert!((pivot.x - 10.0).abs() < f64::EPSILON);
        assert!((sx - 2.0).abs() < 1e-12);
        assert!((sy - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_edge_drag_scales_one_axis() {
        let kind = HandleKind::Edge(Edge::Right);
        let (_, sx, sy) = drag_scale(kind, bounds(), Point::new(60.0, 999.0));
        assert!((sx - 0.5).abs() < 1e-12);
        assert!((sy - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_scale_never_reaches_zero() {
        let kind = HandleKind::Corner(Corner::BottomRight);
        let (pivot, sx, _) = drag_scale(kind, bounds(), Point::new(10.0, 20.0));
        assert!((pivot.x - 10.0).abs() < f64::EPSILON);
        assert!(sx.abs() >= MIN_SCALE);
    }
}
