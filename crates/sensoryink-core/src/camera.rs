//! Camera module for pan/zoom transforms.

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Minimum allowed zoom level.
pub const MIN_ZOOM: f64 = 0.2;
/// Maximum allowed zoom level.
pub const MAX_ZOOM: f64 = 5.0;

/// Camera manages the view transform for the canvas.
///
/// The forward transform is `screen = (world + pan) * zoom`; all stroke,
/// grid, and hit-test math happens in world coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Camera {
    /// Current translation offset in world units.
    pub pan: Vec2,
    /// Current zoom level.
    pub zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

impl Camera {
    /// Create a new camera at identity pan/zoom.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the affine transform converting world to screen coordinates.
    pub fn transform(&self) -> Affine {
        Affine::scale(self.zoom) * Affine::translate(self.pan)
    }

    /// Convert a screen point to world coordinates.
    pub fn screen_to_world(&self, screen_point: Point) -> Point {
        Point::new(
            screen_point.x / self.zoom - self.pan.x,
            screen_point.y / self.zoom - self.pan.y,
        )
    }

    /// Convert a world point to screen coordinates.
    pub fn world_to_screen(&self, world_point: Point) -> Point {
        Point::new(
            (world_point.x + self.pan.x) * self.zoom,
            (world_point.y + self.pan.y) * self.zoom,
        )
    }

    /// Pan the camera by a delta in screen coordinates.
    pub fn pan_by(&mut self, delta: Vec2) {
        self.pan += delta / self.zoom;
    }

    /// Zoom the camera by a factor, keeping the given screen point fixed.
    ///
    /// The world point under the pivot is invariant across the operation.
    pub fn zoom_at(&mut self, screen_pivot: Point, factor: f64) {
        let new_zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        if (new_zoom - self.zoom).abs() < f64::EPSILON {
            return;
        }

        let world_point = self.screen_to_world(screen_pivot);
        self.zoom = new_zoom;

        // Solve screen_pivot = (world_point + pan) * zoom for pan.
        self.pan = Vec2::new(
            screen_pivot.x / self.zoom - world_point.x,
            screen_pivot.y / self.zoom - world_point.y,
        );
    }

    /// Reset camera to identity pan and zoom.
    pub fn reset(&mut self) {
        self.pan = Vec2::ZERO;
        self.zoom = 1.0;
    }

    /// The world rectangle currently visible in a viewport of the given
    /// screen size.
    pub fn visible_world_rect(&self, viewport: Size) -> Rect {
        let top_left = self.screen_to_world(Point::ZERO);
        let bottom_right = self.screen_to_world(Point::new(viewport.width, viewport.height));
        Rect::new(top_left.x, top_left.y, bottom_right.x, bottom_right.y)
    }

    /// Frame the camera on the given world bounds with screen-space padding.
    pub fn fit_to_bounds(&mut self, bounds: Rect, viewport: Size, padding: f64) {
        if bounds.is_zero_area() {
            self.reset();
            return;
        }

        let padded = Size::new(
            (viewport.width - padding * 2.0).max(1.0),
            (viewport.height - padding * 2.0).max(1.0),
        );
        let scale_x = padded.width / bounds.width();
        let scale_y = padded.height / bounds.height();
        self.zoom = scale_x.min(scale_y).clamp(MIN_ZOOM, MAX_ZOOM);

        let center = bounds.center();
        self.pan = Vec2::new(
            viewport.width / (2.0 * self.zoom) - center.x,
            viewport.height / (2.0 * self.zoom) - center.y,
        );
    }
}
