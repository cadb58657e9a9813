//! Shared paint path: paper fill, grid, then strokes, oldest first.

use crate::camera::Camera;
use crate::document::Document;
use crate::grid::{paint_grid, GridType};
use crate::render_target::RenderTarget;
use crate::stroke::{Color, Stroke};
use crate::tessellate::{tessellate, StrokeGeometry};
use kurbo::Size;

/// Paint the full scene into a target whose pixel space matches `viewport`.
pub fn paint_scene(
    document: &Document,
    camera: &Camera,
    grid: GridType,
    viewport: Size,
    target: &mut dyn RenderTarget,
) {
    target.clear(Color::paper().into());
    target.set_transform(camera.transform());
    paint_grid(grid, camera, viewport, target);
    for stroke in document.strokes() {
        paint_stroke(stroke, target);
    }
}

/// Paint one stroke in world coordinates.
pub fn paint_stroke(stroke: &Stroke, target: &mut dyn RenderTarget) {
    let color: peniko::Color = stroke.config.color.into();
    let alpha = stroke.config.opacity;
    match tessellate(stroke) {
        StrokeGeometry::Dot { center, radius } => {
            target.fill_disk(center, radius, color, alpha);
        }
        StrokeGeometry::Polyline(segments) => {
            for segment in segments {
                target.stroke_segment(segment.from, segment.to, segment.width, color, alpha);
            }
        }
    }
}
