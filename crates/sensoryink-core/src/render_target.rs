//! Paint contract between the engine and rendering backends.
//!
//! The core never reaches into a toolkit type: everything it draws goes
//! through [`RenderTarget`]. Backends live in their own crates (or in the
//! host); tests use [`RecordingTarget`].

use kurbo::{Affine, Point, Rect};
use peniko::Color;

/// A surface the engine can paint into.
///
/// Coordinates passed to the drawing methods are in the space established
/// by the last `set_transform` call; widths and radii are in that same
/// space.
pub trait RenderTarget {
    /// Fill the whole surface, resetting the transform to identity.
    fn clear(&mut self, color: Color);

    /// Set the transform applied to subsequent drawing calls.
    fn set_transform(&mut self, transform: Affine);

    /// Fill an axis-aligned rectangle.
    fn fill_rect(&mut self, rect: Rect, color: Color, alpha: f64);

    /// Stroke a line segment with round caps.
    fn stroke_segment(&mut self, from: Point, to: Point, width: f64, color: Color, alpha: f64);

    /// Fill a disk.
    fn fill_disk(&mut self, center: Point, radius: f64, color: Color, alpha: f64);
}

/// A render target that can hand back its contents as PNG bytes.
pub trait ExportSurface: RenderTarget {
    fn encode_png(&self) -> Vec<u8>;
}

/// Capability for creating export surfaces. Injected into the engine; the
/// `Noop` variant models a host with no raster facility, in which case
/// image export degrades to empty bytes.
pub trait SurfaceProvider {
    fn create(&self, width: u32, height: u32) -> Option<Box<dyn ExportSurface>>;
}

/// Surface provider for hosts without raster support.
#[derive(Debug, Default)]
pub struct NoopSurfaceProvider;

impl SurfaceProvider for NoopSurfaceProvider {
    fn create(&self, _width: u32, _height: u32) -> Option<Box<dyn ExportSurface>> {
        None
    }
}

/// One recorded paint command.
#[derive(Debug, Clone, PartialEq)]
pub enum PaintCmd {
    Clear(Color),
    SetTransform(Affine),
    FillRect {
        rect: Rect,
        color: Color,
        alpha: f64,
    },
    StrokeSegment {
        from: Point,
        to: Point,
        width: f64,
        color: Color,
        alpha: f64,
    },
    FillDisk {
        center: Point,
        radius: f64,
        color: Color,
        alpha: f64,
    },
}

/// Render target that records every command it receives. Used by the test
/// suites and useful to hosts for draw-call inspection.
#[derive(Debug, Default)]
pub struct RecordingTarget {
    pub commands: Vec<PaintCmd>,
}

impl RecordingTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn segment_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, PaintCmd::StrokeSegment { .. }))
            .count()
    }

    pub fn disk_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, PaintCmd::FillDisk { .. }))
            .count()
    }
}

impl RenderTarget for RecordingTarget {
    fn clear(&mut self, color: Color) {
        self.commands.push(PaintCmd::Clear(color));
    }

    fn set_transform(&mut self, transform: Affine) {
        self.commands.push(PaintCmd::SetTransform(transform));
    }

    fn fill_rect(&mut self, rect: Rect, color: Color, alpha: f64) {
        self.commands.push(PaintCmd::FillRect { rect, color, alpha });
    }

    fn stroke_segment(&mut self, from: Point, to: Point, width: f64, color: Color, alpha: f64) {
        self.commands.push(PaintCmd::StrokeSegment {
            from,
            to,
            width,
            color,
            alpha,
        });
    }

    fn fill_disk(&mut self, center: Point, radius: f64, color: Color, alpha: f64) {
        self.commands.push(PaintCmd::FillDisk {
            center,
            radius,
            color,
            alpha,
        });
    }
}
