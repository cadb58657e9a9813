//! CPU raster backend: an RGBA8 pixmap implementing the engine's paint
//! contract, with PNG encoding for exports.

use kurbo::{Affine, Point, Rect};
use peniko::Color;
use png::{BitDepth, ColorType, Encoder};
use sensoryink_core::render_target::{ExportSurface, RenderTarget, SurfaceProvider};

/// An owned RGBA8 pixel buffer the engine can paint into.
pub struct RasterTarget {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    transform: Affine,
}

impl RasterTarget {
    pub fn new(width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            pixels: vec![0; (width * height * 4) as usize],
            transform: Affine::IDENTITY,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA8 pixel data, row-major.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// The pixel at (x, y) as (r, g, b, a).
    pub fn pixel(&self, x: u32, y: u32) -> (u8, u8, u8, u8) {
        let i = ((y * self.width + x) * 4) as usize;
        (
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        )
    }

    /// Source-over blend of one pixel.
    fn blend_pixel(&mut self, x: i64, y: i64, color: Color, alpha: f64) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let alpha = alpha.clamp(0.0, 1.0);
        if alpha <= 0.0 {
            return;
        }
        let rgba = color.to_rgba8();
        let src_a = alpha * (rgba.a as f64 / 255.0);
        if src_a <= 0.0 {
            return;
        }

        let i = ((y as u32 * self.width + x as u32) * 4) as usize;
        let inv = 1.0 - src_a;
        let blend = |dst: u8, src: u8| -> u8 {
            (src as f64 * src_a + dst as f64 * inv).round().clamp(0.0, 255.0) as u8
        };
        self.pixels[i] = blend(self.pixels[i], rgba.r);
        self.pixels[i + 1] = blend(self.pixels[i + 1], rgba.g);
        self.pixels[i + 2] = blend(self.pixels[i + 2], rgba.b);
        let dst_a = self.pixels[i + 3] as f64 / 255.0;
        self.pixels[i + 3] = ((src_a + dst_a * inv) * 255.0).round().clamp(0.0, 255.0) as u8;
    }

    /// Fill every pixel whose center lies within `radius` of `center`
    /// (device space).
    fn fill_disk_device(&mut self, center: Point, radius: f64, color: Color, alpha: f64) {
        let r = radius.max(0.0);
        let x0 = (center.x - r).floor() as i64;
        let x1 = (center.x + r).ceil() as i64;
        let y0 = (center.y - r).floor() as i64;
        let y1 = (center.y + r).ceil() as i64;
        let r_sq = r * r;
        for y in y0..=y1 {
            for x in x0..=x1 {
                let dx = x as f64 + 0.5 - center.x;
                let dy = y as f64 + 0.5 - center.y;
                if dx * dx + dy * dy <= r_sq {
                    self.blend_pixel(x, y, color, alpha);
                }
            }
        }
    }

    /// Stroke a device-space segment of the given width as a rectangle
    /// with round caps.
    fn stroke_segment_device(
        &mut self,
        from: Point,
        to: Point,
        width: f64,
        color: Color,
        alpha: f64,
    ) {
        let half = (width / 2.0).max(0.25);
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        let len_sq = dx * dx + dy * dy;
        if len_sq < 1e-12 {
            self.fill_disk_device(from, half, color, alpha);
            return;
        }

        let x0 = (from.x.min(to.x) - half).floor() as i64;
        let x1 = (from.x.max(to.x) + half).ceil() as i64;
        let y0 = (from.y.min(to.y) - half).floor() as i64;
        let y1 = (from.y.max(to.y) + half).ceil() as i64;
        let half_sq = half * half;

        for y in y0..=y1 {
            for x in x0..=x1 {
                let px = x as f64 + 0.5;
                let py = y as f64 + 0.5;
                let t = ((px - from.x) * dx + (py - from.y) * dy) / len_sq;
                let t = t.clamp(0.0, 1.0);
                let cx = from.x + t * dx;
                let cy = from.y + t * dy;
                let ddx = px - cx;
                let ddy = py - cy;
                if ddx * ddx + ddy * ddy <= half_sq {
                    self.blend_pixel(x, y, color, alpha);
                }
            }
        }
    }
}

impl RenderTarget for RasterTarget {
    fn clear(&mut self, color: Color) {
        self.transform = Affine::IDENTITY;
        let rgba = color.to_rgba8();
        for chunk in self.pixels.chunks_exact_mut(4) {
            chunk[0] = rgba.r;
            chunk[1] = rgba.g;
            chunk[2] = rgba.b;
            chunk[3] = rgba.a;
        }
    }

    fn set_transform(&mut self, transform: Affine) {
        self.transform = transform;
    }

    fn fill_rect(&mut self, rect: Rect, color: Color, alpha: f64) {
        // Transform the corners; axis-aligned input stays axis-aligned
        // under the engine's scale/translate transforms.
        let a = self.transform * Point::new(rect.x0, rect.y0);
        let b = self.transform * Point::new(rect.x1, rect.y1);
        let x0 = a.x.min(b.x).floor() as i64;
        let x1 = a.x.max(b.x).ceil() as i64;
        let y0 = a.y.min(b.y).floor() as i64;
        let y1 = a.y.max(b.y).ceil() as i64;
        for y in y0..y1 {
            for x in x0..x1 {
                self.blend_pixel(x, y, color, alpha);
            }
        }
    }

    fn stroke_segment(&mut self, from: Point, to: Point, width: f64, color: Color, alpha: f64) {
        let scale = transform_scale(self.transform);
        self.stroke_segment_device(
            self.transform * from,
            self.transform * to,
            width * scale,
            color,
            alpha,
        );
    }

    fn fill_disk(&mut self, center: Point, radius: f64, color: Color, alpha: f64) {
        let scale = transform_scale(self.transform);
        self.fill_disk_device(self.transform * center, radius * scale, color, alpha);
    }
}

impl ExportSurface for RasterTarget {
    fn encode_png(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        {
            let mut encoder = Encoder::new(&mut bytes, self.width, self.height);
            encoder.set_color(ColorType::Rgba);
            encoder.set_depth(BitDepth::Eight);
            let Ok(mut writer) = encoder.write_header() else {
                return Vec::new();
            };
            if writer.write_image_data(&self.pixels).is_err() {
                return Vec::new();
            }
        }
        bytes
    }
}

/// Mean axis scale of an affine transform, used to convert widths and
/// radii into device space.
fn transform_scale(transform: Affine) -> f64 {
    let c = transform.as_coeffs();
    let sx = (c[0] * c[0] + c[1] * c[1]).sqrt();
    let sy = (c[2] * c[2] + c[3] * c[3]).sqrt();
    (sx + sy) / 2.0
}

/// Surface provider backed by [`RasterTarget`]: plug into the engine to
/// enable PNG export.
#[derive(Debug, Default)]
pub struct RasterSurfaceProvider;

impl SurfaceProvider for RasterSurfaceProvider {
    fn create(&self, width: u32, height: u32) -> Option<Box<dyn ExportSurface>> {
        Some(Box::new(RasterTarget::new(width, height)))
    }
}
