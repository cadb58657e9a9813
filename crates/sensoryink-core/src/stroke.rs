//! Stroke data model: points, render configuration, committed strokes.

use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Serializable color representation (sRGB, RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    /// The paper fill used behind every drawing (`#f9f9f9`).
    pub fn paper() -> Self {
        Self::new(249, 249, 249, 255)
    }
}

impl From<peniko::Color> for Color {
    fn from(color: peniko::Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<Color> for peniko::Color {
    fn from(color: Color) -> Self {
        peniko::Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// One conditioned pointer sample in world coordinates.
///
/// `pressure` is normalized to `[0, 1]`, `timestamp` is monotonic
/// milliseconds, tilt angles are degrees in `[-90, 90]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InkPoint {
    pub x: f64,
    pub y: f64,
    pub pressure: f64,
    pub timestamp: f64,
    #[serde(default)]
    pub tilt_x: f64,
    #[serde(default)]
    pub tilt_y: f64,
}

impl InkPoint {
    pub fn new(x: f64, y: f64, pressure: f64, timestamp: f64) -> Self {
        Self {
            x,
            y,
            pressure,
            timestamp,
            tilt_x: 0.0,
            tilt_y: 0.0,
        }
    }

    pub fn with_tilt(mut self, tilt_x: f64, tilt_y: f64) -> Self {
        self.tilt_x = tilt_x;
        self.tilt_y = tilt_y;
        self
    }

    pub fn pos(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Total tilt magnitude in degrees.
    pub fn tilt_magnitude(&self) -> f64 {
        self.tilt_x.hypot(self.tilt_y)
    }
}

/// Render configuration, frozen per stroke at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrokeConfig {
    /// Base stroke width in world pixels.
    pub base_stroke_width: f64,
    /// Lower clamp for the computed width.
    pub min_width: f64,
    /// Upper clamp for the computed width.
    pub max_width: f64,
    /// Catmull-Rom tension in `[0, 1]`.
    pub smoothness: f64,
    /// Velocity thinning intensity in `[0, 1]`.
    pub velocity_influence: f64,
    /// Pressure response, `>= 0`.
    pub pressure_influence: f64,
    /// Stroke color.
    pub color: Color,
    /// Overall opacity in `[0, 1]`.
    pub opacity: f64,
    /// Streamline smoothing intensity in `[0, 1]`.
    pub streamline: f64,
}

impl Default for StrokeConfig {
    fn default() -> Self {
        Self {
            base_stroke_width: 3.0,
            min_width: 0.5,
            max_width: 12.0,
            smoothness: 0.5,
            velocity_influence: 0.3,
            pressure_influence: 1.0,
            color: Color::black(),
            opacity: 1.0,
            streamline: 0.5,
        }
    }
}

/// A committed stroke: an ordered point sequence plus its frozen config.
///
/// Timestamps are non-decreasing. After commit, points are mutated only by
/// bulk translation/scaling from undoable actions; pressure and tilt never
/// change, and color changes only by replacing the config's color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub config: StrokeConfig,
    pub points: Vec<InkPoint>,
}

impl Stroke {
    pub fn new(config: StrokeConfig) -> Self {
        Self {
            config,
            points: Vec::new(),
        }
    }

    pub fn from_points(config: StrokeConfig, points: Vec<InkPoint>) -> Self {
        Self { config, points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Bounding box of the point positions in world coordinates.
    pub fn bounds(&self) -> Rect {
        if self.points.is_empty() {
            return Rect::ZERO;
        }

        let mut min_x = f64::MAX;
        let mut min_y = f64::MAX;
        let mut max_x = f64::MIN;
        let mut max_y = f64::MIN;

        for point in &self.points {
            min_x = min_x.min(point.x);
            min_y = min_y.min(point.y);
            max_x = max_x.max(point.x);
            max_y = max_y.max(point.y);
        }

        Rect::new(min_x, min_y, max_x, max_y)
    }

    /// Translate every point by a world-space delta.
    pub fn translate(&mut self, delta: Vec2) {
        for point in &mut self.points {
            point.x += delta.x;
            point.y += delta.y;
        }
    }

    /// Scale every point about a world-space pivot.
    pub fn scale_about(&mut self, pivot: Point, sx: f64, sy: f64) {
        for point in &mut self.points {
            point.x = pivot.x + (point.x - pivot.x) * sx;
            point.y = pivot.y + (point.y - pivot.y) * sy;
        }
    }

    /// Total polyline length in world pixels.
    pub fn path_length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| (w[1].x - w[0].x).hypot(w[1].y - w[0].y))
            .sum()
    }

    /// Mean pressure over all points (0.5 for an empty stroke).
    pub fn average_pressure(&self) -> f64 {
        if self.points.is_empty() {
            return 0.5;
        }
        self.points.iter().map(|p| p.pressure).sum::<f64>() / self.points.len() as f64
    }

    /// Mean tilt over all points.
    pub fn average_tilt(&self) -> (f64, f64) {
        if self.points.is_empty() {
            return (0.0, 0.0);
        }
        let n = self.points.len() as f64;
        let tx = self.points.iter().map(|p| p.tilt_x).sum::<f64>() / n;
        let ty = self.points.iter().map(|p| p.tilt_y).sum::<f64>() / n;
        (tx, ty)
    }
}
