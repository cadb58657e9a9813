//! Grid painting: seven styles over the infinite world plane.

use crate::camera::Camera;
use crate::render_target::RenderTarget;
use kurbo::{Point, Size};
use peniko::Color;
use serde::{Deserialize, Serialize};

/// World cell size shared by all grid styles.
pub const GRID_SIZE: f64 = 40.0;

/// Grid display style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridType {
    #[default]
    None,
    Square,
    Dot,
    Ruled,
    Isometric,
    Graph,
    Hex,
}

impl GridType {
    /// Cycle to the next grid style.
    pub fn next(self) -> Self {
        match self {
            GridType::None => GridType::Square,
            GridType::Square => GridType::Dot,
            GridType::Dot => GridType::Ruled,
            GridType::Ruled => GridType::Isometric,
            GridType::Isometric => GridType::Graph,
            GridType::Graph => GridType::Hex,
            GridType::Hex => GridType::None,
        }
    }

    /// Display name for host UIs.
    pub fn name(self) -> &'static str {
        match self {
            GridType::None => "None",
            GridType::Square => "Square",
            GridType::Dot => "Dot",
            GridType::Ruled => "Ruled",
            GridType::Isometric => "Isometric",
            GridType::Graph => "Graph",
            GridType::Hex => "Hex",
        }
    }
}

fn line_color() -> Color {
    Color::from_rgba8(100, 110, 120, 255)
}

fn margin_color() -> Color {
    Color::from_rgba8(220, 80, 80, 255)
}

const LINE_ALPHA: f64 = 0.18;
const MINOR_ALPHA: f64 = 0.08;
const MARGIN_ALPHA: f64 = 0.3;

/// Paint the grid over the currently visible world rectangle.
///
/// The target transform must already map world to screen; every line is
/// stroked at `1 / zoom` so it stays hairline on screen at any zoom.
pub fn paint_grid(grid: GridType, camera: &Camera, viewport: Size, target: &mut dyn RenderTarget) {
    if grid == GridType::None {
        return;
    }

    let rect = camera.visible_world_rect(viewport);
    let hairline = 1.0 / camera.zoom;

    match grid {
        GridType::None => {}
        GridType::Square => {
            paint_lines(target, rect, GRID_SIZE, hairline, LINE_ALPHA, true, true);
        }
        GridType::Dot => {
            let radius = 1.5 / camera.zoom;
            let x0 = (rect.x0 / GRID_SIZE).floor() as i64;
            let x1 = (rect.x1 / GRID_SIZE).ceil() as i64;
            let y0 = (rect.y0 / GRID_SIZE).floor() as i64;
            let y1 = (rect.y1 / GRID_SIZE).ceil() as i64;
            for i in x0..x1 {
                for j in y0..y1 {
                    let center = Point::new(
                        i as f64 * GRID_SIZE + GRID_SIZE / 2.0,
                        j as f64 * GRID_SIZE + GRID_SIZE / 2.0,
                    );
                    target.fill_disk(center, radius, line_color(), LINE_ALPHA);
                }
            }
        }
        GridType::Ruled => {
            paint_lines(target, rect, GRID_SIZE, hairline, LINE_ALPHA, false, true);
            // Single vertical margin line.
            let x = 2.0 * GRID_SIZE;
            if x >= rect.x0 && x <= rect.x1 {
                target.stroke_segment(
                    Point::new(x, rect.y0),
                    Point::new(x, rect.y1),
                    hairline,
                    margin_color(),
                    MARGIN_ALPHA,
                );
            }
        }
        GridType::Isometric => {
            let row = GRID_SIZE * 3.0_f64.sqrt() / 2.0;
            paint_lines(target, rect, row, hairline, LINE_ALPHA, false, true);
            let slope = 3.0_f64.sqrt();
            paint_diagonals(target, rect, GRID_SIZE, slope, hairline, LINE_ALPHA);
            paint_diagonals(target, rect, GRID_SIZE, -slope, hairline, LINE_ALPHA);
        }
        GridType::Graph => {
            paint_lines(target, rect, GRID_SIZE / 4.0, hairline, MINOR_ALPHA, true, true);
            paint_lines(target, rect, GRID_SIZE, hairline, LINE_ALPHA, true, true);
        }
        GridType::Hex => {
            paint_hexes(target, rect, hairline);
        }
    }
}

fn paint_lines(
    target: &mut dyn RenderTarget,
    rect: kurbo::Rect,
    spacing: f64,
    width: f64,
    alpha: f64,
    vertical: bool,
    horizontal: bool,
) {
    if vertical {
        let start = (rect.x0 / spacing).floor() as i64;
        let end = (rect.x1 / spacing).ceil() as i64;
        for i in start..=end {
            let x = i as f64 * spacing;
            target.stroke_segment(
                Point::new(x, rect.y0),
                Point::new(x, rect.y1),
                width,
                line_color(),
                alpha,
            );
        }
    }
    if horizontal {
        let start = (rect.y0 / spacing).floor() as i64;
        let end = (rect.y1 / spacing).ceil() as i64;
        for j in start..=end {
            let y = j as f64 * spacing;
            target.stroke_segment(
                Point::new(rect.x0, y),
                Point::new(rect.x1, y),
                width,
                line_color(),
                alpha,
            );
        }
    }
}

/// A family of parallel lines with the given slope, spaced `spacing` apart
/// along the x axis, clipped to the visible rect's vertical extent.
fn paint_diagonals(
    target: &mut dyn RenderTarget,
    rect: kurbo::Rect,
    spacing: f64,
    slope: f64,
    width: f64,
    alpha: f64,
) {
    // x-intercepts (at y = 0) of lines touching the rect corners.
    let corners = [
        rect.x0 - rect.y0 / slope,
        rect.x0 - rect.y1 / slope,
        rect.x1 - rect.y0 / slope,
        rect.x1 - rect.y1 / slope,
    ];
    let min_b = corners.iter().cloned().fold(f64::INFINITY, f64::min);
    let max_b = corners.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    let start = (min_b / spacing).floor() as i64;
    let end = (max_b / spacing).ceil() as i64;
    for k in start..=end {
        let b = k as f64 * spacing;
        let from = Point::new(b + rect.y0 / slope, rect.y0);
        let to = Point::new(b + rect.y1 / slope, rect.y1);
        target.stroke_segment(from, to, width, line_color(), alpha);
    }
}

fn paint_hexes(target: &mut dyn RenderTarget, rect: kurbo::Rect, width: f64) {
    let radius = 0.6 * GRID_SIZE;
    let row_height = 1.5 * radius;
    let col_width = 3.0_f64.sqrt() * radius;

    let row0 = (rect.y0 / row_height).floor() as i64 - 1;
    let row1 = (rect.y1 / row_height).ceil() as i64 + 1;
    let col0 = (rect.x0 / col_width).floor() as i64 - 1;
    let col1 = (rect.x1 / col_width).ceil() as i64 + 1;

    for row in row0..=row1 {
        let offset = if row.rem_euclid(2) == 1 {
            col_width / 2.0
        } else {
            0.0
        };
        for col in col0..=col1 {
            let center = Point::new(col as f64 * col_width + offset, row as f64 * row_height);
            paint_hex_outline(target, center, radius, width);
        }
    }
}

/// One pointy-top hexagon outline.
fn paint_hex_outline(target: &mut dyn RenderTarget, center: Point, radius: f64, width: f64) {
    let mut vertices = [Point::ZERO; 6];
    for (k, vertex) in vertices.iter_mut().enumerate() {
        let angle = std::f64::consts::FRAC_PI_2 + k as f64 * std::f64::consts::FRAC_PI_3;
        *vertex = Point::new(
            center.x + radius * angle.cos(),
            center.y + radius * angle.sin(),
        );
    }
    for k in 0..6 {
        target.stroke_segment(
            vertices[k],
            vertices[(k + 1) % 6],
            width,
            line_color(),
            LINE_ALPHA,
        );
    }
}
