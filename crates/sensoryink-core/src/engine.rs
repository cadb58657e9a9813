//! The ink engine facade: routes input through the conditioning pipeline
//! into the document, drives feedback, and exposes every host-facing verb.

use crate::camera::Camera;
use crate::dispatch::{InputDispatcher, PlatformCaps, PointerEvent, RoutedAction};
use crate::document::Document;
use crate::error::EngineResult;
use crate::feedback::{HapticDriver, HapticPulser, NoopHaptics, SoundProfile, SurfaceVoice};
use crate::gesture::{self, GestureOutcome};
use crate::grid::GridType;
use crate::hittest::{self, TAP_SLOP};
use crate::pipeline::width::segment_width;
use crate::pipeline::{FrictionParams, InkPipeline};
use crate::render_target::{NoopSurfaceProvider, RenderTarget, SurfaceProvider};
use crate::scene;
use crate::selection::{self, HandleKind, HANDLE_HIT_TOLERANCE};
use crate::serialize::SerializedDrawing;
use crate::stroke::{Color, InkPoint, Stroke, StrokeConfig};
use crate::tessellate::WidthSegment;
use kurbo::{Point, Rect, Size, Vec2};

/// Default audio sample rate in Hz.
const DEFAULT_SAMPLE_RATE: f64 = 44_100.0;
/// Seed for the engine's noise voice.
const NOISE_SEED: u32 = 0x1D9A;
/// Translations below this world distance are not logged.
const MOVE_LOG_THRESHOLD: f64 = 0.5;
/// Screen travel below this makes a rect-select gesture a tap.
const TAP_TRAVEL: f64 = 3.0;

/// What pen/mouse pointers do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolMode {
    #[default]
    Draw,
    Select,
}

/// The stroke currently being drawn.
struct ActiveStroke {
    stroke: Stroke,
    /// Unconditioned samples in world coordinates, for gesture
    /// recognition.
    raw_points: Vec<InkPoint>,
    /// Flat segments drawn immediately while the stroke is live.
    tip_segments: Vec<WidthSegment>,
    tips_flushed: usize,
}

/// In-flight selection interaction.
enum SelectGesture {
    Idle,
    /// Two screen-space corners.
    Rect { start: Point, current: Point },
    /// A screen-space polyline.
    Lasso(Vec<Point>),
    /// Live translation in world space.
    Move {
        indices: Vec<usize>,
        last: Point,
        total: Vec2,
    },
    /// Live anisotropic scale about the opposite handle.
    Resize {
        handle: HandleKind,
        bounds: Rect,
        originals: Vec<(usize, Vec<InkPoint>)>,
        pivot: Point,
        sx: f64,
        sy: f64,
    },
}

/// The sensory ink engine.
///
/// Single-threaded and cooperative: all mutation happens on the caller's
/// loop. Feedback capabilities are injected and every one of them can be
/// absent, degrading from "full sensory ink" to "plain vector ink".
pub struct InkEngine {
    document: Document,
    camera: Camera,
    grid: GridType,
    tool_mode: ToolMode,
    brush: StrokeConfig,
    viewport: Size,

    dispatcher: InputDispatcher,
    pipeline: InkPipeline,
    active: Option<ActiveStroke>,
    select_gesture: SelectGesture,

    audio: Option<SurfaceVoice>,
    haptics: HapticPulser,
    surface_texture: f64,
    surfaces: Box<dyn SurfaceProvider>,

    needs_full_redraw: bool,
    deferred_viewport: Option<Size>,
}

impl Default for InkEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl InkEngine {
    /// Create an engine with default capabilities: deterministic audio
    /// voice, no-op haptics, no raster surface.
    pub fn new() -> Self {
        let brush = StrokeConfig::default();
        let texture = 0.5;
        Self {
            document: Document::new(),
            camera: Camera::new(),
            grid: GridType::default(),
            tool_mode: ToolMode::default(),
            pipeline: InkPipeline::new(brush.streamline, FrictionParams::from_texture(texture)),
            brush,
            viewport: Size::new(800.0, 600.0),
            dispatcher: InputDispatcher::new(PlatformCaps::default()),
            active: None,
            select_gesture: SelectGesture::Idle,
            audio: Some(SurfaceVoice::new(DEFAULT_SAMPLE_RATE, NOISE_SEED)),
            haptics: HapticPulser::new(Box::new(NoopHaptics)),
            surface_texture: texture,
            surfaces: Box::new(NoopSurfaceProvider),
            needs_full_redraw: true,
            deferred_viewport: None,
        }
    }

    /// Drop the audio voice: the engine behaves as if synthesis init
    /// failed, and visual/haptic paths continue unaffected.
    pub fn without_audio(mut self) -> Self {
        self.audio = None;
        self
    }

    pub fn with_haptics(mut self, driver: Box<dyn HapticDriver>) -> Self {
        self.haptics = HapticPulser::new(driver);
        self
    }

    pub fn with_surfaces(mut self, surfaces: Box<dyn SurfaceProvider>) -> Self {
        self.surfaces = surfaces;
        self
    }

    pub fn with_platform(mut self, caps: PlatformCaps) -> Self {
        self.dispatcher = InputDispatcher::new(caps);
        self
    }

    // --- introspection ---

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn grid_type(&self) -> GridType {
        self.grid
    }

    pub fn tool_mode(&self) -> ToolMode {
        self.tool_mode
    }

    pub fn brush(&self) -> &StrokeConfig {
        &self.brush
    }

    pub fn stroke_count(&self) -> usize {
        self.document.len()
    }

    pub fn is_drawing(&self) -> bool {
        self.active.is_some()
    }

    /// Resize handles for the current selection, in world coordinates.
    pub fn selection_handles(&self) -> Vec<selection::Handle> {
        self.document
            .selection_bounds()
            .map(selection::selection_handles)
            .unwrap_or_default()
    }

    fn invalidate(&mut self) {
        self.needs_full_redraw = true;
    }

    // --- configuration verbs ---

    /// Set the brush used for strokes started after this call; the config
    /// is frozen into each stroke at start.
    pub fn set_brush(&mut self, brush: StrokeConfig) {
        self.pipeline.set_streamline(brush.streamline);
        self.brush = brush;
    }

    pub fn set_tool_mode(&mut self, mode: ToolMode) {
        self.tool_mode = mode;
    }

    pub fn set_grid_type(&mut self, grid: GridType) {
        self.grid = grid;
        self.invalidate();
    }

    /// Raw mode: 1:1 input at the cost of visible jitter. Audio and
    /// haptics still fire.
    pub fn set_raw_mode(&mut self, raw: bool) {
        self.pipeline.raw_mode = raw;
    }

    pub fn set_motion_prediction(&mut self, enabled: bool) {
        self.pipeline.set_prediction_enabled(enabled);
    }

    /// One slider, two senses: drives friction parameters and synth
    /// timbre together.
    pub fn set_surface_texture(&mut self, texture: f64) {
        self.surface_texture = texture.clamp(0.0, 1.0);
        self.pipeline
            .set_friction_params(FrictionParams::from_texture(self.surface_texture));
        if let Some(voice) = &mut self.audio {
            voice.set_texture(self.surface_texture);
        }
    }

    pub fn surface_texture(&self) -> f64 {
        self.surface_texture
    }

    pub fn set_sound_profile(&mut self, profile: SoundProfile) {
        if let Some(voice) = &mut self.audio {
            voice.set_profile(profile);
        }
    }

    pub fn set_sound_volume(&mut self, volume: f64) {
        if let Some(voice) = &mut self.audio {
            voice.set_volume(volume);
        }
    }

    pub fn set_haptic_enabled(&mut self, enabled: bool) {
        self.haptics.enabled = enabled;
    }

    /// Pull interleaved stereo frames from the synth. Returns false (and
    /// writes silence) when audio is unavailable.
    pub fn render_audio(&mut self, out: &mut [f64]) -> bool {
        match &mut self.audio {
            Some(voice) => {
                voice.render(out);
                true
            }
            None => {
                out.fill(0.0);
                false
            }
        }
    }

    /// Apply a new viewport size, or defer it to stroke end when a stroke
    /// is live.
    pub fn resize(&mut self, width: f64, height: f64) {
        let size = Size::new(width.max(1.0), height.max(1.0));
        if self.active.is_some() {
            self.deferred_viewport = Some(size);
        } else {
            self.viewport = size;
            self.invalidate();
        }
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    // --- camera verbs ---

    /// Pan by a screen-space delta.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.camera.pan_by(Vec2::new(dx, dy));
        self.invalidate();
    }

    /// Zoom by a factor about a screen-space pivot.
    pub fn zoom(&mut self, factor: f64, pivot_x: f64, pivot_y: f64) {
        self.camera.zoom_at(Point::new(pivot_x, pivot_y), factor);
        self.invalidate();
    }

    /// Frame the camera on the whole drawing.
    pub fn fit_to_content(&mut self) {
        if let Some(bounds) = self.document.bounds() {
            self.camera.fit_to_bounds(bounds, self.viewport, 50.0);
            self.invalidate();
        }
    }

    // --- pointer-event entry ---

    /// Route one raw pointer event. Pen and mouse drive drawing or
    /// selection depending on the tool mode; touch drives the camera.
    pub fn handle_pointer(&mut self, event: &PointerEvent) {
        let actions = self.dispatcher.handle(event);
        for action in actions {
            match action {
                RoutedAction::DrawStart(s) => match self.tool_mode {
                    ToolMode::Draw => {
                        self.start_stroke(s.x, s.y, s.pressure, s.tilt_x, s.tilt_y, s.timestamp)
                    }
                    ToolMode::Select => self.begin_select_gesture(s.pos()),
                },
                RoutedAction::DrawMove(samples) => {
                    for s in samples {
                        match self.tool_mode {
                            ToolMode::Draw => self.add_point(
                                s.x,
                                s.y,
                                s.pressure,
                                s.tilt_x,
                                s.tilt_y,
                                s.timestamp,
                            ),
                            ToolMode::Select => self.update_select_gesture(s.pos()),
                        }
                    }
                }
                RoutedAction::DrawEnd(s) => match self.tool_mode {
                    ToolMode::Draw => self.end_stroke(),
                    ToolMode::Select => self.finish_select_gesture(Some(s.pos())),
                },
                RoutedAction::DrawAbort => match self.tool_mode {
                    ToolMode::Draw => self.end_stroke(),
                    ToolMode::Select => self.finish_select_gesture(None),
                },
                RoutedAction::Pan(delta) => self.pan(delta.x, delta.y),
                RoutedAction::Pinch { factor, center } => {
                    self.zoom(factor, center.x, center.y)
                }
            }
        }
    }

    // --- drawing verbs (screen-space input) ---

    pub fn start_stroke(
        &mut self,
        x: f64,
        y: f64,
        pressure: f64,
        tilt_x: f64,
        tilt_y: f64,
        timestamp: f64,
    ) {
        if self.active.is_some() {
            tracing::warn!("start_stroke while a stroke was active; ending the dangling stroke");
            self.end_stroke();
        }

        self.pipeline.reset();
        let world = self.camera.screen_to_world(Point::new(x, y));
        let raw = InkPoint::new(world.x, world.y, pressure, timestamp).with_tilt(tilt_x, tilt_y);
        let sample = self
            .pipeline
            .process(world.x, world.y, pressure, tilt_x, tilt_y, timestamp);

        let mut stroke = Stroke::new(self.brush.clone());
        stroke.points.push(sample.point);
        self.active = Some(ActiveStroke {
            stroke,
            raw_points: vec![raw],
            tip_segments: Vec::new(),
            tips_flushed: 0,
        });

        if let Some(voice) = &mut self.audio {
            voice.note_on();
            voice.set_pan(Self::pan_for(x, self.viewport.width));
        }
        self.haptics.trigger_immediate(timestamp);
        tracing::trace!(timestamp, "stroke started");
    }

    pub fn add_point(
        &mut self,
        x: f64,
        y: f64,
        pressure: f64,
        tilt_x: f64,
        tilt_y: f64,
        timestamp: f64,
    ) {
        if self.active.is_none() {
            tracing::warn!("add_point with no active stroke; sample dropped");
            return;
        }

        let world = self.camera.screen_to_world(Point::new(x, y));
        let raw = InkPoint::new(world.x, world.y, pressure, timestamp).with_tilt(tilt_x, tilt_y);
        let sample = self
            .pipeline
            .process(world.x, world.y, pressure, tilt_x, tilt_y, timestamp);

        let viewport_width = self.viewport.width;
        let Some(active) = self.active.as_mut() else {
            return;
        };
        let travel = {
            let prev_raw = active.raw_points[active.raw_points.len() - 1];
            (raw.x - prev_raw.x).hypot(raw.y - prev_raw.y)
        };
        active.raw_points.push(raw);

        let prev = active.stroke.points[active.stroke.points.len() - 1];
        active.stroke.points.push(sample.point);
        let width = segment_width(&active.stroke.config, &prev, &sample.point);
        active.tip_segments.push(WidthSegment {
            from: prev.pos(),
            to: sample.point.pos(),
            width,
        });

        if let Some(voice) = &mut self.audio {
            voice.set_velocity(sample.velocity);
            voice.set_pan(Self::pan_for(x, viewport_width));
        }
        self.haptics.trigger_grain(timestamp, travel, sample.velocity);
    }

    /// Finish the active stroke: run gesture recognition, then commit (or
    /// erase). Safe to call when no stroke is active.
    pub fn end_stroke(&mut self) {
        let Some(active) = self.active.take() else {
            tracing::warn!("end_stroke with no active stroke");
            return;
        };

        if let Some(voice) = &mut self.audio {
            voice.note_off();
        }

        match gesture::recognize(&active.raw_points) {
            GestureOutcome::Scratch(bbox) => {
                let victims: Vec<usize> = self
                    .document
                    .strokes()
                    .iter()
                    .enumerate()
                    .filter(|(_, s)| gesture::any_point_inside(&s.points, bbox))
                    .map(|(i, _)| i)
                    .collect();
                tracing::debug!(victims = victims.len(), "scratch erase");
                self.document.delete_strokes(&victims);
            }
            GestureOutcome::Snap(shape, points) => {
                tracing::debug!(?shape, "shape snapped");
                let mut stroke = active.stroke;
                stroke.points = points;
                self.document.commit_stroke(stroke);
            }
            GestureOutcome::Keep => {
                if !active.stroke.points.is_empty() {
                    self.document.commit_stroke(active.stroke);
                }
            }
        }

        if let Some(size) = self.deferred_viewport.take() {
            self.viewport = size;
        }
        self.invalidate();
    }

    fn pan_for(screen_x: f64, canvas_width: f64) -> f64 {
        ((screen_x / canvas_width.max(1.0)) * 2.0 - 1.0).clamp(-1.0, 1.0)
    }

    // --- selection verbs (screen-space input, world-space effect) ---

    /// Tap selection: topmost stroke under the point wins.
    pub fn select_stroke(&mut self, x: f64, y: f64, additive: bool) {
        let world = self.camera.screen_to_world(Point::new(x, y));
        let tolerance = TAP_SLOP / self.camera.zoom;
        match hittest::stroke_at_point(&self.document, world, tolerance) {
            Some(index) => self.document.select(index, additive),
            None => {
                if !additive {
                    self.document.clear_selection();
                }
            }
        }
        self.invalidate();
    }

    pub fn start_selection_rect(&mut self, x: f64, y: f64) {
        let p = Point::new(x, y);
        self.select_gesture = SelectGesture::Rect { start: p, current: p };
    }

    pub fn update_selection_rect(&mut self, x: f64, y: f64) {
        if let SelectGesture::Rect { current, .. } = &mut self.select_gesture {
            *current = Point::new(x, y);
        }
    }

    pub fn end_selection_rect(&mut self, additive: bool) {
        if let SelectGesture::Rect { start, current } =
            std::mem::replace(&mut self.select_gesture, SelectGesture::Idle)
        {
            let a = self.camera.screen_to_world(start);
            let b = self.camera.screen_to_world(current);
            let rect = Rect::new(a.x.min(b.x), a.y.min(b.y), a.x.max(b.x), a.y.max(b.y));
            let hits = hittest::strokes_in_rect(&self.document, rect);
            self.document.select_many(hits, additive);
            self.invalidate();
        }
    }

    pub fn start_lasso(&mut self, x: f64, y: f64) {
        self.select_gesture = SelectGesture::Lasso(vec![Point::new(x, y)]);
    }

    pub fn update_lasso(&mut self, x: f64, y: f64) {
        if let SelectGesture::Lasso(points) = &mut self.select_gesture {
            points.push(Point::new(x, y));
        }
    }

    pub fn end_lasso(&mut self, additive: bool) {
        if let SelectGesture::Lasso(points) =
            std::mem::replace(&mut self.select_gesture, SelectGesture::Idle)
        {
            let polygon: Vec<Point> = points
                .iter()
                .map(|&p| self.camera.screen_to_world(p))
                .collect();
            let hits = hittest::strokes_in_polygon(&self.document, &polygon);
            self.document.select_many(hits, additive);
            self.invalidate();
        }
    }

    pub fn start_move_selected(&mut self, x: f64, y: f64) {
        if self.document.selection().is_empty() {
            return;
        }
        let world = self.camera.screen_to_world(Point::new(x, y));
        self.select_gesture = SelectGesture::Move {
            indices: self.document.selection_sorted(),
            last: world,
            total: Vec2::ZERO,
        };
    }

    pub fn update_move_selected(&mut self, x: f64, y: f64) {
        let world = self.camera.screen_to_world(Point::new(x, y));
        if let SelectGesture::Move { indices, last, total } = &mut self.select_gesture {
            let delta = Vec2::new(world.x - last.x, world.y - last.y);
            for &index in indices.iter() {
                if let Some(stroke) = self.document.stroke_mut(index) {
                    stroke.translate(delta);
                }
            }
            *total += delta;
            *last = world;
            self.needs_full_redraw = true;
        }
    }

    /// Finish a translation: logs one move action when the total travel
    /// exceeds half a world pixel, otherwise reverts the sub-pixel drift.
    pub fn end_move_selected(&mut self) {
        if let SelectGesture::Move { indices, total, .. } =
            std::mem::replace(&mut self.select_gesture, SelectGesture::Idle)
        {
            if total.hypot() > MOVE_LOG_THRESHOLD {
                self.document.log_translate(indices, total);
            } else {
                for &index in &indices {
                    if let Some(stroke) = self.document.stroke_mut(index) {
                        stroke.translate(-total);
                    }
                }
            }
            self.invalidate();
        }
    }

    /// Grab a resize handle. Returns false when no handle is under the
    /// point.
    pub fn start_resize_selected(&mut self, x: f64, y: f64) -> bool {
        let Some(bounds) = self.document.selection_bounds() else {
            return false;
        };
        let world = self.camera.screen_to_world(Point::new(x, y));
        let tolerance = HANDLE_HIT_TOLERANCE / self.camera.zoom;
        let Some(handle) = selection::hit_test_handles(bounds, world, tolerance) else {
            return false;
        };

        let originals: Vec<(usize, Vec<InkPoint>)> = self
            .document
            .selection_sorted()
            .into_iter()
            .filter_map(|i| self.document.stroke(i).map(|s| (i, s.points.clone())))
            .collect();
        let pivot = handle.opposite().anchor(bounds);
        self.select_gesture = SelectGesture::Resize {
            handle,
            bounds,
            originals,
            pivot,
            sx: 1.0,
            sy: 1.0,
        };
        true
    }

    pub fn update_resize_selected(&mut self, x: f64, y: f64) {
        let world = self.camera.screen_to_world(Point::new(x, y));
        if let SelectGesture::Resize {
            handle,
            bounds,
            originals,
            pivot,
            sx,
            sy,
        } = &mut self.select_gesture
        {
            let (new_pivot, new_sx, new_sy) = selection::drag_scale(*handle, *bounds, world);
            *pivot = new_pivot;
            *sx = new_sx;
            *sy = new_sy;
            // Rebuild from the originals each update so repeated drags do
            // not accumulate rounding error.
            for (index, points) in originals.iter() {
                if let Some(stroke) = self.document.stroke_mut(*index) {
                    stroke.points = points.clone();
                    stroke.scale_about(new_pivot, new_sx, new_sy);
                }
            }
            self.needs_full_redraw = true;
        }
    }

    pub fn end_resize_selected(&mut self) {
        if let SelectGesture::Resize {
            originals,
            pivot,
            sx,
            sy,
            ..
        } = std::mem::replace(&mut self.select_gesture, SelectGesture::Idle)
        {
            if sx != 1.0 || sy != 1.0 {
                self.document.log_scale(originals, pivot, sx, sy);
            }
            self.invalidate();
        }
    }

    pub fn delete_selected(&mut self) {
        let indices = self.document.selection_sorted();
        self.document.delete_strokes(&indices);
        self.invalidate();
    }

    pub fn change_selected_color(&mut self, color: Color) {
        let indices = self.document.selection_sorted();
        self.document.recolor_strokes(&indices, color);
        self.invalidate();
    }

    pub fn clear_selection(&mut self) {
        self.document.clear_selection();
        self.invalidate();
    }

    pub fn select_all(&mut self) {
        self.document.select_all();
        self.invalidate();
    }

    // --- default select-mode pointer gesture ---

    fn begin_select_gesture(&mut self, screen: Point) {
        if self.start_resize_selected(screen.x, screen.y) {
            return;
        }
        let world = self.camera.screen_to_world(screen);
        let tolerance = TAP_SLOP / self.camera.zoom;
        if let Some(hit) = hittest::stroke_at_point(&self.document, world, tolerance) {
            if self.document.is_selected(hit) {
                self.start_move_selected(screen.x, screen.y);
                return;
            }
        }
        self.start_selection_rect(screen.x, screen.y);
    }

    fn update_select_gesture(&mut self, screen: Point) {
        match &self.select_gesture {
            SelectGesture::Rect { .. } => self.update_selection_rect(screen.x, screen.y),
            SelectGesture::Lasso(_) => self.update_lasso(screen.x, screen.y),
            SelectGesture::Move { .. } => self.update_move_selected(screen.x, screen.y),
            SelectGesture::Resize { .. } => self.update_resize_selected(screen.x, screen.y),
            SelectGesture::Idle => {}
        }
    }

    fn finish_select_gesture(&mut self, screen: Option<Point>) {
        match &self.select_gesture {
            SelectGesture::Rect { start, current } => {
                let travel = (current.x - start.x).hypot(current.y - start.y);
                let start = *start;
                if travel < TAP_TRAVEL {
                    self.select_gesture = SelectGesture::Idle;
                    let p = screen.unwrap_or(start);
                    self.select_stroke(p.x, p.y, false);
                } else {
                    self.end_selection_rect(false);
                }
            }
            SelectGesture::Lasso(_) => self.end_lasso(false),
            SelectGesture::Move { .. } => self.end_move_selected(),
            SelectGesture::Resize { .. } => self.end_resize_selected(),
            SelectGesture::Idle => {}
        }
    }

    // --- history ---

    pub fn undo(&mut self) -> bool {
        let done = self.document.undo();
        if done {
            self.invalidate();
        }
        done
    }

    pub fn redo(&mut self) -> bool {
        let done = self.document.redo();
        if done {
            self.invalidate();
        }
        done
    }

    pub fn can_undo(&self) -> bool {
        self.document.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.document.can_redo()
    }

    /// Delete every stroke as one reversible action.
    pub fn clear_all(&mut self) {
        self.document.clear_all();
        self.invalidate();
    }

    // --- painting & export ---

    /// Paint into the host's target. During an active stroke only the
    /// newly arrived tip segments are drawn (as flat lines); any other
    /// state change triggers a full repaint, which replaces the tips with
    /// the proper curve rendering.
    pub fn paint(&mut self, target: &mut dyn RenderTarget) {
        if self.needs_full_redraw || self.active.is_none() {
            scene::paint_scene(&self.document, &self.camera, self.grid, self.viewport, target);
            if let Some(active) = &mut self.active {
                let color: peniko::Color = active.stroke.config.color.into();
                let alpha = active.stroke.config.opacity;
                for seg in &active.tip_segments {
                    target.stroke_segment(seg.from, seg.to, seg.width, color, alpha);
                }
                active.tips_flushed = active.tip_segments.len();
            }
            self.needs_full_redraw = false;
        } else if let Some(active) = &mut self.active {
            target.set_transform(self.camera.transform());
            let color: peniko::Color = active.stroke.config.color.into();
            let alpha = active.stroke.config.opacity;
            for seg in &active.tip_segments[active.tips_flushed..] {
                target.stroke_segment(seg.from, seg.to, seg.width, color, alpha);
            }
            active.tips_flushed = active.tip_segments.len();
        }
    }

    /// Export the visible view as a 2x-oversampled PNG. Returns empty
    /// bytes when no raster surface is available.
    pub fn export_image(&self) -> Vec<u8> {
        let width = (self.viewport.width * 2.0).round().max(1.0) as u32;
        let height = (self.viewport.height * 2.0).round().max(1.0) as u32;
        let Some(mut surface) = self.surfaces.create(width, height) else {
            tracing::warn!("image export requested without a raster surface");
            return Vec::new();
        };

        // Double the zoom: the same world view, sampled at 2x.
        let export_camera = Camera {
            pan: self.camera.pan,
            zoom: self.camera.zoom * 2.0,
        };
        let export_viewport = Size::new(self.viewport.width * 2.0, self.viewport.height * 2.0);
        scene::paint_scene(
            &self.document,
            &export_camera,
            self.grid,
            export_viewport,
            &mut *surface,
        );
        surface.encode_png()
    }

    /// Deep-copy the document into the version-1 wire format.
    pub fn export_strokes(&self) -> SerializedDrawing {
        SerializedDrawing::from_document(&self.document, self.grid)
    }

    /// Replace the document from wire data. On malformed input the prior
    /// document, history, and selection are preserved.
    pub fn load_strokes(&mut self, drawing: SerializedDrawing) -> EngineResult<()> {
        drawing.validate()?;
        self.document.replace_strokes(drawing.strokes);
        self.grid = drawing.grid_type;
        self.invalidate();
        Ok(())
    }

    /// Parse and load a JSON drawing. The document is untouched unless the
    /// input fully parses and validates.
    pub fn load_strokes_json(&mut self, json: &str) -> EngineResult<()> {
        match SerializedDrawing::from_json(json) {
            Ok(drawing) => self.load_strokes(drawing),
            Err(err) => {
                tracing::warn!(%err, "rejected serialized drawing");
                Err(err)
            }
        }
    }
}

impl std::fmt::Debug for InkEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InkEngine")
            .field("strokes", &self.document.len())
            .field("zoom", &self.camera.zoom)
            .field("grid", &self.grid)
            .field("drawing", &self.active.is_some())
            .finish()
    }
}
