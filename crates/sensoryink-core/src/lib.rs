//! Sensory Ink Core Library
//!
//! Platform-agnostic real-time vector ink engine: pointer samples go
//! through an input-conditioning pipeline into an editable stroke
//! document, with pressure/velocity/tilt-driven geometry, camera, undo,
//! gesture recognition, and procedural audio/haptic feedback.

pub mod camera;
pub mod dispatch;
pub mod document;
pub mod engine;
pub mod error;
pub mod feedback;
pub mod gesture;
pub mod grid;
pub mod hittest;
pub mod pipeline;
pub mod render_target;
pub mod scene;
pub mod selection;
pub mod serialize;
pub mod stroke;
pub mod tessellate;

pub use camera::{Camera, MAX_ZOOM, MIN_ZOOM};
pub use dispatch::{
    InputDispatcher, PlatformCaps, PointerEvent, PointerPhase, PointerSample, PointerType,
    RoutedAction,
};
pub use document::{DocAction, Document};
pub use engine::{InkEngine, ToolMode};
pub use error::{EngineError, EngineResult};
pub use feedback::{
    haptic_interval, HapticDriver, HapticPulser, NoopHaptics, RecordingHaptics, SoundProfile,
    SurfaceVoice,
};
pub use gesture::{GestureOutcome, SnappedShape};
pub use grid::{GridType, GRID_SIZE};
pub use render_target::{
    ExportSurface, NoopSurfaceProvider, PaintCmd, RecordingTarget, RenderTarget, SurfaceProvider,
};
pub use serialize::SerializedDrawing;
pub use stroke::{Color, InkPoint, Stroke, StrokeConfig};
pub use tessellate::{StrokeGeometry, WidthSegment};
