//! Engine error taxonomy.
//!
//! Nothing here is fatal: every variant names a degradation path, from
//! "full sensory ink" down to "plain vector ink".

use thiserror::Error;

/// Engine errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Audio synthesis could not be initialized; visual and haptic paths
    /// continue unaffected.
    #[error("audio unavailable: {0}")]
    AudioUnavailable(String),
    /// Haptic actuator missing; pulse triggers become no-ops.
    #[error("haptics unavailable")]
    HapticUnavailable,
    /// No raster surface to draw into; exports return empty bytes.
    #[error("raster surface unavailable")]
    SurfaceUnavailable,
    /// Orphaned pointer, lost capture, or out-of-order sample. Recovered
    /// locally by ending any dangling stroke.
    #[error("pointer protocol violation: {0}")]
    PointerProtocolViolation(String),
    /// Malformed input to `load_strokes`; the prior document is preserved.
    #[error("invalid serialized drawing: {0}")]
    InvalidSerialization(String),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
