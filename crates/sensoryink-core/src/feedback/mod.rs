//! Multimodal feedback: procedural surface noise and haptic pulses.
//!
//! Platform capabilities are injected: the synth renders samples that the
//! host pulls into its own audio device, and haptics go through a
//! [`HapticDriver`] with `Noop`/recording variants for hosts and tests.

pub mod haptics;
pub mod synth;

pub use haptics::{haptic_interval, HapticDriver, HapticPulser, NoopHaptics, RecordingHaptics};
pub use synth::{BiquadCoeffs, BiquadFilter, FilterKind, ProfileParams, SoundProfile, SurfaceVoice};
