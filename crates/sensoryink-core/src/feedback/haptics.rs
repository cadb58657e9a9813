//! Rate-limited haptic pulses behind a swappable driver.

/// Pulse length for the stroke-start tap, in ms.
const IMMEDIATE_PULSE_MS: f64 = 8.0;
/// Pulse length for per-sample grain ticks, in ms.
const GRAIN_PULSE_MS: f64 = 5.0;
/// Sample-to-sample travel required before a grain pulse fires.
const GRAIN_MIN_TRAVEL: f64 = 2.0;
/// Pulse spacing at rest, in ms.
const INTERVAL_SLOW_MS: f64 = 80.0;
/// Pulse spacing at full speed, in ms.
const INTERVAL_FAST_MS: f64 = 20.0;
/// Velocity (world px/ms) at which pulses reach their fastest cadence.
const INTERVAL_VELOCITY_SATURATION: f64 = 2.5;

/// Host-provided actuator. The engine never touches platform vibration
/// APIs directly.
pub trait HapticDriver {
    /// Fire one pulse of the given duration in ms.
    fn pulse(&mut self, duration_ms: f64);
}

/// Driver for hosts without an actuator: every pulse is a no-op.
#[derive(Debug, Default)]
pub struct NoopHaptics;

impl HapticDriver for NoopHaptics {
    fn pulse(&mut self, _duration_ms: f64) {}
}

/// Driver that records requested pulses. Used by the test suites.
#[derive(Debug, Default)]
pub struct RecordingHaptics {
    pub pulses: Vec<f64>,
}

impl HapticDriver for RecordingHaptics {
    fn pulse(&mut self, duration_ms: f64) {
        self.pulses.push(duration_ms);
    }
}

/// Minimum spacing between pulses for the given velocity: falls linearly
/// from 80 ms at rest to 20 ms at speed.
pub fn haptic_interval(velocity: f64) -> f64 {
    let t = (velocity / INTERVAL_VELOCITY_SATURATION).clamp(0.0, 1.0);
    INTERVAL_SLOW_MS + (INTERVAL_FAST_MS - INTERVAL_SLOW_MS) * t
}

/// Rate-limited pulser. Time comes from sample timestamps, never a wall
/// clock, so the limiter is deterministic under replay.
pub struct HapticPulser {
    driver: Box<dyn HapticDriver>,
    pub enabled: bool,
    last_pulse_at: Option<f64>,
}

impl HapticPulser {
    pub fn new(driver: Box<dyn HapticDriver>) -> Self {
        Self {
            driver,
            enabled: true,
            last_pulse_at: None,
        }
    }

    /// Stroke-start tap: a single short pulse, not rate-limited.
    pub fn trigger_immediate(&mut self, now_ms: f64) {
        if !self.enabled {
            return;
        }
        self.driver.pulse(IMMEDIATE_PULSE_MS);
        self.last_pulse_at = Some(now_ms);
    }

    /// Per-sample grain tick: fires only after enough travel and after the
    /// velocity-dependent interval has elapsed.
    pub fn trigger_grain(&mut self, now_ms: f64, travel: f64, velocity: f64) {
        if !self.enabled || travel <= GRAIN_MIN_TRAVEL {
            return;
        }
        if let Some(last) = self.last_pulse_at {
            if now_ms - last < haptic_interval(velocity) {
                return;
            }
        }
        self.driver.pulse(GRAIN_PULSE_MS);
        self.last_pulse_at = Some(now_ms);
    }

    /// Swap the driver, keeping limiter state.
    pub fn set_driver(&mut self, driver: Box<dyn HapticDriver>) {
        self.driver = driver;
    }
}
