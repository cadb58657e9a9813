//! Procedural surface-noise synthesis.
//!
//! One stereo voice per engine: a looped pink-noise buffer runs through a
//! biquad filter, a velocity-tracking envelope, master gain, and an
//! equal-power stereo panner. The filter and playback rate come from the
//! active [`SoundProfile`]; `surfaceTexture` pushes the timbre toward a
//! harsher, noisier character.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Length of the looped noise buffer in seconds.
const NOISE_LOOP_SECS: f64 = 2.0;
/// Envelope attack time constant in seconds.
const ATTACK_TAU: f64 = 0.05;
/// Envelope release time constant in seconds.
const RELEASE_TAU: f64 = 0.1;
/// Velocity (world px/ms) at which the envelope saturates.
const ENVELOPE_VELOCITY_SATURATION: f64 = 2.5;
/// Envelope curve exponent.
const ENVELOPE_EXPONENT: f64 = 1.1;

/// Filter response kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Lowpass,
    Bandpass,
}

/// Pen sound profiles, one per brush feel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundProfile {
    #[default]
    Pencil,
    Charcoal,
    Ballpoint,
    Fountain,
    Marker,
    Highlighter,
    Monoline,
    Calligraphy,
}

/// Playback/filter parameters for one profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileParams {
    /// Playback rate over the noise loop.
    pub rate: f64,
    pub filter: FilterKind,
    /// Filter frequency in Hz.
    pub frequency: f64,
    /// Filter Q.
    pub q: f64,
    /// Output gain in dB.
    pub gain_db: f64,
}

impl SoundProfile {
    pub fn params(self) -> ProfileParams {
        use FilterKind::*;
        let (rate, filter, frequency, q, gain_db) = match self {
            SoundProfile::Pencil => (1.0, Lowpass, 600.0, 0.5, 0.0),
            SoundProfile::Charcoal => (0.5, Lowpass, 400.0, 0.5, 0.0),
            SoundProfile::Ballpoint => (1.3, Bandpass, 800.0, 0.8, 0.0),
            SoundProfile::Fountain => (0.9, Lowpass, 400.0, 0.3, 0.0),
            SoundProfile::Marker => (0.8, Lowpass, 200.0, 0.1, 0.0),
            SoundProfile::Highlighter => (1.5, Bandpass, 1200.0, 5.0, 10.0),
            SoundProfile::Monoline => (2.0, Lowpass, 100.0, 0.0, 0.0),
            SoundProfile::Calligraphy => (0.6, Lowpass, 300.0, 0.2, 0.0),
        };
        ProfileParams {
            rate,
            filter,
            frequency,
            q,
            gain_db,
        }
    }
}

/// Biquad filter coefficients (Audio EQ Cookbook).
#[derive(Debug, Clone, Copy)]
pub struct BiquadCoeffs {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl BiquadCoeffs {
    /// Lowpass coefficients. Q is clamped away from zero.
    pub fn lowpass(cutoff: f64, q: f64, sample_rate: f64) -> Self {
        let q = q.max(0.1);
        let omega = 2.0 * PI * cutoff / sample_rate;
        let sin_omega = omega.sin();
        let cos_omega = omega.cos();
        let alpha = sin_omega / (2.0 * q);

        let b0 = (1.0 - cos_omega) / 2.0;
        let b1 = 1.0 - cos_omega;
        let b2 = (1.0 - cos_omega) / 2.0;
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_omega;
        let a2 = 1.0 - alpha;

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }

    /// Bandpass coefficients (constant skirt gain).
    pub fn bandpass(center: f64, q: f64, sample_rate: f64) -> Self {
        let q = q.max(0.1);
        let omega = 2.0 * PI * center / sample_rate;
        let sin_omega = omega.sin();
        let cos_omega = omega.cos();
        let alpha = sin_omega / (2.0 * q);

        let b0 = alpha;
        let b1 = 0.0;
        let b2 = -alpha;
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_omega;
        let a2 = 1.0 - alpha;

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }
}

/// Stateful biquad filter.
#[derive(Debug, Clone)]
pub struct BiquadFilter {
    coeffs: BiquadCoeffs,
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl BiquadFilter {
    pub fn new(coeffs: BiquadCoeffs) -> Self {
        Self {
            coeffs,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    pub fn set_coeffs(&mut self, coeffs: BiquadCoeffs) {
        self.coeffs = coeffs;
    }

    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }

    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        let output = self.coeffs.b0 * input + self.coeffs.b1 * self.x1 + self.coeffs.b2 * self.x2
            - self.coeffs.a1 * self.y1
            - self.coeffs.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;
        output
    }
}

/// Generate a normalized pink-noise buffer (Paul Kellet filter cascade
/// over white noise).
fn pink_noise(rng: &mut Pcg32, num_samples: usize) -> Vec<f64> {
    let mut b = [0.0_f64; 7];
    let mut samples = Vec::with_capacity(num_samples);
    for _ in 0..num_samples {
        let white: f64 = rng.gen_range(-1.0..1.0);
        b[0] = 0.99886 * b[0] + white * 0.0555179;
        b[1] = 0.99332 * b[1] + white * 0.0750759;
        b[2] = 0.96900 * b[2] + white * 0.1538520;
        b[3] = 0.86650 * b[3] + white * 0.3104856;
        b[4] = 0.55000 * b[4] + white * 0.5329522;
        b[5] = -0.7616 * b[5] - white * 0.0168980;
        let pink = b[0] + b[1] + b[2] + b[3] + b[4] + b[5] + b[6] + white * 0.5362;
        b[6] = white * 0.115926;
        samples.push(pink);
    }
    normalize_samples(&mut samples);
    samples
}

/// Normalize samples to peak at 1.0.
fn normalize_samples(samples: &mut [f64]) {
    let max = samples.iter().map(|s| s.abs()).fold(0.0_f64, f64::max);
    if max > 0.0 {
        let scale = 1.0 / max;
        for s in samples.iter_mut() {
            *s *= scale;
        }
    }
}

/// The engine's single stereo voice.
///
/// Deterministic: two voices built with the same seed produce identical
/// noise buffers. The host pulls interleaved stereo frames from `render`.
#[derive(Debug, Clone)]
pub struct SurfaceVoice {
    sample_rate: f64,
    noise: Vec<f64>,
    cursor: f64,
    profile: SoundProfile,
    texture: f64,
    filter: BiquadFilter,
    rate: f64,
    gain: f64,
    envelope: f64,
    envelope_target: f64,
    releasing: bool,
    master: f64,
    pan: f64,
}

impl SurfaceVoice {
    pub fn new(sample_rate: f64, seed: u32) -> Self {
        let seed64 = (seed as u64) | ((seed as u64) << 32);
        let mut rng = Pcg32::seed_from_u64(seed64);
        let noise = pink_noise(&mut rng, (sample_rate * NOISE_LOOP_SECS) as usize);
        let params = SoundProfile::default().params();

        let mut voice = Self {
            sample_rate,
            noise,
            cursor: 0.0,
            profile: SoundProfile::default(),
            texture: 0.5,
            filter: BiquadFilter::new(BiquadCoeffs::lowpass(
                params.frequency,
                params.q,
                sample_rate,
            )),
            rate: params.rate,
            gain: 1.0,
            envelope: 0.0,
            envelope_target: 0.0,
            releasing: false,
            master: 1.0,
            pan: 0.0,
        };
        voice.reconfigure();
        voice
    }

    pub fn profile(&self) -> SoundProfile {
        self.profile
    }

    pub fn set_profile(&mut self, profile: SoundProfile) {
        self.profile = profile;
        self.reconfigure();
    }

    /// Surface texture in `[0, 1]`: higher values open the filter and drop
    /// its Q for a harsher, noisier character.
    pub fn set_texture(&mut self, texture: f64) {
        self.texture = texture.clamp(0.0, 1.0);
        self.reconfigure();
    }

    pub fn set_volume(&mut self, volume: f64) {
        self.master = volume.clamp(0.0, 1.0);
    }

    /// Equal-power stereo position in `[-1, 1]`.
    pub fn set_pan(&mut self, pan: f64) {
        self.pan = pan.clamp(-1.0, 1.0);
    }

    fn reconfigure(&mut self) {
        let params = self.profile.params();
        let frequency =
            (params.frequency * (1.0 + 1.5 * self.texture)).min(self.sample_rate / 2.0 * 0.9);
        let q = (params.q * (1.0 - 0.5 * self.texture)).max(0.1);
        let coeffs = match params.filter {
            FilterKind::Lowpass => BiquadCoeffs::lowpass(frequency, q, self.sample_rate),
            FilterKind::Bandpass => BiquadCoeffs::bandpass(frequency, q, self.sample_rate),
        };
        self.filter.set_coeffs(coeffs);
        self.rate = params.rate;
        self.gain = 10.0_f64.powf(params.gain_db / 20.0);
    }

    /// Stroke started: arm the envelope.
    pub fn note_on(&mut self) {
        self.releasing = false;
        self.envelope_target = 0.0;
    }

    /// Feed instantaneous velocity (world px/ms); the envelope ramps
    /// toward the matching loudness.
    pub fn set_velocity(&mut self, velocity: f64) {
        if self.releasing {
            return;
        }
        let normalized = (velocity / ENVELOPE_VELOCITY_SATURATION).max(0.0);
        self.envelope_target = (normalized.powf(ENVELOPE_EXPONENT) * self.rate).clamp(0.0, 1.0);
    }

    /// Stroke ended: decay to silence.
    pub fn note_off(&mut self) {
        self.releasing = true;
        self.envelope_target = 0.0;
    }

    pub fn envelope_target(&self) -> f64 {
        self.envelope_target
    }

    /// Fill an interleaved stereo buffer.
    pub fn render(&mut self, out: &mut [f64]) {
        let len = self.noise.len() as f64;
        let tau = if self.releasing { RELEASE_TAU } else { ATTACK_TAU };
        let coeff = 1.0 - (-1.0 / (tau * self.sample_rate)).exp();

        // Equal-power pan law.
        let angle = (self.pan + 1.0) * PI / 4.0;
        let left_gain = angle.cos();
        let right_gain = angle.sin();

        for frame in out.chunks_exact_mut(2) {
            let i = self.cursor as usize;
            let frac = self.cursor - i as f64;
            let s0 = self.noise[i % self.noise.len()];
            let s1 = self.noise[(i + 1) % self.noise.len()];
            let raw = s0 + (s1 - s0) * frac;

            self.cursor += self.rate;
            if self.cursor >= len {
                self.cursor -= len;
            }

            self.envelope += (self.envelope_target - self.envelope) * coeff;
            let sample = self.filter.process(raw) * self.envelope * self.gain * self.master;

            frame[0] = sample * left_gain;
            frame[1] = sample * right_gain;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noise_buffer_is_deterministic() {
        let a = SurfaceVoice::new(44_100.0, 7);
        let b = SurfaceVoice::new(44_100.0, 7);
        assert_eq!(a.noise, b.noise);
        assert_eq!(a.noise.len(), 88_200);
    }

    #[test]
    fn test_noise_normalized() {
        let voice = SurfaceVoice::new(44_100.0, 1);
        let peak = voice.noise.iter().map(|s| s.abs()).fold(0.0_f64, f64::max);
        assert!((peak - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_silent_until_velocity() {
        let mut voice = SurfaceVoice::new(44_100.0, 1);
        voice.note_on();
        let mut out = vec![0.0; 256];
        voice.render(&mut out);
        assert!(out.iter().all(|s| s.abs() < 1e-9));
    }

    #[test]
    fn test_velocity_raises_envelope() {
        let mut voice = SurfaceVoice::new(44_100.0, 1);
        voice.note_on();
        voice.set_velocity(2.5);
        // Pencil rate is 1.0: full-speed strokes drive the target to 1.
        assert!((voice.envelope_target() - 1.0).abs() < 1e-9);

        let mut out = vec![0.0; 8192];
        voice.render(&mut out);
        assert!(out.iter().any(|s| s.abs() > 1e-4));
    }

    #[test]
    fn test_slow_profile_still_saturates_when_fast() {
        let mut voice = SurfaceVoice::new(44_100.0, 1);
        voice.set_profile(SoundProfile::Charcoal); // rate 0.5
        voice.note_on();
        // Velocity overdrive beats the low profile factor before clamping.
        voice.set_velocity(10.0);
        assert!((voice.envelope_target() - 1.0).abs() < 1e-9);

        voice.set_velocity(2.5);
        assert!((voice.envelope_target() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_note_off_decays() {
        let mut voice = SurfaceVoice::new(44_100.0, 1);
        voice.note_on();
        voice.set_velocity(2.5);
        let mut out = vec![0.0; 8192];
        voice.render(&mut out);

        voice.note_off();
        // Velocity updates during release are ignored.
        voice.set_velocity(2.5);
        assert!(voice.envelope_target().abs() < 1e-12);

        // Render ~1 second: envelope is far into its 100 ms decay.
        let mut tail = vec![0.0; 88_200];
        voice.render(&mut tail);
        let late = &tail[tail.len() - 512..];
        assert!(late.iter().all(|s| s.abs() < 1e-3));
    }

    #[test]
    fn test_pan_weights_channels() {
        let mut voice = SurfaceVoice::new(44_100.0, 1);
        voice.note_on();
        voice.set_velocity(2.5);
        voice.set_pan(-1.0);
        let mut out = vec![0.0; 4096];
        voice.render(&mut out);

        let left: f64 = out.iter().step_by(2).map(|s| s * s).sum();
        let right: f64 = out.iter().skip(1).step_by(2).map(|s| s * s).sum();
        assert!(left > 0.0);
        assert!(right < left * 1e-6);
    }

    #[test]
    fn test_profile_table() {
        let p = SoundProfile::Highlighter.params();
        assert_eq!(p.filter, FilterKind::Bandpass);
        assert!((p.frequency - 1200.0).abs() < f64::EPSILON);
        assert!((p.gain_db - 10.0).abs() < f64::EPSILON);

        let p = SoundProfile::Monoline.params();
        assert!((p.rate - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_biquad_lowpass_attenuates_high_frequency() {
        let sample_rate = 44_100.0;
        let mut filter = BiquadFilter::new(BiquadCoeffs::lowpass(400.0, 0.5, sample_rate));
        // A 10 kHz sine through a 400 Hz lowpass loses most of its energy.
        let mut in_energy = 0.0;
        let mut out_energy = 0.0;
        for n in 0..4096 {
            let x = (2.0 * PI * 10_000.0 * n as f64 / sample_rate).sin();
            let y = filter.process(x);
            if n > 512 {
                in_energy += x * x;
                out_energy += y * y;
            }
        }
        assert!(out_energy < in_energy * 0.01);
    }
}
