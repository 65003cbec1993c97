//! Synthetic PPG signal generators shared by the estimator tests.
//!
//! The waveform mimics a reflectance pulse: a fundamental at the target
//! heart rate with a weaker second harmonic, riding on per-channel DC
//! baselines. The red/IR amplitude ratio is derived by inverting the SpO2
//! calibration polynomial, so a generated stream has a known ground truth
//! for both readings.

#[cfg(feature = "nostd")]
use micromath::F32Ext;

use crate::{SPO2_CAL_A, SPO2_CAL_B, SPO2_CAL_C};

pub const RED_DC: f32 = 50_000.0;
pub const IR_DC: f32 = 80_000.0;
pub const IR_AMP: f32 = 2_000.0;

/// Deterministic pseudo-noise, so noisy-signal tests stay reproducible.
pub struct NoiseSource {
    state: u32,
}

impl NoiseSource {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Uniform in `[0, 1)`.
    pub fn next_f32(&mut self) -> f32 {
        self.state = self.state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        (self.state >> 8) as f32 / (1 << 24) as f32
    }
}

/// R-value that the calibration polynomial maps to the given SpO2, using
/// the physiologically relevant root of the inverted quadratic.
pub fn r_for_spo2(spo2: f32) -> f32 {
    let disc = SPO2_CAL_B * SPO2_CAL_B - 4.0 * SPO2_CAL_A * (SPO2_CAL_C - spo2);
    (-SPO2_CAL_B - disc.sqrt()) / (2.0 * SPO2_CAL_A)
}

fn pulse_wave(phase: f32) -> f32 {
    phase.sin() + 0.3 * (2.0 * phase).sin()
}

fn sample_at(n: usize, bpm: f32, red_amp: f32) -> (u32, u32) {
    let phase = core::f32::consts::TAU * bpm / 60.0 * n as f32 / crate::SAMPLE_RATE_HZ;
    let wave = pulse_wave(phase);

    let red = RED_DC + red_amp * wave;
    let ir = IR_DC + IR_AMP * wave;
    (red as u32, ir as u32)
}

fn red_amp_for(spo2: f32) -> f32 {
    // R = (red_amp / RED_DC) / (IR_AMP / IR_DC)
    r_for_spo2(spo2) * RED_DC / IR_DC * IR_AMP
}

/// Noise-free pulse stream with known heart rate and SpO2.
pub fn clean_signal(bpm: f32, spo2: f32, len: usize) -> impl Iterator<Item = (u32, u32)> {
    let red_amp = red_amp_for(spo2);
    (0..len).map(move |n| sample_at(n, bpm, red_amp))
}

/// One sample of a 98 % SpO2 pulse stream with additive uniform noise.
pub fn noisy_sample(n: usize, bpm: f32, noise: &mut NoiseSource) -> (u32, u32) {
    let (red, ir) = sample_at(n, bpm, red_amp_for(98.0));
    let jitter = |noise: &mut NoiseSource| (noise.next_f32() - 0.5) * 100.0;
    (
        (red as f32 + jitter(noise)) as u32,
        (ir as f32 + jitter(noise)) as u32,
    )
}

/// DC-only stream, as produced by a sensor with no finger on it but strong
/// ambient reflection.
pub fn flat_signal(len: usize) -> impl Iterator<Item = (u32, u32)> {
    (0..len).map(|_| (RED_DC as u32, IR_DC as u32))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::spo2_from_ratio;

    #[test]
    fn inverted_polynomial_round_trips() {
        for spo2 in [80.0, 90.0, 95.0, 98.0, 100.0] {
            let r = r_for_spo2(spo2);
            assert!((0.1..=2.0).contains(&r), "R {r} for SpO2 {spo2}");
            assert!((spo2_from_ratio(r) - spo2).abs() < 1e-3);
        }
    }

    #[test]
    fn generated_amplitude_ratio_implies_target_r() {
        // both channels share the waveform shape, so the peak-to-peak ratio
        // equals the amplitude coefficient ratio regardless of the shape
        let swing = |channel: fn((u32, u32)) -> u32| {
            let (min, max) = clean_signal(75.0, 98.0, 400)
                .map(channel)
                .fold((u32::MAX, 0u32), |(min, max), v| (min.min(v), max.max(v)));
            (max - min) as f32
        };

        let measured_ratio = swing(|(red, _)| red) / swing(|(_, ir)| ir);
        let expected_ratio = red_amp_for(98.0) / IR_AMP;
        assert!(
            (measured_ratio - expected_ratio).abs() < 0.01,
            "amplitude ratio {measured_ratio} vs {expected_ratio}"
        );
    }

    #[test]
    fn noise_source_is_deterministic() {
        let mut a = NoiseSource::new(1);
        let mut b = NoiseSource::new(1);
        for _ in 0..100 {
            assert_eq!(a.next_f32(), b.next_f32());
        }
    }
}
