//! Sliding discrete period transform.
//!
//! For every candidate pulse period `P` the transform maintains a complex
//! correlation of the signal against `e^(-j2π/P)` over the most recent `P`
//! samples. Each accumulator updates in O(1) per sample:
//!
//! ```text
//! T ← e^(-j2π/P) · (T + x_new − x_old)
//! ```
//!
//! where `x_old` is the sample exactly `P` positions behind the newest, or
//! zero while the history is still shorter than that. The rotation by a full
//! turn over `P` samples cancels the departing sample's contribution, so the
//! accumulator always equals the transform of the latest `P`-sample window.
//! The strongest normalized magnitude across all candidates marks the pulse
//! period.

use num_complex::Complex;

use crate::{filter::median::median_of, sliding::SlidingWindow, ComplExt};

/// Candidate period bounds in samples: 40 (150 bpm) to 200 (30 bpm) at
/// 100 Hz.
pub const MIN_PERIOD: usize = 40;
pub const MAX_PERIOD: usize = 200;
pub const PERIOD_RANGE: usize = MAX_PERIOD - MIN_PERIOD + 1;

/// Sample history depth, 10 s at 100 Hz. Must exceed `MAX_PERIOD`.
pub const HISTORY_SIZE: usize = 1000;

/// Precomputed per-period rotation factors `e^(-j2π/P)`.
///
/// Building one costs `PERIOD_RANGE` sin/cos pairs; share a single instance
/// between channels and across resets.
pub struct RotationBasis {
    rot: [Complex<f32>; PERIOD_RANGE],
}

impl Default for RotationBasis {
    fn default() -> Self {
        Self::new()
    }
}

impl RotationBasis {
    pub fn new() -> Self {
        let mut rot = [Complex::new(0.0, 0.0); PERIOD_RANGE];
        for (i, slot) in rot.iter_mut().enumerate() {
            let period = (MIN_PERIOD + i) as f32;
            *slot = <Complex<f32> as ComplExt>::from_polar(1.0, -core::f32::consts::TAU / period);
        }
        Self { rot }
    }
}

/// Per-channel transform state: sample history, one accumulator per
/// candidate period, and the normalized magnitude spectrum.
pub struct SlidingDpt {
    history: SlidingWindow<i32, HISTORY_SIZE>,
    acc: [Complex<f32>; PERIOD_RANGE],
    magnitude: [f32; PERIOD_RANGE],
}

impl Default for SlidingDpt {
    fn default() -> Self {
        Self::new()
    }
}

impl SlidingDpt {
    pub const fn new() -> Self {
        Self {
            history: SlidingWindow::new(),
            acc: [Complex::new(0.0, 0.0); PERIOD_RANGE],
            magnitude: [0.0; PERIOD_RANGE],
        }
    }

    pub fn clear(&mut self) {
        self.history.clear();
        self.acc = [Complex::new(0.0, 0.0); PERIOD_RANGE];
        self.magnitude = [0.0; PERIOD_RANGE];
    }

    /// The estimate is only trusted once a full history backs every
    /// accumulator.
    pub fn is_ready(&self) -> bool {
        self.history.is_full()
    }

    /// Advances every accumulator by one sample.
    pub fn update(&mut self, sample: i32, basis: &RotationBasis) {
        self.history.push(sample);

        for (i, acc) in self.acc.iter_mut().enumerate() {
            let period = MIN_PERIOD + i;
            let old = self.history.nth_back(period).unwrap_or(0);
            *acc = basis.rot[i] * (*acc + Complex::new((sample - old) as f32, 0.0));
        }
    }

    /// Recomputes the normalized magnitude spectrum from the accumulators.
    /// Dividing by the period makes magnitudes comparable across window
    /// lengths.
    pub fn compute_magnitudes(&mut self) {
        for (i, magnitude) in self.magnitude.iter_mut().enumerate() {
            let period = (MIN_PERIOD + i) as f32;
            *magnitude = self.acc[i].norm() / period;
        }
    }

    /// Magnitude spectrum as last computed by [`compute_magnitudes`],
    /// indexed from `MIN_PERIOD`.
    ///
    /// [`compute_magnitudes`]: SlidingDpt::compute_magnitudes
    pub fn magnitudes(&self) -> &[f32; PERIOD_RANGE] {
        &self.magnitude
    }

    pub fn magnitude_at(&self, period: usize) -> f32 {
        self.magnitude[period - MIN_PERIOD]
    }

    /// Strongest period in the spectrum, if it clears the adaptive
    /// threshold `floor + 0.5 · median(spectrum)`. The median term rejects
    /// broadband noise, which lifts the whole spectrum rather than a single
    /// period.
    ///
    /// A maximum sitting on either boundary of the candidate range is
    /// rejected outright: a spectrum still rising into the boundary is a
    /// baseline-drift or ring-down artifact, not a pulse.
    pub fn peak_period(&self, floor: f32) -> Option<(usize, f32)> {
        let mut scratch = self.magnitude;
        let threshold = floor + 0.5 * median_of(&mut scratch);

        let mut best = (0, 0.0f32);
        for (i, &magnitude) in self.magnitude.iter().enumerate() {
            if magnitude > best.1 {
                best = (MIN_PERIOD + i, magnitude);
            }
        }

        let interior = best.0 > MIN_PERIOD && best.0 < MAX_PERIOD;
        (interior && best.1 > threshold).then_some(best)
    }
}
