//! Heart rate and blood-oxygen estimation from raw pulse-oximeter samples.
//!
//! The sensor produces interleaved red/infrared reflectance readings (18-bit
//! ADC counts) at [`SAMPLE_RATE_HZ`]. Two self-contained pipelines turn that
//! stream into smoothed, validity-gated HR and SpO2 readings:
//!
//! - [`peak::PeakMethod`] conditions the signal with a moving-average detrend
//!   and a Butterworth bandpass, then measures inter-peak intervals in the
//!   time domain.
//! - [`dpt::DptMethod`] extracts AC/DC with one-pole recursive filters and
//!   correlates the AC signal against every candidate pulse period with a
//!   sliding discrete period transform; the spectral peak is the period.
//!
//! Both implement [`estimator::PulseEstimator`] and own their state
//! exclusively, so two instances can run side by side on the same stream for
//! comparison. No heap allocation anywhere; every buffer is a fixed array.

#![cfg_attr(feature = "nostd", no_std)]

#[macro_use]
mod fmt;

pub mod conditioner;
pub mod dpt;
pub mod estimator;
pub mod filter;
pub mod moving;
pub mod peak;
pub mod sliding;

#[cfg(test)]
pub(crate) mod testing;

#[cfg(feature = "nostd")]
use micromath::F32Ext;
use num_complex::Complex;

pub use estimator::PulseEstimator;

/// Samples per second delivered by the sensor. Every buffer size, period
/// bound and filter coefficient in this crate is derived for this rate;
/// changing it requires re-deriving all of them.
pub const SAMPLE_RATE_HZ: f32 = 100.0;

/// SpO2 calibration polynomial, `SpO2 = A·R² + B·R + C`.
///
/// Empirical coefficients, not calibrated against a reference oximeter.
/// Shared by both estimation methods; replace per device if a calibration
/// run is available.
pub const SPO2_CAL_A: f32 = -45.060;
pub const SPO2_CAL_B: f32 = 30.354;
pub const SPO2_CAL_C: f32 = 94.845;

/// Applies the calibration polynomial to an averaged R-value.
pub fn spo2_from_ratio(r: f32) -> f32 {
    SPO2_CAL_A * r * r + SPO2_CAL_B * r + SPO2_CAL_C
}

pub trait ComplExt {
    fn from_polar(mag: f32, phase: f32) -> Complex<f32>;
    fn norm(&self) -> f32;
}

impl ComplExt for Complex<f32> {
    fn from_polar(mag: f32, phase: f32) -> Complex<f32> {
        mag * Complex::new(phase.cos(), phase.sin())
    }

    fn norm(&self) -> f32 {
        self.norm_sqr().sqrt()
    }
}
