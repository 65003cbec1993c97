//! Second-order IIR sections (Direct Form II transposed).

use super::Filter;

/// Coefficients of one second-order section, with `a0` normalized to 1.
pub struct SosCoeffs {
    pub b0: f32,
    pub b1: f32,
    pub b2: f32,
    pub a1: f32,
    pub a2: f32,
}

pub mod precomputed {
    use super::SosCoeffs;

    /// Butterworth bandpass, 0.5–4 Hz passband at a 100 Hz sample rate,
    /// decomposed into two cascaded sections.
    ///
    /// `scipy.signal.butter(4, [0.5, 4], "bandpass", fs=100, output="sos")`
    pub const PPG_BANDPASS: [SosCoeffs; 2] = [
        SosCoeffs {
            b0: 0.00743916,
            b1: 0.0,
            b2: -0.00743916,
            a1: -1.86319070,
            a2: 0.87439781,
        },
        SosCoeffs {
            b0: 1.0,
            b1: 0.0,
            b2: -1.0,
            a1: -1.94632328,
            a2: 0.95124514,
        },
    ];
}

/// One biquad section with persistent delay state.
pub struct Biquad<'a> {
    coeffs: &'a SosCoeffs,
    z1: f32,
    z2: f32,
}

impl<'a> Biquad<'a> {
    pub const fn new(coeffs: &'a SosCoeffs) -> Self {
        Self {
            coeffs,
            z1: 0.0,
            z2: 0.0,
        }
    }
}

impl Filter for Biquad<'_> {
    fn update(&mut self, sample: f32) -> f32 {
        let c = self.coeffs;
        let output = c.b0 * sample + self.z1;
        self.z1 = c.b1 * sample - c.a1 * output + self.z2;
        self.z2 = c.b2 * sample - c.a2 * output;
        output
    }

    fn clear(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }
}
