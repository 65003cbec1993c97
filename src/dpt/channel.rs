//! One-pole recursive AC/DC extraction for the period-transform method.
//!
//! Much cheaper than the cascaded bandpass used by the peak-detection
//! pipeline: a single leaky integrator per component. The AC output is
//! negated because reflectance PPG absorbs more light at the pulse, so the
//! physiological waveform is inverted relative to the ADC counts.

/// Leak coefficient of both one-pole filters. At 100 Hz this puts the AC
/// high-pass corner near 0.16 Hz.
pub const IIR_COEFF: f32 = 0.99;

pub struct AcDcFilter {
    w: f32,
    dc: f32,
}

impl Default for AcDcFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl AcDcFilter {
    pub const fn new() -> Self {
        Self { w: 0.0, dc: 0.0 }
    }

    pub fn clear(&mut self) {
        self.w = 0.0;
        self.dc = 0.0;
    }

    /// Consumes one raw sample and returns the AC component, truncated to an
    /// integer. The DC estimate updates as a side effect; read it with
    /// [`dc`].
    ///
    /// [`dc`]: AcDcFilter::dc
    pub fn process(&mut self, sample: u32) -> i32 {
        let x = sample as f32;

        let w = x + IIR_COEFF * self.w;
        let ac = -((w - self.w) as i32);
        self.w = w;

        self.dc = IIR_COEFF * self.dc + (1.0 - IIR_COEFF) * x;

        ac
    }

    /// Slow-moving DC estimate of the raw signal.
    pub fn dc(&self) -> i32 {
        self.dc as i32
    }
}
