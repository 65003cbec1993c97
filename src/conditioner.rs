//! Per-channel signal conditioning for the peak-detection method.
//!
//! raw sample → moving-average detrend (the baseline doubles as the DC
//! estimate) → two cascaded Butterworth sections → short smoothing average.
//! The smoothed AC output also feeds a read-and-clear RMS accumulator used by
//! the SpO2 stage.

use object_chain::{Chain, ChainElement, Link};

use crate::{
    filter::{
        biquad::{precomputed::PPG_BANDPASS, Biquad},
        Filter,
    },
    moving::{average::MovingAverage, rms::RmsAccumulator},
};

/// Detrend window length; the moving average over it is the DC baseline.
pub const DETREND_WINDOW: usize = 32;

/// Post-filter smoothing window, suppressing residual high-frequency noise.
pub const SMOOTH_WINDOW: usize = 5;

type Bandpass = Link<Biquad<'static>, Chain<Biquad<'static>>>;

pub struct SignalConditioner {
    detrend: MovingAverage<DETREND_WINDOW>,
    bandpass: Bandpass,
    smoother: MovingAverage<SMOOTH_WINDOW>,
    dc: f32,
    ac_rms: RmsAccumulator,
}

impl Default for SignalConditioner {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalConditioner {
    pub fn new() -> Self {
        Self {
            detrend: MovingAverage::new(),
            bandpass: Chain::new(Biquad::new(&PPG_BANDPASS[0]))
                .append(Biquad::new(&PPG_BANDPASS[1])),
            smoother: MovingAverage::new(),
            dc: 0.0,
            ac_rms: RmsAccumulator::new(),
        }
    }

    pub fn clear(&mut self) {
        self.detrend.clear();
        self.bandpass.clear();
        self.smoother.clear();
        self.dc = 0.0;
        self.ac_rms.clear();
    }

    /// Consumes one raw sample and returns the filtered AC value. Updates the
    /// DC estimate and the AC-RMS accumulator as side effects.
    pub fn process(&mut self, raw: u32) -> f32 {
        let sample = raw as f32;

        let baseline = self.detrend.update(sample);
        self.dc = baseline;

        let filtered = self.bandpass.update(sample - baseline);
        let smoothed = self.smoother.update(filtered);

        self.ac_rms.add(smoothed);
        smoothed
    }

    /// Current DC baseline estimate. Non-destructive.
    pub fn dc(&self) -> f32 {
        self.dc
    }

    /// RMS of the AC output accumulated since the previous call, consuming
    /// the accumulator. The reading always describes the interval since the
    /// last read; see [`RmsAccumulator::take_rms`].
    pub fn take_ac_rms(&mut self) -> f32 {
        self.ac_rms.take_rms()
    }
}
