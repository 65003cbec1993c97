//! Frequency-domain HR/SpO2 estimation via the sliding discrete period
//! transform (Method 2).
//!
//! Each channel runs a one-pole AC/DC split and a bank of per-period
//! correlators updated in O(1) per sample. At every estimation interval the
//! IR magnitude spectrum is scanned for its strongest period, which maps
//! directly to a heart rate candidate; SpO2 comes from the ratio of the two
//! channels' spectral magnitudes at that period.
//!
//! Compared with the peak-detection method this one rejects candidates much
//! more aggressively: any gating failure zeroes the smoothing state instead
//! of coasting on the previous reading, trading latency for a far lower
//! chance of publishing a rate locked onto noise.

pub mod channel;
pub mod transform;

#[cfg(feature = "nostd")]
use micromath::F32Ext;

use crate::{
    estimator::PulseEstimator,
    filter::{median::MedianFilter, Filter},
    sliding::SlidingWindow,
    spo2_from_ratio,
};

use self::channel::AcDcFilter;
use self::transform::{RotationBasis, SlidingDpt, PERIOD_RANGE};

/// Samples between estimation passes (2.5 s at 100 Hz).
pub const ESTIMATION_INTERVAL: u32 = 250;

/// Raw DC floor below which the sensor is assumed unworn.
pub const MIN_DC_VALUE: i32 = 10_000;

/// Spectral magnitude floor for the adaptive peak threshold, and for the
/// per-channel magnitudes entering the R-value.
pub const MIN_PEAK_MAGNITUDE: f32 = 0.5;

/// HR smoothing: median depth, EMA coefficient, per-update rate limit,
/// secondary averaging depth, stability gate.
pub const HR_MEDIAN_SIZE: usize = 7;
pub const HR_EMA_ALPHA: f32 = 0.15;
pub const MAX_HR_CHANGE: f32 = 8.0;
pub const HR_SMOOTH_SIZE: usize = 7;
pub const STABLE_DELTA: f32 = 3.0;
pub const STABLE_READINGS: u8 = 2;

/// R-value history depth and acceptance bounds.
pub const R_HISTORY_SIZE: usize = 10;
pub const MIN_R_VALUE: f32 = 0.1;
pub const MAX_R_VALUE: f32 = 2.0;
pub const MIN_SPO2: f32 = 70.0;
pub const MAX_SPO2: f32 = 100.0;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Channel {
    Red,
    Ir,
}

/// Method 2 facade. The rotation basis is computed once and survives
/// [`reset`], so resets stay cheap.
///
/// [`reset`]: PulseEstimator::reset
pub struct DptMethod {
    basis: RotationBasis,

    red_filter: AcDcFilter,
    ir_filter: AcDcFilter,
    red_dpt: SlidingDpt,
    ir_dpt: SlidingDpt,

    hr_median: MedianFilter<HR_MEDIAN_SIZE>,
    hr_smooth: SlidingWindow<f32, HR_SMOOTH_SIZE>,
    ema_hr: f32,
    last_hr: f32,
    stable_count: u8,
    hr_valid: bool,

    r_history: SlidingWindow<f32, R_HISTORY_SIZE>,
    last_spo2: f32,
    spo2_valid: bool,

    sample_counter: u32,
    cycle_source: Option<fn() -> u32>,
    last_process_cycles: u32,
}

impl Default for DptMethod {
    fn default() -> Self {
        Self::new()
    }
}

impl DptMethod {
    pub fn new() -> Self {
        Self {
            basis: RotationBasis::new(),

            red_filter: AcDcFilter::new(),
            ir_filter: AcDcFilter::new(),
            red_dpt: SlidingDpt::new(),
            ir_dpt: SlidingDpt::new(),

            hr_median: MedianFilter::new(),
            hr_smooth: SlidingWindow::new(),
            ema_hr: 0.0,
            last_hr: 0.0,
            stable_count: 0,
            hr_valid: false,

            r_history: SlidingWindow::new(),
            last_spo2: 0.0,
            spo2_valid: false,

            sample_counter: 0,
            cycle_source: None,
            last_process_cycles: 0,
        }
    }

    /// Installs a cycle counter (e.g. a CPU cycle register reader) used to
    /// measure the cost of each `process_sample` call.
    pub fn set_cycle_source(&mut self, source: fn() -> u32) {
        self.cycle_source = Some(source);
    }

    /// Cycles consumed by the most recent `process_sample` call, or 0 when no
    /// cycle source is installed.
    pub fn last_process_cycles(&self) -> u32 {
        self.last_process_cycles
    }

    /// Magnitude spectrum of one channel as of the last estimation pass,
    /// indexed from [`transform::MIN_PERIOD`].
    pub fn spectrum(&self, channel: Channel) -> &[f32; PERIOD_RANGE] {
        match channel {
            Channel::Red => self.red_dpt.magnitudes(),
            Channel::Ir => self.ir_dpt.magnitudes(),
        }
    }

    /// Current pulse period candidate from the IR spectrum.
    pub fn peak_period(&self) -> Option<usize> {
        self.ir_dpt
            .peak_period(MIN_PEAK_MAGNITUDE)
            .map(|(period, _)| period)
    }

    pub fn debug_dc(&self) -> (i32, i32) {
        (self.red_filter.dc(), self.ir_filter.dc())
    }

    /// Zeroes the whole HR smoothing pipeline. Any rejected candidate lands
    /// here; the method never coasts on stale state.
    fn reset_hr_state(&mut self) {
        self.hr_median.clear();
        self.hr_smooth.clear();
        self.ema_hr = 0.0;
        self.last_hr = 0.0;
        self.stable_count = 0;
        self.hr_valid = false;
    }

    fn update_heart_rate(&mut self) {
        if !self.ir_dpt.is_ready() {
            return;
        }

        if self.ir_filter.dc() < MIN_DC_VALUE {
            debug!("DPT: IR DC below wear threshold, resetting");
            self.reset_hr_state();
            return;
        }

        let Some((period, _)) = self.ir_dpt.peak_period(MIN_PEAK_MAGNITUDE) else {
            debug!("DPT: no spectral peak");
            self.reset_hr_state();
            return;
        };

        // 10 ms sample period, so BPM = 6000 / period
        let hr = 6000.0 / period as f32;

        let mut candidate = self.hr_median.update(hr);

        if self.ema_hr > 0.0 {
            let diff = candidate - self.ema_hr;
            candidate = self.ema_hr + diff.clamp(-MAX_HR_CHANGE, MAX_HR_CHANGE);
            self.ema_hr = HR_EMA_ALPHA * candidate + (1.0 - HR_EMA_ALPHA) * self.ema_hr;
        } else {
            self.ema_hr = candidate;
        }

        self.hr_smooth.push(self.ema_hr);
        let smoothed = self.hr_smooth.iter().sum::<f32>() / self.hr_smooth.len() as f32;

        // stability is judged against the previously published value
        if self.last_hr > 0.0 && (smoothed - self.last_hr).abs() < STABLE_DELTA {
            self.stable_count = self.stable_count.saturating_add(1);
        } else {
            self.stable_count = 0;
        }
        if self.stable_count >= STABLE_READINGS {
            self.hr_valid = true;
        }

        self.last_hr = smoothed;
    }

    fn update_spo2(&mut self) {
        if !self.ir_dpt.is_ready() {
            return;
        }

        if self.red_filter.dc() < MIN_DC_VALUE || self.ir_filter.dc() < MIN_DC_VALUE {
            self.r_history.clear();
            self.spo2_valid = false;
            return;
        }

        let Some(period) = self.peak_period() else {
            self.r_history.clear();
            self.spo2_valid = false;
            return;
        };

        let red_mag = self.red_dpt.magnitude_at(period);
        let ir_mag = self.ir_dpt.magnitude_at(period);
        if red_mag < MIN_PEAK_MAGNITUDE || ir_mag < MIN_PEAK_MAGNITUDE {
            self.r_history.clear();
            self.spo2_valid = false;
            return;
        }

        let red_dc = self.red_filter.dc() as f32;
        let ir_dc = self.ir_filter.dc() as f32;
        let r = (red_mag / red_dc) / (ir_mag / ir_dc);
        if !(MIN_R_VALUE..=MAX_R_VALUE).contains(&r) {
            debug!("DPT: R-value {} out of range", r);
            self.r_history.clear();
            self.spo2_valid = false;
            return;
        }

        self.r_history.push(r);
        let avg_r = self.r_history.iter().sum::<f32>() / self.r_history.len() as f32;

        let spo2 = spo2_from_ratio(avg_r);
        if !(MIN_SPO2..=MAX_SPO2).contains(&spo2) {
            // the averaged history is plausible, only this reading is not
            self.spo2_valid = false;
            return;
        }

        self.last_spo2 = spo2;
        self.spo2_valid = true;
    }
}

impl PulseEstimator for DptMethod {
    fn reset(&mut self) {
        self.red_filter.clear();
        self.ir_filter.clear();
        self.red_dpt.clear();
        self.ir_dpt.clear();
        self.reset_hr_state();
        self.r_history.clear();
        self.last_spo2 = 0.0;
        self.spo2_valid = false;
        self.sample_counter = 0;
        self.last_process_cycles = 0;
    }

    fn process_sample(&mut self, raw_red: u32, raw_ir: u32) {
        let start = self.cycle_source.map(|read| read());

        let red_ac = self.red_filter.process(raw_red);
        let ir_ac = self.ir_filter.process(raw_ir);

        self.red_dpt.update(red_ac, &self.basis);
        self.ir_dpt.update(ir_ac, &self.basis);

        self.sample_counter += 1;
        if self.sample_counter >= ESTIMATION_INTERVAL {
            self.sample_counter = 0;

            self.red_dpt.compute_magnitudes();
            self.ir_dpt.compute_magnitudes();

            self.update_heart_rate();
            self.update_spo2();
        }

        if let (Some(start), Some(read)) = (start, self.cycle_source) {
            self.last_process_cycles = read().wrapping_sub(start);
        }
    }

    fn heart_rate(&self) -> f32 {
        self.last_hr
    }

    fn spo2(&self) -> f32 {
        self.last_spo2
    }

    fn hr_valid(&self) -> bool {
        self.hr_valid
    }

    fn spo2_valid(&self) -> bool {
        self.spo2_valid
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testing;

    fn run(method: &mut DptMethod, samples: impl Iterator<Item = (u32, u32)>) {
        for (red, ir) in samples {
            method.process_sample(red, ir);
        }
    }

    #[test]
    fn converges_on_clean_signal() {
        let mut method = DptMethod::new();
        run(&mut method, testing::clean_signal(75.0, 98.0, 3000));

        assert!(method.hr_valid(), "HR never validated");
        assert!(
            (method.heart_rate() - 75.0).abs() <= 2.0,
            "HR off: {}",
            method.heart_rate()
        );
        assert!(method.spo2_valid(), "SpO2 never validated");
        assert!(
            (method.spo2() - 98.0).abs() <= 2.0,
            "SpO2 off: {}",
            method.spo2()
        );
    }

    #[test]
    fn detected_period_matches_pulse() {
        let mut method = DptMethod::new();
        // 75 bpm is exactly 80 samples at 100 Hz
        run(&mut method, testing::clean_signal(75.0, 98.0, 2000));

        let period = method.peak_period().unwrap();
        assert!((79..=81).contains(&period), "period {period}");
    }

    #[test]
    fn flat_signal_invalidates_and_zeroes_state() {
        let mut method = DptMethod::new();
        run(&mut method, testing::clean_signal(75.0, 98.0, 3000));
        assert!(method.hr_valid());

        run(&mut method, testing::flat_signal(400));
        assert!(!method.hr_valid(), "HR still valid on flat input");
        assert!(!method.spo2_valid(), "SpO2 still valid on flat input");
        // rejection zeroes the pipeline rather than freezing the old rate
        assert_eq!(0.0, method.heart_rate());
    }

    #[test]
    fn low_dc_resets_without_panicking() {
        let mut method = DptMethod::new();
        run(&mut method, testing::clean_signal(75.0, 98.0, 2000));

        // sensor lifted off: DC collapses below the wear threshold
        for _ in 0..2000 {
            method.process_sample(100, 120);
        }
        assert!(!method.hr_valid());
        assert!(!method.spo2_valid());
    }

    #[test]
    fn cycle_source_measures_each_call() {
        fn fake_cycles() -> u32 {
            use core::sync::atomic::{AtomicU32, Ordering};
            static COUNTER: AtomicU32 = AtomicU32::new(0);
            COUNTER.fetch_add(17, Ordering::Relaxed)
        }

        let mut method = DptMethod::new();
        method.set_cycle_source(fake_cycles);
        method.process_sample(50_000, 80_000);
        assert_eq!(17, method.last_process_cycles());
    }
}
