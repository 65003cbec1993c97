//! Time-domain peak-detection HR/SpO2 estimation (Method 1).
//!
//! The IR channel's filtered AC signal accumulates in a rolling window; every
//! estimation interval the window is scanned for pulse peaks, the median
//! inter-peak interval becomes the heart rate candidate, and a median filter,
//! rate limiter, EMA and stability gate turn candidates into a published
//! reading. SpO2 comes from the red/IR AC-RMS-to-DC ratio over the same
//! interval.

use heapless::Vec;

use crate::{
    conditioner::SignalConditioner,
    estimator::PulseEstimator,
    filter::{
        median::{median_of, MedianFilter},
        Filter,
    },
    moving::stats::RollingStats,
    sliding::SlidingWindow,
    spo2_from_ratio,
};

#[cfg(feature = "nostd")]
use micromath::F32Ext;

/// AC sample window scanned for peaks: 2.5 s at 100 Hz. Shorter windows
/// cannot hold the three peaks needed for two intervals at low heart rates.
pub const HR_BUFFER_SIZE: usize = 250;

/// Minimum samples between two peaks (caps detectable HR at 150 bpm).
pub const MIN_PEAK_DISTANCE: usize = 40;

/// Maximum plausible inter-peak interval (floors detectable HR at 37.5 bpm).
pub const MAX_PEAK_DISTANCE: usize = 160;

/// Peaks tracked per scan.
const MAX_PEAKS: usize = 20;

/// Signal-quality floors: AC/DC ratio, AC standard deviation, and
/// peak-to-peak amplitude of the scanned window.
pub const MIN_AC_DC_RATIO: f32 = 0.01;
pub const MIN_STD_DEV: f32 = 5.0;
pub const MIN_PEAK_AMPLITUDE: f32 = 10.0;

/// Interval spread that triggers outlier re-filtering, and the distance from
/// the median an interval may keep.
const INTERVAL_SPREAD_LIMIT: f32 = 15.0;
const INTERVAL_OUTLIER_DISTANCE: f32 = 20.0;

pub const MIN_HR_BPM: f32 = 30.0;
pub const MAX_HR_BPM: f32 = 180.0;

/// HR smoothing: median history depth, EMA coefficient, per-update rate
/// limit, stability gate.
pub const HR_MEDIAN_SIZE: usize = 5;
pub const HR_EMA_ALPHA: f32 = 0.2;
pub const MAX_HR_CHANGE: f32 = 6.0;
pub const STABLE_DELTA: f32 = 6.0;
pub const STABLE_READINGS: u8 = 2;

/// Consecutive failed estimations before the smoothing state is reset.
pub const INVALID_RESET_THRESHOLD: u8 = 2;

/// Samples between estimation passes (2.5 s at 100 Hz).
pub const ESTIMATION_INTERVAL: u32 = 250;

/// SpO2 gating floors and bounds.
pub const SPO2_MIN_DC: f32 = 1000.0;
pub const SPO2_MIN_IR_AC_RMS: f32 = 1.0;
pub const MIN_R_VALUE: f32 = 0.1;
pub const MAX_R_VALUE: f32 = 2.0;
pub const MIN_SPO2: f32 = 70.0;
pub const MAX_SPO2: f32 = 100.0;
pub const R_HISTORY_SIZE: usize = 10;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum SignalQuality {
    Poor,
    Fair,
    Good,
}

/// Heart rate core: rolling AC window, peak scan, interval statistics and the
/// smoothing/validity pipeline.
pub struct PeakHr {
    stats: RollingStats<HR_BUFFER_SIZE>,
    ac_dc_ratio: f32,
    peak_amplitude: f32,
    quality: SignalQuality,
    consecutive_invalid: u8,

    hr_history: MedianFilter<HR_MEDIAN_SIZE>,
    last_hr: f32,
    ema_hr: f32,
    stable_count: u8,
    hr_valid: bool,
}

impl Default for PeakHr {
    fn default() -> Self {
        Self::new()
    }
}

impl PeakHr {
    pub const fn new() -> Self {
        Self {
            stats: RollingStats::new(),
            ac_dc_ratio: 0.0,
            peak_amplitude: 0.0,
            quality: SignalQuality::Poor,
            consecutive_invalid: 0,

            hr_history: MedianFilter::new(),
            last_hr: 0.0,
            ema_hr: 0.0,
            stable_count: 0,
            hr_valid: false,
        }
    }

    /// Full reset, discarding the sample window as well.
    pub fn clear(&mut self) {
        self.stats.clear();
        self.ac_dc_ratio = 0.0;
        self.partial_reset();
    }

    /// Partial reset after persistent poor quality: the sample window and its
    /// rolling statistics survive (keeping the warm-up cost paid), only the
    /// smoothing and validity state is discarded.
    fn partial_reset(&mut self) {
        self.hr_history.clear();
        self.last_hr = 0.0;
        self.ema_hr = 0.0;
        self.hr_valid = false;
        self.stable_count = 0;
        self.consecutive_invalid = 0;
        self.quality = SignalQuality::Poor;
        self.peak_amplitude = 0.0;
    }

    /// Appends one filtered AC sample along with the channel's current DC
    /// estimate. Side effects only; estimation happens in [`calculate`].
    ///
    /// [`calculate`]: PeakHr::calculate
    pub fn add_sample(&mut self, ac: f32, dc: f32) {
        self.stats.push(ac);

        if dc > SPO2_MIN_DC {
            self.ac_dc_ratio = self.stats.std_dev() / dc;
        }
    }

    pub fn signal_quality(&self) -> SignalQuality {
        self.quality
    }

    pub fn is_valid(&self) -> bool {
        self.hr_valid
    }

    /// Latest smoothed heart rate, meaningful only alongside [`is_valid`].
    ///
    /// [`is_valid`]: PeakHr::is_valid
    pub fn heart_rate(&self) -> f32 {
        self.ema_hr
    }

    /// The AC/DC ratio is the primary gate: it collapses within one window
    /// refill when the pulse disappears, while raw variance can stay elevated
    /// on filter ring-down.
    fn assess_quality(&self) -> SignalQuality {
        if self.ac_dc_ratio < MIN_AC_DC_RATIO {
            return SignalQuality::Poor;
        }

        let std_ok = self.stats.std_dev() >= MIN_STD_DEV;
        let amplitude_ok = self.peak_amplitude >= MIN_PEAK_AMPLITUDE;
        match (std_ok, amplitude_ok) {
            (true, true) => SignalQuality::Good,
            (true, false) | (false, true) => SignalQuality::Fair,
            (false, false) => SignalQuality::Poor,
        }
    }

    fn mark_invalid(&mut self) -> f32 {
        self.stable_count = 0;
        self.consecutive_invalid += 1;
        if self.consecutive_invalid >= INVALID_RESET_THRESHOLD {
            warn!("HR: persistent poor signal, resetting smoothing state");
            self.partial_reset();
        }
        self.hr_valid = false;
        self.last_hr
    }

    /// Runs one estimation pass over the sample window and returns the
    /// smoothed heart rate. Callers must check [`is_valid`] separately; on
    /// any rejection the previous reading is returned unchanged.
    ///
    /// [`is_valid`]: PeakHr::is_valid
    pub fn calculate(&mut self) -> f32 {
        if !self.stats.is_full() {
            return self.last_hr;
        }

        let mean = self.stats.mean();
        let std_dev = self.stats.std_dev();

        self.quality = self.assess_quality();
        if self.quality == SignalQuality::Poor {
            return self.mark_invalid();
        }
        self.consecutive_invalid = 0;

        // good signal affords a more permissive peak threshold
        let multiplier = match self.quality {
            SignalQuality::Good => 0.4,
            SignalQuality::Fair => 0.5,
            SignalQuality::Poor => 0.6,
        };
        let threshold = mean + multiplier * std_dev;

        let mut window = [0.0; HR_BUFFER_SIZE];
        for (slot, sample) in window.iter_mut().zip(self.stats.iter()) {
            *slot = sample;
        }

        // single scan: collect peaks and track min/max for the next quality
        // assessment
        let mut peaks: Vec<usize, MAX_PEAKS> = Vec::new();
        let mut min_val = mean;
        let mut max_val = mean;

        for i in 3..HR_BUFFER_SIZE - 3 {
            let value = window[i];
            min_val = min_val.min(value);
            max_val = max_val.max(value);

            let local_max = value > window[i - 1]
                && value > window[i - 2]
                && value > window[i - 3]
                && value > window[i + 1]
                && value > window[i + 2]
                && value > window[i + 3];

            if local_max && value > threshold {
                let far_enough = peaks
                    .last()
                    .map_or(true, |&prev| i - prev >= MIN_PEAK_DISTANCE);
                if far_enough && peaks.push(i).is_err() {
                    break;
                }
            }
        }

        self.peak_amplitude = max_val - min_val;

        if peaks.len() < 2 {
            return self.mark_invalid();
        }

        let mut intervals: Vec<f32, MAX_PEAKS> = Vec::new();
        for pair in peaks.windows(2) {
            let interval = pair[1] - pair[0];
            if (MIN_PEAK_DISTANCE..=MAX_PEAK_DISTANCE).contains(&interval) {
                // cannot overflow: at most peaks.len() - 1 entries
                let _ = intervals.push(interval as f32);
            }
        }

        // at the low end of the rate range the window only fits two peaks,
        // so a single plausible interval has to be enough; the median filter
        // and stability gate downstream absorb the extra variance
        if intervals.is_empty() {
            return self.mark_invalid();
        }

        let mut scratch = intervals.clone();
        let mut median_interval = median_of(&mut scratch);

        // one spurious peak can skew the whole estimate: when the spread is
        // large, keep only intervals near the median and re-take it
        let count = intervals.len() as f32;
        let interval_mean = intervals.iter().sum::<f32>() / count;
        let spread = (intervals
            .iter()
            .map(|i| (i - interval_mean) * (i - interval_mean))
            .sum::<f32>()
            / count)
            .sqrt();

        if spread > INTERVAL_SPREAD_LIMIT && intervals.len() > 2 {
            let mut filtered: Vec<f32, MAX_PEAKS> = intervals
                .iter()
                .copied()
                .filter(|i| (i - median_interval).abs() < INTERVAL_OUTLIER_DISTANCE)
                .collect();
            if filtered.len() >= 2 {
                median_interval = median_of(&mut filtered);
            }
        }

        // sample period is 10 ms, so BPM = 60 / (interval · 0.01 s)
        let hr = 6000.0 / median_interval;
        if !(MIN_HR_BPM..=MAX_HR_BPM).contains(&hr) {
            debug!("HR: implausible candidate {} bpm", hr);
            return self.mark_invalid();
        }

        let mut filtered_hr = self.hr_history.update(hr);

        // rate limit against the previous smoothed value
        if self.ema_hr > 0.0 {
            let diff = filtered_hr - self.ema_hr;
            filtered_hr = self.ema_hr + diff.clamp(-MAX_HR_CHANGE, MAX_HR_CHANGE);
        }

        if self.ema_hr == 0.0 {
            // first valid reading seeds the EMA directly
            self.ema_hr = filtered_hr;
        } else {
            self.ema_hr = HR_EMA_ALPHA * filtered_hr + (1.0 - HR_EMA_ALPHA) * self.ema_hr;
        }

        if self.hr_history.len() >= 2 {
            let diff = (self.ema_hr - self.last_hr).abs();
            if diff < STABLE_DELTA || self.last_hr == 0.0 {
                self.stable_count = self.stable_count.saturating_add(1);
            } else {
                // a large jump restarts the stability count without
                // invalidating a previously valid reading (hysteresis)
                self.stable_count = 0;
            }

            if self.stable_count >= STABLE_READINGS {
                if !self.hr_valid {
                    debug!("HR valid at {} bpm", self.ema_hr);
                }
                self.hr_valid = true;
                self.consecutive_invalid = 0;
            }
        }

        self.last_hr = self.ema_hr;
        self.ema_hr
    }
}

/// SpO2 core: R-value history ring and calibration polynomial.
pub struct PeakSpo2 {
    r_history: SlidingWindow<f32, R_HISTORY_SIZE>,
    last_spo2: f32,
    valid: bool,
}

impl Default for PeakSpo2 {
    fn default() -> Self {
        Self::new()
    }
}

impl PeakSpo2 {
    pub const fn new() -> Self {
        Self {
            r_history: SlidingWindow::new(),
            last_spo2: 0.0,
            valid: false,
        }
    }

    pub fn clear(&mut self) {
        self.r_history.clear();
        self.last_spo2 = 0.0;
        self.valid = false;
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn value(&self) -> f32 {
        self.last_spo2
    }

    /// Drops the validity flag without touching the R-value history, used
    /// when the shared quality gate fails before the R computation.
    pub fn invalidate(&mut self) {
        self.valid = false;
    }

    /// Computes SpO2 from per-interval AC-RMS and DC readings of both
    /// channels. On any gating failure the previous value is returned
    /// unchanged and the reading is marked invalid.
    pub fn calculate(&mut self, red_ac_rms: f32, red_dc: f32, ir_ac_rms: f32, ir_dc: f32) -> f32 {
        if red_dc < SPO2_MIN_DC || ir_dc < SPO2_MIN_DC || ir_ac_rms < SPO2_MIN_IR_AC_RMS {
            self.valid = false;
            return self.last_spo2;
        }

        let r = (red_ac_rms / red_dc) / (ir_ac_rms / ir_dc);
        if !(MIN_R_VALUE..=MAX_R_VALUE).contains(&r) {
            debug!("SpO2: R-value {} out of range", r);
            self.valid = false;
            return self.last_spo2;
        }

        self.r_history.push(r);
        let avg_r = self.r_history.iter().sum::<f32>() / self.r_history.len() as f32;

        let spo2 = spo2_from_ratio(avg_r);
        if !(MIN_SPO2..=MAX_SPO2).contains(&spo2) {
            self.valid = false;
            return self.last_spo2;
        }

        self.last_spo2 = spo2;
        self.valid = true;
        spo2
    }
}

/// Method 1 facade: owns one conditioner per channel and drives the
/// estimation cadence. The IR channel feeds the heart rate core; red is only
/// used for SpO2.
pub struct PeakMethod {
    red: SignalConditioner,
    ir: SignalConditioner,
    hr: PeakHr,
    spo2: PeakSpo2,
    sample_counter: u32,
}

impl Default for PeakMethod {
    fn default() -> Self {
        Self::new()
    }
}

impl PeakMethod {
    pub fn new() -> Self {
        Self {
            red: SignalConditioner::new(),
            ir: SignalConditioner::new(),
            hr: PeakHr::new(),
            spo2: PeakSpo2::new(),
            sample_counter: 0,
        }
    }

    pub fn signal_quality(&self) -> SignalQuality {
        self.hr.signal_quality()
    }
}

impl PulseEstimator for PeakMethod {
    fn reset(&mut self) {
        self.red.clear();
        self.ir.clear();
        self.hr.clear();
        self.spo2.clear();
        self.sample_counter = 0;
    }

    fn process_sample(&mut self, raw_red: u32, raw_ir: u32) {
        self.red.process(raw_red);
        let ir_ac = self.ir.process(raw_ir);

        self.hr.add_sample(ir_ac, self.ir.dc());

        self.sample_counter += 1;
        if self.sample_counter >= ESTIMATION_INTERVAL {
            self.sample_counter = 0;

            self.hr.calculate();

            // the RMS reads are destructive and must happen every interval,
            // even when the reading is discarded below
            let red_ac_rms = self.red.take_ac_rms();
            let ir_ac_rms = self.ir.take_ac_rms();

            // filter ring-down after signal loss keeps both channels' RMS
            // proportional, which would yield a plausible R from a dead
            // signal; the shared quality gate catches that
            if self.hr.signal_quality() == SignalQuality::Poor {
                self.spo2.invalidate();
            } else {
                self.spo2
                    .calculate(red_ac_rms, self.red.dc(), ir_ac_rms, self.ir.dc());
            }
        }
    }

    fn heart_rate(&self) -> f32 {
        self.hr.heart_rate()
    }

    fn spo2(&self) -> f32 {
        self.spo2.value()
    }

    fn hr_valid(&self) -> bool {
        self.hr.is_valid()
    }

    fn spo2_valid(&self) -> bool {
        self.spo2.is_valid()
    }
}
