#[cfg(feature = "nostd")]
use micromath::F32Ext;

/// Accumulates the sum of squares of every sample added since the last
/// [`take_rms`] call.
///
/// [`take_rms`] is deliberately destructive: the returned RMS describes the
/// interval since the previous read, and reading resets the accumulator.
/// Callers that poll it periodically therefore get per-interval RMS values
/// without any extra bookkeeping.
///
/// [`take_rms`]: RmsAccumulator::take_rms
#[derive(Default)]
pub struct RmsAccumulator {
    squared_sum: f32,
    count: u32,
}

impl RmsAccumulator {
    pub const fn new() -> Self {
        Self {
            squared_sum: 0.0,
            count: 0,
        }
    }

    pub fn clear(&mut self) {
        self.squared_sum = 0.0;
        self.count = 0;
    }

    pub fn add(&mut self, sample: f32) {
        self.squared_sum += sample * sample;
        self.count += 1;
    }

    /// Root-mean-square of the samples accumulated since the last call,
    /// consuming them. Returns 0 if nothing was accumulated.
    pub fn take_rms(&mut self) -> f32 {
        if self.count == 0 {
            return 0.0;
        }

        let rms = (self.squared_sum / self.count as f32).sqrt();
        self.clear();
        rms
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn take_rms_consumes_the_accumulator() {
        let mut rms = RmsAccumulator::new();
        rms.add(3.0);
        rms.add(4.0);

        // sqrt((9 + 16) / 2)
        let expected = (25.0f32 / 2.0).sqrt();
        assert!((rms.take_rms() - expected).abs() < 1e-6);

        // second read has nothing left to report
        assert_eq!(0.0, rms.take_rms());
    }
}
