use crate::sliding::SlidingWindow;

#[cfg(feature = "nostd")]
use micromath::F32Ext;

/// Mean and population variance over a sliding window, kept in sync with the
/// window incrementally: samples enter via Welford's recurrence and leave via
/// its exact inverse when the window wraps, so no O(N) rescan is ever needed.
#[derive(Default)]
pub struct RollingStats<const N: usize> {
    window: SlidingWindow<f32, N>,
    mean: f32,
    m2: f32,
}

impl<const N: usize> RollingStats<N> {
    pub const fn new() -> Self {
        Self {
            window: SlidingWindow::new(),
            mean: 0.0,
            m2: 0.0,
        }
    }

    pub fn clear(&mut self) {
        self.window.clear();
        self.mean = 0.0;
        self.m2 = 0.0;
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.window.is_full()
    }

    pub fn push(&mut self, sample: f32) {
        if let Some(old) = self.window.push(sample) {
            // window was full: retire the evicted sample first (inverse
            // Welford step, N -> N-1), then admit the new one (N-1 -> N)
            let n = N as f32;
            let reduced_mean = (n * self.mean - old) / (n - 1.0);
            self.m2 -= (old - self.mean) * (old - reduced_mean);
            self.mean = reduced_mean;

            let delta = sample - self.mean;
            self.mean += delta / n;
            self.m2 += delta * (sample - self.mean);
        } else {
            let count = self.window.len() as f32;
            let delta = sample - self.mean;
            self.mean += delta / count;
            self.m2 += delta * (sample - self.mean);
        }
    }

    pub fn mean(&self) -> f32 {
        self.mean
    }

    /// Population variance of the current window contents.
    pub fn variance(&self) -> f32 {
        if self.window.is_empty() {
            return 0.0;
        }
        // m2 can drift marginally negative on near-constant input
        (self.m2 / self.window.len() as f32).max(0.0)
    }

    pub fn std_dev(&self) -> f32 {
        self.variance().sqrt()
    }

    /// Window contents, oldest-first.
    pub fn iter(&self) -> impl Iterator<Item = f32> + Clone + '_ {
        self.window.iter()
    }
}
