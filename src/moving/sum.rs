use crate::sliding::SlidingWindow;

/// Sum over a sliding window, maintained incrementally: each update adds the
/// new sample and subtracts the evicted one, so cost is O(1) regardless of
/// window length.
#[derive(Default)]
pub struct MovingSum<const N: usize> {
    window: SlidingWindow<f32, N>,
    current: f32,
}

impl<const N: usize> MovingSum<N> {
    pub const fn new() -> Self {
        Self {
            window: SlidingWindow::new(),
            current: 0.0,
        }
    }

    pub fn clear(&mut self) {
        self.window.clear();
        self.current = 0.0;
    }

    /// Number of samples currently in the window.
    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.window.is_full()
    }

    /// Pushes a sample and returns the sum over the (possibly still filling)
    /// window.
    pub fn update(&mut self, sample: f32) -> f32 {
        self.current += sample;
        if let Some(old) = self.window.push(sample) {
            self.current -= old;
        }
        self.current
    }
}
