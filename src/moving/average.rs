use crate::moving::sum::MovingSum;

/// Moving average over a sliding window. While the window is still filling
/// the divisor is the number of samples seen, so the output is meaningful
/// from the very first sample.
#[derive(Default)]
pub struct MovingAverage<const N: usize> {
    sum: MovingSum<N>,
}

impl<const N: usize> MovingAverage<N> {
    pub const fn new() -> Self {
        Self {
            sum: MovingSum::new(),
        }
    }

    pub fn clear(&mut self) {
        self.sum.clear();
    }

    pub fn is_full(&self) -> bool {
        self.sum.is_full()
    }

    pub fn update(&mut self, sample: f32) -> f32 {
        let sum = self.sum.update(sample);
        sum / self.sum.len() as f32
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn averages_partial_and_full_windows() {
        let mut avg: MovingAverage<4> = MovingAverage::new();

        assert_eq!(2.0, avg.update(2.0));
        assert_eq!(3.0, avg.update(4.0));
        assert_eq!(4.0, avg.update(6.0));
        assert_eq!(5.0, avg.update(8.0));
        // 2.0 evicted
        assert_eq!(7.0, avg.update(10.0));
    }
}
