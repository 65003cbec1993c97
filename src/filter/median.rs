use crate::sliding::SlidingWindow;

use super::Filter;

/// Median over the filled portion of a small sliding window.
///
/// Unlike a textbook median filter this one does not wait for the window to
/// fill: the median of however many samples have arrived is already a useful
/// smoothed reading during warm-up. An even sample count yields the average
/// of the two middle values.
#[derive(Default)]
pub struct MedianFilter<const N: usize> {
    window: SlidingWindow<f32, N>,
}

impl<const N: usize> MedianFilter<N> {
    pub const fn new() -> Self {
        Self {
            window: SlidingWindow::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }
}

impl<const N: usize> Filter for MedianFilter<N> {
    fn update(&mut self, sample: f32) -> f32 {
        self.window.push(sample);

        let mut copy = [0.0; N];
        let len = self.window.len();
        for (slot, value) in copy.iter_mut().zip(self.window.iter()) {
            *slot = value;
        }

        median_of(&mut copy[..len])
    }

    fn clear(&mut self) {
        self.window.clear();
    }
}

/// Median of a scratch slice; sorts it in place.
pub(crate) fn median_of(values: &mut [f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }

    // insertion sort; every caller's slice is small
    for i in 1..values.len() {
        let mut j = i;
        while j > 0 && values[j - 1] > values[j] {
            values.swap(j - 1, j);
            j -= 1;
        }
    }

    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn median_over_full_window() {
        let mut filter: MedianFilter<5> = MedianFilter::new();
        filter.update(0.0);
        filter.update(1.0);
        filter.update(2.0);
        filter.update(3.0);
        assert_eq!(2.0, filter.update(4.0));
        assert_eq!(2.0, filter.update(1.0));
        assert_eq!(2.0, filter.update(2.0));
        assert_eq!(3.0, filter.update(5.0));
    }

    #[test]
    fn median_while_filling() {
        let mut filter: MedianFilter<5> = MedianFilter::new();
        assert_eq!(7.0, filter.update(7.0));
        // even count averages the middle pair
        assert_eq!(5.0, filter.update(3.0));
        assert_eq!(7.0, filter.update(9.0));
    }

    #[test]
    fn median_of_slice() {
        let mut empty: [f32; 0] = [];
        assert_eq!(0.0, median_of(&mut empty));
        assert_eq!(4.0, median_of(&mut [4.0]));
        assert_eq!(2.5, median_of(&mut [4.0, 1.0, 3.0, 2.0]));
        assert_eq!(3.0, median_of(&mut [5.0, 1.0, 3.0]));
    }
}
