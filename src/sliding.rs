//! Fixed-capacity circular sample windows.
//!
//! Every buffer in this crate is one of these: a preallocated array with a
//! wrapping write index and a sticky `full` flag. The flag transitions
//! false→true exactly once per session and only an explicit [`clear`] reverts
//! it. Nothing ever reallocates.
//!
//! [`clear`]: SlidingWindow::clear

use core::mem::MaybeUninit;

pub struct SlidingWindow<T: Copy, const N: usize> {
    buffer: [MaybeUninit<T>; N],
    idx: usize,
    full: bool,
}

impl<T: Copy, const N: usize> Default for SlidingWindow<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy, const N: usize> SlidingWindow<T, N> {
    pub const fn new() -> Self {
        Self {
            buffer: [MaybeUninit::uninit(); N],
            idx: 0,
            full: false,
        }
    }

    pub fn clear(&mut self) {
        self.idx = 0;
        self.full = false;
    }

    pub fn len(&self) -> usize {
        if self.full {
            N
        } else {
            self.idx
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn is_full(&self) -> bool {
        self.full
    }

    /// Appends a sample, returning the overwritten one once the window has
    /// wrapped around.
    pub fn push(&mut self, sample: T) -> Option<T> {
        let old = self
            .full
            .then_some(unsafe { self.buffer[self.idx].assume_init() });

        self.buffer[self.idx] = MaybeUninit::new(sample);
        self.idx = (self.idx + 1) % N;
        if self.idx == 0 {
            self.full = true;
        }

        old
    }

    /// Returns the sample `n` positions behind the newest one, where `n = 0`
    /// is the newest itself. `None` if the window does not reach back that
    /// far yet.
    pub fn nth_back(&self, n: usize) -> Option<T> {
        if n >= self.len() {
            return None;
        }
        let idx = (self.idx + N - 1 - n) % N;
        Some(unsafe { self.buffer[idx].assume_init() })
    }

    /// Iterates the stored samples oldest-first.
    pub fn iter(&self) -> impl Iterator<Item = T> + Clone + '_ {
        (self.idx..N)
            .chain(0..self.idx)
            .map(|i| self.buffer[i])
            .take(self.len())
            .map(|e| unsafe { e.assume_init() })
    }
}
