//! Streaming window statistics: O(1)-per-sample sums, averages, windowed
//! mean/variance and a read-and-clear RMS accumulator.

pub mod average;
pub mod rms;
pub mod stats;
pub mod sum;
