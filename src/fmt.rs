//! Logging macros that forward to `defmt` and/or `log` depending on the
//! enabled features. With neither enabled they expand to nothing, so the
//! sample path stays allocation- and I/O-free on constrained targets.

macro_rules! debug {
    ($($args:tt)*) => {
        #[cfg(feature = "defmt")]
        ::defmt::debug!($($args)*);
        #[cfg(feature = "log")]
        ::log::debug!($($args)*);
    }
}

macro_rules! warn {
    ($($args:tt)*) => {
        #[cfg(feature = "defmt")]
        ::defmt::warn!($($args)*);
        #[cfg(feature = "log")]
        ::log::warn!($($args)*);
    }
}
