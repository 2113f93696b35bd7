//! Politeness pacing between requests.
//!
//! There is no retry anywhere in the pipeline; the only deliberate waits
//! are these pauses between successive page fetches and downloads.

use std::time::Duration;

/// A pause inserted between successive requests.
pub trait Throttle {
    /// Block the current thread for one pacing interval.
    fn pause(&self);
}

/// Constant delay: the same sleep every time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstantDelay(pub Duration);

impl ConstantDelay {
    pub const fn from_millis(ms: u64) -> Self {
        Self(Duration::from_millis(ms))
    }
}

impl Throttle for ConstantDelay {
    fn pause(&self) {
        if !self.0.is_zero() {
            log::trace!("throttle: sleeping {:?}", self.0);
            std::thread::sleep(self.0);
        }
    }
}

/// No pacing (tests, or when the caller paces externally).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl Throttle for NoDelay {
    fn pause(&self) {}
}
