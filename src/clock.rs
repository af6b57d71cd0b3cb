//! Time Source Module
//!
//! All timelock comparisons in the coordinator go through an injectable
//! clock so that expiry logic can be tested deterministically. Production
//! code uses [`SystemClock`]; tests supply a manually-advanced clock.

use std::time::{SystemTime, UNIX_EPOCH};

/// Injectable time source for timelock comparisons.
///
/// Implementations must be cheap to call; the coordinator reads the clock
/// on every validation and refund-eligibility check.
pub trait Clock: Send + Sync {
    /// Returns the current time as seconds since the Unix epoch.
    fn unix_now(&self) -> u64;
}

/// Wall-clock implementation backed by [`SystemTime`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn unix_now(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}
