//! Time source for message timestamps and chart pruning.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Milliseconds on the dashboard clock.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> f64;
}

/// Wall clock (Unix epoch milliseconds).
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> f64 {
        chrono::Utc::now().timestamp_millis() as f64
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default, Clone)]
pub struct ManualClock {
    bits: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start_millis: f64) -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(start_millis.to_bits())),
        }
    }

    pub fn set(&self, millis: f64) {
        self.bits.store(millis.to_bits(), Ordering::SeqCst);
    }

    pub fn advance(&self, millis: f64) {
        self.set(self.now_millis() + millis);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(100.0);
        let shared = clock.clone();
        clock.advance(25.5);
        assert_eq!(shared.now_millis(), 125.5);
        shared.set(0.0);
        assert_eq!(clock.now_millis(), 0.0);
    }

    #[test]
    fn test_system_clock_is_epoch_millis() {
        // Any date after 2020 is fine
        assert!(SystemClock.now_millis() > 1.5e12);
    }
}
