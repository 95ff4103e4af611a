//! Update-in-flight guard.
//!
//! A mutual-exclusion flag, not a queue: whoever fails to acquire it drops
//! its work. The flag is released when the permit drops, including during
//! a panic unwind.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct InFlightGuard {
    flag: Arc<AtomicBool>,
}

impl InFlightGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the flag, or `None` if an update is already in flight.
    pub fn try_acquire(&self) -> Option<InFlightPermit> {
        self.flag
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightPermit {
                flag: Arc::clone(&self.flag),
            })
    }

    pub fn is_in_flight(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Holds the in-flight flag until dropped.
#[derive(Debug)]
pub struct InFlightPermit {
    flag: Arc<AtomicBool>,
}

impl Drop for InFlightPermit {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
