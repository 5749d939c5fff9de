use std::sync::atomic::{AtomicI64, Ordering};

use strongbox_core::constants::SECONDS_PER_DAY;
use strongbox_core::types::Timestamp;

/// Read-only, non-decreasing wall-clock source in unix seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// System wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        chrono::Utc::now().timestamp()
    }
}

/// Hand-driven clock for tests and simulations. Never moves backwards.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn starting_at(now: Timestamp) -> Self {
        Self { now: AtomicI64::new(now) }
    }

    pub fn advance(&self, secs: i64) {
        self.now.fetch_add(secs.max(0), Ordering::SeqCst);
    }

    pub fn advance_days(&self, days: i64) {
        self.advance(days.saturating_mul(SECONDS_PER_DAY));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}
