//! Clock capability.
//!
//! All "now" / "today" references in the engine go through this trait so
//! scenario tests can pin or advance time. Production wiring uses
//! [`SystemClock`]; tests use [`FixedClock`].

use chrono::{DateTime, Local, NaiveDateTime, Utc};

/// Time source for the broker.
///
/// Object-safe and `Send + Sync` so one clock can be shared across accounts.
pub trait Clock: Send + Sync {
    /// Current instant in UTC. Drives ids, order timestamps, settlement
    /// dates, and borrow-fee day counting.
    fn now(&self) -> DateTime<Utc>;

    /// Current wall time at the venue, used only by the market-hours gate.
    fn now_local(&self) -> NaiveDateTime;
}

/// Wall-clock implementation.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn now_local(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Settable clock for tests.
///
/// `now_local` returns the pinned instant's naive form, i.e. tests treat the
/// fixed UTC instant as venue wall time.
#[derive(Debug)]
pub struct FixedClock {
    at: std::sync::Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self {
            at: std::sync::Mutex::new(at),
        }
    }

    /// Pin the clock to a new instant.
    pub fn set(&self, at: DateTime<Utc>) {
        *self.at.lock().expect("clock lock poisoned") = at;
    }

    /// Move the clock forward.
    pub fn advance(&self, by: chrono::Duration) {
        let mut at = self.at.lock().expect("clock lock poisoned");
        *at = *at + by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.at.lock().expect("clock lock poisoned")
    }

    fn now_local(&self) -> NaiveDateTime {
        self.now().naive_utc()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
