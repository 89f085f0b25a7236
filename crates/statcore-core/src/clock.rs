//! A `Clock` abstraction so staleness-tier checks (§4.3) and dedup guards
//! (§4.4) can be unit-tested without `sleep`ing real wall-clock time.

use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};

/// Returns the current wall-clock time. Production code uses [`SystemClock`];
/// tests use a fixed or manually-advanced clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that always returns the same instant unless advanced, for tests
/// that need precise control over "age" calculations (repo staleness tiers,
/// recency/dedup guards).
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    pub fn advance(&self, delta: chrono::Duration) {
        let mut guard = self.now.lock().unwrap();
        *guard += delta;
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap() = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_advances_explicitly() {
        let epoch = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let clock = FixedClock::new(epoch);
        assert_eq!(clock.now(), epoch);
        clock.advance(chrono::Duration::days(10));
        assert_eq!(clock.now(), epoch + chrono::Duration::days(10));
    }
}
