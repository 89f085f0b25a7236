use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Sliding-log admission counter: a `VecDeque<Instant>` of recent admission
/// timestamps is sufficient; no token bucket required (§9). Admission blocks
/// until the oldest timestamp exits the window or the bound elapses.
#[derive(Debug)]
struct SlidingLog {
    max_ops: usize,
    window: Duration,
    log: VecDeque<Instant>,
}

impl SlidingLog {
    fn new(max_ops: usize, window: Duration) -> Self {
        Self {
            max_ops,
            window,
            log: VecDeque::with_capacity(max_ops),
        }
    }

    fn evict_expired(&mut self, now: Instant) {
        while let Some(&oldest) = self.log.front() {
            if now.duration_since(oldest) >= self.window {
                self.log.pop_front();
            } else {
                break;
            }
        }
    }

    /// Returns `Ok(())` if a slot is free now, or `Err(wait)` with the
    /// duration until the oldest entry exits the window.
    fn try_admit(&mut self, now: Instant) -> Result<(), Duration> {
        self.evict_expired(now);
        if self.log.len() < self.max_ops {
            self.log.push_back(now);
            return Ok(());
        }
        let oldest = *self.log.front().expect("log full implies non-empty");
        let wait = oldest
            .checked_add(self.window)
            .map(|expiry| expiry.saturating_duration_since(now))
            .unwrap_or(Duration::ZERO);
        Err(wait)
    }
}

/// Shared, cloneable sliding-window admission counter. Guarded by a
/// `std::sync::Mutex` around the ordered log of recent timestamps (§5).
#[derive(Debug, Clone)]
pub(crate) struct SharedWindow {
    inner: Arc<Mutex<SlidingLog>>,
}

impl SharedWindow {
    pub(crate) fn new(max_ops: usize, window: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SlidingLog::new(max_ops, window))),
        }
    }

    /// Attempts to admit immediately, recording the admission on success.
    pub(crate) fn try_admit(&self, now: Instant) -> Result<(), Duration> {
        self.inner.lock().expect("sliding log mutex poisoned").try_admit(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admits_up_to_the_limit() {
        let mut log = SlidingLog::new(2, Duration::from_secs(1));
        let now = Instant::now();
        assert!(log.try_admit(now).is_ok());
        assert!(log.try_admit(now).is_ok());
        assert!(log.try_admit(now).is_err());
    }

    #[test]
    fn expired_entries_free_a_slot() {
        let mut log = SlidingLog::new(1, Duration::from_millis(50));
        let t0 = Instant::now();
        assert!(log.try_admit(t0).is_ok());
        let later = t0 + Duration::from_millis(60);
        assert!(log.try_admit(later).is_ok());
    }

    #[test]
    fn reports_wait_until_oldest_expires() {
        let mut log = SlidingLog::new(1, Duration::from_millis(100));
        let t0 = Instant::now();
        log.try_admit(t0).unwrap();
        let soon = t0 + Duration::from_millis(30);
        let wait = log.try_admit(soon).unwrap_err();
        assert!(wait <= Duration::from_millis(70));
    }
}
