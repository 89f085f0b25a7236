//! Sliding-window request admission for outgoing calls to third-party APIs
//! (§4.2). Bounds the *count* of operations per window and, independently,
//! shapes the *duration* of each admitted operation: either a hard deadline
//! the whole admission+call must fit inside, or a floor the call is padded up
//! to.
//!
//! # Example
//!
//! ```rust
//! use statcore_ratelimiter::{Bound, RequestLimiter};
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let limiter = RequestLimiter::new(600, Duration::from_secs(300));
//! let token = CancellationToken::new();
//!
//! let outcome = limiter
//!     .limit(&token, Bound::MaxOperationTime(Duration::from_secs(5)), || async {
//!         Ok::<_, std::io::Error>("response")
//!     })
//!     .await
//!     .unwrap();
//! # }
//! ```

mod error;
mod limiter;

pub use error::RateLimitError;

use limiter::SharedWindow;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

#[cfg(feature = "tracing")]
use tracing::debug;

/// How `limit` bounds the timing of an admitted operation.
#[derive(Debug, Clone, Copy)]
pub enum Bound {
    /// The admission wait plus the operation itself must complete within
    /// `d`; if admission cannot happen in time, the operation never runs.
    MaxOperationTime(Duration),
    /// The operation always takes at least `d`; if it returns sooner, the
    /// limiter sleeps out the remainder after the operation completes.
    MinOperationTime(Duration),
}

/// Result of a call through [`RequestLimiter::limit`].
#[derive(Debug)]
pub enum Outcome<R> {
    /// The operation ran and produced `R`.
    Ran(R),
    /// Admission was refused within the bound; the operation never ran.
    Dropped,
}

/// A cloneable, sliding-window request admission gate.
#[derive(Debug, Clone)]
pub struct RequestLimiter {
    window: SharedWindow,
}

impl RequestLimiter {
    /// Admits at most `max_ops` operations per sliding `window`.
    pub fn new(max_ops: usize, window: Duration) -> Self {
        Self {
            window: SharedWindow::new(max_ops, window),
        }
    }

    /// Admits according to the sliding window, then runs `operation` shaped
    /// by `bound`.
    ///
    /// - `Bound::MaxOperationTime(d)`: if admission is not possible within
    ///   `d`, returns `Err(RateLimitError::TemporarilyUnavailable)` and
    ///   `operation` never runs. The clock for `d` starts when `limit` is
    ///   called, not after admission.
    /// - `Bound::MinOperationTime(d)`: admission blocks until granted (there
    ///   is no count-based timeout on this path); the limiter then runs
    ///   `operation` and sleeps out any remainder of `d` after it returns.
    pub async fn limit<F, Fut, R>(
        &self,
        cancellation: &CancellationToken,
        bound: Bound,
        operation: F,
    ) -> Result<Outcome<R>, RateLimitError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = R>,
    {
        match bound {
            Bound::MaxOperationTime(deadline) => {
                let started = Instant::now();
                self.admit_within(cancellation, deadline, started).await?;
                let result = operation().await;
                Ok(Outcome::Ran(result))
            }
            Bound::MinOperationTime(floor) => {
                self.admit_unbounded(cancellation).await?;
                let started = Instant::now();
                let result = operation().await;
                let elapsed = started.elapsed();
                if let Some(remaining) = floor.checked_sub(elapsed) {
                    if remaining > Duration::ZERO {
                        tokio::select! {
                            biased;
                            _ = cancellation.cancelled() => {}
                            _ = tokio::time::sleep(remaining) => {}
                        }
                    }
                }
                Ok(Outcome::Ran(result))
            }
        }
    }

    async fn admit_within(
        &self,
        cancellation: &CancellationToken,
        deadline: Duration,
        started: Instant,
    ) -> Result<(), RateLimitError> {
        loop {
            if cancellation.is_cancelled() {
                return Err(RateLimitError::Cancelled);
            }
            let now = Instant::now();
            let remaining = deadline.checked_sub(now.duration_since(started));
            let Some(remaining) = remaining else {
                return Err(RateLimitError::TemporarilyUnavailable);
            };
            match self.window.try_admit(now) {
                Ok(()) => return Ok(()),
                Err(wait) => {
                    if wait > remaining {
                        #[cfg(feature = "tracing")]
                        debug!(?wait, ?remaining, "admission would exceed bound");
                        return Err(RateLimitError::TemporarilyUnavailable);
                    }
                    tokio::select! {
                        biased;
                        _ = cancellation.cancelled() => return Err(RateLimitError::Cancelled),
                        _ = tokio::time::sleep(wait) => {}
                    }
                }
            }
        }
    }

    async fn admit_unbounded(&self, cancellation: &CancellationToken) -> Result<(), RateLimitError> {
        loop {
            let now = Instant::now();
            match self.window.try_admit(now) {
                Ok(()) => return Ok(()),
                Err(wait) => {
                    tokio::select! {
                        biased;
                        _ = cancellation.cancelled() => return Err(RateLimitError::Cancelled),
                        _ = tokio::time::sleep(wait) => {}
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn admits_within_count_and_runs_operation() {
        let limiter = RequestLimiter::new(2, Duration::from_secs(1));
        let token = CancellationToken::new();

        let outcome = limiter
            .limit(&token, Bound::MaxOperationTime(Duration::from_millis(50)), || async { 1 })
            .await
            .unwrap();
        assert!(matches!(outcome, Outcome::Ran(1)));
    }

    #[tokio::test]
    async fn max_operation_time_refuses_when_window_exhausted() {
        let limiter = RequestLimiter::new(1, Duration::from_secs(10));
        let token = CancellationToken::new();

        limiter
            .limit(&token, Bound::MaxOperationTime(Duration::from_millis(10)), || async { 1 })
            .await
            .unwrap();

        let err = limiter
            .limit(&token, Bound::MaxOperationTime(Duration::from_millis(10)), || async { 2 })
            .await
            .unwrap_err();
        assert_eq!(err, RateLimitError::TemporarilyUnavailable);
    }

    #[tokio::test]
    async fn min_operation_time_pads_a_fast_call() {
        let limiter = RequestLimiter::new(10, Duration::from_secs(1));
        let token = CancellationToken::new();

        let started = Instant::now();
        limiter
            .limit(&token, Bound::MinOperationTime(Duration::from_millis(50)), || async { 1 })
            .await
            .unwrap();
        assert!(started.elapsed() >= Duration::from_millis(45));
    }

    #[tokio::test]
    async fn cancellation_during_admission_wait_yields_cancelled() {
        let limiter = RequestLimiter::new(1, Duration::from_secs(10));
        let token = CancellationToken::new();

        limiter
            .limit(&token, Bound::MaxOperationTime(Duration::from_secs(5)), || async { 1 })
            .await
            .unwrap();

        let token2 = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            token2.cancel();
        });

        let err = limiter
            .limit(&token, Bound::MaxOperationTime(Duration::from_secs(5)), || async { 2 })
            .await
            .unwrap_err();
        assert_eq!(err, RateLimitError::Cancelled);
    }

    #[tokio::test]
    async fn concurrent_callers_share_the_same_window() {
        let limiter = Arc::new(RequestLimiter::new(5, Duration::from_secs(10)));
        let runs = Arc::new(AtomicUsize::new(0));
        let token = CancellationToken::new();

        let mut handles = Vec::new();
        for _ in 0..5 {
            let limiter = Arc::clone(&limiter);
            let runs = Arc::clone(&runs);
            let token = token.clone();
            handles.push(tokio::spawn(async move {
                limiter
                    .limit(&token, Bound::MaxOperationTime(Duration::from_millis(200)), || {
                        let runs = Arc::clone(&runs);
                        async move {
                            runs.fetch_add(1, Ordering::SeqCst);
                        }
                    })
                    .await
            }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }
        assert_eq!(runs.load(Ordering::SeqCst), 5);

        let err = limiter
            .limit(&token, Bound::MaxOperationTime(Duration::from_millis(10)), || async {})
            .await
            .unwrap_err();
        assert_eq!(err, RateLimitError::TemporarilyUnavailable);
    }
}
