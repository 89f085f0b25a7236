//! Single-flight caching (§4.1).
//!
//! `Cache<K, V>` guarantees at most one concurrent "producer" per key while
//! any number of concurrent callers wait for its result, with a cleanup rule
//! on producer failure so retries remain possible. This is the same pattern
//! Go calls `singleflight`; the two eviction variants required by the design
//! spec — unbounded and TTL — share one implementation that differs only in
//! [`store::Expiry`].
//!
//! # Example
//!
//! ```rust
//! use statcore_cache::Cache;
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let cache: Cache<String, u64> = Cache::unbounded();
//! let token = CancellationToken::new();
//!
//! let (value, created) = cache
//!     .get_or_create(&token, "key".to_string(), || async { Ok::<_, std::io::Error>(42) })
//!     .await
//!     .unwrap();
//! assert_eq!(value, 42);
//! assert!(created);
//! # }
//! ```

mod store;
mod waiters;

use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use parking_lot::Mutex;
use store::{DataStore, Expiry};
use waiters::WaiterMap;

#[cfg(feature = "tracing")]
use tracing::debug;

/// Result of [`Cache::get_or_claim`].
pub enum Hit<V> {
    /// The value is cached and usable as-is.
    Valid(V),
    /// No other caller is producing a value for this key; the caller is now
    /// responsible for calling [`Cache::set`] or [`Cache::delete`].
    Claimed,
    /// Another caller is already producing a value for this key. Await the
    /// handle, then retry `get_or_claim`.
    Waiting(WaitHandle),
}

/// A one-shot wait for the in-flight producer of a key to finish (success or
/// failure — the handle doesn't carry the value, it just signals "try
/// again").
pub struct WaitHandle {
    receiver: tokio::sync::broadcast::Receiver<()>,
}

impl WaitHandle {
    /// Waits for the producer to release the key, or for `cancellation` to
    /// fire. Returns `true` if released, `false` if cancelled.
    pub async fn wait(mut self, cancellation: &CancellationToken) -> bool {
        tokio::select! {
            biased;
            _ = cancellation.cancelled() => false,
            _ = self.receiver.recv() => true,
        }
    }
}

/// A generic single-flight cache, parametric over key `K` and value `V`.
pub struct Cache<K, V> {
    data: Mutex<DataStore<K, V>>,
    waiters: Arc<WaiterMap<K>>,
}

impl<K: Hash + Eq + Clone, V: Clone> Cache<K, V> {
    /// Creates a cache whose entries never expire. Suited to tests and small
    /// fixed domains (§4.1).
    pub fn unbounded() -> Self {
        Self::new(Expiry::Unbounded)
    }

    /// Creates a cache whose entries expire `ttl` after being `set`. TTL is
    /// not refreshed on reads.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self::new(Expiry::Ttl(ttl))
    }

    fn new(expiry: Expiry) -> Self {
        Self {
            data: Mutex::new(DataStore::new(expiry)),
            waiters: Arc::new(WaiterMap::new()),
        }
    }

    /// Atomically reads the entry, claims it, or returns a handle to wait on
    /// another caller's claim. Never blocks and never fails (§4.1).
    pub fn get_or_claim(&self, key: &K) -> Hit<V> {
        if let Some(value) = self.data.lock().get(key) {
            return Hit::Valid(value);
        }
        match self.waiters.try_claim(key.clone()) {
            None => Hit::Claimed,
            Some(receiver) => Hit::Waiting(WaitHandle { receiver }),
        }
    }

    /// Stores `value`, marks it valid, and releases every waiter on `key`.
    pub fn set(&self, key: K, value: V) {
        self.data.lock().insert(key.clone(), value);
        self.waiters.release(&key);
    }

    /// Removes any entry for `key` and releases every waiter (so the next
    /// caller becomes the producer).
    pub fn delete(&self, key: &K) {
        self.data.lock().remove(key);
        self.waiters.release(key);
    }

    /// The composed operation every cached read path actually calls: resolve
    /// `key` from cache, or run `produce` exactly once among concurrent
    /// callers and cache the result.
    ///
    /// Returns `(value, created)` where `created` is `true` iff this call ran
    /// `produce` itself. On producer error, the entry is deleted so the next
    /// waiter (or a fresh call) can retry.
    pub async fn get_or_create<F, Fut, E>(
        &self,
        cancellation: &CancellationToken,
        key: K,
        produce: F,
    ) -> Result<(V, bool), E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let mut produce = Some(produce);
        loop {
            match self.get_or_claim(&key) {
                Hit::Valid(value) => return Ok((value, false)),
                Hit::Claimed => {
                    let produce = produce
                        .take()
                        .expect("produce is only consumed once we've claimed the key");
                    return match produce().await {
                        Ok(value) => {
                            self.set(key, value.clone());
                            Ok((value, true))
                        }
                        Err(err) => {
                            self.delete(&key);
                            Err(err)
                        }
                    };
                }
                Hit::Waiting(handle) => {
                    #[cfg(feature = "tracing")]
                    debug!("waiting on in-flight producer");
                    handle.wait(cancellation).await;
                    // Whether released by set/delete or abandoned because we
                    // were cancelled, loop back and re-check the cache; a
                    // cancelled wait simply retries the claim race.
                    if cancellation.is_cancelled() {
                        // A cancelled waiter still re-checks once in case the
                        // value landed in the same instant, matching "a
                        // waiter whose context cancels simply abandons the
                        // wait; the claim is unaffected" (§5). If nothing is
                        // there, the caller's own cancellation will surface
                        // through their own call stack on the next await.
                        if let Hit::Valid(value) = self.get_or_claim(&key) {
                            return Ok((value, false));
                        }
                    }
                }
            }
        }
    }
}
