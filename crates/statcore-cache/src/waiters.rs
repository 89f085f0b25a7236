//! Waiter notification, kept deliberately separate from the data map so that
//! signalling waiters never blocks a `get`/`set` on the data map (§5).

use hashbrown::HashMap;
use parking_lot::Mutex;
use std::hash::Hash;
use tokio::sync::broadcast;

/// Tracks, per key, whether a producer currently holds the claim and (if so)
/// a close-once channel other callers can wait on.
pub(crate) struct WaiterMap<K> {
    claims: Mutex<HashMap<K, broadcast::Sender<()>>>,
}

impl<K: Hash + Eq + Clone> WaiterMap<K> {
    pub(crate) fn new() -> Self {
        Self {
            claims: Mutex::new(HashMap::new()),
        }
    }

    /// Returns `None` if this call becomes the claim holder, `Some(receiver)`
    /// if another caller already holds it.
    pub(crate) fn try_claim(&self, key: K) -> Option<broadcast::Receiver<()>> {
        let mut claims = self.claims.lock();
        if let Some(sender) = claims.get(&key) {
            Some(sender.subscribe())
        } else {
            let (tx, _rx) = broadcast::channel(1);
            claims.insert(key, tx);
            None
        }
    }

    /// Releases the claim on `key`, waking every current waiter.
    pub(crate) fn release(&self, key: &K) {
        let mut claims = self.claims.lock();
        if let Some(sender) = claims.remove(key) {
            let _ = sender.send(());
        }
    }

    pub(crate) fn is_claimed(&self, key: &K) -> bool {
        self.claims.lock().contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_claim_attempt_joins_as_waiter() {
        let waiters: WaiterMap<&str> = WaiterMap::new();
        assert!(waiters.try_claim("k").is_none());
        assert!(waiters.try_claim("k").is_some());
        assert!(waiters.is_claimed(&"k"));
    }

    #[test]
    fn release_frees_the_key_for_a_new_claim() {
        let waiters: WaiterMap<&str> = WaiterMap::new();
        assert!(waiters.try_claim("k").is_none());
        waiters.release(&"k");
        assert!(!waiters.is_claimed(&"k"));
        assert!(waiters.try_claim("k").is_none());
    }

    #[tokio::test]
    async fn waiter_is_woken_on_release() {
        let waiters: WaiterMap<&str> = WaiterMap::new();
        assert!(waiters.try_claim("k").is_none());
        let mut rx = waiters.try_claim("k").unwrap();
        waiters.release(&"k");
        assert!(rx.recv().await.is_ok());
    }
}
