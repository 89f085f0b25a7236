//! Data-map half of the cache (§4.1, §5 — "Cache maps: guarded by a
//! per-cache mutex").

use hashbrown::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

#[derive(Clone, Debug)]
struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

/// Whether entries ever expire. `Unbounded` never does; `Ttl` expires an
/// entry `duration` after it was `set` (not refreshed on reads, per §4.1).
#[derive(Clone, Copy, Debug)]
pub(crate) enum Expiry {
    Unbounded,
    Ttl(Duration),
}

impl Expiry {
    fn is_expired(&self, inserted_at: Instant) -> bool {
        match self {
            Expiry::Unbounded => false,
            Expiry::Ttl(ttl) => inserted_at.elapsed() > *ttl,
        }
    }
}

pub(crate) struct DataStore<K, V> {
    entries: HashMap<K, Entry<V>>,
    expiry: Expiry,
}

impl<K: Hash + Eq + Clone, V: Clone> DataStore<K, V> {
    pub(crate) fn new(expiry: Expiry) -> Self {
        Self {
            entries: HashMap::new(),
            expiry,
        }
    }

    /// Returns the value if present and not expired. An expired entry is
    /// removed as a side effect, matching "expired entries behave as if
    /// absent on next get_or_claim".
    pub(crate) fn get(&mut self, key: &K) -> Option<V> {
        let expired = match self.entries.get(key) {
            Some(entry) => self.expiry.is_expired(entry.inserted_at),
            None => return None,
        };
        if expired {
            self.entries.remove(key);
            return None;
        }
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    pub(crate) fn insert(&mut self, key: K, value: V) {
        self.entries.insert(
            key,
            Entry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    pub(crate) fn remove(&mut self, key: &K) {
        self.entries.remove(key);
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn unbounded_never_expires() {
        let mut store = DataStore::new(Expiry::Unbounded);
        store.insert("k", 1);
        sleep(Duration::from_millis(20));
        assert_eq!(store.get(&"k"), Some(1));
    }

    #[test]
    fn ttl_expires_and_is_removed() {
        let mut store = DataStore::new(Expiry::Ttl(Duration::from_millis(20)));
        store.insert("k", 1);
        assert_eq!(store.get(&"k"), Some(1));
        sleep(Duration::from_millis(30));
        assert_eq!(store.get(&"k"), None);
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn ttl_not_refreshed_on_read() {
        let mut store = DataStore::new(Expiry::Ttl(Duration::from_millis(30)));
        store.insert("k", 1);
        sleep(Duration::from_millis(15));
        assert_eq!(store.get(&"k"), Some(1));
        sleep(Duration::from_millis(20));
        // 35ms since insert, beyond the 30ms ttl, even though a read happened midway.
        assert_eq!(store.get(&"k"), None);
    }
}
