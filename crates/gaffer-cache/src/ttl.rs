//! TTL key/value store.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::debug;

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

/// In-memory cache with per-entry time-to-live.
///
/// Expiry is lazy: an expired entry may still occupy storage until it is
/// overwritten or purged, but `get` never returns it. There is no capacity
/// bound beyond TTL expiry; concurrent writers to the same key race on
/// last-writer-wins semantics.
pub struct TtlCache<K, V> {
    entries: RwLock<HashMap<K, Entry<V>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Look up a key, returning the value only if it has not expired.
    pub async fn get(&self, key: &K) -> Option<V> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        if Instant::now() < entry.expires_at {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    /// Store a value with an absolute expiry computed at write time.
    ///
    /// Unconditionally overwrites any prior entry for the key.
    pub async fn set(&self, key: K, value: V, ttl: Duration) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key,
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Drop expired entries.
    ///
    /// Not required for correctness (expiry is enforced on read); callers
    /// may invoke this periodically to reclaim memory.
    pub async fn purge_expired(&self) {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        let now = Instant::now();
        entries.retain(|_, entry| now < entry.expires_at);
        let purged = before - entries.len();
        if purged > 0 {
            debug!(purged, remaining = entries.len(), "Purged expired cache entries");
        }
    }

    /// Number of stored entries, including not-yet-purged expired ones.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the cache holds no entries at all.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl<K, V> Default for TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
