use dashmap::DashMap;
use shared_types::ContentKey;
use std::time::{Duration, Instant};

struct CachedValue {
    value: serde_json::Value,
    stored_at: Instant,
}

/// In-process read cache in front of the content store.
///
/// Entries are filled lazily by reads and evicted by writes to the same key.
/// With `ttl: None` an entry lives until evicted or the process exits.
/// Caches are per process: a write on one instance does not evict entries
/// held by another.
pub struct ResponseCache {
    entries: DashMap<ContentKey, CachedValue>,
    ttl: Option<Duration>,
}

impl ResponseCache {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn get(&self, key: ContentKey) -> Option<serde_json::Value> {
        {
            let entry = self.entries.get(&key)?;
            let fresh = self
                .ttl
                .map_or(true, |ttl| entry.stored_at.elapsed() < ttl);
            if fresh {
                return Some(entry.value.clone());
            }
        }

        // The shard guard above must be released before removing.
        self.entries.remove(&key);
        None
    }

    pub fn insert(&self, key: ContentKey, value: serde_json::Value) {
        self.entries.insert(
            key,
            CachedValue {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    pub fn evict(&self, key: ContentKey) {
        self.entries.remove(&key);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
