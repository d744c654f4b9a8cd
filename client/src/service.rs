//! Caching, de-duplicating, write-batching front for the content gateway.
//!
//! Reads go through a TTL cache and share in-flight requests per key. Writes
//! are applied to the cache immediately, queued with last-write-wins per key,
//! and flushed together once no new write has arrived for the debounce
//! window. Failures never surface as errors: reads resolve to `None`, writes
//! to `false`, and the cause is logged.

use futures::future::{join_all, BoxFuture, FutureExt, Shared};
use shared_types::ContentKey;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch, Mutex};
use tokio::time::Instant;
use tracing::{debug, error, warn};

use crate::cache::ReadCache;
use crate::transport::Transport;

type SharedRead = Shared<BoxFuture<'static, Option<serde_json::Value>>>;

#[derive(Debug, Clone)]
pub struct DataServiceConfig {
    /// How long a confirmed value is served without asking the server.
    pub cache_ttl: Duration,
    /// Quiet period after the last `set` before the queue is flushed.
    pub debounce: Duration,
    /// Writes per batch within one flush.
    pub write_batch_size: usize,
}

impl Default for DataServiceConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(5 * 60),
            debounce: Duration::from_millis(500),
            write_batch_size: 5,
        }
    }
}

struct WriteQueue {
    entries: BTreeMap<ContentKey, serde_json::Value>,
    /// Bumped on every enqueue; a timer only flushes if it is still current.
    generation: u64,
    outcome: watch::Sender<Option<bool>>,
}

impl WriteQueue {
    fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            generation: 0,
            outcome: watch::channel(None).0,
        }
    }

    /// Detach the queued writes together with the channel their callers wait on.
    fn drain(
        &mut self,
    ) -> (
        BTreeMap<ContentKey, serde_json::Value>,
        watch::Sender<Option<bool>>,
    ) {
        self.generation += 1;
        let entries = std::mem::take(&mut self.entries);
        let outcome = std::mem::replace(&mut self.outcome, watch::channel(None).0);
        (entries, outcome)
    }
}

struct Inner {
    transport: Arc<dyn Transport>,
    config: DataServiceConfig,
    cache: Mutex<ReadCache>,
    in_flight: Mutex<HashMap<ContentKey, SharedRead>>,
    writes: Mutex<WriteQueue>,
    changes: broadcast::Sender<ContentKey>,
}

/// Client data service. Cheap to clone; clones share caches and queue.
///
/// Construct one per process (or per admin session) and hand it to whoever
/// needs content. The debounce timer runs on the ambient tokio runtime.
#[derive(Clone)]
pub struct DataService {
    inner: Arc<Inner>,
}

impl DataService {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_config(transport, DataServiceConfig::default())
    }

    pub fn with_config(transport: Arc<dyn Transport>, config: DataServiceConfig) -> Self {
        let (changes, _) = broadcast::channel(64);
        Self {
            inner: Arc::new(Inner {
                transport,
                config,
                cache: Mutex::new(ReadCache::new()),
                in_flight: Mutex::new(HashMap::new()),
                writes: Mutex::new(WriteQueue::new()),
                changes,
            }),
        }
    }

    pub fn config(&self) -> &DataServiceConfig {
        &self.inner.config
    }

    /// Value of `key`, or `None` when it could not be fetched.
    ///
    /// `None` means "unknown", not "empty": callers fall back to defaults.
    pub async fn get(&self, key: ContentKey, force_refresh: bool) -> Option<serde_json::Value> {
        if !force_refresh {
            let cache = self.inner.cache.lock().await;
            if let Some(value) = cache.fresh(key, self.inner.config.cache_ttl, Instant::now()) {
                debug!(%key, "Cache hit");
                return Some(value);
            }
        }

        let read = {
            let mut in_flight = self.inner.in_flight.lock().await;
            match in_flight.get(&key) {
                Some(read) => {
                    debug!(%key, "Joining in-flight read");
                    read.clone()
                }
                None => {
                    let inner = Arc::clone(&self.inner);
                    let read = async move { inner.fetch_one(key).await }.boxed().shared();
                    in_flight.insert(key, read.clone());
                    read
                }
            }
        };

        read.await
    }

    /// Values for all `keys` that could be resolved, in one round trip where
    /// possible. Falls back to per-key reads if the batch request fails.
    pub async fn get_batch(&self, keys: &[ContentKey]) -> HashMap<ContentKey, serde_json::Value> {
        let mut resolved = HashMap::with_capacity(keys.len());
        let mut missing = Vec::new();

        {
            let cache = self.inner.cache.lock().await;
            let now = Instant::now();
            for &key in keys {
                match cache.fresh(key, self.inner.config.cache_ttl, now) {
                    Some(value) => {
                        resolved.insert(key, value);
                    }
                    None if !missing.contains(&key) => missing.push(key),
                    None => {}
                }
            }
        }

        if missing.is_empty() {
            return resolved;
        }

        match self.inner.transport.fetch_batch(&missing).await {
            Ok(fetched) => {
                let mut cache = self.inner.cache.lock().await;
                let now = Instant::now();
                for (key, value) in fetched {
                    cache.record_fetch(key, value.clone(), now);
                    if let Some(current) = cache.fresh(key, self.inner.config.cache_ttl, now) {
                        resolved.insert(key, current);
                    }
                }
            }
            Err(e) => {
                warn!(
                    error = %e,
                    count = missing.len(),
                    "Batch read failed, reading keys individually"
                );
                let reads = missing
                    .iter()
                    .map(|&key| async move { (key, self.get(key, false).await) });
                for (key, value) in join_all(reads).await {
                    if let Some(value) = value {
                        resolved.insert(key, value);
                    }
                }
            }
        }

        resolved
    }

    /// Queue a write of `data` to `key`.
    ///
    /// The cache reflects `data` immediately. Resolves once the flush that
    /// carried this write has settled: `true` if every write in that flush
    /// succeeded. Later `set`s on the same key before the flush replace this
    /// one and share its outcome.
    pub async fn set(&self, key: ContentKey, data: serde_json::Value) -> bool {
        self.inner.cache.lock().await.stage(key, data.clone());

        let mut outcome = {
            let mut queue = self.inner.writes.lock().await;
            queue.entries.insert(key, data);
            queue.generation += 1;

            let generation = queue.generation;
            let inner = Arc::clone(&self.inner);
            tokio::spawn(async move {
                tokio::time::sleep(inner.config.debounce).await;
                inner.flush_if_current(generation).await;
            });

            queue.outcome.subscribe()
        };

        // A dropped sender means the flush never ran
        let settled = outcome.wait_for(Option::is_some).await.map(|settled| *settled);
        matches!(settled, Ok(Some(true)))
    }

    /// Flush queued writes now instead of waiting for the debounce timer.
    pub async fn flush(&self) -> bool {
        let (entries, outcome) = self.inner.writes.lock().await.drain();
        let ok = self.inner.write_all(entries).await;
        outcome.send_replace(Some(ok));
        ok
    }

    /// Drop cached values for `key`, or for every key when `None`.
    pub async fn clear_cache(&self, key: Option<ContentKey>) {
        self.inner.cache.lock().await.clear(key);
    }

    pub async fn has_pending_write(&self, key: ContentKey) -> bool {
        self.inner.writes.lock().await.entries.contains_key(&key)
    }

    /// Tell other views that `key` changed so they drop their cached copy.
    pub fn announce_change(&self, key: ContentKey) {
        // No subscribers is fine
        let _ = self.inner.changes.send(key);
    }

    pub fn changes(&self) -> broadcast::Receiver<ContentKey> {
        self.inner.changes.subscribe()
    }

    /// Clear the cache entry of every key announced through
    /// [`DataService::announce_change`] on `source`.
    pub fn spawn_invalidation_listener(&self, source: &DataService) -> tokio::task::JoinHandle<()> {
        let mut changes = source.changes();
        let service = self.clone();
        tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(key) => {
                        debug!(%key, "Content changed, dropping cached copy");
                        service.clear_cache(Some(key)).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Missed change notifications, clearing cache");
                        service.clear_cache(None).await;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}

impl Inner {
    async fn fetch_one(&self, key: ContentKey) -> Option<serde_json::Value> {
        let result = self.transport.fetch(key).await;

        let value = match result {
            Ok(value) => {
                let mut cache = self.cache.lock().await;
                cache.record_fetch(key, value.clone(), Instant::now());
                // A pending local edit wins over what the server returned
                cache.fresh(key, self.config.cache_ttl, Instant::now()).or(Some(value))
            }
            Err(e) => {
                warn!(%key, error = %e, "Read failed");
                None
            }
        };

        self.in_flight.lock().await.remove(&key);
        value
    }

    async fn flush_if_current(&self, generation: u64) {
        let (entries, outcome) = {
            let mut queue = self.writes.lock().await;
            if queue.generation != generation {
                return;
            }
            queue.drain()
        };

        let ok = self.write_all(entries).await;
        outcome.send_replace(Some(ok));
    }

    async fn write_all(&self, entries: BTreeMap<ContentKey, serde_json::Value>) -> bool {
        if entries.is_empty() {
            return true;
        }

        let writes: Vec<(ContentKey, serde_json::Value)> = entries.into_iter().collect();
        debug!(count = writes.len(), "Flushing queued writes");

        let batches = writes
            .chunks(self.config.write_batch_size.max(1))
            .map(|batch| {
                join_all(batch.iter().map(|(key, value)| async move {
                    (*key, value, self.transport.store(*key, value).await)
                }))
            });
        let results = join_all(batches).await;

        let mut all_ok = true;
        let mut cache = self.cache.lock().await;
        let now = Instant::now();
        for (key, value, result) in results.into_iter().flatten() {
            match result {
                Ok(()) => cache.confirm(key, value, now),
                Err(e) => {
                    all_ok = false;
                    error!(%key, error = %e, "Write failed");
                    cache.roll_back(key, value);
                }
            }
        }

        all_ok
    }
}
