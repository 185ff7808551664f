//! Per-language export snapshot cache.
//!
//! Process-wide state, constructed at startup and shared by reference across
//! request handlers. Holds one key→value snapshot per language with a
//! time-based expiry. All access goes through `get`/`put`/`invalidate` (plus
//! the single-flight `get_or_fill`), so the whole thing can be swapped for a
//! fresh instance in tests.
//!
//! Two concurrency properties matter here:
//! - concurrent misses for the same language collapse into one fill
//!   (per-language fill locks);
//! - an `invalidate` that lands while a fill is in flight wins: the fill's
//!   snapshot was computed from pre-invalidation state and is not published
//!   (per-language generation counters).

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// Full key→value mapping of one language's translations. `BTreeMap` keeps
/// serialization order stable so repeat exports are byte-identical.
pub type Snapshot = Arc<BTreeMap<String, String>>;

struct CacheEntry {
    snapshot: Snapshot,
    expires_at: Instant,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<i64, CacheEntry>,
    /// Bumped by `invalidate`; a fill only publishes if the generation it
    /// started from is still current.
    generations: HashMap<i64, u64>,
}

#[derive(Default)]
pub struct ExportCache {
    inner: RwLock<Inner>,
    fill_locks: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl ExportCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached snapshot for a language, if present and not expired.
    pub async fn get(&self, language_id: i64) -> Option<Snapshot> {
        let inner = self.inner.read().await;
        let entry = inner.entries.get(&language_id)?;
        if Instant::now() < entry.expires_at {
            Some(entry.snapshot.clone())
        } else {
            None
        }
    }

    /// Store a snapshot, replacing any prior entry, expiring at `now + ttl`.
    pub async fn put(&self, language_id: i64, snapshot: Snapshot, ttl: Duration) {
        let mut inner = self.inner.write().await;
        inner.entries.insert(
            language_id,
            CacheEntry {
                snapshot,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Drop the entry for one language, forcing the next read to recompute.
    /// Also defeats any fill currently in flight for that language.
    pub async fn invalidate(&self, language_id: i64) {
        let mut inner = self.inner.write().await;
        inner.entries.remove(&language_id);
        *inner.generations.entry(language_id).or_insert(0) += 1;
        debug!(language_id, "export cache invalidated");
    }

    /// Cached snapshot, or run `fill` to compute one. Concurrent callers for
    /// the same language collapse onto a single fill; the rest wait and reuse
    /// its result from the cache.
    pub async fn get_or_fill<F, Fut, E>(
        &self,
        language_id: i64,
        ttl: Duration,
        fill: F,
    ) -> Result<Snapshot, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<BTreeMap<String, String>, E>>,
    {
        if let Some(snapshot) = self.get(language_id).await {
            return Ok(snapshot);
        }

        let lock = self.fill_lock(language_id).await;
        let _guard = lock.lock().await;

        // Another caller may have completed the fill while we waited.
        if let Some(snapshot) = self.get(language_id).await {
            return Ok(snapshot);
        }

        let generation = self.generation(language_id).await;
        let snapshot: Snapshot = Arc::new(fill().await?);

        let mut inner = self.inner.write().await;
        if inner.generations.get(&language_id).copied().unwrap_or(0) == generation {
            inner.entries.insert(
                language_id,
                CacheEntry {
                    snapshot: snapshot.clone(),
                    expires_at: Instant::now() + ttl,
                },
            );
        } else {
            // A write invalidated this language mid-fill; the snapshot may
            // predate it. Serve it to this caller but leave the cache cold.
            debug!(language_id, "fill superseded by invalidation, not cached");
        }
        Ok(snapshot)
    }

    async fn generation(&self, language_id: i64) -> u64 {
        self.inner
            .read()
            .await
            .generations
            .get(&language_id)
            .copied()
            .unwrap_or(0)
    }

    async fn fill_lock(&self, language_id: i64) -> Arc<Mutex<()>> {
        let mut locks = self.fill_locks.lock().await;
        locks.entry(language_id).or_default().clone()
    }
}
