//! Load-once manifest cache

use super::eval::{Evaluator, QuickJsEvaluator};
use super::source::{DocumentFormat, FsReader, SourceReader};
use super::store::{EntryInfo, ManifestStore, Strategy};
use crate::error::{GlacierError, GlacierResult};
use crate::value::Value;
use parking_lot::Mutex;
use serde::Serialize;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Counters describing cache traffic
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Cacheable requests served from the store
    pub hits: u64,
    /// Cacheable requests that had to materialize
    pub misses: u64,
    /// Requests made with caching disabled
    pub bypassed: u64,
    /// Entries removed by explicit eviction
    pub evictions: u64,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    bypassed: AtomicU64,
    evictions: AtomicU64,
}

/// Manifest cache.
///
/// Holds its own [`ManifestStore`]; share one instance (e.g. behind an
/// `Arc`) wherever a process-wide cache is wanted. Parsed and evaluated
/// manifests live in the same store, keyed only by path.
///
/// Cacheable calls hold the store lock while a missing entry is read and
/// materialized, script evaluation included. A slow manifest therefore
/// stalls every other cacheable call, hits on unrelated paths too, until it
/// finishes. Calls with `should_cache == false` never take the lock.
pub struct ManifestCache {
    store: Mutex<ManifestStore>,
    reader: Box<dyn SourceReader>,
    evaluator: Box<dyn Evaluator>,
    counters: Counters,
}

impl ManifestCache {
    /// Create a cache reading from disk and evaluating with QuickJS
    pub fn new() -> Self {
        Self::with_collaborators(FsReader, QuickJsEvaluator::new())
    }

    /// Create a cache with a custom reader and evaluator
    pub fn with_collaborators(
        reader: impl SourceReader + 'static,
        evaluator: impl Evaluator + 'static,
    ) -> Self {
        Self {
            store: Mutex::new(ManifestStore::new()),
            reader: Box::new(reader),
            evaluator: Box::new(evaluator),
            counters: Counters::default(),
        }
    }

    /// Load a structured (JSON or TOML) manifest.
    ///
    /// With `should_cache`, a stored entry is returned without touching the
    /// reader, and a fresh load is deep-frozen and stored. Without it, the
    /// file is read and parsed on every call and the result stays mutable.
    pub fn load_manifest(&self, path: impl AsRef<Path>, should_cache: bool) -> GlacierResult<Value> {
        self.materialize(path.as_ref(), should_cache, Strategy::Parse)
    }

    /// Evaluate a script manifest and return its root binding object.
    ///
    /// Caching behaves as in [`ManifestCache::load_manifest`]. Empty files
    /// fail with [`GlacierError::EmptyManifest`] before any evaluation.
    pub fn eval_manifest(&self, path: impl AsRef<Path>, should_cache: bool) -> GlacierResult<Value> {
        self.materialize(path.as_ref(), should_cache, Strategy::Evaluate)
    }

    /// Evict `path`, returning whether an entry existed
    pub fn clear_manifest_cache(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        let removed = self.store.lock().remove(path);
        if removed {
            self.counters.evictions.fetch_add(1, Ordering::Relaxed);
            debug!("Evicted manifest {}", path.display());
        }
        removed
    }

    /// Evict every entry, returning how many were dropped
    pub fn clear(&self) -> usize {
        let count = self.store.lock().clear();
        self.counters
            .evictions
            .fetch_add(count as u64, Ordering::Relaxed);
        count
    }

    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.store.lock().contains(path.as_ref())
    }

    pub fn len(&self) -> usize {
        self.store.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.lock().is_empty()
    }

    /// Summaries of the cached entries, sorted by path
    pub fn entries(&self) -> Vec<EntryInfo> {
        self.store.lock().entries()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            bypassed: self.counters.bypassed.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
        }
    }

    /// Shared control flow for both strategies.
    ///
    /// The store lock is held from lookup to insert so concurrent callers
    /// never materialize the same path twice.
    fn materialize(&self, path: &Path, should_cache: bool, strategy: Strategy) -> GlacierResult<Value> {
        if !should_cache {
            self.counters.bypassed.fetch_add(1, Ordering::Relaxed);
            return self.produce(path, strategy);
        }

        let mut store = self.store.lock();
        if let Some(value) = store.get(path) {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            debug!("Manifest cache hit: {}", path.display());
            return Ok(value);
        }

        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        debug!("Manifest cache miss: {}", path.display());
        let value = self.produce(path, strategy)?;
        Ok(store.insert(path.to_path_buf(), value, strategy))
    }

    fn produce(&self, path: &Path, strategy: Strategy) -> GlacierResult<Value> {
        let content = self
            .reader
            .read_to_string(path)
            .map_err(|e| GlacierError::read_failed(path, e))?;

        match strategy {
            Strategy::Parse => DocumentFormat::from_path(path).parse(path, &content),
            Strategy::Evaluate => {
                if content.is_empty() {
                    return Err(GlacierError::EmptyManifest(path.to_path_buf()));
                }
                self.evaluator
                    .evaluate(&content, path)
                    .map(Value::Object)
                    .map_err(|reason| GlacierError::EvaluationFailed {
                        path: path.to_path_buf(),
                        reason,
                    })
            }
        }
    }
}

impl Default for ManifestCache {
    fn default() -> Self {
        Self::new()
    }
}
