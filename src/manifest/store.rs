//! Keyed store of frozen manifests

use crate::freeze::freeze;
use crate::value::Value;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// How a manifest value was materialized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Parsed as a structured document (JSON or TOML)
    Parse,
    /// Executed as a script in an isolated context
    Evaluate,
}

/// A stored manifest
#[derive(Debug, Clone)]
pub struct CacheEntry {
    value: Value,
    strategy: Strategy,
    loaded_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Deep-freeze `value` and wrap it as an entry
    pub fn new(value: Value, strategy: Strategy) -> Self {
        freeze(&value);
        Self {
            value,
            strategy,
            loaded_at: Utc::now(),
        }
    }

    /// The frozen value (a handle to the stored containers)
    pub fn value(&self) -> Value {
        self.value.clone()
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}

/// Summary of one cached entry
#[derive(Debug, Clone, Serialize)]
pub struct EntryInfo {
    pub path: PathBuf,
    pub strategy: Strategy,
    pub loaded_at: DateTime<Utc>,
}

/// Path-keyed manifest store.
///
/// Keys are compared exactly as given: `a.json` and `./a.json` are distinct
/// entries. Every stored value is frozen.
#[derive(Debug, Default)]
pub struct ManifestStore {
    entries: HashMap<PathBuf, CacheEntry>,
}

impl ManifestStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frozen value cached for `path`
    pub fn get(&self, path: &Path) -> Option<Value> {
        self.entries.get(path).map(CacheEntry::value)
    }

    pub fn entry(&self, path: &Path) -> Option<&CacheEntry> {
        self.entries.get(path)
    }

    /// Freeze and store `value` under `path`, replacing any previous entry
    pub fn insert(&mut self, path: PathBuf, value: Value, strategy: Strategy) -> Value {
        let entry = CacheEntry::new(value, strategy);
        let stored = entry.value();
        self.entries.insert(path, entry);
        stored
    }

    /// Evict `path`, returning whether an entry existed
    pub fn remove(&mut self, path: &Path) -> bool {
        self.entries.remove(path).is_some()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Evict everything, returning how many entries were dropped
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }

    /// Cached paths, sorted
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<_> = self.entries.keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Per-entry summaries, sorted by path
    pub fn entries(&self) -> Vec<EntryInfo> {
        let mut infos: Vec<_> = self
            .entries
            .iter()
            .map(|(path, entry)| EntryInfo {
                path: path.clone(),
                strategy: entry.strategy,
                loaded_at: entry.loaded_at,
            })
            .collect();
        infos.sort_by(|a, b| a.path.cmp(&b.path));
        infos
    }
}
