//! Shared supertype cache.
//!
//! `get_supertype` results are memoized in a concurrent side table keyed by
//! `(type, target declaration)`. The cache is disabled while the graph is
//! still being wired, and types carrying an underlying marker are never
//! used as keys.

use crate::def::DeclId;
use crate::types::ProducedType;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

pub struct SupertypeCache {
    entries: DashMap<(ProducedType, DeclId), Option<ProducedType>>,
    enabled: AtomicBool,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Default for SupertypeCache {
    fn default() -> Self {
        Self::new()
    }
}

impl SupertypeCache {
    /// A new, disabled cache.
    pub fn new() -> Self {
        SupertypeCache {
            entries: DashMap::new(),
            enabled: AtomicBool::new(false),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn enable(&self) {
        if !self.enabled.swap(true, Ordering::AcqRel) {
            debug!("supertype cache enabled");
        }
    }

    /// Disable lookups and inserts. Existing entries are dropped since they
    /// may describe a graph that is about to change.
    pub fn disable(&self) {
        if self.enabled.swap(false, Ordering::AcqRel) {
            debug!("supertype cache disabled");
        }
        self.entries.clear();
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Outer `None` is a miss; inner `None` is a cached negative answer.
    pub fn get(&self, key: &(ProducedType, DeclId)) -> Option<Option<ProducedType>> {
        if !self.is_enabled() {
            return None;
        }
        match self.entries.get(key) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Idempotent: a concurrent insert of the same key keeps the first value.
    pub fn insert(&self, key: (ProducedType, DeclId), value: Option<ProducedType>) {
        if self.is_enabled() {
            self.entries.entry(key).or_insert(value);
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
#[path = "../tests/cache_tests.rs"]
mod tests;
