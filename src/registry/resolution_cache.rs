//! # Resolution Cache
//!
//! Memoizing, concurrency-safe map from a concrete type to its resolved value
//! (or to an explicit "nothing applies").
//!
//! ## Concurrency
//!
//! Each key owns a slot (`Arc<OnceLock<..>>`). The DashMap shard lock is held
//! only long enough to fetch or insert the slot; the resolution itself runs in
//! `OnceLock::get_or_init` with no shard lock held. Concurrent first callers of
//! the same key wait for a single computation, while callers of other keys,
//! including keys that hash to the same shard, proceed independently.
//!
//! Entries are never evicted; a slot is written at most once.

use crate::taxonomy::TypeKey;
use dashmap::DashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

type Slot<V> = Arc<OnceLock<Option<V>>>;

/// Write-once-per-key cache of resolution results
pub struct ResolutionCache<V> {
    entries: DashMap<TypeKey, Slot<V>>,
    computations: AtomicU64,
    hits: AtomicU64,
}

impl<V: Clone> ResolutionCache<V> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            computations: AtomicU64::new(0),
            hits: AtomicU64::new(0),
        }
    }

    /// Return the cached value for `key`, running `resolve` exactly once if the
    /// key has not been resolved yet. A `None` result is cached as well.
    pub fn get_or_resolve<F>(&self, key: &TypeKey, resolve: F) -> Option<V>
    where
        F: FnOnce(&TypeKey) -> Option<V>,
    {
        let slot = self.slot(key);
        let mut computed = false;
        let value = slot.get_or_init(|| {
            computed = true;
            self.computations.fetch_add(1, Ordering::Relaxed);
            resolve(key)
        });
        if !computed {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        value.clone()
    }

    /// Observe an entry without resolving it.
    ///
    /// The outer `None` means "not yet resolved"; `Some(None)` means the key was
    /// resolved and nothing applies.
    pub fn peek(&self, key: &TypeKey) -> Option<Option<V>> {
        let slot = self.entries.get(key).map(|entry| Arc::clone(entry.value()))?;
        slot.get().cloned()
    }

    /// Number of keys that have been resolved
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.value().get().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> ResolutionCacheStats {
        let mut stats = ResolutionCacheStats {
            computations: self.computations.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            ..ResolutionCacheStats::default()
        };
        for entry in self.entries.iter() {
            match entry.value().get() {
                Some(Some(_)) => stats.resolved += 1,
                Some(None) => stats.absent += 1,
                None => continue,
            }
            stats.cached_types += 1;
        }
        stats
    }

    fn slot(&self, key: &TypeKey) -> Slot<V> {
        if let Some(entry) = self.entries.get(key) {
            return Arc::clone(entry.value());
        }
        let entry = self.entries.entry(key.clone()).or_default();
        Arc::clone(entry.value())
    }
}

impl<V: Clone> Default for ResolutionCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for ResolutionCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolutionCache")
            .field("entries", &self.entries.len())
            .field("computations", &self.computations.load(Ordering::Relaxed))
            .finish()
    }
}

/// Statistics about a resolution cache
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionCacheStats {
    /// Keys with a resolved entry (value or absence)
    pub cached_types: usize,
    /// Keys resolved to a value
    pub resolved: usize,
    /// Keys resolved to "nothing applies"
    pub absent: usize,
    /// Number of times a resolver closure actually ran
    pub computations: u64,
    /// Lookups answered from an existing entry
    pub hits: u64,
}
