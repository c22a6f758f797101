//! Layer cache
//!
//! One [`CacheEntry`] per key per layer twin. Entries are written only under
//! the layer lock; every write bumps the cache version so that a resolution
//! which checked the cache before taking the lock can tell whether it has to
//! look again (double-checked locking).

use dashmap::DashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use tessera_domain::{Instance, Key, Lifetime};

use super::scope_var::ScopeSnapshot;
use crate::ports::Recipe;

/// Cached outcome of a resolution
#[derive(Clone)]
pub(crate) enum CacheEntry {
    /// Value reused for the layer's lifetime
    Singleton(Instance),
    /// Recipe invoked on every resolution
    Transient(Recipe),
    /// Value reused while `snapshot` is fresh, recomputed with `recipe` otherwise
    Scoped {
        value: Instance,
        recipe: Recipe,
        snapshot: ScopeSnapshot,
    },
}

impl CacheEntry {
    pub(crate) fn lifetime(&self) -> Lifetime {
        match self {
            Self::Singleton(_) => Lifetime::Singleton,
            Self::Transient(_) => Lifetime::Transient,
            Self::Scoped { .. } => Lifetime::Scoped,
        }
    }
}

impl fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Singleton(_) => f.write_str("Singleton"),
            Self::Transient(_) => f.write_str("Transient"),
            Self::Scoped { snapshot, .. } => f.debug_tuple("Scoped").field(snapshot).finish(),
        }
    }
}

/// Versioned cache map of one layer twin
#[derive(Default)]
pub(crate) struct LayerCache {
    entries: DashMap<Key, CacheEntry>,
    version: AtomicU64,
}

impl LayerCache {
    /// Version to compare against after taking the layer lock
    pub(crate) fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    pub(crate) fn get(&self, key: &Key) -> Option<CacheEntry> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    pub(crate) fn contains(&self, key: &Key) -> bool {
        self.entries.contains_key(key)
    }

    /// Commit an entry; callers hold the layer lock
    pub(crate) fn insert(&self, key: Key, entry: CacheEntry) {
        self.entries.insert(key, entry);
        self.version.fetch_add(1, Ordering::AcqRel);
    }

    /// Copy of the entries a `copy` sandbox keeps
    ///
    /// Scoped entries are dropped: their snapshots point at the scope
    /// variables of the layer being copied, not at the forked ones.
    pub(crate) fn copy_for_sandbox(&self) -> Self {
        let entries = DashMap::new();
        for entry in &self.entries {
            if !matches!(entry.value(), CacheEntry::Scoped { .. }) {
                entries.insert(entry.key().clone(), entry.value().clone());
            }
        }
        Self {
            entries,
            version: AtomicU64::new(0),
        }
    }
}

impl fmt::Debug for LayerCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerCache")
            .field("entries", &self.entries.len())
            .field("version", &self.version())
            .finish()
    }
}
