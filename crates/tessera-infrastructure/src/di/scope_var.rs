//! Scope variables and version snapshots
//!
//! A scope variable is a versioned mutable cell. Its version strictly increases
//! on every external update and is never bumped by reads. Scoped cache entries
//! keep a [`ScopeSnapshot`] of `(variable, version)` pairs observed while they
//! were computed; the entry stays valid for as long as every pair is current.

use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tessera_domain::error::{Error, Result};
use tessera_domain::{Instance, Key};

/// Versioned mutable cell
pub(crate) struct ScopeVar {
    key: Key,
    default: Option<Instance>,
    value: RwLock<Option<Instance>>,
    version: AtomicU64,
}

impl ScopeVar {
    pub(crate) fn new(key: Key, default: Option<Instance>) -> Self {
        Self {
            key,
            value: RwLock::new(default.clone()),
            default,
            version: AtomicU64::new(0),
        }
    }

    pub(crate) fn key(&self) -> &Key {
        &self.key
    }

    /// Current version
    pub(crate) fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Read the value together with the version it belongs to
    pub(crate) fn read(&self) -> (Option<Instance>, u64) {
        let value = self.value.read();
        (value.clone(), self.version())
    }

    /// Replace the value and bump the version, returning the previous value
    ///
    /// Callers hold the owning layer's lock.
    pub(crate) fn update(&self, new_value: Instance) -> Option<Instance> {
        let mut value = self.value.write();
        let previous = value.replace(new_value);
        self.version.fetch_add(1, Ordering::AcqRel);
        previous
    }

    /// Independent copy for a sandbox layer
    pub(crate) fn fork(&self, reset: bool) -> Self {
        let value = if reset {
            self.default.clone()
        } else {
            self.value.read().clone()
        };
        Self {
            key: self.key.clone(),
            default: self.default.clone(),
            value: RwLock::new(value),
            version: AtomicU64::new(0),
        }
    }
}

impl fmt::Debug for ScopeVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeVar")
            .field("key", &self.key)
            .field("version", &self.version())
            .field("defined", &self.value.read().is_some())
            .finish()
    }
}

/// Read a scope variable on behalf of a resolution
pub(crate) fn read_defined(var: &Arc<ScopeVar>) -> Result<(Instance, u64)> {
    match var.read() {
        (Some(value), version) => Ok((value, version)),
        (None, _) => Err(Error::undefined_scope_var(var.key().clone())),
    }
}

/// Scope variable versions observed while computing a value
#[derive(Clone, Default)]
pub(crate) struct ScopeSnapshot {
    reads: Vec<(Arc<ScopeVar>, u64)>,
}

impl ScopeSnapshot {
    pub(crate) fn is_empty(&self) -> bool {
        self.reads.is_empty()
    }

    /// Record a read; the first observed version of a variable wins
    pub(crate) fn record(&mut self, var: &Arc<ScopeVar>, version: u64) {
        if !self.reads.iter().any(|(seen, _)| Arc::ptr_eq(seen, var)) {
            self.reads.push((Arc::clone(var), version));
        }
    }

    /// Merge another snapshot into this one
    pub(crate) fn extend(&mut self, other: &ScopeSnapshot) {
        for (var, version) in &other.reads {
            self.record(var, *version);
        }
    }

    /// Whether every recorded version is still the live one
    pub(crate) fn is_fresh(&self) -> bool {
        self.reads
            .iter()
            .all(|(var, version)| var.version() == *version)
    }

    pub(crate) fn keys(&self) -> impl Iterator<Item = &Key> {
        self.reads.iter().map(|(var, _)| var.key())
    }
}

impl fmt::Debug for ScopeSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.reads.iter().map(|(var, version)| (var.key(), version)))
            .finish()
    }
}
