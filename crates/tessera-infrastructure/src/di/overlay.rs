//! Test overlay
//!
//! Copy-on-write override store consulted before the layer it belongs to.
//! Lookups resolve in this order:
//!
//! 1. tombstone: the key is reported absent regardless of providers;
//! 2. singleton override: the stored value;
//! 3. factory override: built lazily, memoized when declared singleton.

use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tessera_domain::Instance;
use tessera_domain::Key;

use crate::ports::Recipe;

/// Lazily evaluated override
#[derive(Clone)]
pub(crate) struct FactoryOverride {
    pub(crate) factory: Recipe,
    pub(crate) singleton: bool,
    pub(crate) memo: Arc<OnceCell<Instance>>,
}

/// Outcome of an overlay lookup
pub(crate) enum OverlayHit {
    /// The overlay has nothing for the key
    Miss,
    /// The key is tombstoned
    Tombstone,
    /// Singleton override (or memoized factory value)
    Value(Instance),
    /// Factory override to evaluate
    Factory(FactoryOverride),
}

#[derive(Default)]
struct OverlayState {
    tombstones: HashSet<Key>,
    singletons: HashMap<Key, Instance>,
    factories: HashMap<Key, FactoryOverride>,
}

/// Override store of one sandbox layer
#[derive(Default)]
pub(crate) struct Overlay {
    state: RwLock<OverlayState>,
    closed: AtomicBool,
}

impl Overlay {
    pub(crate) fn lookup(&self, key: &Key) -> OverlayHit {
        let state = self.state.read();
        if state.tombstones.contains(key) {
            return OverlayHit::Tombstone;
        }
        if let Some(value) = state.singletons.get(key) {
            return OverlayHit::Value(Arc::clone(value));
        }
        match state.factories.get(key) {
            Some(factory) => match factory.memo.get() {
                Some(value) if factory.singleton => OverlayHit::Value(Arc::clone(value)),
                _ => OverlayHit::Factory(factory.clone()),
            },
            None => OverlayHit::Miss,
        }
    }

    /// Whether the overlay answers for `key` without the layer (`Some(false)` for tombstones)
    pub(crate) fn claims(&self, key: &Key) -> Option<bool> {
        let state = self.state.read();
        if state.tombstones.contains(key) {
            Some(false)
        } else if state.singletons.contains_key(key) || state.factories.contains_key(key) {
            Some(true)
        } else {
            None
        }
    }

    pub(crate) fn set(&self, key: Key, value: Instance) {
        let mut state = self.state.write();
        state.tombstones.remove(&key);
        state.factories.remove(&key);
        state.singletons.insert(key, value);
    }

    pub(crate) fn remove(&self, key: Key) {
        let mut state = self.state.write();
        state.singletons.remove(&key);
        state.factories.remove(&key);
        state.tombstones.insert(key);
    }

    pub(crate) fn factory(&self, key: Key, factory: Recipe, singleton: bool) {
        let mut state = self.state.write();
        state.tombstones.remove(&key);
        state.singletons.remove(&key);
        state.factories.insert(
            key,
            FactoryOverride {
                factory,
                singleton,
                memo: Arc::new(OnceCell::new()),
            },
        );
    }

    pub(crate) fn describe(&self, key: &Key) -> Option<&'static str> {
        let state = self.state.read();
        if state.tombstones.contains(key) {
            Some("tombstone override")
        } else if state.singletons.contains_key(key) {
            Some("singleton override")
        } else {
            state.factories.get(key).map(|factory| {
                if factory.singleton {
                    "singleton factory override"
                } else {
                    "factory override"
                }
            })
        }
    }

    pub(crate) fn close(&self) {
        self.closed.store(true, Ordering::Release);
        *self.state.write() = OverlayState::default();
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}
