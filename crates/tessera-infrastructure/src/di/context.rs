//! Instantiation context
//!
//! One context is created per top-level `get` and threaded through the whole
//! resolution, including nested resolutions made by providers and recipes
//! through their [`Resolver`](super::Resolver). It tracks:
//!
//! - the in-flight `(catalog, key)` frames, for cycle detection;
//! - the scope variables read by each frame, so scoped values can record
//!   their snapshot and propagate it to the enclosing frame;
//! - the layer locks acquired during the call, released exactly once in
//!   reverse order when the context is dropped.
//!
//! ```text
//! get(a) ──► instantiating(a) ──► provider(a) ──► get(b) ──► instantiating(b)
//!                 │                                               │
//!                 │  frame a: reads += reads(b)  ◄──  finish() ───┘
//!                 ▼
//!            finish() ──► snapshot(a)
//! ```

use parking_lot::lock_api::ArcReentrantMutexGuard;
use parking_lot::{RawMutex, RawThreadId, ReentrantMutex};
use std::cell::RefCell;
use std::sync::Arc;
use tracing::warn;

use tessera_domain::error::{Error, Result};
use tessera_domain::Key;

use super::identity::CatalogId;
use super::scope_var::{ScopeSnapshot, ScopeVar};

/// Lock shared by the public and private twin of a layer
pub(crate) type LayerLock = ReentrantMutex<()>;

type LayerLockGuard = ArcReentrantMutexGuard<RawMutex, RawThreadId, ()>;

struct Frame {
    catalog: CatalogId,
    key: Key,
    reads: ScopeSnapshot,
}

struct HeldLock {
    lock: Arc<LayerLock>,
    _guard: LayerLockGuard,
}

#[derive(Default)]
struct ContextState {
    frames: Vec<Frame>,
    held: Vec<HeldLock>,
}

/// Per-top-level-call resolution state
#[derive(Default)]
pub struct InstantiationContext {
    state: RefCell<ContextState>,
}

impl InstantiationContext {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Enter the resolution of `key` in `catalog`
    ///
    /// Fails with [`Error::DependencyCycle`] when the key is already in flight.
    /// The returned guard pops the frame on every exit path.
    pub(crate) fn instantiating(&self, catalog: CatalogId, key: &Key) -> Result<FrameGuard<'_>> {
        let mut state = self.state.borrow_mut();
        if state
            .frames
            .iter()
            .any(|frame| frame.catalog == catalog && &frame.key == key)
        {
            let mut chain: Vec<Key> = state.frames.iter().map(|frame| frame.key.clone()).collect();
            chain.push(key.clone());
            warn!(key = %key, depth = chain.len(), "Dependency cycle detected");
            return Err(Error::cycle(chain));
        }
        state.frames.push(Frame {
            catalog,
            key: key.clone(),
            reads: ScopeSnapshot::default(),
        });
        Ok(FrameGuard {
            context: self,
            depth: state.frames.len(),
            finished: false,
        })
    }

    /// Record a scope variable read in the innermost frame
    pub(crate) fn observe_var(&self, var: &Arc<ScopeVar>, version: u64) {
        if let Some(frame) = self.state.borrow_mut().frames.last_mut() {
            frame.reads.record(var, version);
        }
    }

    /// Propagate a snapshot to the innermost frame
    pub(crate) fn observe(&self, snapshot: &ScopeSnapshot) {
        if snapshot.is_empty() {
            return;
        }
        if let Some(frame) = self.state.borrow_mut().frames.last_mut() {
            frame.reads.extend(snapshot);
        }
    }

    /// Acquire `lock` for the rest of the top-level call
    ///
    /// A lock already held by this context is not acquired again.
    pub(crate) fn acquire(&self, lock: &Arc<LayerLock>) {
        if self.holds(lock) {
            return;
        }
        // Block outside the RefCell borrow
        let guard = lock.lock_arc();
        self.state.borrow_mut().held.push(HeldLock {
            lock: Arc::clone(lock),
            _guard: guard,
        });
    }

    pub(crate) fn holds(&self, lock: &Arc<LayerLock>) -> bool {
        self.state
            .borrow()
            .held
            .iter()
            .any(|held| Arc::ptr_eq(&held.lock, lock))
    }

    /// Number of in-flight frames
    pub fn depth(&self) -> usize {
        self.state.borrow().frames.len()
    }

    /// Number of layer locks held
    pub fn held_locks(&self) -> usize {
        self.state.borrow().held.len()
    }

    fn pop(&self, depth: usize) -> ScopeSnapshot {
        let mut state = self.state.borrow_mut();
        state.frames.truncate(depth);
        state
            .frames
            .pop()
            .map(|frame| frame.reads)
            .unwrap_or_default()
    }
}

impl Drop for InstantiationContext {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        while let Some(held) = state.held.pop() {
            drop(held);
        }
    }
}

/// In-flight frame of one key
pub(crate) struct FrameGuard<'a> {
    context: &'a InstantiationContext,
    depth: usize,
    finished: bool,
}

impl FrameGuard<'_> {
    /// Leave the frame, returning the scope variable reads it observed
    pub(crate) fn finish(mut self) -> ScopeSnapshot {
        self.finished = true;
        self.context.pop(self.depth)
    }
}

impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            let _ = self.context.pop(self.depth);
        }
    }
}
