//! Layer stack of one catalog
//!
//! The bottom layer is created with the catalog and never removed; sandboxes
//! push layers on top and peel them off when they exit. The catalog always
//! answers from the top layer.

use parking_lot::RwLock;
use std::sync::Arc;
use tracing::warn;

use super::layer::Layer;

pub(crate) struct Onion {
    base: Arc<Layer>,
    sandboxes: RwLock<Vec<Arc<Layer>>>,
}

impl Onion {
    pub(crate) fn new(base: Layer) -> Self {
        Self {
            base: Arc::new(base),
            sandboxes: RwLock::new(Vec::new()),
        }
    }

    /// Top layer
    pub(crate) fn current(&self) -> Arc<Layer> {
        self.sandboxes
            .read()
            .last()
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.base))
    }

    pub(crate) fn push(&self, layer: Arc<Layer>) {
        self.sandboxes.write().push(layer);
    }

    /// Remove `layer`, normally the top one
    ///
    /// Returns false when the layer is not on the stack.
    pub(crate) fn peel(&self, layer: &Arc<Layer>) -> bool {
        let mut sandboxes = self.sandboxes.write();
        match sandboxes.iter().rposition(|pushed| Arc::ptr_eq(pushed, layer)) {
            Some(position) => {
                if position + 1 != sandboxes.len() {
                    warn!(
                        catalog = %layer.identity(),
                        "Sandbox layer peeled out of order"
                    );
                }
                sandboxes.remove(position);
                true
            }
            None => false,
        }
    }

    /// Number of sandbox layers on top of the base
    pub(crate) fn depth(&self) -> usize {
        self.sandboxes.read().len()
    }
}
