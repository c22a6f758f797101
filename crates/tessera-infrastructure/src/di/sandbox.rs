//! Test sandboxes
//!
//! `catalog.test()` pushes a new layer (with an overlay) onto the catalog and
//! returns a [`TestEnvironment`] guard. Dropping the guard peels every layer it
//! pushed, in reverse order, closes the overlays and restores the frozen flags
//! the sandbox could have changed.
//!
//! | Strategy | Providers      | Children          | Cache                  | Scope variables | Frozen    |
//! |----------|----------------|-------------------|------------------------|-----------------|-----------|
//! | `empty`  | none           | none              | empty                  | none            | no        |
//! | `new`    | from includes  | included, copied  | empty                  | from includes   | no        |
//! | `clone`  | forked         | re-layered        | empty                  | forked          | inherited |
//! | `copy`   | forked         | re-layered        | singleton + transient  | forked          | inherited |
//!
//! A catalog attached as a child while a sandbox is active is re-layered by
//! that sandbox too (a copy of its current layer), so nothing registered or
//! cached in it inside the sandbox survives exit.

use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

use tessera_domain::error::{Error, Result};
use tessera_domain::{Instance, Key};

use super::catalog::{Catalog, Include};
use super::identity::{CatalogId, SandboxId};
use super::layer::{ForkOptions, Layer, Resolver};
use super::overlay::Overlay;
use crate::ports::recipe;

/// Options of the `clone` and `copy` strategies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CloneOptions {
    /// Reset forked scope variables to their defaults
    pub reset_scope_vars: bool,
    /// Force the frozen flag of the sandbox layers; inherited when `None`
    pub frozen: Option<bool>,
}

impl CloneOptions {
    /// Reset forked scope variables to their defaults
    pub fn reset_scope_vars(mut self) -> Self {
        self.reset_scope_vars = true;
        self
    }

    /// Force the frozen flag of the sandbox layers
    pub fn frozen(mut self, frozen: bool) -> Self {
        self.frozen = Some(frozen);
        self
    }
}

struct OverlayEntry {
    catalog: String,
    overlay: Arc<Overlay>,
}

/// State shared by every layer one sandbox pushed
pub(crate) struct SandboxState {
    id: SandboxId,
    fork_options: ForkOptions,
    overlays: DashMap<CatalogId, OverlayEntry>,
    pushed: Mutex<Vec<(Catalog, Arc<Layer>)>>,
    frozen_flags: Mutex<Vec<(Arc<Layer>, bool)>>,
    adopted: Mutex<Vec<Catalog>>,
    closed: AtomicBool,
}

impl SandboxState {
    fn new(fork_options: ForkOptions) -> Self {
        Self {
            id: SandboxId::next(),
            fork_options,
            overlays: DashMap::new(),
            pushed: Mutex::new(Vec::new()),
            frozen_flags: Mutex::new(Vec::new()),
            adopted: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    pub(crate) fn id(&self) -> SandboxId {
        self.id
    }

    /// Remember the frozen flags of `catalog` and its children for restoration on exit
    pub(crate) fn capture_frozen(&self, catalog: &Catalog) {
        let layer = catalog.current_layer();
        let frozen = layer.is_frozen();
        self.frozen_flags.lock().push((Arc::clone(&layer), frozen));
        for child in layer.children().iter() {
            self.capture_frozen(child);
        }
    }

    /// Remember a child whose parent link was set inside the sandbox
    pub(crate) fn adopt(&self, child: &Catalog) {
        self.adopted.lock().push(child.clone());
    }

    /// Push a fork of `catalog`'s current layer, then of its children's
    ///
    /// Catalogs already re-layered by this sandbox are left alone. Returns the
    /// overlay of `catalog`'s sandbox layer.
    pub(crate) fn fork_catalog(self: &Arc<Self>, catalog: &Catalog) -> Arc<Overlay> {
        if let Some(entry) = self.overlays.get(&catalog.id()) {
            return Arc::clone(&entry.overlay);
        }
        let overlay = Arc::new(Overlay::default());
        let layer = Arc::new(Layer::fork_sandbox(
            &catalog.current_layer(),
            self,
            Arc::clone(&overlay),
            self.fork_options,
        ));
        let children = layer.children();
        self.push(catalog, layer, Arc::clone(&overlay));
        for child in children.iter() {
            self.fork_catalog(child);
        }
        overlay
    }

    fn push(&self, catalog: &Catalog, layer: Arc<Layer>, overlay: Arc<Overlay>) {
        self.overlays.insert(
            catalog.id(),
            OverlayEntry {
                catalog: catalog.name().to_string(),
                overlay,
            },
        );
        catalog.push_layer(Arc::clone(&layer));
        self.pushed.lock().push((catalog.clone(), layer));
    }

    fn layer_count(&self) -> usize {
        self.pushed.lock().len()
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Peel every pushed layer in reverse order, then close the overlays
    fn exit(&self) {
        let pushed = std::mem::take(&mut *self.pushed.lock());
        for (catalog, layer) in pushed.into_iter().rev() {
            if !catalog.peel_layer(&layer) {
                debug!(catalog = %catalog.name(), "Sandbox layer already peeled");
            }
        }

        self.closed.store(true, Ordering::Release);
        for entry in self.overlays.iter() {
            entry.value().overlay.close();
        }
        self.overlays.clear();
        let mut flags = self.frozen_flags.lock();
        while let Some((layer, frozen)) = flags.pop() {
            layer.set_frozen(frozen);
        }
        for child in self.adopted.lock().drain(..) {
            child.detach_parent();
        }
    }
}

/// Builder returned by [`Catalog::test`]
#[derive(Debug)]
pub struct TestBuilder<'a> {
    catalog: &'a Catalog,
}

impl<'a> TestBuilder<'a> {
    pub(crate) fn new_for(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Sandbox with an empty, unfrozen layer
    pub fn empty(self) -> Result<TestEnvironment> {
        let (environment, _) = TestEnvironment::enter_empty(self.catalog, "empty");
        Ok(environment)
    }

    /// Sandbox with an empty, unfrozen layer seeded by `includes`
    #[allow(clippy::new_ret_no_self, clippy::wrong_self_convention)]
    pub fn new<I>(self, includes: I) -> Result<TestEnvironment>
    where
        I: IntoIterator,
        I::Item: Into<Include>,
    {
        let (environment, catalog) = TestEnvironment::enter_empty(self.catalog, "new");
        // On failure the environment is dropped and the layer peeled
        catalog.include_all(includes)?;
        Ok(environment)
    }

    /// Sandbox keeping providers and children but no cached values
    #[allow(clippy::should_implement_trait)]
    pub fn clone(self, options: CloneOptions) -> Result<TestEnvironment> {
        Ok(TestEnvironment::enter_forked(self.catalog, options, false))
    }

    /// Sandbox keeping providers, children and cached singleton/transient entries
    pub fn copy(self, options: CloneOptions) -> Result<TestEnvironment> {
        Ok(TestEnvironment::enter_forked(self.catalog, options, true))
    }
}

/// RAII guard of an entered sandbox
///
/// Dropping the guard leaves the sandbox.
#[must_use = "the sandbox is left as soon as the environment is dropped"]
pub struct TestEnvironment {
    catalog: Catalog,
    sandbox: Arc<SandboxState>,
    overrides: Overrides,
}

impl TestEnvironment {
    fn begin(catalog: &Catalog, sandbox: Arc<SandboxState>, overlay: Arc<Overlay>) -> Self {
        let overrides = Overrides {
            catalog: catalog.id(),
            name: catalog.name().to_string(),
            overlay,
            sandbox: Arc::clone(&sandbox),
        };
        Self {
            catalog: catalog.clone(),
            sandbox,
            overrides,
        }
    }

    fn enter_empty(catalog: &Catalog, strategy: &str) -> (Self, Catalog) {
        // Children attached later are copied as they are
        let sandbox = Arc::new(SandboxState::new(ForkOptions {
            keep_cache: true,
            reset_scope_vars: false,
            frozen: None,
        }));
        sandbox.capture_frozen(catalog);
        let overlay = Arc::new(Overlay::default());
        let layer = Arc::new(Layer::empty_sandbox(
            &catalog.current_layer(),
            &sandbox,
            Arc::clone(&overlay),
        ));
        sandbox.push(catalog, layer, Arc::clone(&overlay));
        let environment = Self::begin(catalog, sandbox, overlay);
        environment.log_entry(strategy);
        (environment, catalog.clone())
    }

    fn enter_forked(catalog: &Catalog, options: CloneOptions, keep_cache: bool) -> Self {
        let sandbox = Arc::new(SandboxState::new(ForkOptions {
            keep_cache,
            reset_scope_vars: options.reset_scope_vars,
            frozen: options.frozen,
        }));
        sandbox.capture_frozen(catalog);
        let overlay = sandbox.fork_catalog(catalog);
        let environment = Self::begin(catalog, sandbox, overlay);
        environment.log_entry(if keep_cache { "copy" } else { "clone" });
        environment
    }

    fn log_entry(&self, strategy: &str) {
        info!(
            catalog = %self.catalog.identity(),
            sandbox = %self.sandbox.id(),
            strategy,
            layers = self.sandbox.layer_count(),
            "Entered test sandbox"
        );
    }

    /// Overrides of the sandboxed catalog
    pub fn overrides(&self) -> &Overrides {
        &self.overrides
    }

    /// Identifier of this sandbox
    pub fn sandbox_id(&self) -> SandboxId {
        self.sandbox.id()
    }

    /// The sandboxed catalog
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Leave the sandbox
    pub fn exit(self) {}
}

impl Drop for TestEnvironment {
    fn drop(&mut self) {
        self.sandbox.exit();
        info!(
            catalog = %self.catalog.identity(),
            sandbox = %self.sandbox.id(),
            "Exited test sandbox"
        );
    }
}

impl std::fmt::Debug for TestEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestEnvironment")
            .field("catalog", &self.catalog.name())
            .field("sandbox", &self.sandbox.id())
            .field("layers", &self.sandbox.layer_count())
            .finish()
    }
}

/// Override handle of one catalog inside a sandbox
#[derive(Clone)]
pub struct Overrides {
    catalog: CatalogId,
    name: String,
    overlay: Arc<Overlay>,
    sandbox: Arc<SandboxState>,
}

impl Overrides {
    fn ensure_open(&self) -> Result<()> {
        if self.overlay.is_closed() {
            Err(Error::sandbox_closed(&self.name))
        } else {
            Ok(())
        }
    }

    /// Catalog these overrides apply to
    pub fn catalog_id(&self) -> CatalogId {
        self.catalog
    }

    /// Install a singleton override, clearing any tombstone
    pub fn set(&self, key: impl Into<Key>, value: Instance) -> Result<()> {
        self.ensure_open()?;
        let key = key.into();
        debug!(catalog = %self.name, key = %key, "Override set");
        self.overlay.set(key, value);
        Ok(())
    }

    /// Tombstone `key`: it resolves as missing inside the sandbox
    pub fn remove(&self, key: impl Into<Key>) -> Result<()> {
        self.ensure_open()?;
        let key = key.into();
        debug!(catalog = %self.name, key = %key, "Override removed");
        self.overlay.remove(key);
        Ok(())
    }

    /// Install several singleton overrides
    pub fn update<I, K>(&self, items: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, Instance)>,
        K: Into<Key>,
    {
        self.ensure_open()?;
        for (key, value) in items {
            self.overlay.set(key.into(), value);
        }
        Ok(())
    }

    /// Install a lazily evaluated override, memoized when `singleton`
    pub fn factory<F>(&self, key: impl Into<Key>, singleton: bool, factory: F) -> Result<()>
    where
        F: Fn(&Resolver<'_>) -> Result<Instance> + Send + Sync + 'static,
    {
        self.ensure_open()?;
        let key = key.into();
        debug!(catalog = %self.name, key = %key, singleton, "Factory override set");
        self.overlay.factory(key, recipe(factory), singleton);
        Ok(())
    }

    /// Overrides of a catalog re-layered by the same sandbox
    pub fn of(&self, catalog: &Catalog) -> Result<Overrides> {
        if self.sandbox.is_closed() {
            return Err(Error::sandbox_closed(catalog.name()));
        }
        let entry = self
            .sandbox
            .overlays
            .get(&catalog.id())
            .ok_or_else(|| Error::unknown_catalog(catalog.name()))?;
        Ok(Overrides {
            catalog: catalog.id(),
            name: entry.catalog.clone(),
            overlay: Arc::clone(&entry.overlay),
            sandbox: Arc::clone(&self.sandbox),
        })
    }
}

impl std::fmt::Debug for Overrides {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Overrides")
            .field("catalog", &self.name)
            .field("closed", &self.overlay.is_closed())
            .finish()
    }
}
