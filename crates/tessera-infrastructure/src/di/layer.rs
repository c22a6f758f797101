//! Catalog layers
//!
//! A [`Layer`] is one versioned snapshot of a catalog: the public and private
//! twins (providers, cache, scope variables), the attached children, the
//! frozen flag and, for sandbox layers, the test overlay. Both twins share a
//! single re-entrant lock; taking it for one twin takes it for the other, so
//! resolutions crossing from public to private never order two locks.
//!
//! ## Resolution
//!
//! ```text
//! provide(key, access)
//!   ├─ overlay        tombstone → miss │ override → value │ factory → build
//!   ├─ public twin    cache → scope variable → providers (cold path, locked)
//!   ├─ private twin   only with Access::Full
//!   └─ children       attachment order, Access::Public, same context
//! ```

use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, trace};

use dashmap::DashMap;
use tessera_domain::error::{Error, Result};
use tessera_domain::{Instance, Key, Lifetime};

use super::cache::{CacheEntry, LayerCache};
use super::catalog::{Catalog, Visibility};
use super::context::{InstantiationContext, LayerLock};
use super::identity::{CatalogId, CatalogIdentity};
use super::overlay::{FactoryOverride, Overlay, OverlayHit};
use super::sandbox::SandboxState;
use super::scope_var::{ScopeSnapshot, ScopeVar, read_defined};
use crate::ports::provider::Provided;
use crate::ports::{DependencyDebug, ProvidedDependency, Provider, ProviderType};

/// Which twins a resolution may see
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Access {
    /// Public twin and children
    Public,
    /// Public twin, private twin and children
    Full,
}

/// Options used when forking a layer for a sandbox
#[derive(Debug, Clone, Copy)]
pub(crate) struct ForkOptions {
    pub(crate) keep_cache: bool,
    pub(crate) reset_scope_vars: bool,
    pub(crate) frozen: Option<bool>,
}

/// Providers, cache and scope variables of one visibility
#[derive(Default)]
pub(crate) struct Twin {
    providers: RwLock<Arc<[Arc<dyn Provider>]>>,
    cache: LayerCache,
    scope_vars: DashMap<Key, Arc<ScopeVar>>,
}

impl Twin {
    fn fork(&self, options: ForkOptions) -> Self {
        let providers: Vec<Arc<dyn Provider>> =
            self.providers().iter().map(|provider| provider.fork()).collect();
        let scope_vars = DashMap::new();
        for entry in &self.scope_vars {
            scope_vars.insert(
                entry.key().clone(),
                Arc::new(entry.value().fork(options.reset_scope_vars)),
            );
        }
        Self {
            providers: RwLock::new(providers.into()),
            cache: if options.keep_cache {
                self.cache.copy_for_sandbox()
            } else {
                LayerCache::default()
            },
            scope_vars,
        }
    }

    /// Current provider tuple
    pub(crate) fn providers(&self) -> Arc<[Arc<dyn Provider>]> {
        Arc::clone(&self.providers.read())
    }

    fn push_provider(&self, provider: Arc<dyn Provider>) {
        let mut providers = self.providers.write();
        let mut next: Vec<Arc<dyn Provider>> = providers.iter().cloned().collect();
        next.push(provider);
        *providers = next.into();
    }

    pub(crate) fn scope_var(&self, key: &Key) -> Option<Arc<ScopeVar>> {
        self.scope_vars.get(key).map(|entry| Arc::clone(entry.value()))
    }

    pub(crate) fn cached(&self, key: &Key) -> Option<CacheEntry> {
        self.cache.get(key)
    }

    fn claims(&self, key: &Key) -> bool {
        self.cache.contains(key)
            || self.scope_vars.contains_key(key)
            || self.providers().iter().any(|provider| provider.can_provide(key))
    }
}

/// One snapshot of a catalog's state
pub(crate) struct Layer {
    catalog: CatalogId,
    identity: CatalogIdentity,
    lock: Arc<LayerLock>,
    frozen: AtomicBool,
    public: Twin,
    private: Twin,
    children: RwLock<Arc<[Catalog]>>,
    overlay: Option<Arc<Overlay>>,
    sandbox: Option<Arc<SandboxState>>,
}

impl Layer {
    /// Base layer of a new catalog
    pub(crate) fn root(catalog: CatalogId, name: &str) -> Self {
        Self {
            catalog,
            identity: CatalogIdentity::root(name),
            lock: Arc::new(LayerLock::new(())),
            frozen: AtomicBool::new(false),
            public: Twin::default(),
            private: Twin::default(),
            children: RwLock::new(Arc::from(Vec::new())),
            overlay: None,
            sandbox: None,
        }
    }

    /// Brand-new, unfrozen sandbox layer with nothing in it
    pub(crate) fn empty_sandbox(
        previous: &Layer,
        sandbox: &Arc<SandboxState>,
        overlay: Arc<Overlay>,
    ) -> Self {
        Self {
            catalog: previous.catalog,
            identity: previous.identity.enter(sandbox.id()),
            lock: Arc::new(LayerLock::new(())),
            frozen: AtomicBool::new(false),
            public: Twin::default(),
            private: Twin::default(),
            children: RwLock::new(Arc::from(Vec::new())),
            overlay: Some(overlay),
            sandbox: Some(Arc::clone(sandbox)),
        }
    }

    /// Sandbox layer keeping the structure of `previous`
    ///
    /// Children are kept as handles; the sandbox re-layers them separately.
    pub(crate) fn fork_sandbox(
        previous: &Layer,
        sandbox: &Arc<SandboxState>,
        overlay: Arc<Overlay>,
        options: ForkOptions,
    ) -> Self {
        // Registration and cache writes on `previous` must not interleave with the copy
        let _guard = previous.lock.lock();
        Self {
            catalog: previous.catalog,
            identity: previous.identity.enter(sandbox.id()),
            lock: Arc::new(LayerLock::new(())),
            frozen: AtomicBool::new(options.frozen.unwrap_or_else(|| previous.is_frozen())),
            public: previous.public.fork(options),
            private: previous.private.fork(options),
            children: RwLock::new(previous.children()),
            overlay: Some(overlay),
            sandbox: Some(Arc::clone(sandbox)),
        }
    }

    pub(crate) fn identity(&self) -> &CatalogIdentity {
        &self.identity
    }

    pub(crate) fn lock(&self) -> &Arc<LayerLock> {
        &self.lock
    }

    pub(crate) fn sandbox(&self) -> Option<&Arc<SandboxState>> {
        self.sandbox.as_ref()
    }

    pub(crate) fn twin(&self, visibility: Visibility) -> &Twin {
        match visibility {
            Visibility::Public => &self.public,
            Visibility::Private => &self.private,
        }
    }

    pub(crate) fn children(&self) -> Arc<[Catalog]> {
        Arc::clone(&self.children.read())
    }

    pub(crate) fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Acquire)
    }

    pub(crate) fn set_frozen(&self, frozen: bool) {
        self.frozen.store(frozen, Ordering::Release);
    }

    /// Fail with [`Error::FrozenCatalog`] once frozen
    pub(crate) fn raise_if_frozen(&self) -> Result<()> {
        if self.is_frozen() {
            Err(Error::frozen(self.identity.to_string()))
        } else {
            Ok(())
        }
    }

    /// Resolver bound to this layer with full access
    pub(crate) fn resolver<'a>(self: &'a Arc<Self>, context: &'a InstantiationContext) -> Resolver<'a> {
        Resolver {
            layer: self,
            context,
        }
    }

    // ========================================================================
    // Registration (callers hold the layer lock)
    // ========================================================================

    pub(crate) fn include_provider(
        &self,
        visibility: Visibility,
        provider_type: ProviderType,
    ) -> Result<()> {
        self.raise_if_frozen()?;
        let twin = self.twin(visibility);
        if twin
            .providers()
            .iter()
            .any(|provider| provider_type.is_instance(provider.as_ref()))
        {
            return Err(Error::duplicate_provider(
                provider_type.name(),
                self.identity.to_string(),
            ));
        }
        twin.push_provider(provider_type.create());
        debug!(
            catalog = %self.identity,
            provider = provider_type.name(),
            ?visibility,
            "Included provider"
        );
        Ok(())
    }

    pub(crate) fn find_provider<P: Provider>(&self, visibility: Visibility) -> Option<Arc<P>> {
        self.twin(visibility)
            .providers()
            .iter()
            .find_map(|provider| Arc::clone(provider).downcast_arc::<P>().ok())
    }

    pub(crate) fn register_scope_var(
        &self,
        visibility: Visibility,
        key: Key,
        default: Option<Instance>,
    ) -> Result<()> {
        self.raise_if_frozen()?;
        self.raise_if_claimed(visibility, &key)?;
        debug!(catalog = %self.identity, key = %key, "Registered scope variable");
        self.twin(visibility)
            .scope_vars
            .insert(key.clone(), Arc::new(ScopeVar::new(key, default)));
        Ok(())
    }

    /// Fail with [`Error::DuplicateDependency`] when `key` already resolves in the twin
    pub(crate) fn raise_if_claimed(&self, visibility: Visibility, key: &Key) -> Result<()> {
        if self.twin(visibility).claims(key) {
            Err(Error::duplicate_dependency(key.clone(), self.identity.to_string()))
        } else {
            Ok(())
        }
    }

    pub(crate) fn update_scope_var(
        &self,
        visibility: Visibility,
        key: &Key,
        value: Instance,
    ) -> Result<Option<Instance>> {
        let var = self
            .twin(visibility)
            .scope_var(key)
            .ok_or_else(|| Error::not_found(key.clone()))?;
        let previous = var.update(value);
        debug!(
            catalog = %self.identity,
            key = %key,
            version = var.version(),
            "Updated scope variable"
        );
        Ok(previous)
    }

    pub(crate) fn push_child(&self, child: Catalog) {
        let mut children = self.children.write();
        let mut next: Vec<Catalog> = children.iter().cloned().collect();
        next.push(child);
        *children = next.into();
    }

    pub(crate) fn has_child(&self, child: &Catalog) -> bool {
        self.children().iter().any(|existing| existing.same_catalog(child))
    }

    // ========================================================================
    // Resolution
    // ========================================================================

    /// Whether `key` would resolve in this layer
    pub(crate) fn can_provide(&self, key: &Key, access: Access) -> bool {
        if let Some(claimed) = self.overlay.as_ref().and_then(|overlay| overlay.claims(key)) {
            return claimed;
        }
        self.public.claims(key)
            || (access == Access::Full && self.private.claims(key))
            || self
                .children()
                .iter()
                .any(|child| child.current_layer().can_provide(key, Access::Public))
    }

    /// Resolve `key`, returning `None` on a miss
    pub(crate) fn provide(
        self: &Arc<Self>,
        key: &Key,
        access: Access,
        context: &InstantiationContext,
    ) -> Result<Option<Instance>> {
        if let Some(overlay) = &self.overlay {
            match overlay.lookup(key) {
                OverlayHit::Miss => {}
                OverlayHit::Tombstone => {
                    trace!(catalog = %self.identity, key = %key, "Tombstoned dependency");
                    return Ok(None);
                }
                OverlayHit::Value(value) => return Ok(Some(value)),
                OverlayHit::Factory(factory) => {
                    return self.build_override(key, &factory, context).map(Some);
                }
            }
        }

        if let Some(value) = self.provide_from(Visibility::Public, key, context)? {
            return Ok(Some(value));
        }
        if access == Access::Full {
            if let Some(value) = self.provide_from(Visibility::Private, key, context)? {
                return Ok(Some(value));
            }
        }
        for child in self.children().iter() {
            if let Some(value) = child
                .current_layer()
                .provide(key, Access::Public, context)?
            {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    fn build_override(
        self: &Arc<Self>,
        key: &Key,
        factory: &FactoryOverride,
        context: &InstantiationContext,
    ) -> Result<Instance> {
        context.acquire(&self.lock);
        if factory.singleton {
            if let Some(value) = factory.memo.get() {
                return Ok(Arc::clone(value));
            }
        }
        let frame = context.instantiating(self.catalog, key)?;
        let value = (factory.factory)(&self.resolver(context))?;
        let reads = frame.finish();
        if factory.singleton && !reads.is_empty() {
            return Err(Error::definition(
                key.clone(),
                "singleton override reads scope variables",
            ));
        }
        context.observe(&reads);
        if factory.singleton {
            Ok(Arc::clone(factory.memo.get_or_init(|| value)))
        } else {
            Ok(value)
        }
    }

    fn provide_from(
        self: &Arc<Self>,
        visibility: Visibility,
        key: &Key,
        context: &InstantiationContext,
    ) -> Result<Option<Instance>> {
        let twin = self.twin(visibility);
        let seen = twin.cache.version();
        if let Some(entry) = twin.cache.get(key) {
            return self.use_entry(visibility, key, entry, context).map(Some);
        }

        if let Some(var) = twin.scope_var(key) {
            let (value, version) = read_defined(&var)?;
            context.observe_var(&var, version);
            return Ok(Some(value));
        }

        let providers = twin.providers();
        if !providers.iter().any(|provider| provider.can_provide(key)) {
            return Ok(None);
        }

        // Cold path
        context.acquire(&self.lock);
        if twin.cache.version() != seen {
            if let Some(entry) = twin.cache.get(key) {
                return self.use_entry(visibility, key, entry, context).map(Some);
            }
        }

        let frame = context.instantiating(self.catalog, key)?;
        let resolver = self.resolver(context);
        for provider in providers.iter().filter(|provider| provider.can_provide(key)) {
            let mut out = ProvidedDependency::new(key.clone());
            provider.maybe_provide(key, &resolver, &mut out)?;
            if let Some(provided) = out.take() {
                let reads = frame.finish();
                return self.commit(visibility, key, provided, reads, context).map(Some);
            }
        }
        Ok(None)
    }

    fn use_entry(
        self: &Arc<Self>,
        visibility: Visibility,
        key: &Key,
        entry: CacheEntry,
        context: &InstantiationContext,
    ) -> Result<Instance> {
        match entry {
            CacheEntry::Singleton(value) => {
                trace!(catalog = %self.identity, key = %key, "Singleton cache hit");
                Ok(value)
            }
            CacheEntry::Transient(recipe) => {
                // Recipes always run under their own layer's lock so locks are taken parent first
                context.acquire(&self.lock);
                let frame = context.instantiating(self.catalog, key)?;
                let value = recipe(&self.resolver(context))?;
                context.observe(&frame.finish());
                Ok(value)
            }
            CacheEntry::Scoped {
                value, snapshot, ..
            } if snapshot.is_fresh() => {
                trace!(catalog = %self.identity, key = %key, "Scoped cache hit");
                context.observe(&snapshot);
                Ok(value)
            }
            CacheEntry::Scoped { .. } => self.refresh_scoped(visibility, key, context),
        }
    }

    fn refresh_scoped(
        self: &Arc<Self>,
        visibility: Visibility,
        key: &Key,
        context: &InstantiationContext,
    ) -> Result<Instance> {
        context.acquire(&self.lock);
        let twin = self.twin(visibility);
        let recipe = match twin.cache.get(key) {
            Some(CacheEntry::Scoped {
                value, snapshot, ..
            }) if snapshot.is_fresh() => {
                // Refreshed by another call while we waited for the lock
                context.observe(&snapshot);
                return Ok(value);
            }
            Some(CacheEntry::Scoped { recipe, .. }) => recipe,
            Some(other) => return self.use_entry(visibility, key, other, context),
            None => return Err(Error::not_found(key.clone())),
        };

        let frame = context.instantiating(self.catalog, key)?;
        let value = recipe(&self.resolver(context))?;
        let reads = frame.finish();
        if reads.is_empty() {
            return Err(Error::definition(
                key.clone(),
                "scoped value no longer reads any scope variable",
            ));
        }
        context.observe(&reads);
        twin.cache.insert(
            key.clone(),
            CacheEntry::Scoped {
                value: Arc::clone(&value),
                recipe,
                snapshot: reads,
            },
        );
        debug!(catalog = %self.identity, key = %key, "Recomputed scoped dependency");
        Ok(value)
    }

    fn commit(
        &self,
        visibility: Visibility,
        key: &Key,
        provided: Provided,
        reads: ScopeSnapshot,
        context: &InstantiationContext,
    ) -> Result<Instance> {
        let Provided {
            value,
            lifetime,
            callback,
        } = provided;
        let twin = self.twin(visibility);
        match lifetime {
            Lifetime::Singleton => {
                if !reads.is_empty() {
                    let vars: Vec<String> = reads.keys().map(ToString::to_string).collect();
                    return Err(Error::definition(
                        key.clone(),
                        format!("singleton reads scope variables: {}", vars.join(", ")),
                    ));
                }
                twin.cache
                    .insert(key.clone(), CacheEntry::Singleton(Arc::clone(&value)));
            }
            Lifetime::Scoped => {
                let Some(recipe) = callback else {
                    return Err(Error::definition(
                        key.clone(),
                        "scoped value requires a recompute callback",
                    ));
                };
                if reads.is_empty() {
                    return Err(Error::definition(
                        key.clone(),
                        "scoped value must read at least one scope variable",
                    ));
                }
                context.observe(&reads);
                twin.cache.insert(
                    key.clone(),
                    CacheEntry::Scoped {
                        value: Arc::clone(&value),
                        recipe,
                        snapshot: reads,
                    },
                );
            }
            Lifetime::Transient => {
                context.observe(&reads);
                if let Some(recipe) = callback {
                    twin.cache.insert(key.clone(), CacheEntry::Transient(recipe));
                }
            }
        }
        debug!(
            catalog = %self.identity,
            key = %key,
            %lifetime,
            ?visibility,
            "Resolved dependency"
        );
        Ok(value)
    }

    // ========================================================================
    // Debugging
    // ========================================================================

    /// Layer and description of whatever answers for `key`
    pub(crate) fn debug_node(
        self: &Arc<Self>,
        key: &Key,
        access: Access,
    ) -> Option<(Arc<Layer>, DependencyDebug)> {
        if let Some(description) = self.overlay.as_ref().and_then(|overlay| overlay.describe(key)) {
            return Some((Arc::clone(self), DependencyDebug::new(description)));
        }
        let mut twins = vec![Visibility::Public];
        if access == Access::Full {
            twins.push(Visibility::Private);
        }
        for visibility in twins {
            if let Some(found) = self.debug_twin(visibility, key) {
                return Some((Arc::clone(self), found));
            }
        }
        self.children()
            .iter()
            .find_map(|child| child.current_layer().debug_node(key, Access::Public))
    }

    fn debug_twin(&self, visibility: Visibility, key: &Key) -> Option<DependencyDebug> {
        let twin = self.twin(visibility);
        if let Some(var) = twin.scope_var(key) {
            return Some(DependencyDebug::new(format!(
                "scope variable (version {})",
                var.version()
            )));
        }
        let cached = twin.cached(key).map(|entry| entry.lifetime());
        let described = twin
            .providers()
            .iter()
            .find(|provider| provider.can_provide(key))
            .map(|provider| {
                provider
                    .maybe_debug(key)
                    .unwrap_or_else(|| DependencyDebug::new(provider.name()))
            });
        match (described, cached) {
            (Some(mut debug), Some(lifetime)) => {
                if debug.lifetime.is_none() {
                    debug.lifetime = Some(lifetime);
                }
                Some(debug)
            }
            (Some(debug), None) => Some(debug),
            (None, Some(lifetime)) => Some(DependencyDebug::new("cached").with_lifetime(lifetime)),
            (None, None) => None,
        }
    }
}

/// Per-layer accessor handed to providers and recipes
///
/// Resolves with full access (public and private twin, then children) inside
/// the caller's instantiation context, so nested resolutions take part in
/// cycle detection and scope variable tracking.
pub struct Resolver<'a> {
    layer: &'a Arc<Layer>,
    context: &'a InstantiationContext,
}

impl Resolver<'_> {
    /// Resolve `key`, failing with [`Error::DependencyNotFound`] on a miss
    pub fn get(&self, key: impl Into<Key>) -> Result<Instance> {
        let key = key.into();
        self.get_opt(&key)?.ok_or_else(|| Error::not_found(key))
    }

    /// Resolve `key`, returning `None` on a miss
    pub fn get_opt(&self, key: impl Into<Key>) -> Result<Option<Instance>> {
        self.layer.provide(&key.into(), Access::Full, self.context)
    }

    /// Resolve `key`, falling back to `default` on a miss
    pub fn get_or(&self, key: impl Into<Key>, default: Instance) -> Result<Instance> {
        Ok(self.get_opt(key)?.unwrap_or(default))
    }

    /// Resolve `key` and downcast it to `T`
    pub fn get_as<T: std::any::Any + Send + Sync>(&self, key: impl Into<Key>) -> Result<Arc<T>> {
        let key = key.into();
        let value = self.get(&key)?;
        tessera_domain::downcast(&key, value)
    }

    /// Whether `key` would resolve from here
    pub fn can_provide(&self, key: impl Into<Key>) -> bool {
        self.layer.can_provide(&key.into(), Access::Full)
    }

    /// Identity of the layer this resolver is bound to
    pub fn catalog(&self) -> &CatalogIdentity {
        self.layer.identity()
    }

    /// The instantiation context of the current top-level call
    pub fn context(&self) -> &InstantiationContext {
        self.context
    }
}

impl std::fmt::Debug for Resolver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("catalog", &self.layer.identity().to_string())
            .field("depth", &self.context.depth())
            .finish()
    }
}
