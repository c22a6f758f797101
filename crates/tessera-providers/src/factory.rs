//! Factory provider
//!
//! Resolves keys by running a registered recipe. The declared lifetime decides
//! what the engine keeps:
//!
//! | Factory | Cached entry | Recipe runs |
//! |---------|--------------|-------------|
//! | [`Factory::singleton`] | the value | once per layer |
//! | [`Factory::scoped`] | value + scope snapshot | when a read scope variable changes |
//! | [`Factory::transient`] | the recipe | on every `get` |
//! | [`Factory::transient`] + [`uncached`](Factory::uncached) | nothing | on every `get`, through the providers |
//!
//! An uncached transient goes back through the providers on each resolution,
//! so a sandbox that re-registers the key sees the new recipe.

use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

use tessera_domain::constants::FACTORIES_PROVIDER;
use tessera_domain::error::Result;
use tessera_domain::{Instance, Key, Lifetime};
use tessera_infrastructure::di::{Catalog, Registration, Resolver};
use tessera_infrastructure::ports::{
    DependencyDebug, PROVIDER_TYPES, ProvidedDependency, Provider, ProviderType,
    ProviderTypeEntry, Recipe, recipe,
};

/// A recipe with its declared lifetime
#[derive(Clone)]
pub struct Factory {
    recipe: Recipe,
    lifetime: Lifetime,
    cached: bool,
    description: Option<String>,
    dependencies: Vec<Key>,
}

impl Factory {
    fn with_lifetime<F>(lifetime: Lifetime, f: F) -> Self
    where
        F: Fn(&Resolver<'_>) -> Result<Instance> + Send + Sync + 'static,
    {
        Self {
            recipe: recipe(f),
            lifetime,
            cached: true,
            description: None,
            dependencies: Vec::new(),
        }
    }

    /// Recipe run once, its value shared by every resolution
    pub fn singleton<F>(f: F) -> Self
    where
        F: Fn(&Resolver<'_>) -> Result<Instance> + Send + Sync + 'static,
    {
        Self::with_lifetime(Lifetime::Singleton, f)
    }

    /// Recipe rerun whenever a scope variable it read changes
    pub fn scoped<F>(f: F) -> Self
    where
        F: Fn(&Resolver<'_>) -> Result<Instance> + Send + Sync + 'static,
    {
        Self::with_lifetime(Lifetime::Scoped, f)
    }

    /// Recipe rerun on every resolution
    pub fn transient<F>(f: F) -> Self
    where
        F: Fn(&Resolver<'_>) -> Result<Instance> + Send + Sync + 'static,
    {
        Self::with_lifetime(Lifetime::Transient, f)
    }

    /// Skip the engine cache entirely
    ///
    /// Only meaningful for transient factories; singleton and scoped values
    /// are always cached.
    #[must_use]
    pub fn uncached(mut self) -> Self {
        self.cached = false;
        self
    }

    /// Declare the upstream keys shown by `Catalog::debug`
    #[must_use]
    pub fn depends_on<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<Key>,
    {
        self.dependencies = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Description shown by `Catalog::debug`
    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Declared lifetime
    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    /// Whether the engine keeps a cache entry for this factory
    pub fn is_cached(&self) -> bool {
        self.cached || self.lifetime != Lifetime::Transient
    }

    fn callback(&self) -> Option<Recipe> {
        match self.lifetime {
            Lifetime::Singleton => None,
            Lifetime::Transient if !self.cached => None,
            Lifetime::Scoped | Lifetime::Transient => Some(Arc::clone(&self.recipe)),
        }
    }

    fn debug(&self) -> DependencyDebug {
        let description = self.description.clone().unwrap_or_else(|| {
            if self.is_cached() {
                "factory".to_string()
            } else {
                "factory (uncached)".to_string()
            }
        });
        DependencyDebug::new(description)
            .with_lifetime(self.lifetime)
            .with_dependencies(self.dependencies.iter().cloned())
    }
}

impl std::fmt::Debug for Factory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Factory")
            .field("lifetime", &self.lifetime)
            .field("cached", &self.is_cached())
            .field("description", &self.description)
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}

/// Provider of recipe-built values
#[derive(Debug, Default)]
pub struct FactoryProvider {
    factories: DashMap<Key, Factory>,
}

/// Provider type of [`FactoryProvider`]
pub const FACTORIES: ProviderType = ProviderType::of::<FactoryProvider>(FACTORIES_PROVIDER);

impl FactoryProvider {
    /// Register `factory` under `key`
    pub fn insert(
        &self,
        registration: &Registration<'_>,
        key: impl Into<Key>,
        factory: Factory,
    ) -> Result<()> {
        let key = key.into();
        registration.raise_if_claimed(&key)?;
        debug!(
            catalog = registration.catalog(),
            key = %key,
            lifetime = %factory.lifetime,
            cached = factory.is_cached(),
            "Registered factory"
        );
        self.factories.insert(key, factory);
        Ok(())
    }

    /// Declared lifetime of the factory registered under `key`
    pub fn lifetime_of(&self, key: &Key) -> Option<Lifetime> {
        self.factories.get(key).map(|factory| factory.lifetime)
    }
}

impl Provider for FactoryProvider {
    fn name(&self) -> &str {
        FACTORIES_PROVIDER
    }

    fn can_provide(&self, key: &Key) -> bool {
        self.factories.contains_key(key)
    }

    fn maybe_provide(
        &self,
        key: &Key,
        resolver: &Resolver<'_>,
        out: &mut ProvidedDependency,
    ) -> Result<()> {
        // Recipes resolve other keys; never run one under a shard lock
        let Some(factory) = self.factories.get(key).map(|entry| entry.value().clone()) else {
            return Ok(());
        };
        let value = (factory.recipe)(resolver)?;
        out.set_value(value, factory.lifetime, factory.callback())
    }

    fn maybe_debug(&self, key: &Key) -> Option<DependencyDebug> {
        self.factories.get(key).map(|factory| factory.debug())
    }

    fn fork(&self) -> Arc<dyn Provider> {
        Arc::new(Self {
            factories: self.factories.clone(),
        })
    }
}

/// Concise factory registration on a catalog
pub trait FactoryCatalogExt {
    /// Register `factory` in the [`FactoryProvider`] of this handle's twin
    fn provide_factory(&self, key: impl Into<Key>, factory: Factory) -> Result<()>;
}

impl FactoryCatalogExt for Catalog {
    fn provide_factory(&self, key: impl Into<Key>, factory: Factory) -> Result<()> {
        let key = key.into();
        self.with_provider::<FactoryProvider, _>(|factories, registration| {
            factories.insert(registration, key, factory)
        })
    }
}

// ============================================================================
// Auto-registration via linkme
// ============================================================================

#[linkme::distributed_slice(PROVIDER_TYPES)]
static FACTORY_PROVIDER: ProviderTypeEntry = ProviderTypeEntry {
    name: FACTORIES_PROVIDER,
    description: "Recipes with a declared lifetime",
    provider_type: FACTORIES,
};
