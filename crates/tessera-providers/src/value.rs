//! Value provider
//!
//! Resolves keys to constant values registered up front. Every value is a
//! singleton: the same instance is returned on each resolution.

use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

use tessera_domain::constants::VALUES_PROVIDER;
use tessera_domain::error::Result;
use tessera_domain::{Instance, Key, Lifetime};
use tessera_infrastructure::di::{Catalog, Registration, Resolver};
use tessera_infrastructure::ports::{
    DependencyDebug, PROVIDER_TYPES, ProvidedDependency, Provider, ProviderType,
    ProviderTypeEntry,
};

/// Provider of constant values
#[derive(Default)]
pub struct ValueProvider {
    values: DashMap<Key, Instance>,
}

impl std::fmt::Debug for ValueProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueProvider")
            .field("values", &self.values.len())
            .finish()
    }
}

/// Provider type of [`ValueProvider`]
pub const VALUES: ProviderType = ProviderType::of::<ValueProvider>(VALUES_PROVIDER);

impl ValueProvider {
    /// Register `value` under `key`
    pub fn insert(
        &self,
        registration: &Registration<'_>,
        key: impl Into<Key>,
        value: Instance,
    ) -> Result<()> {
        let key = key.into();
        registration.raise_if_claimed(&key)?;
        debug!(catalog = registration.catalog(), key = %key, "Registered value");
        self.values.insert(key, value);
        Ok(())
    }

    /// Whether a value is registered under `key`
    pub fn contains(&self, key: &Key) -> bool {
        self.values.contains_key(key)
    }

    /// Number of registered values
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no value is registered
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Provider for ValueProvider {
    fn name(&self) -> &str {
        VALUES_PROVIDER
    }

    fn can_provide(&self, key: &Key) -> bool {
        self.values.contains_key(key)
    }

    fn maybe_provide(
        &self,
        key: &Key,
        _resolver: &Resolver<'_>,
        out: &mut ProvidedDependency,
    ) -> Result<()> {
        let value = self.values.get(key).map(|entry| Arc::clone(entry.value()));
        match value {
            Some(value) => out.set_value(value, Lifetime::Singleton, None),
            None => Ok(()),
        }
    }

    fn maybe_debug(&self, key: &Key) -> Option<DependencyDebug> {
        self.can_provide(key)
            .then(|| DependencyDebug::new("value").with_lifetime(Lifetime::Singleton))
    }

    fn fork(&self) -> Arc<dyn Provider> {
        Arc::new(Self {
            values: self.values.clone(),
        })
    }
}

/// Concise value registration on a catalog
pub trait ValueCatalogExt {
    /// Register a constant value in the [`ValueProvider`] of this handle's twin
    fn provide_value(&self, key: impl Into<Key>, value: Instance) -> Result<()>;
}

impl ValueCatalogExt for Catalog {
    fn provide_value(&self, key: impl Into<Key>, value: Instance) -> Result<()> {
        let key = key.into();
        self.with_provider::<ValueProvider, _>(|values, registration| {
            values.insert(registration, key, value)
        })
    }
}

// ============================================================================
// Auto-registration via linkme
// ============================================================================

#[linkme::distributed_slice(PROVIDER_TYPES)]
static VALUE_PROVIDER: ProviderTypeEntry = ProviderTypeEntry {
    name: VALUES_PROVIDER,
    description: "Constant singleton values",
    provider_type: VALUES,
};
