//! Provider port
//!
//! A provider is the pluggable unit that resolves a subset of dependency keys.
//! Each provider instance is owned by exactly one layer twin; when a sandbox
//! clones a catalog, providers are [`fork`](Provider::fork)ed into the new layer.
//!
//! ## Contract
//!
//! ```text
//! can_provide(key)            pure, consistent with maybe_provide
//!        │
//!        ▼
//! maybe_provide(key, resolver, out)
//!        │   resolver: per-layer accessor (never the public catalog)
//!        ▼
//! out.set_value(value, lifetime, callback)   at most once
//! ```
//!
//! The engine checks the lifetime contract after `maybe_provide` returns:
//! a scoped value needs a recompute callback and at least one scope variable
//! read, a singleton must not read any scope variable.

use downcast_rs::{DowncastSync, impl_downcast};
use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

use tessera_domain::error::{Error, Result};
use tessera_domain::{Instance, Key, Lifetime};

use crate::di::Resolver;

/// Recompute callback stored alongside transient and scoped values
pub type Recipe = Arc<dyn Fn(&Resolver<'_>) -> Result<Instance> + Send + Sync>;

/// Wrap a closure as a [`Recipe`]
pub fn recipe<F>(f: F) -> Recipe
where
    F: Fn(&Resolver<'_>) -> Result<Instance> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Value written by a provider
pub(crate) struct Provided {
    pub(crate) value: Instance,
    pub(crate) lifetime: Lifetime,
    pub(crate) callback: Option<Recipe>,
}

/// Output slot handed to [`Provider::maybe_provide`]
pub struct ProvidedDependency {
    key: Key,
    slot: Option<Provided>,
}

impl ProvidedDependency {
    pub(crate) fn new(key: Key) -> Self {
        Self { key, slot: None }
    }

    /// Write the provided value
    ///
    /// Fails with a definition error when a value was already written.
    pub fn set_value(
        &mut self,
        value: Instance,
        lifetime: Lifetime,
        callback: Option<Recipe>,
    ) -> Result<()> {
        if self.slot.is_some() {
            return Err(Error::definition(
                self.key.clone(),
                "provider wrote more than one value",
            ));
        }
        self.slot = Some(Provided {
            value,
            lifetime,
            callback,
        });
        Ok(())
    }

    /// Whether a value has been written
    pub fn is_set(&self) -> bool {
        self.slot.is_some()
    }

    /// Key being provided
    pub fn key(&self) -> &Key {
        &self.key
    }

    pub(crate) fn take(self) -> Option<Provided> {
        self.slot
    }
}

/// Debug description of one dependency, used by [`Catalog::debug`](crate::di::Catalog::debug)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyDebug {
    /// Human readable description
    pub description: String,
    /// Declared lifetime, if known without resolving
    pub lifetime: Option<Lifetime>,
    /// Upstream keys this dependency resolves
    pub dependencies: Vec<Key>,
}

impl DependencyDebug {
    /// Create a description without lifetime or dependencies
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            lifetime: None,
            dependencies: Vec::new(),
        }
    }

    /// Set the declared lifetime
    pub fn with_lifetime(mut self, lifetime: Lifetime) -> Self {
        self.lifetime = Some(lifetime);
        self
    }

    /// Set the upstream keys
    pub fn with_dependencies(mut self, dependencies: impl IntoIterator<Item = Key>) -> Self {
        self.dependencies = dependencies.into_iter().collect();
        self
    }
}

/// Pluggable resolver for a subset of dependency keys
pub trait Provider: DowncastSync {
    /// Provider type name, used in errors and debug output
    fn name(&self) -> &str;

    /// Whether this provider can resolve `key`
    fn can_provide(&self, key: &Key) -> bool;

    /// Resolve `key`, writing at most one value into `out`
    ///
    /// Errors are returned to the `get` caller unchanged.
    fn maybe_provide(
        &self,
        key: &Key,
        resolver: &Resolver<'_>,
        out: &mut ProvidedDependency,
    ) -> Result<()>;

    /// Describe `key` for tooling
    fn maybe_debug(&self, _key: &Key) -> Option<DependencyDebug> {
        None
    }

    /// Copy of this provider's registrations for a sandbox layer
    fn fork(&self) -> Arc<dyn Provider>;
}

impl_downcast!(sync Provider);

impl fmt::Debug for dyn Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider").field("name", &self.name()).finish()
    }
}

/// A provider type that can be included into a catalog
///
/// Identifies the concrete provider type and knows how to construct an empty
/// instance of it.
#[derive(Clone, Copy)]
pub struct ProviderType {
    name: &'static str,
    type_id: fn() -> TypeId,
    create: fn() -> Arc<dyn Provider>,
}

fn create_provider<P: Provider + Default>() -> Arc<dyn Provider> {
    Arc::new(P::default())
}

impl ProviderType {
    /// Provider type for `P`, constructed with `P::default()`
    pub const fn of<P: Provider + Default>(name: &'static str) -> Self {
        Self {
            name,
            type_id: TypeId::of::<P>,
            create: create_provider::<P>,
        }
    }

    /// Provider type name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type id of the concrete provider
    pub fn type_id(&self) -> TypeId {
        (self.type_id)()
    }

    /// Whether `provider` is an instance of this type
    pub fn is_instance(&self, provider: &dyn Provider) -> bool {
        provider.as_any().type_id() == self.type_id()
    }

    pub(crate) fn create(&self) -> Arc<dyn Provider> {
        (self.create)()
    }
}

impl fmt::Debug for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ProviderType").field(&self.name).finish()
    }
}
