//! Interface provider
//!
//! Binds an interface key to weighted implementation keys.
//!
//! ```text
//! bind("storage", "s3", 10)
//! bind("storage", "local", 0)
//!
//! get("storage")                                  -> get("s3")
//! get(Key::new(AllImplementations("storage")))    -> [get("s3"), get("local")]
//! ```
//!
//! Interface values are never cached: each resolution goes back to the
//! implementation keys, which keep their own lifetimes.

use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

use tessera_domain::constants::INTERFACES_PROVIDER;
use tessera_domain::error::Result;
use tessera_domain::{Instance, Key, Lifetime, instance};
use tessera_infrastructure::di::{Catalog, Registration, Resolver};
use tessera_infrastructure::ports::{
    DependencyDebug, PROVIDER_TYPES, ProvidedDependency, Provider, ProviderType,
    ProviderTypeEntry,
};

/// Key resolving every implementation bound to an interface
///
/// Resolves to a `Vec<Instance>` ordered by descending weight.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AllImplementations(pub Key);

impl AllImplementations {
    /// Key of the implementation list for `interface`
    pub fn key(interface: impl Into<Key>) -> Key {
        Key::new(Self(interface.into()))
    }
}

#[derive(Debug, Clone)]
struct Binding {
    implementation: Key,
    weight: i64,
}

/// Provider of weighted interface bindings
#[derive(Debug, Default)]
pub struct InterfaceProvider {
    bindings: DashMap<Key, Vec<Binding>>,
}

/// Provider type of [`InterfaceProvider`]
pub const INTERFACES: ProviderType = ProviderType::of::<InterfaceProvider>(INTERFACES_PROVIDER);

impl InterfaceProvider {
    /// Bind `implementation` to `interface` with `weight`
    ///
    /// Binding the same implementation twice updates its weight.
    pub fn bind(
        &self,
        registration: &Registration<'_>,
        interface: impl Into<Key>,
        implementation: impl Into<Key>,
        weight: i64,
    ) -> Result<()> {
        let interface = interface.into();
        let implementation = implementation.into();
        // Further bindings of an interface this provider already resolves are updates
        if !self.can_provide(&interface) {
            registration.raise_if_claimed(&interface)?;
        }
        debug!(
            catalog = registration.catalog(),
            interface = %interface,
            implementation = %implementation,
            weight,
            "Bound implementation"
        );

        let mut bindings = self.bindings.entry(interface).or_default();
        bindings.retain(|binding| binding.implementation != implementation);
        bindings.push(Binding {
            implementation,
            weight,
        });
        // Stable sort keeps registration order among equal weights
        bindings.sort_by(|a, b| b.weight.cmp(&a.weight));
        Ok(())
    }

    /// Implementation keys bound to `interface`, highest weight first
    pub fn implementations(&self, interface: &Key) -> Vec<Key> {
        self.bindings
            .get(interface)
            .map(|bindings| {
                bindings
                    .iter()
                    .map(|binding| binding.implementation.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn interface_of(key: &Key) -> Option<&Key> {
        key.downcast_ref::<AllImplementations>()
            .map(|AllImplementations(interface)| interface)
    }
}

impl Provider for InterfaceProvider {
    fn name(&self) -> &str {
        INTERFACES_PROVIDER
    }

    fn can_provide(&self, key: &Key) -> bool {
        let interface = Self::interface_of(key).unwrap_or(key);
        self.bindings
            .get(interface)
            .is_some_and(|bindings| !bindings.is_empty())
    }

    fn maybe_provide(
        &self,
        key: &Key,
        resolver: &Resolver<'_>,
        out: &mut ProvidedDependency,
    ) -> Result<()> {
        if let Some(interface) = Self::interface_of(key) {
            let implementations = self.implementations(interface);
            if implementations.is_empty() {
                return Ok(());
            }
            let values = implementations
                .into_iter()
                .map(|implementation| resolver.get(implementation))
                .collect::<Result<Vec<Instance>>>()?;
            return out.set_value(instance(values), Lifetime::Transient, None);
        }

        match self.implementations(key).into_iter().next() {
            Some(implementation) => {
                let value = resolver.get(implementation)?;
                out.set_value(value, Lifetime::Transient, None)
            }
            None => Ok(()),
        }
    }

    fn maybe_debug(&self, key: &Key) -> Option<DependencyDebug> {
        if let Some(interface) = Self::interface_of(key) {
            let implementations = self.implementations(interface);
            return (!implementations.is_empty()).then(|| {
                DependencyDebug::new("all implementations")
                    .with_lifetime(Lifetime::Transient)
                    .with_dependencies(implementations)
            });
        }
        let implementation = self.implementations(key).into_iter().next()?;
        Some(
            DependencyDebug::new("interface")
                .with_lifetime(Lifetime::Transient)
                .with_dependencies([implementation]),
        )
    }

    fn fork(&self) -> Arc<dyn Provider> {
        Arc::new(Self {
            bindings: self.bindings.clone(),
        })
    }
}

/// Concise interface binding on a catalog
pub trait InterfaceCatalogExt {
    /// Bind `implementation` to `interface` in the [`InterfaceProvider`] of this handle's twin
    fn bind_interface(
        &self,
        interface: impl Into<Key>,
        implementation: impl Into<Key>,
        weight: i64,
    ) -> Result<()>;
}

impl InterfaceCatalogExt for Catalog {
    fn bind_interface(
        &self,
        interface: impl Into<Key>,
        implementation: impl Into<Key>,
        weight: i64,
    ) -> Result<()> {
        let interface = interface.into();
        let implementation = implementation.into();
        self.with_provider::<InterfaceProvider, _>(|interfaces, registration| {
            interfaces.bind(registration, interface, implementation, weight)
        })
    }
}

// ============================================================================
// Auto-registration via linkme
// ============================================================================

#[linkme::distributed_slice(PROVIDER_TYPES)]
static INTERFACE_PROVIDER: ProviderTypeEntry = ProviderTypeEntry {
    name: INTERFACES_PROVIDER,
    description: "Weighted implementations of an interface key",
    provider_type: INTERFACES,
};
