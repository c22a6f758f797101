//! # Tessera
//!
//! Layered dependency resolution with lifetime-aware caching and test sandboxes.
//!
//! This crate is the public API: it re-exports the domain types, the
//! resolution engine and the reference providers, and owns the composition
//! root (configuration bootstrap and the default catalog).
//!
//! ## Features
//!
//! - **Lifetimes**: singleton, scoped (invalidated by scope variables) and transient values
//! - **Visibility**: public and private halves of every catalog, child catalogs
//! - **Sandboxes**: `empty`, `new`, `clone` and `copy` test environments with overrides
//! - **Cycle detection**: dependency cycles fail with the full key chain
//!
//! ## Example
//!
//! ```ignore
//! use tessera::{Catalog, CloneOptions, FACTORIES, Factory, FactoryCatalogExt, instance};
//!
//! let catalog = Catalog::new("app");
//! catalog.include(FACTORIES)?;
//! catalog.provide_factory("db", Factory::singleton(|_| Ok(instance(Database::connect()))))?;
//!
//! let env = catalog.test().clone(CloneOptions::default())?;
//! env.overrides().set("db", instance(Database::in_memory()))?;
//! // catalog.get("db") now returns the in-memory database until `env` is dropped
//! ```
//!
//! ## Architecture
//!
//! - `domain` - keys, lifetimes, instances and errors
//! - `infrastructure` - the resolution engine, configuration and logging
//! - `providers` - value, factory and interface providers

/// Domain layer - keys, lifetimes, instances and errors
///
/// Re-exports from the domain crate for convenience
pub mod domain {
    pub use tessera_domain::*;
}

/// Infrastructure layer - engine, configuration and logging
///
/// Re-exports from the infrastructure crate for convenience
pub mod infrastructure {
    pub use tessera_infrastructure::*;
}

/// Reference providers
///
/// Re-exports from the providers crate for convenience
pub mod providers {
    pub use tessera_providers::*;
}

/// Configuration bootstrap
pub mod bootstrap;

/// Default catalog
pub mod world;

// Re-export commonly used domain types at the crate root
pub use domain::*;

// Re-export the engine surface at the crate root
pub use infrastructure::di::{
    Catalog, CloneOptions, Include, Overrides, Registration, Resolver,
    TestEnvironment, Visibility,
};
pub use infrastructure::ports::{DependencyDebug, ProvidedDependency, Provider, ProviderType};

// Re-export providers at the crate root
pub use providers::{
    AllImplementations, FACTORIES, Factory, FactoryCatalogExt, INTERFACES, InterfaceCatalogExt,
    VALUES, ValueCatalogExt,
};

pub use bootstrap::{build_catalog, init, init_from_file};
pub use world::{install_world, reset_world, world};
