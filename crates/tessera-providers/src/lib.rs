//! # Tessera - Reference Providers
//!
//! Providers implementing the [`Provider`](tessera_infrastructure::ports::Provider)
//! port. Each one auto-registers into the provider type registry so catalogs
//! built from configuration can include it by name.
//!
//! | Name | Provider | Resolves |
//! |------|----------|----------|
//! | `values` | [`ValueProvider`] | constant singleton values |
//! | `factories` | [`FactoryProvider`] | recipes with a declared lifetime |
//! | `interfaces` | [`InterfaceProvider`] | weighted implementations of an interface key |
//!
//! ## Usage
//!
//! ```ignore
//! use tessera_providers::{FACTORIES, Factory, FactoryCatalogExt, VALUES, ValueCatalogExt};
//!
//! catalog.include(VALUES)?;
//! catalog.include(FACTORIES)?;
//! catalog.provide_value("dsn", instance("postgres://localhost/app"))?;
//! catalog.provide_factory("pool", Factory::singleton(|resolver| {
//!     let dsn = resolver.get_as::<&str>("dsn")?;
//!     Ok(instance(Pool::connect(&dsn)))
//! }))?;
//! ```

// Re-export domain types commonly used with providers
pub use tessera_domain::error::{Error, Result};

/// Constant singleton values
pub mod value;

/// Recipes with a declared lifetime
pub mod factory;

/// Weighted interface bindings
pub mod interface;

pub use factory::{FACTORIES, Factory, FactoryCatalogExt, FactoryProvider};
pub use interface::{AllImplementations, INTERFACES, InterfaceCatalogExt, InterfaceProvider};
pub use value::{VALUES, ValueCatalogExt, ValueProvider};
