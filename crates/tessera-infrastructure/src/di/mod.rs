//! Resolution engine
//!
//! ```text
//! Catalog (public / private handle)
//!   └── Onion: base layer + sandbox layers
//!         └── Layer
//!               ├── overlay (sandbox layers only)
//!               ├── public twin:  providers, cache, scope variables
//!               ├── private twin: providers, cache, scope variables
//!               └── children: attached catalogs (public handles)
//! ```
//!
//! Every top-level `get` creates an [`InstantiationContext`] which is threaded
//! through nested resolutions via the [`Resolver`] handed to providers.

mod cache;
pub mod catalog;
pub mod context;
mod debug;
pub mod identity;
mod layer;
mod onion;
mod overlay;
pub mod sandbox;
mod scope_var;

pub use catalog::{Catalog, Include, Registration, SetupFn, Visibility};
pub use context::InstantiationContext;
pub use identity::{CatalogId, CatalogIdentity, SandboxId};
pub use layer::Resolver;
pub use sandbox::{CloneOptions, Overrides, TestBuilder, TestEnvironment};
