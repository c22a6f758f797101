//! # Infrastructure Layer
//!
//! The resolution engine and the cross-cutting concerns around it.
//!
//! ## Module Categories
//!
//! ### Resolution
//! | Module | Description |
//! |--------|-------------|
//! | [`di`] | Catalogs, layers, scope variables, sandboxes |
//! | [`ports`] | Provider protocol and provider type registry |
//!
//! ### Configuration
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | TOML + environment configuration via figment |
//! | [`constants`] | Configuration constants |
//!
//! ### Observability
//! | Module | Description |
//! |--------|-------------|
//! | [`logging`] | Structured logging with tracing |
//! | [`error_ext`] | Context helpers for foreign errors |

pub mod config;
pub mod constants;
pub mod di;
pub mod error_ext;
pub mod logging;
pub mod ports;

// Re-export commonly used types
pub use di::{Catalog, CloneOptions, Include, Overrides, Registration, Resolver, TestEnvironment};
pub use error_ext::ErrorContext;
pub use ports::{Provider, ProviderType};
