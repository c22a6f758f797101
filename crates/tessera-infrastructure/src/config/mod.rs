//! Configuration
//!
//! Layered with figment: defaults, then `tessera.toml`, then `TESSERA_*`
//! environment variables.

pub mod loader;
pub mod types;

pub use loader::{ConfigBuilder, ConfigLoader, validate_app_config};
pub use types::{AppConfig, CatalogConfig, LoggingConfig};
