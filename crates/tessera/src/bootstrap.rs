//! Composition root bootstrap
//!
//! ```text
//! tessera.toml + TESSERA_* ──► ConfigLoader ──► AppConfig
//!                                                 │
//!                          init_logging(logging) ◄┤
//!                                                 ▼
//!                        build_catalog(catalog): include providers by name
//! ```

use std::path::Path;
use tracing::info;

use tessera_domain::error::Result;
use tessera_infrastructure::config::{AppConfig, CatalogConfig, ConfigLoader, validate_app_config};
use tessera_infrastructure::di::Catalog;
use tessera_infrastructure::logging::init_logging;
use tessera_infrastructure::ports::resolve_provider_type;

// Force linking of the providers crate so its linkme registrations are present
extern crate tessera_providers;

/// Build a catalog from configuration
///
/// Provider types are resolved by name in the provider type registry and
/// included into the public twin in configuration order.
pub fn build_catalog(config: &CatalogConfig) -> Result<Catalog> {
    let provider_types = config
        .providers
        .iter()
        .map(String::as_str)
        .map(resolve_provider_type)
        .collect::<Result<Vec<_>>>()?;

    let catalog = Catalog::new(&config.name);
    catalog.include_all(provider_types)?;
    if config.freeze {
        catalog.freeze();
    }

    info!(
        catalog = %config.name,
        providers = ?config.providers,
        frozen = config.freeze,
        "Catalog built from configuration"
    );
    Ok(catalog)
}

/// Initialize logging and build the configured catalog
///
/// Fails when a global log subscriber is already installed.
pub fn init(config: AppConfig) -> Result<Catalog> {
    validate_app_config(&config)?;
    init_logging(&config.logging)?;
    build_catalog(&config.catalog)
}

/// Load configuration from `path` and environment, then [`init`]
pub fn init_from_file(path: impl AsRef<Path>) -> Result<Catalog> {
    let config = ConfigLoader::new().with_config_path(path).load()?;
    init(config)
}
