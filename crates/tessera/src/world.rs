//! Default catalog
//!
//! The process-wide catalog used by code that has no explicit handle. It is
//! built lazily from the default catalog configuration on first access; the
//! composition root can replace it with [`install_world`], and test harnesses
//! tear it down with [`reset_world`].

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tracing::debug;

use tessera_domain::error::Result;
use tessera_infrastructure::config::CatalogConfig;
use tessera_infrastructure::di::Catalog;

use crate::bootstrap::build_catalog;

static WORLD: Lazy<RwLock<Option<Catalog>>> = Lazy::new(|| RwLock::new(None));

/// The default catalog, built on first call
pub fn world() -> Result<Catalog> {
    if let Some(catalog) = WORLD.read().as_ref() {
        return Ok(catalog.clone());
    }

    let mut slot = WORLD.write();
    // Another thread may have built it between the two locks
    if let Some(catalog) = slot.as_ref() {
        return Ok(catalog.clone());
    }
    let catalog = build_catalog(&CatalogConfig::default())?;
    debug!(catalog = %catalog.identity(), "Default catalog created");
    *slot = Some(catalog.clone());
    Ok(catalog)
}

/// Replace the default catalog, returning the previous one
pub fn install_world(catalog: Catalog) -> Option<Catalog> {
    debug!(catalog = %catalog.identity(), "Default catalog installed");
    WORLD.write().replace(catalog)
}

/// Drop the default catalog; the next [`world`] call builds a fresh one
pub fn reset_world() -> Option<Catalog> {
    WORLD.write().take()
}
