//! Provider Type Registry
//!
//! Auto-registration system for provider types using linkme distributed slices.
//! Provider crates register their types via `#[linkme::distributed_slice]` and
//! catalogs built from configuration include them by name.
//!
//! ## Architecture
//!
//! ```text
//! Config: catalog.providers = ["values", "factories"]
//!                    │
//!                    ▼
//! ┌─────────────────────────────────────┐
//! │   resolve_provider_type("values")   │
//! └─────────────────────────────────────┘
//!                    │
//!                    ▼
//! ┌─────────────────────────────────────┐
//! │   PROVIDER_TYPES.iter()             │  ← Discovers auto-registered types
//! └─────────────────────────────────────┘
//!                    │
//!                    ▼
//!          catalog.include(provider_type)
//! ```

use tessera_domain::error::{Error, Result};

use super::provider::ProviderType;

/// Registry entry for provider types
///
/// Each provider crate registers its types with this entry using
/// `#[linkme::distributed_slice(PROVIDER_TYPES)]`.
pub struct ProviderTypeEntry {
    /// Unique provider type name (e.g., "values", "factories")
    pub name: &'static str,
    /// Human-readable description
    pub description: &'static str,
    /// The provider type to include
    pub provider_type: ProviderType,
}

// Auto-collection via linkme distributed slices - providers submit entries at compile time
#[linkme::distributed_slice]
pub static PROVIDER_TYPES: [ProviderTypeEntry] = [..];

/// Resolve a provider type by name from the registry
///
/// # Example
///
/// ```ignore
/// let provider_type = resolve_provider_type("factories")?;
/// catalog.include(provider_type)?;
/// ```
pub fn resolve_provider_type(name: &str) -> Result<ProviderType> {
    PROVIDER_TYPES
        .iter()
        .find(|entry| entry.name == name)
        .map(|entry| entry.provider_type)
        .ok_or_else(|| Error::unknown_provider_type(name))
}

/// List all registered provider types as (name, description)
pub fn list_provider_types() -> Vec<(&'static str, &'static str)> {
    PROVIDER_TYPES
        .iter()
        .map(|entry| (entry.name, entry.description))
        .collect()
}
