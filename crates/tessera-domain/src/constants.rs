//! Domain layer constants
//!
//! Names shared by the engine, the reference providers and configuration.
//! Infrastructure-specific constants remain in `tessera_infrastructure::constants`.

// ============================================================================
// CATALOG CONSTANTS
// ============================================================================

/// Name of the default catalog created at the composition root
pub const DEFAULT_CATALOG_NAME: &str = "world";

/// Suffix used when displaying the private twin of a catalog
pub const PRIVATE_CATALOG_SUFFIX: &str = "#private";

/// Separator between dependency keys in a cycle chain
pub const CYCLE_CHAIN_SEPARATOR: &str = " -> ";

// ============================================================================
// PROVIDER TYPE NAMES
// ============================================================================

/// Provider type name of the constant value provider
pub const VALUES_PROVIDER: &str = "values";

/// Provider type name of the factory provider
pub const FACTORIES_PROVIDER: &str = "factories";

/// Provider type name of the interface provider
pub const INTERFACES_PROVIDER: &str = "interfaces";
