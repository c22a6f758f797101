//! Catalog configuration types

use serde::{Deserialize, Serialize};
use tessera_domain::constants::{
    DEFAULT_CATALOG_NAME, FACTORIES_PROVIDER, INTERFACES_PROVIDER, VALUES_PROVIDER,
};

/// Catalog built by the bootstrap
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CatalogConfig {
    /// Catalog name, shown in errors and logs
    pub name: String,

    /// Provider types to include, by registry name, in order
    pub providers: Vec<String>,

    /// Freeze the catalog once the bootstrap is done
    pub freeze: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_CATALOG_NAME.to_string(),
            providers: vec![
                VALUES_PROVIDER.to_string(),
                FACTORIES_PROVIDER.to_string(),
                INTERFACES_PROVIDER.to_string(),
            ],
            freeze: false,
        }
    }
}
