//! Main application configuration

use serde::{Deserialize, Serialize};

use super::catalog::CatalogConfig;
use super::logging::LoggingConfig;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    /// Catalog built at bootstrap
    #[serde(default)]
    pub catalog: CatalogConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}
