//! Infrastructure constants

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Default configuration file name
pub const DEFAULT_CONFIG_FILENAME: &str = "tessera.toml";

/// Default configuration directory name
pub const DEFAULT_CONFIG_DIR: &str = "tessera";

/// Environment variable prefix for configuration
pub const CONFIG_ENV_PREFIX: &str = "TESSERA";

/// Separator for nested keys in environment variables
pub const CONFIG_ENV_SEPARATOR: &str = "__";

// ============================================================================
// LOGGING
// ============================================================================

/// Default log level
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Environment variable overriding the configured log filter
pub const LOG_ENV_FILTER: &str = "TESSERA_LOG";

/// File stem used when the configured log path has none
pub const DEFAULT_LOG_FILE_STEM: &str = "tessera";
