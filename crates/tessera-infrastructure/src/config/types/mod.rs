//! Configuration types module

pub mod app;
pub mod catalog;
pub mod logging;

// Re-export main types
pub use app::AppConfig;
pub use catalog::CatalogConfig;
pub use logging::LoggingConfig;
