//! Ports
//!
//! Interfaces implemented outside the engine:
//!
//! - [`provider`]: the provider protocol and provider types
//! - [`registry`]: linkme registry of provider types included by name

pub mod provider;
pub mod registry;

pub use provider::{
    DependencyDebug, ProvidedDependency, Provider, ProviderType, Recipe, recipe,
};
pub use registry::{
    PROVIDER_TYPES, ProviderTypeEntry, list_provider_types, resolve_provider_type,
};
