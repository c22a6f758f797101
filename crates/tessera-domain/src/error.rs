//! Error handling types
//!
//! Registration errors surface synchronously to the registering caller,
//! resolution errors to the `get` caller. Errors raised by provider code are
//! carried by [`Error::Provider`] and pass through the engine unchanged.

use thiserror::Error;

use crate::constants::CYCLE_CHAIN_SEPARATOR;
use crate::key::Key;

/// Result type alias for operations that can fail
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Tessera
#[derive(Error, Debug)]
pub enum Error {
    /// No provider, cache entry, scope variable or child could resolve the key
    #[error("Dependency not found: {key}")]
    DependencyNotFound {
        /// The key that could not be resolved
        key: Key,
    },

    /// A key was requested again while it was still being resolved
    #[error("Dependency cycle: {}", format_chain(.chain))]
    DependencyCycle {
        /// In-flight keys, outermost first, ending with the re-entered key
        chain: Vec<Key>,
    },

    /// The key is already registered in this catalog layer
    #[error("Duplicate dependency {key} in catalog {catalog}")]
    DuplicateDependency {
        /// The conflicting key
        key: Key,
        /// Catalog where the conflict was detected
        catalog: String,
    },

    /// The provider type is already included in this catalog layer
    #[error("Provider {provider} is already included in catalog {catalog}")]
    DuplicateProvider {
        /// Provider type name
        provider: String,
        /// Catalog where the conflict was detected
        catalog: String,
    },

    /// A structural mutation was attempted after `freeze()`
    #[error("Catalog {catalog} is frozen")]
    FrozenCatalog {
        /// The frozen catalog
        catalog: String,
    },

    /// A scope variable was read before it was given a value
    #[error("Scope variable {key} is undefined")]
    UndefinedScopeVar {
        /// Key of the scope variable
        key: Key,
    },

    /// A provider violated the lifetime / scope variable contract
    #[error("Invalid definition of {key}: {message}")]
    DependencyDefinition {
        /// Key being provided
        key: Key,
        /// Description of the violation
        message: String,
    },

    /// A child catalog could not be attached
    #[error("Cannot attach catalog: {message}")]
    CatalogAttachment {
        /// Description of the attachment conflict
        message: String,
    },

    /// A typed provider lookup found no provider of that type
    #[error("Provider {provider} is not included in catalog {catalog}")]
    MissingProvider {
        /// Provider type name
        provider: String,
        /// Catalog that was searched
        catalog: String,
    },

    /// No provider type is registered under that name
    #[error("Unknown provider type: {name}")]
    UnknownProviderType {
        /// Requested provider type name
        name: String,
    },

    /// The sandbox owning an overlay has already exited
    #[error("Sandbox for catalog {catalog} has exited")]
    SandboxClosed {
        /// Catalog the overlay belonged to
        catalog: String,
    },

    /// The catalog is not part of the sandbox
    #[error("Catalog {catalog} is not part of this sandbox")]
    UnknownCatalog {
        /// Requested catalog
        catalog: String,
    },

    /// A resolved value does not have the requested type
    #[error("Dependency {key} is not a {expected}")]
    UnexpectedType {
        /// Resolved key
        key: Key,
        /// Requested type name
        expected: &'static str,
    },

    /// Failure raised by provider code while producing a value
    #[error("Provider error: {message}")]
    Provider {
        /// Description of the failure
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration-related error (loading, validation, logging setup)
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

fn format_chain(chain: &[Key]) -> String {
    chain
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(CYCLE_CHAIN_SEPARATOR)
}

// Resolution error creation methods
impl Error {
    /// Create a dependency not found error
    pub fn not_found(key: Key) -> Self {
        Self::DependencyNotFound { key }
    }

    /// Create a dependency cycle error
    pub fn cycle(chain: Vec<Key>) -> Self {
        Self::DependencyCycle { chain }
    }

    /// Create an undefined scope variable error
    pub fn undefined_scope_var(key: Key) -> Self {
        Self::UndefinedScopeVar { key }
    }

    /// Create a dependency definition error
    pub fn definition<S: Into<String>>(key: Key, message: S) -> Self {
        Self::DependencyDefinition {
            key,
            message: message.into(),
        }
    }

    /// Create an unexpected type error
    pub fn unexpected_type(key: Key, expected: &'static str) -> Self {
        Self::UnexpectedType { key, expected }
    }

    /// Whether this is a [`Error::DependencyNotFound`] for `key`
    pub fn is_not_found_for(&self, key: &Key) -> bool {
        matches!(self, Self::DependencyNotFound { key: missing } if missing == key)
    }
}

// Registration error creation methods
impl Error {
    /// Create a duplicate dependency error
    pub fn duplicate_dependency<S: Into<String>>(key: Key, catalog: S) -> Self {
        Self::DuplicateDependency {
            key,
            catalog: catalog.into(),
        }
    }

    /// Create a duplicate provider error
    pub fn duplicate_provider<P: Into<String>, S: Into<String>>(provider: P, catalog: S) -> Self {
        Self::DuplicateProvider {
            provider: provider.into(),
            catalog: catalog.into(),
        }
    }

    /// Create a frozen catalog error
    pub fn frozen<S: Into<String>>(catalog: S) -> Self {
        Self::FrozenCatalog {
            catalog: catalog.into(),
        }
    }

    /// Create a catalog attachment error
    pub fn attachment<S: Into<String>>(message: S) -> Self {
        Self::CatalogAttachment {
            message: message.into(),
        }
    }

    /// Create a missing provider error
    pub fn missing_provider<P: Into<String>, S: Into<String>>(provider: P, catalog: S) -> Self {
        Self::MissingProvider {
            provider: provider.into(),
            catalog: catalog.into(),
        }
    }

    /// Create an unknown provider type error
    pub fn unknown_provider_type<S: Into<String>>(name: S) -> Self {
        Self::UnknownProviderType { name: name.into() }
    }
}

// Sandbox error creation methods
impl Error {
    /// Create a sandbox closed error
    pub fn sandbox_closed<S: Into<String>>(catalog: S) -> Self {
        Self::SandboxClosed {
            catalog: catalog.into(),
        }
    }

    /// Create an unknown catalog error
    pub fn unknown_catalog<S: Into<String>>(catalog: S) -> Self {
        Self::UnknownCatalog {
            catalog: catalog.into(),
        }
    }
}

// Provider and configuration error creation methods
impl Error {
    /// Create a provider error
    pub fn provider<S: Into<String>>(message: S) -> Self {
        Self::Provider {
            message: message.into(),
            source: None,
        }
    }

    /// Create a provider error with source
    pub fn provider_with_source<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        message: S,
        source: E,
    ) -> Self {
        Self::Provider {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// Create a configuration error with source
    pub fn configuration_with_source<
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    >(
        message: S,
        source: E,
    ) -> Self {
        Self::Configuration {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}
