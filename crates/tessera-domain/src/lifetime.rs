//! Caching policies of resolved values

use serde::{Deserialize, Serialize};
use std::fmt;

/// Caching policy of a resolved value
///
/// - **Singleton**: computed once per layer and reused for the layer's lifetime.
/// - **Scoped**: cached together with the versions of the scope variables read
///   while computing it; recomputed once any of them changes.
/// - **Transient**: never cached as a value; recomputed on each resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifetime {
    /// One value per layer
    Singleton,
    /// One value per generation of the scope variables it depends on
    Scoped,
    /// A fresh value on every resolution
    Transient,
}

impl Lifetime {
    /// Lowercase name used in logs and debug trees
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Singleton => "singleton",
            Self::Scoped => "scoped",
            Self::Transient => "transient",
        }
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
