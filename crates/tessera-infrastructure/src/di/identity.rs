//! Catalog identities
//!
//! [`CatalogId`] is stable for the whole life of a catalog and keys the sandbox
//! overlay registry. [`CatalogIdentity`] names one layer of it: the catalog name
//! followed by the sandboxes entered so far.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_CATALOG_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_SANDBOX_ID: AtomicU64 = AtomicU64::new(1);

/// Stable, process-unique catalog identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CatalogId(u64);

impl CatalogId {
    pub(crate) fn next() -> Self {
        Self(NEXT_CATALOG_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for CatalogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifier of one sandbox entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SandboxId(u64);

impl SandboxId {
    pub(crate) fn next() -> Self {
        Self(NEXT_SANDBOX_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SandboxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sandbox-{}", self.0)
    }
}

/// Name plus the ordered sandboxes of one layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogIdentity {
    name: Arc<str>,
    sandboxes: Vec<SandboxId>,
}

impl CatalogIdentity {
    pub(crate) fn root(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            sandboxes: Vec::new(),
        }
    }

    /// Identity of a layer pushed for `sandbox` on top of this one
    pub(crate) fn enter(&self, sandbox: SandboxId) -> Self {
        let mut sandboxes = self.sandboxes.clone();
        sandboxes.push(sandbox);
        Self {
            name: Arc::clone(&self.name),
            sandboxes,
        }
    }

    /// Catalog name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sandboxes entered, outermost first
    pub fn sandboxes(&self) -> &[SandboxId] {
        &self.sandboxes
    }
}

impl fmt::Display for CatalogIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for sandbox in &self.sandboxes {
            write!(f, "[{sandbox}]")?;
        }
        Ok(())
    }
}
