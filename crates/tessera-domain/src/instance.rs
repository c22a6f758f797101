//! Resolved values
//!
//! Every value produced by the engine is an [`Instance`]: a reference-counted,
//! type-erased pointer. Identity of a resolved value is pointer identity, which
//! is what singleton and scoped caching guarantees are stated in terms of.

use std::any::Any;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::key::Key;

/// A resolved dependency value
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Wrap a value as an [`Instance`]
pub fn instance<T: Any + Send + Sync>(value: T) -> Instance {
    Arc::new(value)
}

/// Downcast an [`Instance`] resolved for `key` to its concrete type
pub fn downcast<T: Any + Send + Sync>(key: &Key, value: Instance) -> Result<Arc<T>> {
    value
        .downcast::<T>()
        .map_err(|_| Error::unexpected_type(key.clone(), std::any::type_name::<T>()))
}

/// Whether two instances are the same object
pub fn same_instance(a: &Instance, b: &Instance) -> bool {
    Arc::ptr_eq(a, b)
}
