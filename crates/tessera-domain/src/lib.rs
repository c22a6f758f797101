//! # Tessera Domain
//!
//! Pure types shared by every Tessera crate:
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`key`] | Opaque, hashable dependency keys |
//! | [`instance`] | Type-erased resolved values |
//! | [`lifetime`] | Transient / Scoped / Singleton caching policies |
//! | [`error`] | Error taxonomy shared by registration and resolution |
//! | [`constants`] | Names shared across crates |

pub mod constants;
pub mod error;
pub mod instance;
pub mod key;
pub mod lifetime;

pub use error::{Error, Result};
pub use instance::{Instance, downcast, instance, same_instance};
pub use key::Key;
pub use lifetime::Lifetime;
