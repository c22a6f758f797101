//! Dependency keys
//!
//! A [`Key`] is an opaque, type-erased handle over any immutable value that is
//! `Eq + Hash + Debug + Send + Sync + 'static`. Two keys are equal only when
//! their concrete types match and the values compare equal, so `"db"` as a
//! named key never collides with a caller's own `Db` marker type.
//!
//! ## Example
//!
//! ```
//! use tessera_domain::key::Key;
//!
//! #[derive(Debug, PartialEq, Eq, Hash)]
//! struct Database;
//!
//! let named = Key::from("db");
//! let typed = Key::of::<Database>();
//! let custom = Key::new(("tenant", 42_u32));
//!
//! assert_eq!(named, Key::named("db"));
//! assert_ne!(typed, named);
//! assert_eq!(custom, Key::new(("tenant", 42_u32)));
//! ```

use std::any::{Any, TypeId};
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Object-safe view over a key value
trait KeyObject: Any + Send + Sync {
    fn eq_dyn(&self, other: &dyn KeyObject) -> bool;
    fn hash_dyn(&self, state: &mut dyn Hasher);
    fn fmt_dyn(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
    fn as_any(&self) -> &dyn Any;
}

impl<T> KeyObject for T
where
    T: Any + Eq + Hash + fmt::Debug + Send + Sync,
{
    fn eq_dyn(&self, other: &dyn KeyObject) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| other == self)
    }

    fn hash_dyn(&self, mut state: &mut dyn Hasher) {
        TypeId::of::<T>().hash(&mut state);
        self.hash(&mut state);
    }

    fn fmt_dyn(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Named key used by `Key::named` and the string conversions
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Name(Cow<'static, str>);

impl Name {
    /// Name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

/// Key identifying a Rust type
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Opaque, hashable dependency key
///
/// Cloning is cheap (reference counted). The engine never mutates a key.
#[derive(Clone)]
pub struct Key(Arc<dyn KeyObject>);

impl Key {
    /// Wrap any hashable value as a key
    pub fn new<T>(value: T) -> Self
    where
        T: Any + Eq + Hash + fmt::Debug + Send + Sync,
    {
        Self(Arc::new(value))
    }

    /// Key for a string name
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Self::new(Name(name.into()))
    }

    /// Key for a Rust type
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::new(TypeKey {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        })
    }

    /// Borrow the underlying value if it has type `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }

    /// Name of a key created with [`Key::named`] or from a string
    pub fn as_name(&self) -> Option<&str> {
        self.downcast_ref::<Name>().map(Name::as_str)
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.eq_dyn(other.0.as_ref())
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash_dyn(state);
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt_dyn(f)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_name() {
            Some(name) => f.write_str(name),
            None => self.0.fmt_dyn(f),
        }
    }
}

impl From<&'static str> for Key {
    fn from(name: &'static str) -> Self {
        Self::named(name)
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Self::named(name)
    }
}

impl From<&Key> for Key {
    fn from(key: &Key) -> Self {
        key.clone()
    }
}
