//! Catalogs
//!
//! A [`Catalog`] is a cheap handle onto a stack of layers ([`Onion`]). Every
//! catalog has a public and a private twin; [`Catalog::private`] returns the
//! handle of the private twin of the same catalog. Resolution through the
//! public handle only sees the public twin and the children; the private
//! handle and every provider [`Resolver`](super::Resolver) also see the
//! private twin.
//!
//! ## Example
//!
//! ```ignore
//! let catalog = Catalog::new("app");
//! catalog.include(VALUES)?;
//! catalog.with_provider::<ValueProvider, _>(|values, registration| {
//!     values.insert(registration, "greeting", instance("hello"))
//! })?;
//! let greeting = catalog.get_as::<&str>("greeting")?;
//! ```

use parking_lot::Mutex;
use parking_lot::ReentrantMutexGuard;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, info, trace};

use tessera_domain::constants::PRIVATE_CATALOG_SUFFIX;
use tessera_domain::error::{Error, Result};
use tessera_domain::{Instance, Key};

use super::context::InstantiationContext;
use super::debug::render_tree;
use super::identity::{CatalogId, CatalogIdentity};
use super::layer::{Access, Layer};
use super::onion::Onion;
use super::sandbox::TestBuilder;
use crate::ports::{Provider, ProviderType};

/// Public or private twin of a catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// Visible to callers and parent catalogs
    Public,
    /// Visible to the catalog's own providers and the private handle
    Private,
}

/// Setup step run against a catalog by [`Catalog::include`]
pub type SetupFn = Arc<dyn Fn(&Catalog) -> Result<()> + Send + Sync>;

/// Structural change applied by [`Catalog::include`]
#[derive(Clone)]
pub enum Include {
    /// Add a provider of this type to the twin of the handle
    Provider(ProviderType),
    /// Attach a child catalog
    Child(Catalog),
    /// Run a setup function against the handle
    Setup(SetupFn),
}

impl Include {
    /// Wrap a closure as a setup step
    pub fn setup<F>(f: F) -> Self
    where
        F: Fn(&Catalog) -> Result<()> + Send + Sync + 'static,
    {
        Self::Setup(Arc::new(f))
    }
}

impl From<ProviderType> for Include {
    fn from(provider_type: ProviderType) -> Self {
        Self::Provider(provider_type)
    }
}

impl From<Catalog> for Include {
    fn from(catalog: Catalog) -> Self {
        Self::Child(catalog)
    }
}

impl From<&Catalog> for Include {
    fn from(catalog: &Catalog) -> Self {
        Self::Child(catalog.clone())
    }
}

impl fmt::Debug for Include {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Provider(provider_type) => f.debug_tuple("Provider").field(provider_type).finish(),
            Self::Child(catalog) => f.debug_tuple("Child").field(&catalog.name()).finish(),
            Self::Setup(_) => f.write_str("Setup"),
        }
    }
}

/// Proof that the registration lock is held and the catalog is not frozen
///
/// Provider methods that mutate registrations take this token, so they can
/// only run inside [`Catalog::with_provider`].
pub struct Registration<'a> {
    catalog: String,
    layer: &'a Layer,
    visibility: Visibility,
    _guard: ReentrantMutexGuard<'a, ()>,
}

impl Registration<'_> {
    /// Identity of the catalog layer being registered into
    pub fn catalog(&self) -> &str {
        &self.catalog
    }

    /// Fail with [`Error::DuplicateDependency`] when `key` is already
    /// provided in this twin, by any provider or as a scope variable
    pub fn raise_if_claimed(&self, key: &Key) -> Result<()> {
        self.layer.raise_if_claimed(self.visibility, key)
    }
}

impl fmt::Debug for Registration<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("catalog", &self.catalog)
            .finish()
    }
}

pub(crate) struct CatalogInner {
    id: CatalogId,
    name: Arc<str>,
    onion: Onion,
    parent: Mutex<Option<Weak<CatalogInner>>>,
}

impl CatalogInner {
    fn parent(&self) -> Option<Arc<CatalogInner>> {
        self.parent.lock().as_ref().and_then(Weak::upgrade)
    }
}

/// Handle onto one twin of a catalog
#[derive(Clone)]
pub struct Catalog {
    inner: Arc<CatalogInner>,
    visibility: Visibility,
}

impl Catalog {
    /// Create an empty, unfrozen catalog
    pub fn new(name: impl AsRef<str>) -> Self {
        let id = CatalogId::next();
        let name: Arc<str> = Arc::from(name.as_ref());
        debug!(catalog = %name, id = %id, "Created catalog");
        Self {
            inner: Arc::new(CatalogInner {
                id,
                onion: Onion::new(Layer::root(id, &name)),
                name,
                parent: Mutex::new(None),
            }),
            visibility: Visibility::Public,
        }
    }

    /// Stable identifier shared by every layer and both twins
    pub fn id(&self) -> CatalogId {
        self.inner.id
    }

    /// Catalog name
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Identity of the current layer (name plus entered sandboxes)
    pub fn identity(&self) -> CatalogIdentity {
        self.current_layer().identity().clone()
    }

    /// Twin this handle operates on
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Whether this is the private handle
    pub fn is_private(&self) -> bool {
        self.visibility == Visibility::Private
    }

    /// Handle of the private twin of this catalog
    pub fn private(&self) -> Catalog {
        Self {
            inner: Arc::clone(&self.inner),
            visibility: Visibility::Private,
        }
    }

    /// Handle of the public twin of this catalog
    pub fn public(&self) -> Catalog {
        Self {
            inner: Arc::clone(&self.inner),
            visibility: Visibility::Public,
        }
    }

    /// Whether both handles point at the same catalog (either twin)
    pub fn same_catalog(&self, other: &Catalog) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Number of sandbox layers currently entered
    pub fn sandbox_depth(&self) -> usize {
        self.inner.onion.depth()
    }

    pub(crate) fn current_layer(&self) -> Arc<Layer> {
        self.inner.onion.current()
    }

    pub(crate) fn push_layer(&self, layer: Arc<Layer>) {
        self.inner.onion.push(layer);
    }

    pub(crate) fn peel_layer(&self, layer: &Arc<Layer>) -> bool {
        self.inner.onion.peel(layer)
    }

    pub(crate) fn detach_parent(&self) {
        *self.inner.parent.lock() = None;
    }

    fn access(&self) -> Access {
        match self.visibility {
            Visibility::Public => Access::Public,
            Visibility::Private => Access::Full,
        }
    }

    // ========================================================================
    // Resolution
    // ========================================================================

    /// Resolve `key`, failing with [`Error::DependencyNotFound`] on a miss
    pub fn get(&self, key: impl Into<Key>) -> Result<Instance> {
        let key = key.into();
        self.get_opt(&key)?.ok_or_else(|| Error::not_found(key))
    }

    /// Resolve `key`, falling back to `default` on a miss
    pub fn get_or(&self, key: impl Into<Key>, default: Instance) -> Result<Instance> {
        Ok(self.get_opt(key)?.unwrap_or(default))
    }

    /// Resolve `key`, returning `None` on a miss
    pub fn get_opt(&self, key: impl Into<Key>) -> Result<Option<Instance>> {
        let key = key.into();
        trace!(catalog = %self.name(), key = %key, "Resolving dependency");
        let layer = self.current_layer();
        let context = InstantiationContext::new();
        layer.provide(&key, self.access(), &context)
    }

    /// Resolve `key` and downcast it to `T`
    pub fn get_as<T: std::any::Any + Send + Sync>(&self, key: impl Into<Key>) -> Result<Arc<T>> {
        let key = key.into();
        let value = self.get(&key)?;
        tessera_domain::downcast(&key, value)
    }

    /// Whether `key` would resolve through this handle
    pub fn can_provide(&self, key: impl Into<Key>) -> bool {
        self.current_layer().can_provide(&key.into(), self.access())
    }

    /// Render the dependency tree of `key`
    pub fn debug(&self, key: impl Into<Key>) -> Result<String> {
        render_tree(&self.current_layer(), &key.into(), self.access())
    }

    // ========================================================================
    // Structure
    // ========================================================================

    /// Apply a structural change
    pub fn include(&self, item: impl Into<Include>) -> Result<()> {
        match item.into() {
            Include::Provider(provider_type) => {
                let layer = self.current_layer();
                let _guard = layer.lock().lock();
                layer.include_provider(self.visibility, provider_type)
            }
            Include::Child(child) => self.add_child(&child),
            Include::Setup(setup) => {
                self.current_layer().raise_if_frozen()?;
                setup(self)
            }
        }
    }

    /// Apply several structural changes in order
    pub fn include_all<I>(&self, items: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<Include>,
    {
        items.into_iter().try_for_each(|item| self.include(item))
    }

    /// Attach `child`; its public twin becomes visible to this catalog
    pub fn add_child(&self, child: &Catalog) -> Result<()> {
        let layer = self.current_layer();
        let _guard = layer.lock().lock();
        layer.raise_if_frozen()?;

        if child.is_private() {
            return Err(Error::attachment(format!(
                "private catalog {} cannot be attached as a child",
                child.name()
            )));
        }
        if self.same_catalog(child) {
            return Err(Error::attachment(format!(
                "catalog {} cannot be attached to itself",
                self.name()
            )));
        }
        let mut ancestor = self.inner.parent();
        while let Some(current) = ancestor {
            if Arc::ptr_eq(&current, &child.inner) {
                return Err(Error::attachment(format!(
                    "attaching {} to {} would create a cycle",
                    child.name(),
                    self.name()
                )));
            }
            ancestor = current.parent();
        }
        if layer.has_child(child) {
            return Err(Error::attachment(format!(
                "catalog {} is already attached to {}",
                child.name(),
                self.name()
            )));
        }

        let adopted = {
            let mut parent = child.inner.parent.lock();
            match parent.as_ref().and_then(Weak::upgrade) {
                Some(existing) if !Arc::ptr_eq(&existing, &self.inner) => {
                    return Err(Error::attachment(format!(
                        "catalog {} already has parent {}",
                        child.name(),
                        existing.name
                    )));
                }
                Some(_) => false,
                None => {
                    *parent = Some(Arc::downgrade(&self.inner));
                    true
                }
            }
        };

        if let Some(sandbox) = layer.sandbox() {
            sandbox.capture_frozen(child);
            if adopted {
                sandbox.adopt(child);
            }
            // The child's lock is taken under ours, parent first
            sandbox.fork_catalog(child);
        }
        layer.push_child(child.public());
        debug!(catalog = %layer.identity(), child = %child.name(), "Attached child catalog");
        Ok(())
    }

    /// Freeze this catalog (both twins) and its children
    pub fn freeze(&self) {
        let layer = self.current_layer();
        {
            let _guard = layer.lock().lock();
            layer.set_frozen(true);
        }
        for child in layer.children().iter() {
            child.freeze();
        }
        info!(catalog = %layer.identity(), "Catalog frozen");
    }

    /// Whether the current layer is frozen
    pub fn is_frozen(&self) -> bool {
        self.current_layer().is_frozen()
    }

    // ========================================================================
    // Providers
    // ========================================================================

    /// Provider of type `P` in this handle's twin
    pub fn provider<P: Provider>(&self) -> Result<Arc<P>> {
        let layer = self.current_layer();
        layer
            .find_provider::<P>(self.visibility)
            .ok_or_else(|| Error::missing_provider(std::any::type_name::<P>(), layer.identity().to_string()))
    }

    /// Run a registration against the provider of type `P`
    ///
    /// The registration lock is held for the duration of `f` and the catalog
    /// is checked for frozenness first.
    pub fn with_provider<P, R>(&self, f: impl FnOnce(&P, &Registration<'_>) -> Result<R>) -> Result<R>
    where
        P: Provider,
    {
        let layer = self.current_layer();
        let guard = layer.lock().lock();
        layer.raise_if_frozen()?;
        let provider = layer.find_provider::<P>(self.visibility).ok_or_else(|| {
            Error::missing_provider(std::any::type_name::<P>(), layer.identity().to_string())
        })?;
        let registration = Registration {
            catalog: layer.identity().to_string(),
            layer: &layer,
            visibility: self.visibility,
            _guard: guard,
        };
        f(&provider, &registration)
    }

    // ========================================================================
    // Scope variables
    // ========================================================================

    /// Register a scope variable in this handle's twin
    ///
    /// Without a default the variable is undefined until first updated.
    pub fn register_scope_var(&self, key: impl Into<Key>, default: Option<Instance>) -> Result<()> {
        let layer = self.current_layer();
        let _guard = layer.lock().lock();
        layer.register_scope_var(self.visibility, key.into(), default)
    }

    /// Replace a scope variable's value, returning the previous one
    pub fn update_scope_var(&self, key: impl Into<Key>, value: Instance) -> Result<Option<Instance>> {
        let layer = self.current_layer();
        let _guard = layer.lock().lock();
        layer.update_scope_var(self.visibility, &key.into(), value)
    }

    // ========================================================================
    // Sandboxes
    // ========================================================================

    /// Entry point for test sandboxes
    pub fn test(&self) -> TestBuilder<'_> {
        TestBuilder::new_for(self)
    }
}

impl fmt::Display for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identity())?;
        if self.is_private() {
            f.write_str(PRIVATE_CATALOG_SUFFIX)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Catalog")
            .field("id", &self.inner.id)
            .field("identity", &self.identity().to_string())
            .field("visibility", &self.visibility)
            .finish()
    }
}
