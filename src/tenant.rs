//! Per-tenant dispatch of rendering engines.
//!
//! Every render names the tenant it is done for. The tenant is an explicit
//! argument, never ambient state, so renders for different tenants can run
//! side by side on a shared [`DocumentService`].

use std::{any::type_name, collections::BTreeMap, fmt};

use thiserror::Error;
use tracing::{debug, instrument};

use crate::{
    domain::{Catalog, Requirement, Tailoring},
    render::{Document, DocumentKind, Placeholders, RenderEngine},
    Error,
};

/// The key of a tenant, e.g. `plattform`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tenant(String);

impl Tenant {
    /// Creates a tenant key.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The tenant key as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Tenant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A tenant has no implementation of a component registered.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("tenant {tenant} has no registered implementation of {component}")]
pub struct ConfigurationError {
    /// The tenant that was requested.
    pub tenant: Tenant,
    /// The component that was requested.
    pub component: &'static str,
}

/// Implementations of one component, keyed by tenant.
///
/// There is no fallback: resolving a tenant that was never registered is an
/// error.
pub struct Tenants<E> {
    component: &'static str,
    implementations: BTreeMap<Tenant, E>,
}

impl<E> Default for Tenants<E> {
    fn default() -> Self {
        Self::named(type_name::<E>())
    }
}

impl<E> fmt::Debug for Tenants<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tenants")
            .field("component", &self.component)
            .field("tenants", &self.implementations.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<E> Tenants<E> {
    /// Creates an empty registry for the named component.
    #[must_use]
    pub const fn named(component: &'static str) -> Self {
        Self {
            component,
            implementations: BTreeMap::new(),
        }
    }

    /// Registers the implementation for a tenant, returning the one it
    /// replaces.
    pub fn register(&mut self, tenant: Tenant, implementation: E) -> Option<E> {
        self.implementations.insert(tenant, implementation)
    }

    /// The implementation registered for `tenant`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if no implementation is registered.
    pub fn resolve(&self, tenant: &Tenant) -> Result<&E, ConfigurationError> {
        self.implementations
            .get(tenant)
            .ok_or_else(|| ConfigurationError {
                tenant: tenant.clone(),
                component: self.component,
            })
    }

    /// The registered tenants, in order.
    pub fn tenants(&self) -> impl Iterator<Item = &Tenant> {
        self.implementations.keys()
    }

    /// The number of registered tenants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.implementations.len()
    }

    /// Whether no tenant is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.implementations.is_empty()
    }
}

/// Renders documents with the engine registered for the requesting tenant.
#[derive(Debug)]
pub struct DocumentService {
    engines: Tenants<RenderEngine>,
}

impl DocumentService {
    /// Creates a service dispatching to the given engines.
    #[must_use]
    pub const fn new(engines: Tenants<RenderEngine>) -> Self {
        Self { engines }
    }

    /// The tenants documents can be rendered for.
    pub fn tenants(&self) -> impl Iterator<Item = &Tenant> {
        self.engines.tenants()
    }

    /// The engine of a tenant.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if the tenant has no engine.
    pub fn engine(&self, tenant: &Tenant) -> Result<&RenderEngine, ConfigurationError> {
        self.engines.resolve(tenant)
    }

    /// Renders a document of the given kind for a tenant.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the tenant has no engine and
    /// [`Error::Rendering`] if rendering fails.
    #[instrument(skip(self, tenant, tailoring, placeholders), fields(%tenant))]
    pub fn create(
        &self,
        tenant: &Tenant,
        kind: DocumentKind,
        document_id: &str,
        tailoring: &Tailoring,
        placeholders: &Placeholders,
    ) -> Result<Document, Error> {
        let engine = self.engine(tenant)?;
        debug!("dispatching to tenant engine");
        Ok(engine.create(kind, document_id, tailoring, placeholders)?)
    }

    /// Renders the untailored catalog for a tenant.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the tenant has no engine and
    /// [`Error::Rendering`] if rendering fails.
    #[instrument(skip(self, tenant, catalog, placeholders), fields(%tenant))]
    pub fn create_base_catalog(
        &self,
        tenant: &Tenant,
        document_id: &str,
        catalog: &Catalog<Requirement>,
        placeholders: &Placeholders,
    ) -> Result<Document, Error> {
        let engine = self.engine(tenant)?;
        Ok(engine.create_base_catalog(document_id, catalog, placeholders)?)
    }
}
