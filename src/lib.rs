//! Requirement catalog tailoring and document rendering
//!
//! A catalog is a tree of numbered chapters holding requirements. A project
//! tailors the catalog by selecting and rewording requirements, and renders
//! documents from the tailoring: the tailored catalog, the list of deliverable
//! documents (DRDs) and a comparison against the catalog.

pub mod domain;
pub use domain::{
    Catalog, CatalogRequirement, Chapter, ChapterNumber, Config, Drd, Phase, Requirement,
    Tailoring, TailoringRequirement, ValidationError,
};

pub mod aggregate;
pub use aggregate::aggregate;

pub mod linearize;
pub use linearize::{linearize, CatalogElement};

pub mod render;
pub use render::{Document, DocumentKind, Placeholders, RenderEngine, RenderingError};

pub mod tenant;
pub use tenant::{ConfigurationError, DocumentService, Tenant, Tenants};

/// Loading catalogs and tailorings from YAML files.
pub mod storage;

mod error;
pub use error::Error;
