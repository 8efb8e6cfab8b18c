//! Domain models for catalog tailoring.
//!
//! This module contains the core domain types: the catalog tree, chapter
//! numbers, lifecycle phases, DRDs, the tailoring overlay and configuration.

pub mod catalog;
pub use catalog::{Catalog, CatalogRequirement, Chapter, Logo, Reference, Requirement, ValidationError};

mod config;
pub use config::{Config, TenantConfig};

mod drd;
pub use drd::Drd;

/// Chapter number types and parsing.
pub mod number;
pub use number::{ChapterNumber, InvalidNumberError};

mod phase;
pub use phase::{Phase, UnknownPhaseError};

pub mod tailoring;
pub use tailoring::{
    DocumentSignature, SignatureState, Tailoring, TailoringError, TailoringRequirement,
};
