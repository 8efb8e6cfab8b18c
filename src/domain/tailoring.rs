//! The per-project tailoring overlay.
//!
//! A [`Tailoring`] owns a copy of the catalog tree in which every requirement
//! carries its tailoring state: whether it is selected, its (possibly edited)
//! text and whether it differs from the catalog baseline. The source catalog
//! itself is never modified.

use std::collections::BTreeSet;

use borsh::BorshSerialize;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::instrument;

use crate::domain::{
    Catalog, CatalogRequirement, ChapterNumber, Phase, Reference, Requirement,
};

/// The tailoring-relevant content of a requirement.
///
/// This contributes to the 'fingerprint' used to detect changes relative to the
/// catalog baseline.
#[derive(Debug, BorshSerialize, Clone, Copy)]
struct Content<'a> {
    text: &'a str,
    selected: bool,
}

impl Content<'_> {
    /// Calculate the fingerprint of this content.
    ///
    /// The fingerprint is a SHA256 hash of the Borsh-serialized text and
    /// selection state.
    ///
    /// # Panics
    ///
    /// Panics if borsh serialization fails (which should never happen for this
    /// data structure).
    fn fingerprint(&self) -> String {
        // encode using [borsh](https://borsh.io/)
        let encoded = borsh::to_vec(self).expect("this should never fail");

        let hash = Sha256::digest(encoded);

        format!("{hash:x}")
    }
}

/// A catalog requirement together with its tailoring state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailoringRequirement {
    position: String,
    text: String,
    reference: Option<Reference>,
    drds: Option<BTreeSet<String>>,
    selected: bool,
    changed: bool,
    /// Fingerprint of the text and selection the requirement was created with.
    baseline: String,
    catalog_text: String,
    catalog_reference_changed: bool,
}

impl TailoringRequirement {
    /// Creates the tailoring state of a catalog requirement.
    ///
    /// The given selection together with the catalog text forms the baseline
    /// against which later edits are compared.
    #[must_use]
    pub fn from_catalog(requirement: &Requirement, selected: bool) -> Self {
        let baseline = Content {
            text: requirement.text(),
            selected,
        }
        .fingerprint();

        let reference = requirement.reference().cloned();
        Self {
            position: requirement.position().to_string(),
            text: requirement.text().to_string(),
            catalog_reference_changed: reference.as_ref().is_some_and(|r| r.changed),
            reference,
            drds: requirement.drds().cloned(),
            selected,
            changed: false,
            baseline,
            catalog_text: requirement.text().to_string(),
        }
    }

    /// Whether the requirement applies to the project.
    #[must_use]
    pub const fn selected(&self) -> bool {
        self.selected
    }

    /// Whether the text or selection differs from the catalog baseline.
    #[must_use]
    pub const fn changed(&self) -> bool {
        self.changed
    }

    /// Sets whether the requirement applies.
    ///
    /// Returns the resulting changed flag.
    pub fn set_selected(&mut self, selected: bool) -> bool {
        self.selected = selected;
        self.refresh_changed()
    }

    /// Replaces the requirement text.
    ///
    /// A text that differs from the catalog text marks the reference as
    /// modified; restoring the catalog text clears the mark again.
    ///
    /// Returns the resulting changed flag.
    pub fn set_text(&mut self, text: String) -> bool {
        self.text = text;
        let edited = self.text != self.catalog_text;
        if let Some(reference) = &mut self.reference {
            reference.changed = self.catalog_reference_changed || edited;
        }
        self.refresh_changed()
    }

    fn fingerprint(&self) -> String {
        Content {
            text: &self.text,
            selected: self.selected,
        }
        .fingerprint()
    }

    fn refresh_changed(&mut self) -> bool {
        self.changed = self.fingerprint() != self.baseline;
        self.changed
    }
}

impl CatalogRequirement for TailoringRequirement {
    fn position(&self) -> &str {
        &self.position
    }

    fn text(&self) -> &str {
        &self.text
    }

    fn reference(&self) -> Option<&Reference> {
        self.reference.as_ref()
    }

    fn drds(&self) -> Option<&BTreeSet<String>> {
        self.drds.as_ref()
    }

    fn is_applicable(&self) -> bool {
        self.selected
    }
}

/// Approval state of a document signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignatureState {
    /// The signee prepared the document.
    Prepared,
    /// The signee agreed to the document.
    Agreed,
    /// The signee released the document.
    Released,
}

/// A signature line printed on generated documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSignature {
    /// Organisational unit of the signee.
    pub faculty: String,
    /// Name of the signee.
    pub signee: String,
    /// Approval state.
    pub state: SignatureState,
    /// Whether the signature is printed at all.
    #[serde(default = "applicable_default")]
    pub applicable: bool,
    /// Sort key; signatures are printed in ascending position order.
    pub position: u32,
}

const fn applicable_default() -> bool {
    true
}

/// Errors raised when addressing a requirement of a tailoring.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TailoringError {
    /// The tailored catalog has no chapter with this number.
    #[error("chapter {0} does not exist in the tailored catalog")]
    UnknownChapter(ChapterNumber),
    /// The chapter has no requirement at this position.
    #[error("chapter {chapter} has no requirement at position '{position}'")]
    UnknownRequirement {
        /// The chapter that was searched.
        chapter: ChapterNumber,
        /// The requested position.
        position: String,
    },
}

/// A project-specific tailoring of a catalog.
#[derive(Debug, Clone)]
pub struct Tailoring {
    name: String,
    catalog: Catalog<TailoringRequirement>,
    phases: BTreeSet<Phase>,
    signatures: Vec<DocumentSignature>,
}

impl Tailoring {
    /// Creates a tailoring in which every requirement is selected.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        catalog: &Catalog<Requirement>,
        phases: impl IntoIterator<Item = Phase>,
    ) -> Self {
        Self::with_selection(name, catalog, phases, |_, _| true)
    }

    /// Creates a tailoring whose initial selection is decided by `select`.
    ///
    /// The initial selection is the baseline: a requirement only counts as
    /// changed once it deviates from it.
    #[must_use]
    pub fn with_selection(
        name: impl Into<String>,
        catalog: &Catalog<Requirement>,
        phases: impl IntoIterator<Item = Phase>,
        mut select: impl FnMut(&ChapterNumber, &Requirement) -> bool,
    ) -> Self {
        let catalog = catalog.map(|chapter, requirement| {
            TailoringRequirement::from_catalog(requirement, select(chapter, requirement))
        });

        Self {
            name: name.into(),
            catalog,
            phases: phases.into_iter().collect(),
            signatures: Vec::new(),
        }
    }

    /// The project / tailoring name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The tailored catalog.
    #[must_use]
    pub const fn catalog(&self) -> &Catalog<TailoringRequirement> {
        &self.catalog
    }

    /// The lifecycle phases in scope, in lifecycle order.
    #[must_use]
    pub const fn phases(&self) -> &BTreeSet<Phase> {
        &self.phases
    }

    /// The document signatures, in insertion order.
    #[must_use]
    pub fn signatures(&self) -> &[DocumentSignature] {
        &self.signatures
    }

    /// Adds a document signature.
    pub fn add_signature(&mut self, signature: DocumentSignature) {
        self.signatures.push(signature);
    }

    /// Looks up a requirement by chapter number and position.
    ///
    /// # Errors
    ///
    /// Returns [`TailoringError`] if the chapter or the position does not exist.
    pub fn requirement(
        &self,
        chapter: &ChapterNumber,
        position: &str,
    ) -> Result<&TailoringRequirement, TailoringError> {
        self.catalog
            .find(chapter)
            .ok_or_else(|| TailoringError::UnknownChapter(chapter.clone()))?
            .requirements()
            .iter()
            .find(|requirement| requirement.position() == position)
            .ok_or_else(|| TailoringError::UnknownRequirement {
                chapter: chapter.clone(),
                position: position.to_string(),
            })
    }

    fn requirement_mut(
        &mut self,
        chapter: &ChapterNumber,
        position: &str,
    ) -> Result<&mut TailoringRequirement, TailoringError> {
        self.catalog
            .find_mut(chapter)
            .ok_or_else(|| TailoringError::UnknownChapter(chapter.clone()))?
            .requirements_mut()
            .iter_mut()
            .find(|requirement| requirement.position() == position)
            .ok_or_else(|| TailoringError::UnknownRequirement {
                chapter: chapter.clone(),
                position: position.to_string(),
            })
    }

    /// Selects or deselects a requirement.
    ///
    /// Returns the requirement's resulting changed flag.
    ///
    /// # Errors
    ///
    /// Returns [`TailoringError`] if the requirement does not exist.
    #[instrument(level = "debug", skip(self), fields(tailoring = %self.name))]
    pub fn select(
        &mut self,
        chapter: &ChapterNumber,
        position: &str,
        selected: bool,
    ) -> Result<bool, TailoringError> {
        Ok(self.requirement_mut(chapter, position)?.set_selected(selected))
    }

    /// Replaces the text of a requirement.
    ///
    /// Returns the requirement's resulting changed flag.
    ///
    /// # Errors
    ///
    /// Returns [`TailoringError`] if the requirement does not exist.
    #[instrument(level = "debug", skip(self, text), fields(tailoring = %self.name))]
    pub fn edit_text(
        &mut self,
        chapter: &ChapterNumber,
        position: &str,
        text: String,
    ) -> Result<bool, TailoringError> {
        Ok(self.requirement_mut(chapter, position)?.set_text(text))
    }

    /// Iterates over the requirements that differ from the catalog baseline,
    /// together with their chapter number, in catalog order.
    pub fn changed_requirements(
        &self,
    ) -> impl Iterator<Item = (&ChapterNumber, &TailoringRequirement)> {
        self.catalog.walk().flat_map(|chapter| {
            chapter
                .requirements()
                .iter()
                .filter(|requirement| requirement.changed())
                .map(move |requirement| (chapter.number(), requirement))
        })
    }
}
