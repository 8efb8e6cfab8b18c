//! The catalog tree: chapters, requirements and the DRDs they reference.
//!
//! A [`Catalog`] is built once (usually by an import) and only read afterwards.
//! Tailoring never edits a catalog in place; it maps the tree onto its own
//! requirement type (see [`crate::domain::tailoring`]).

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;
use tracing::instrument;

use crate::domain::{ChapterNumber, Drd};

/// The logo shown in front of a requirement's reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Logo {
    /// Display name, used as the image's alternative text.
    pub name: String,
    /// Location of the image.
    pub url: String,
}

/// The source-standard citation of a requirement.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reference {
    /// Citation text, e.g. `ECSS-Q-ST-80C 5.2.1a`.
    pub text: String,
    /// Whether the requirement was modified relative to the cited standard.
    pub changed: bool,
    /// Optional logo of the cited standard.
    pub logo: Option<Logo>,
}

impl Reference {
    /// Creates an unmodified reference without a logo.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

/// The view of a requirement that traversals (linearization, DRD aggregation)
/// work with.
///
/// Implemented by the catalog's own [`Requirement`] and by
/// [`TailoringRequirement`](crate::domain::TailoringRequirement).
pub trait CatalogRequirement {
    /// Display label of the requirement within its chapter.
    fn position(&self) -> &str;

    /// Requirement body. May contain `${name}` placeholders.
    fn text(&self) -> &str;

    /// The cited standard, if any.
    fn reference(&self) -> Option<&Reference>;

    /// Numbers of the DRDs the requirement refers to.
    ///
    /// `None` and an empty set are equivalent.
    fn drds(&self) -> Option<&BTreeSet<String>>;

    /// Whether the requirement applies (is rendered as applicable).
    fn is_applicable(&self) -> bool;

    /// Whether the requirement refers to at least one DRD.
    fn has_drd(&self) -> bool {
        self.drds().is_some_and(|drds| !drds.is_empty())
    }
}

/// A requirement as defined by the master catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    position: String,
    text: String,
    reference: Option<Reference>,
    drds: Option<BTreeSet<String>>,
}

impl Requirement {
    /// Creates a requirement without reference and without DRDs.
    #[must_use]
    pub fn new(position: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            position: position.into(),
            text: text.into(),
            reference: None,
            drds: None,
        }
    }

    /// Sets the reference.
    #[must_use]
    pub fn with_reference(mut self, reference: Reference) -> Self {
        self.reference = Some(reference);
        self
    }

    /// Sets the referenced DRD numbers.
    ///
    /// An empty iterator yields an empty (but present) set.
    #[must_use]
    pub fn with_drds<S: Into<String>>(mut self, drds: impl IntoIterator<Item = S>) -> Self {
        self.drds = Some(drds.into_iter().map(Into::into).collect());
        self
    }
}

impl CatalogRequirement for Requirement {
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

    /// Untailored catalog requirements always apply.
    fn is_applicable(&self) -> bool {
        true
    }
}

/// A node of the catalog tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter<R = Requirement> {
    number: ChapterNumber,
    name: String,
    requirements: Vec<R>,
    chapters: Vec<Self>,
}

impl<R> Chapter<R> {
    /// Creates a chapter without requirements or sub-chapters.
    #[must_use]
    pub fn new(number: ChapterNumber, name: impl Into<String>) -> Self {
        Self {
            number,
            name: name.into(),
            requirements: Vec::new(),
            chapters: Vec::new(),
        }
    }

    /// Sets the requirements of this chapter, in display order.
    #[must_use]
    pub fn with_requirements(mut self, requirements: Vec<R>) -> Self {
        self.requirements = requirements;
        self
    }

    /// Sets the sub-chapters of this chapter, in display order.
    #[must_use]
    pub fn with_chapters(mut self, chapters: Vec<Self>) -> Self {
        self.chapters = chapters;
        self
    }

    /// The chapter's number.
    #[must_use]
    pub const fn number(&self) -> &ChapterNumber {
        &self.number
    }

    /// The chapter's title.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The chapter's own requirements, in order.
    #[must_use]
    pub fn requirements(&self) -> &[R] {
        &self.requirements
    }

    /// The direct sub-chapters, in order.
    #[must_use]
    pub fn chapters(&self) -> &[Self] {
        &self.chapters
    }

    /// Iterates over this chapter and all of its descendants in pre-order.
    pub fn walk(&self) -> impl Iterator<Item = &Self> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let chapter = stack.pop()?;
            stack.extend(chapter.chapters.iter().rev());
            Some(chapter)
        })
    }

    /// Finds this chapter or the descendant with the given number.
    ///
    /// Sub-trees whose number is not a prefix of `number` are skipped.
    #[must_use]
    pub fn find(&self, number: &ChapterNumber) -> Option<&Self> {
        if self.number == *number {
            return Some(self);
        }
        if !self.number.is_ancestor_of(number) {
            return None;
        }
        self.chapters.iter().find_map(|chapter| chapter.find(number))
    }

    pub(crate) fn find_mut(&mut self, number: &ChapterNumber) -> Option<&mut Self> {
        if self.number == *number {
            return Some(self);
        }
        if !self.number.is_ancestor_of(number) {
            return None;
        }
        self.chapters
            .iter_mut()
            .find_map(|chapter| chapter.find_mut(number))
    }

    pub(crate) fn requirements_mut(&mut self) -> &mut [R] {
        &mut self.requirements
    }

    /// Builds a structurally identical tree with every requirement converted by
    /// `f`.
    pub fn map<T, F>(&self, f: &mut F) -> Chapter<T>
    where
        F: FnMut(&ChapterNumber, &R) -> T,
    {
        Chapter {
            number: self.number.clone(),
            name: self.name.clone(),
            requirements: self
                .requirements
                .iter()
                .map(|requirement| f(&self.number, requirement))
                .collect(),
            chapters: self
                .chapters
                .iter()
                .map(|chapter| chapter.map(&mut *f))
                .collect(),
        }
    }
}

/// Errors raised when a catalog definition is malformed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A chapter's number is missing or malformed.
    #[error("chapter '{name}' has an invalid number '{number}'")]
    InvalidNumber {
        /// Name of the offending chapter.
        name: String,
        /// The rejected number.
        number: String,
    },
    /// Two chapters share the same number.
    #[error("chapter number {number} is used more than once (by '{name}')")]
    DuplicateNumber {
        /// The duplicated number.
        number: ChapterNumber,
        /// Name of the second chapter using the number.
        name: String,
    },
    /// A sub-chapter's number does not extend its parent's number.
    #[error("chapter {number} is nested in chapter {parent}, but its number does not extend it")]
    NotNested {
        /// The parent chapter's number.
        parent: ChapterNumber,
        /// The offending sub-chapter's number.
        number: ChapterNumber,
    },
    /// Two DRD definitions share the same number.
    #[error("DRD {0} is defined more than once")]
    DuplicateDrd(String),
}

/// A versioned catalog: the chapter tree and the DRD definitions it refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog<R = Requirement> {
    version: String,
    chapters: Vec<Chapter<R>>,
    drds: BTreeMap<String, Drd>,
}

impl<R: CatalogRequirement> Catalog<R> {
    /// Creates a catalog, validating the tree.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if a chapter number is used twice, if a
    /// sub-chapter's number does not extend its parent's, or if a DRD is
    /// defined twice. References to undefined DRDs are kept; they deliver
    /// nothing.
    #[instrument(level = "debug", skip(chapters, drds))]
    pub fn new(
        version: String,
        chapters: Vec<Chapter<R>>,
        drds: impl IntoIterator<Item = Drd>,
    ) -> Result<Self, ValidationError> {
        let mut definitions = BTreeMap::new();
        for drd in drds {
            if definitions.contains_key(&drd.number) {
                return Err(ValidationError::DuplicateDrd(drd.number));
            }
            definitions.insert(drd.number.clone(), drd);
        }

        let mut seen = BTreeSet::new();
        for root in &chapters {
            for chapter in root.walk() {
                if !seen.insert(chapter.number()) {
                    return Err(ValidationError::DuplicateNumber {
                        number: chapter.number().clone(),
                        name: chapter.name().to_string(),
                    });
                }

                if let Some(child) = chapter
                    .chapters()
                    .iter()
                    .find(|child| !chapter.number().is_ancestor_of(child.number()))
                {
                    return Err(ValidationError::NotNested {
                        parent: chapter.number().clone(),
                        number: child.number().clone(),
                    });
                }
            }
        }

        tracing::debug!(chapters = seen.len(), drds = definitions.len(), "catalog validated");

        Ok(Self {
            version,
            chapters,
            drds: definitions,
        })
    }
}

impl<R> Catalog<R> {
    /// The catalog version, e.g. `8.2.1`.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The top-level chapters, in order.
    #[must_use]
    pub fn chapters(&self) -> &[Chapter<R>] {
        &self.chapters
    }

    /// All DRD definitions, ordered by number.
    pub fn drds(&self) -> impl Iterator<Item = &Drd> {
        self.drds.values()
    }

    /// Looks up a DRD definition by number.
    #[must_use]
    pub fn drd(&self, number: &str) -> Option<&Drd> {
        self.drds.get(number)
    }

    /// Iterates over every chapter of the catalog in pre-order.
    pub fn walk(&self) -> impl Iterator<Item = &Chapter<R>> {
        self.chapters.iter().flat_map(Chapter::walk)
    }

    /// Finds a chapter anywhere in the tree.
    #[must_use]
    pub fn find(&self, number: &ChapterNumber) -> Option<&Chapter<R>> {
        self.chapters.iter().find_map(|chapter| chapter.find(number))
    }

    pub(crate) fn find_mut(&mut self, number: &ChapterNumber) -> Option<&mut Chapter<R>> {
        self.chapters
            .iter_mut()
            .find_map(|chapter| chapter.find_mut(number))
    }

    /// Builds a lookup table from chapter number to chapter in a single pass.
    #[must_use]
    pub fn index(&self) -> BTreeMap<&ChapterNumber, &Chapter<R>> {
        self.walk().map(|chapter| (chapter.number(), chapter)).collect()
    }

    /// The total number of requirements in the tree.
    #[must_use]
    pub fn requirement_count(&self) -> usize {
        self.walk().map(|chapter| chapter.requirements().len()).sum()
    }

    /// Builds a structurally identical catalog with every requirement converted
    /// by `f`.
    ///
    /// The result shares the version and DRD definitions and needs no
    /// revalidation.
    pub fn map<T>(&self, mut f: impl FnMut(&ChapterNumber, &R) -> T) -> Catalog<T> {
        Catalog {
            version: self.version.clone(),
            chapters: self
                .chapters
                .iter()
                .map(|chapter| chapter.map(&mut f))
                .collect(),
            drds: self.drds.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Phase;

    fn number(s: &str) -> ChapterNumber {
        s.parse().unwrap()
    }

    fn chapter(n: &str) -> Chapter {
        Chapter::new(number(n), format!("Chapter {n}"))
    }

    fn sample() -> Catalog {
        Catalog::new(
            "8.2.1".to_string(),
            vec![
                chapter("1")
                    .with_requirements(vec![Requirement::new("a", "first")])
                    .with_chapters(vec![
                        chapter("1.1").with_chapters(vec![chapter("1.1.1")]),
                        chapter("1.2"),
                    ]),
                chapter("2").with_requirements(vec![
                    Requirement::new("a", "second").with_drds(["DRD-1"]),
                ]),
            ],
            [Drd::new("DRD-1", "Plan").with_phases([Phase::A])],
        )
        .unwrap()
    }

    #[test]
    fn walk_is_pre_order_in_declared_order() {
        let catalog = sample();
        let numbers: Vec<_> = catalog.walk().map(|c| c.number().as_str()).collect();
        assert_eq!(numbers, ["1", "1.1", "1.1.1", "1.2", "2"]);
    }

    #[test]
    fn find_locates_nested_chapters() {
        let catalog = sample();
        assert_eq!(
            catalog.find(&number("1.1.1")).map(Chapter::name),
            Some("Chapter 1.1.1")
        );
        assert!(catalog.find(&number("3")).is_none());
        assert!(catalog.find(&number("1.3")).is_none());
    }

    #[test]
    fn index_contains_every_chapter() {
        let catalog = sample();
        let index = catalog.index();
        assert_eq!(index.len(), 5);
        assert_eq!(index[&number("1.2")].name(), "Chapter 1.2");
    }

    #[test]
    fn counts_requirements_across_the_tree() {
        assert_eq!(sample().requirement_count(), 2);
    }

    #[test]
    fn rejects_duplicate_numbers() {
        let err = Catalog::new(
            "1".to_string(),
            vec![chapter("1").with_chapters(vec![chapter("1.1")]), chapter("1")],
            Vec::new(),
        )
        .unwrap_err();

        assert_eq!(
            err,
            ValidationError::DuplicateNumber {
                number: number("1"),
                name: "Chapter 1".to_string(),
            }
        );
    }

    #[test]
    fn rejects_duplicates_across_subtrees() {
        let err = Catalog::<Requirement>::new(
            "1".to_string(),
            vec![
                chapter("1").with_chapters(vec![chapter("1.1")]),
                chapter("2").with_chapters(vec![chapter("2.1")]),
                chapter("3").with_chapters(vec![chapter("3.1"), chapter("3.1")]),
            ],
            Vec::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::DuplicateNumber { .. }));
    }

    #[test]
    fn rejects_chapters_not_nested_under_their_parent() {
        let err = Catalog::new(
            "1".to_string(),
            vec![chapter("1").with_chapters(vec![chapter("2.1")])],
            Vec::new(),
        )
        .unwrap_err();

        assert_eq!(
            err,
            ValidationError::NotNested {
                parent: number("1"),
                number: number("2.1"),
            }
        );
    }

    #[test]
    fn accepts_references_to_undefined_drds() {
        let catalog = Catalog::new(
            "1".to_string(),
            vec![chapter("1").with_requirements(vec![
                Requirement::new("b", "text").with_drds(["DRD-404"]),
            ])],
            Vec::new(),
        )
        .unwrap();

        assert!(catalog.drd("DRD-404").is_none());
        assert!(catalog.find(&number("1")).unwrap().requirements()[0].has_drd());
    }

    #[test]
    fn rejects_duplicate_drd_definitions() {
        let err = Catalog::<Requirement>::new(
            "1".to_string(),
            Vec::new(),
            [Drd::new("DRD-1", "a"), Drd::new("DRD-1", "b")],
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::DuplicateDrd("DRD-1".to_string()));
    }

    #[test]
    fn has_drd_treats_absent_and_empty_alike() {
        assert!(!Requirement::new("a", "t").has_drd());
        assert!(!Requirement::new("a", "t").with_drds(Vec::<String>::new()).has_drd());
        assert!(Requirement::new("a", "t").with_drds(["DRD-1"]).has_drd());
    }

    #[test]
    fn map_preserves_structure() {
        let catalog = sample();
        let mapped = catalog.map(|chapter, requirement| {
            format!("{chapter}{}", requirement.position())
        });

        assert_eq!(mapped.version(), "8.2.1");
        assert_eq!(mapped.chapters()[0].requirements(), ["1a".to_string()]);
        assert_eq!(mapped.chapters()[1].requirements(), ["2a".to_string()]);
        assert_eq!(mapped.walk().count(), 5);
        assert!(mapped.drd("DRD-1").is_some());
    }
}
