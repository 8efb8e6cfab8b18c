//! The document rendering pipeline.
//!
//! Rendering a document is a three step affair:
//!
//! 1. build the template parameters from a tailoring (catalog rows, DRD rows,
//!    bookmarks, signatures and the caller's placeholders),
//! 2. resolve the template `{catalog version}/{template name}` through a
//!    [`TemplateEngine`],
//! 3. convert the markup into a [`Document`] through a [`DocumentEngine`].
//!
//! A failure in any step aborts the render; there is no partial output and no
//! retry.

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::{
    aggregate::aggregate,
    domain::{Catalog, CatalogRequirement, DocumentSignature, Requirement, Tailoring},
    linearize::linearize,
};

pub mod document;
pub use document::{ConversionError, Document, DocumentEngine, HtmlDocumentEngine};

pub mod markup;

mod template;
pub use template::{FileTemplateEngine, TemplateEngine, TemplateError};

/// Caller supplied values for `${name}` placeholders.
pub type Placeholders = BTreeMap<String, String>;

/// The values handed to a template.
pub type Parameters = serde_json::Map<String, Value>;

/// One row of a DRD listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrdElement {
    /// The DRD number.
    pub number: String,
    /// The DRD title.
    pub title: String,
    /// What has to be done with the document.
    pub action: String,
    /// When the document is due.
    pub delivery_date: String,
    /// Labels of the requirements calling for the document.
    pub requirements: Vec<String>,
}

/// A top-level chapter, used for the document outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bookmark {
    /// Chapter number.
    pub number: String,
    /// Chapter title.
    pub name: String,
}

/// A requirement that deviates from the catalog baseline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComparisonElement {
    /// Chapter number.
    pub chapter: String,
    /// Position within the chapter.
    pub position: String,
    /// Current text (markup).
    pub text: String,
    /// Current selection state.
    pub applicable: bool,
}

/// The documents that can be produced from a tailoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DocumentKind {
    /// The tailored requirements catalog.
    TailoringCatalog,
    /// The list of deliverable documents.
    Drd,
    /// The requirements that deviate from the catalog.
    Comparison,
}

impl DocumentKind {
    /// Every document kind.
    pub const ALL: [Self; 3] = [Self::TailoringCatalog, Self::Drd, Self::Comparison];

    /// The name of the kind's template, below the catalog version directory.
    #[must_use]
    pub const fn template_name(self) -> &'static str {
        match self {
            Self::TailoringCatalog => "tailoringcatalog",
            Self::Drd => "drd",
            Self::Comparison => "comparison",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.template_name())
    }
}

/// The given document kind does not exist.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown document kind '{0}' (expected one of tailoringcatalog, drd, comparison)")]
pub struct UnknownDocumentKindError(String);

impl FromStr for DocumentKind {
    type Err = UnknownDocumentKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.template_name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownDocumentKindError(s.to_string()))
    }
}

/// Template name of the untailored catalog document.
pub const BASE_CATALOG_TEMPLATE: &str = "basecatalog";

/// A document could not be rendered.
#[derive(Debug, Error)]
#[error("failed to render document {document_id} from template {template}")]
pub struct RenderingError {
    /// The document that was being rendered.
    pub document_id: String,
    /// The template identifier that was being resolved.
    pub template: String,
    /// What went wrong.
    #[source]
    pub source: RenderingFailure,
}

/// The step of the pipeline that failed.
#[derive(Debug, Error)]
pub enum RenderingFailure {
    /// The template could not be resolved.
    #[error(transparent)]
    Template(#[from] TemplateError),
    /// The markup could not be converted.
    #[error(transparent)]
    Conversion(#[from] ConversionError),
    /// The parameters could not be encoded.
    #[error("failed to encode template parameters")]
    Parameters(#[from] serde_json::Error),
}

/// A template engine and a document engine, used together to render
/// documents.
pub struct RenderEngine {
    template: Box<dyn TemplateEngine>,
    document: Box<dyn DocumentEngine>,
}

impl fmt::Debug for RenderEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderEngine").finish_non_exhaustive()
    }
}

impl RenderEngine {
    /// Pairs a template engine with a document engine.
    #[must_use]
    pub fn new(
        template: impl TemplateEngine + 'static,
        document: impl DocumentEngine + 'static,
    ) -> Self {
        Self {
            template: Box::new(template),
            document: Box::new(document),
        }
    }

    /// Renders a document of the given kind from a tailoring.
    ///
    /// The template is `{catalog version}/{kind}`. Placeholders are passed to
    /// the template as they are, unless they collide with a parameter the
    /// document kind defines itself.
    ///
    /// # Errors
    ///
    /// Returns a [`RenderingError`] if the template cannot be resolved or the
    /// markup cannot be converted.
    #[instrument(skip(self, tailoring, placeholders), fields(tailoring = tailoring.name()))]
    pub fn create(
        &self,
        kind: DocumentKind,
        document_id: &str,
        tailoring: &Tailoring,
        placeholders: &Placeholders,
    ) -> Result<Document, RenderingError> {
        let catalog = tailoring.catalog();
        let template = format!("{}/{}", catalog.version(), kind.template_name());

        let parameters = match kind {
            DocumentKind::TailoringCatalog => self.catalog_parameters(tailoring, placeholders),
            DocumentKind::Drd => drd_parameters(tailoring, placeholders),
            DocumentKind::Comparison => self.comparison_parameters(tailoring, placeholders),
        };

        self.render(document_id, template, parameters)
    }

    /// Renders the untailored catalog, every requirement applicable.
    ///
    /// # Errors
    ///
    /// Returns a [`RenderingError`] if the template cannot be resolved or the
    /// markup cannot be converted.
    #[instrument(skip(self, catalog, placeholders), fields(version = catalog.version()))]
    pub fn create_base_catalog(
        &self,
        document_id: &str,
        catalog: &Catalog<Requirement>,
        placeholders: &Placeholders,
    ) -> Result<Document, RenderingError> {
        let template = format!("{}/{BASE_CATALOG_TEMPLATE}", catalog.version());

        let parameters = self.base_catalog_parameters(catalog, placeholders);
        self.render(document_id, template, parameters)
    }

    fn render(
        &self,
        document_id: &str,
        template: String,
        parameters: Result<Parameters, serde_json::Error>,
    ) -> Result<Document, RenderingError> {
        let result = parameters
            .map_err(RenderingFailure::from)
            .and_then(|parameters| {
                debug!(parameters = parameters.len(), %template, "processing template");
                Ok(self.template.process(&template, &parameters)?)
            })
            .and_then(|markup| Ok(self.document.convert(document_id, &markup, &template)?));

        result.map_err(|source| RenderingError {
            document_id: document_id.to_string(),
            template,
            source,
        })
    }

    fn base_catalog_parameters(
        &self,
        catalog: &Catalog<Requirement>,
        placeholders: &Placeholders,
    ) -> Result<Parameters, serde_json::Error> {
        let mut parameters = base_parameters(catalog, placeholders)?;
        insert(
            &mut parameters,
            "requirements",
            &linearize(catalog.chapters(), placeholders, self.template.as_ref()),
        )?;
        Ok(parameters)
    }

    fn catalog_parameters(
        &self,
        tailoring: &Tailoring,
        placeholders: &Placeholders,
    ) -> Result<Parameters, serde_json::Error> {
        let catalog = tailoring.catalog();
        let mut parameters = base_parameters(catalog, placeholders)?;
        insert(
            &mut parameters,
            "requirements",
            &linearize(catalog.chapters(), placeholders, self.template.as_ref()),
        )?;
        insert(&mut parameters, "drds", &drd_elements(tailoring))?;
        insert(&mut parameters, "signatures", &sorted_signatures(tailoring))?;
        Ok(parameters)
    }

    fn comparison_parameters(
        &self,
        tailoring: &Tailoring,
        placeholders: &Placeholders,
    ) -> Result<Parameters, serde_json::Error> {
        let rows: Vec<_> = tailoring
            .changed_requirements()
            .map(|(chapter, requirement)| ComparisonElement {
                chapter: chapter.to_string(),
                position: requirement.position().to_string(),
                text: self.template.to_xhtml(requirement.text(), placeholders),
                applicable: requirement.selected(),
            })
            .collect();

        let mut parameters = base_parameters(tailoring.catalog(), placeholders)?;
        insert(&mut parameters, "requirements", &rows)?;
        insert(&mut parameters, "signatures", &sorted_signatures(tailoring))?;
        Ok(parameters)
    }
}

fn drd_parameters(
    tailoring: &Tailoring,
    placeholders: &Placeholders,
) -> Result<Parameters, serde_json::Error> {
    let mut parameters = base_parameters(tailoring.catalog(), placeholders)?;
    insert(&mut parameters, "drds", &drd_elements(tailoring))?;
    insert(&mut parameters, "signatures", &sorted_signatures(tailoring))?;
    Ok(parameters)
}

/// The placeholders, the catalog version and the bookmarks.
///
/// Placeholders go in first so that the fixed parameters take precedence.
fn base_parameters<R>(
    catalog: &Catalog<R>,
    placeholders: &Placeholders,
) -> Result<Parameters, serde_json::Error> {
    let mut parameters: Parameters = placeholders
        .iter()
        .map(|(key, value)| (key.clone(), Value::String(value.clone())))
        .collect();

    parameters.insert(
        "catalogVersion".to_string(),
        Value::String(catalog.version().to_string()),
    );
    insert(&mut parameters, "bookmarks", &bookmarks(catalog))?;
    Ok(parameters)
}

fn insert<T: Serialize + ?Sized>(
    parameters: &mut Parameters,
    key: &str,
    value: &T,
) -> Result<(), serde_json::Error> {
    parameters.insert(key.to_string(), serde_json::to_value(value)?);
    Ok(())
}

/// The DRD rows of a tailoring, ordered by number, then title.
fn drd_elements(tailoring: &Tailoring) -> Vec<DrdElement> {
    let mut rows: Vec<DrdElement> = aggregate(tailoring.catalog(), tailoring.phases())
        .into_iter()
        .map(|(drd, labels)| DrdElement {
            number: drd.number.clone(),
            title: drd.title.clone(),
            action: drd.action.clone(),
            delivery_date: drd.delivery_date.clone(),
            requirements: labels.into_iter().collect(),
        })
        .collect();
    rows.sort_by(|a, b| (&a.number, &a.title).cmp(&(&b.number, &b.title)));
    rows
}

fn sorted_signatures(tailoring: &Tailoring) -> Vec<DocumentSignature> {
    let mut signatures = tailoring.signatures().to_vec();
    signatures.sort_by_key(|signature| signature.position);
    signatures
}

/// The bookmarks of a catalog: its top-level chapters, in order.
#[must_use]
pub fn bookmarks<R>(catalog: &Catalog<R>) -> Vec<Bookmark> {
    catalog
        .chapters()
        .iter()
        .map(|chapter| Bookmark {
            number: chapter.number().to_string(),
            name: chapter.name().to_string(),
        })
        .collect()
}
