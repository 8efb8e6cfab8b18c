//! Converting rendered markup into output documents.

use std::{
    error::Error as StdError,
    io,
    path::{Component, Path, PathBuf},
};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::instrument;

/// A generated output document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// File name of the document, including its extension.
    pub name: String,
    /// The encoded document.
    pub data: Vec<u8>,
    /// Identifier of the template the document was rendered from.
    pub template: String,
    /// Creator tag of the engine that produced the document.
    pub creator: String,
    /// When the document was produced.
    pub created: DateTime<Utc>,
}

impl Document {
    /// Writes the document into `dir` under its own name.
    ///
    /// Returns the path of the written file.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is not a plain file name or if the file
    /// cannot be written.
    pub fn save_to(&self, dir: &Path) -> io::Result<PathBuf> {
        let mut components = Path::new(&self.name).components();
        if !matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        ) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("document name '{}' is not a file name", self.name),
            ));
        }

        let path = dir.join(&self.name);
        std::fs::write(&path, &self.data)?;
        Ok(path)
    }
}

/// Turns markup into a [`Document`].
pub trait DocumentEngine: Send + Sync {
    /// Converts `markup` into a document identified by `document_id`, tagged
    /// with the identifier of the template that produced the markup.
    ///
    /// # Errors
    ///
    /// Returns a [`ConversionError`] if the backend cannot convert the markup.
    fn convert(
        &self,
        document_id: &str,
        markup: &str,
        template: &str,
    ) -> Result<Document, ConversionError>;
}

/// Errors raised by a [`DocumentEngine`].
#[derive(Debug, Error)]
pub enum ConversionError {
    /// There was nothing to convert.
    #[error("document {0} has no content")]
    EmptyMarkup(String),
    /// The document id cannot be used as a file name.
    #[error("document id '{0}' contains a path separator")]
    InvalidId(String),
    /// The conversion backend failed.
    #[error("document conversion failed")]
    Backend(#[source] Box<dyn StdError + Send + Sync>),
}

/// A document engine that emits the markup as an HTML file.
#[derive(Debug, Clone)]
pub struct HtmlDocumentEngine {
    creator: String,
}

impl HtmlDocumentEngine {
    /// Creates an engine stamping documents with the given creator tag.
    #[must_use]
    pub fn new(creator: impl Into<String>) -> Self {
        Self {
            creator: creator.into(),
        }
    }
}

impl DocumentEngine for HtmlDocumentEngine {
    #[instrument(level = "debug", skip(self, markup))]
    fn convert(
        &self,
        document_id: &str,
        markup: &str,
        template: &str,
    ) -> Result<Document, ConversionError> {
        if document_id.contains(['/', '\\']) || matches!(document_id, "" | "." | "..") {
            return Err(ConversionError::InvalidId(document_id.to_string()));
        }
        if markup.trim().is_empty() {
            return Err(ConversionError::EmptyMarkup(document_id.to_string()));
        }

        Ok(Document {
            name: format!("{document_id}.html"),
            data: markup.as_bytes().to_vec(),
            template: template.to_string(),
            creator: self.creator.clone(),
            created: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test]
    fn html_document_carries_identifiers() {
        let engine = HtmlDocumentEngine::new("TailoringExpert");

        let document = engine
            .convert("SAT-1000", "<html></html>", "8.1/tailoringcatalog")
            .unwrap();

        assert_eq!(document.name, "SAT-1000.html");
        assert_eq!(document.data, b"<html></html>");
        assert_eq!(document.template, "8.1/tailoringcatalog");
        assert_eq!(document.creator, "TailoringExpert");
    }

    #[test]
    fn blank_markup_is_rejected() {
        let engine = HtmlDocumentEngine::new("TailoringExpert");
        let err = engine.convert("SAT-1000", " \n", "8.1/drd").unwrap_err();
        assert!(matches!(err, ConversionError::EmptyMarkup(id) if id == "SAT-1000"));
    }

    #[test_case("../x"; "parent directory")]
    #[test_case("a/b"; "nested")]
    #[test_case("a\\b"; "backslash")]
    #[test_case(".."; "dot dot")]
    fn ids_with_path_separators_are_rejected(id: &str) {
        let err = HtmlDocumentEngine::new("x")
            .convert(id, "<p>hi</p>", "1/drd")
            .unwrap_err();
        assert!(matches!(err, ConversionError::InvalidId(ref rejected) if rejected == id));
    }

    #[test]
    fn save_to_stays_inside_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        std::fs::create_dir(&out).unwrap();
        let mut document = HtmlDocumentEngine::new("x")
            .convert("doc", "<p>hi</p>", "1/drd")
            .unwrap();
        document.name = "../escaped.html".to_string();

        let err = document.save_to(&out).unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(!dir.path().join("escaped.html").exists());
    }

    #[test]
    fn save_to_writes_into_directory() {
        let dir = tempfile::tempdir().unwrap();
        let document = HtmlDocumentEngine::new("x")
            .convert("doc", "<p>hi</p>", "1/drd")
            .unwrap();

        let path = document.save_to(dir.path()).unwrap();

        assert_eq!(path, dir.path().join("doc.html"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "<p>hi</p>");
    }
}
