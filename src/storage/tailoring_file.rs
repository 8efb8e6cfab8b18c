//! Loading project tailorings from YAML files.
//!
//! A tailoring file names the catalog it tailors (relative to the tailoring
//! file), the phases in scope, the signatures printed on the documents and the
//! requirements that deviate from the catalog:
//!
//! ```yaml
//! _version: "1"
//! name: SAT
//! catalog: catalog.yaml
//! phases: [A, B]
//! requirements:
//!   - chapter: "1.1"
//!     position: a
//!     selected: false
//!   - chapter: "2"
//!     position: b
//!     text: The supplier shall deliver monthly reports.
//! signatures:
//!   - faculty: Software
//!     signee: A. Smith
//!     state: PREPARED
//!     position: 1
//! ```

use std::{
    collections::BTreeSet,
    io,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::{
    domain::{
        Catalog, ChapterNumber, DocumentSignature, InvalidNumberError, Phase, Tailoring,
        TailoringError,
    },
    storage::import::{load_catalog, ImportError},
};

/// Errors raised while loading a tailoring file.
#[derive(Debug, Error)]
pub enum TailoringFileError {
    /// The tailoring file could not be read.
    #[error("failed to read tailoring {}", path.display())]
    Io {
        /// The tailoring file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },
    /// The tailoring file is not valid YAML or does not have the expected
    /// shape.
    #[error("failed to parse tailoring")]
    Parse(#[from] serde_yaml::Error),
    /// The referenced catalog could not be imported.
    #[error("failed to import catalog {}", path.display())]
    Catalog {
        /// The catalog file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: ImportError,
    },
    /// A requirement override names an invalid chapter number.
    #[error(transparent)]
    Number(#[from] InvalidNumberError),
    /// A requirement override names a requirement the catalog does not have.
    #[error(transparent)]
    Tailoring(#[from] TailoringError),
}

#[derive(Debug, Deserialize)]
#[serde(tag = "_version")]
enum TailoringFile {
    #[serde(rename = "1")]
    V1(TailoringDefinition),
}

#[derive(Debug, Deserialize)]
struct TailoringDefinition {
    name: String,
    catalog: PathBuf,
    #[serde(default)]
    phases: BTreeSet<Phase>,
    #[serde(default)]
    requirements: Vec<Override>,
    #[serde(default)]
    signatures: Vec<DocumentSignature>,
}

/// A deviation of one requirement from the catalog.
#[derive(Debug, Deserialize)]
struct Override {
    chapter: String,
    position: String,
    #[serde(default)]
    selected: Option<bool>,
    #[serde(default)]
    text: Option<String>,
}

/// A tailoring together with the catalog it tailors.
#[derive(Debug, Clone)]
pub struct Project {
    /// The untailored catalog.
    pub catalog: Catalog,
    /// The tailoring.
    pub tailoring: Tailoring,
}

/// Loads the tailoring stored at `path`.
///
/// See [`load_project`].
///
/// # Errors
///
/// Returns a [`TailoringFileError`] if either file cannot be read or parsed,
/// or if an override names a requirement the catalog does not have.
pub fn load_tailoring(path: &Path) -> Result<Tailoring, TailoringFileError> {
    load_project(path).map(|project| project.tailoring)
}

/// Loads the tailoring stored at `path`, together with the catalog it refers
/// to.
///
/// The tailoring starts with every catalog requirement selected; the
/// requirement overrides of the file are then applied as edits, so they show
/// up as changed requirements.
///
/// # Errors
///
/// Returns a [`TailoringFileError`] if either file cannot be read or parsed,
/// or if an override names a requirement the catalog does not have.
#[instrument(level = "debug")]
pub fn load_project(path: &Path) -> Result<Project, TailoringFileError> {
    let content = std::fs::read_to_string(path).map_err(|source| TailoringFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let TailoringFile::V1(definition) = serde_yaml::from_str(&content)?;

    let catalog_path = path
        .parent()
        .map_or_else(|| definition.catalog.clone(), |dir| dir.join(&definition.catalog));
    let catalog = load_catalog(&catalog_path).map_err(|source| TailoringFileError::Catalog {
        path: catalog_path,
        source,
    })?;

    let mut tailoring = Tailoring::new(definition.name, &catalog, definition.phases);
    for signature in definition.signatures {
        tailoring.add_signature(signature);
    }

    for edit in definition.requirements {
        let chapter = ChapterNumber::new(edit.chapter)?;
        if let Some(selected) = edit.selected {
            tailoring.select(&chapter, &edit.position, selected)?;
        }
        if let Some(text) = edit.text {
            tailoring.edit_text(&chapter, &edit.position, text)?;
        }
    }

    debug!(
        changed = tailoring.changed_requirements().count(),
        "tailoring loaded"
    );
    Ok(Project { catalog, tailoring })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::domain::{CatalogRequirement, SignatureState};

    const CATALOG: &str = r#"
_version: "1"
version: "8.1"
chapters:
  - number: "1"
    name: General
    requirements:
      - position: a
        text: First
      - position: b
        text: Second
"#;

    fn write(dir: &Path, tailoring: &str) -> PathBuf {
        fs::write(dir.join("catalog.yaml"), CATALOG).unwrap();
        let path = dir.join("tailoring.yaml");
        fs::write(&path, tailoring).unwrap();
        path
    }

    #[test]
    fn applies_overrides_as_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            r#"
_version: "1"
name: SAT
catalog: catalog.yaml
phases: [B]
requirements:
  - chapter: "1"
    position: a
    selected: false
  - chapter: "1"
    position: b
    text: Second, reworded
signatures:
  - faculty: Software
    signee: A. Smith
    state: AGREED
    position: 1
"#,
        );

        let tailoring = load_tailoring(&path).unwrap();

        assert_eq!(tailoring.name(), "SAT");
        assert_eq!(tailoring.phases(), &BTreeSet::from([Phase::B]));
        assert_eq!(tailoring.signatures()[0].state, SignatureState::Agreed);
        assert!(tailoring.signatures()[0].applicable);

        let chapter: ChapterNumber = "1".parse().unwrap();
        let first = tailoring.requirement(&chapter, "a").unwrap();
        assert!(!first.selected());
        let second = tailoring.requirement(&chapter, "b").unwrap();
        assert_eq!(second.text(), "Second, reworded");
        assert_eq!(tailoring.changed_requirements().count(), 2);
    }

    #[test]
    fn project_keeps_the_untailored_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "_version: \"1\"\nname: SAT\ncatalog: catalog.yaml\nrequirements:\n  - chapter: \"1\"\n    position: a\n    text: Changed\n",
        );

        let project = load_project(&path).unwrap();

        let chapter: ChapterNumber = "1".parse().unwrap();
        assert_eq!(project.catalog.find(&chapter).unwrap().requirements()[0].text(), "First");
        assert_eq!(project.tailoring.requirement(&chapter, "a").unwrap().text(), "Changed");
    }

    #[test]
    fn unknown_requirement_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            r#"
_version: "1"
name: SAT
catalog: catalog.yaml
requirements:
  - chapter: "1"
    position: z
    selected: false
"#,
        );

        let err = load_tailoring(&path).unwrap_err();
        assert!(matches!(
            err,
            TailoringFileError::Tailoring(TailoringError::UnknownRequirement { .. })
        ));
    }

    #[test]
    fn missing_catalog_names_its_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tailoring.yaml");
        fs::write(
            &path,
            "_version: \"1\"\nname: SAT\ncatalog: nowhere.yaml\n",
        )
        .unwrap();

        let err = load_tailoring(&path).unwrap_err();
        assert!(matches!(
            err,
            TailoringFileError::Catalog { path: ref p, .. } if *p == dir.path().join("nowhere.yaml")
        ));
    }
}
