//! Importing catalogs from YAML files.
//!
//! A catalog file looks like this:
//!
//! ```yaml
//! _version: "1"
//! version: "8.1"
//! drds:
//!   - number: DRD-1
//!     title: Software development plan
//!     action: delivery
//!     deliveryDate: SRR
//!     phases: [A, B]
//! chapters:
//!   - number: "1"
//!     name: Management
//!     requirements:
//!       - position: a
//!         text: The supplier shall establish a plan.
//!         reference:
//!           text: ECSS-Q-ST-80C 5.1
//!         drds: [DRD-1]
//!     chapters: []
//! ```

use std::{
    collections::BTreeSet,
    io,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use crate::domain::{
    Catalog, Chapter, ChapterNumber, Drd, Logo, Phase, Reference, Requirement, ValidationError,
};

/// Errors raised while importing a catalog.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The catalog file could not be read.
    #[error("failed to read catalog {}", path.display())]
    Io {
        /// The catalog file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },
    /// The catalog file is not valid YAML or does not have the expected shape.
    #[error("failed to parse catalog")]
    Parse(#[from] serde_yaml::Error),
    /// The catalog is malformed.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Loads and validates the catalog stored at `path`.
///
/// # Errors
///
/// Returns an [`ImportError`] if the file cannot be read or parsed, or if the
/// catalog is malformed.
#[instrument(level = "debug")]
pub fn load_catalog(path: &Path) -> Result<Catalog, ImportError> {
    let content = std::fs::read_to_string(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_catalog(&content)
}

/// Parses and validates a catalog from YAML.
///
/// # Errors
///
/// Returns an [`ImportError`] if the YAML cannot be parsed or the catalog is
/// malformed.
pub fn parse_catalog(yaml: &str) -> Result<Catalog, ImportError> {
    let CatalogFile::V1(definition) = serde_yaml::from_str(yaml)?;
    Ok(Catalog::try_from(definition)?)
}

#[derive(Debug, Deserialize)]
#[serde(tag = "_version")]
enum CatalogFile {
    #[serde(rename = "1")]
    V1(CatalogDefinition),
}

/// The serialized form of a catalog.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogDefinition {
    version: String,
    #[serde(default)]
    drds: Vec<DrdDefinition>,
    #[serde(default)]
    chapters: Vec<ChapterDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DrdDefinition {
    number: String,
    title: String,
    #[serde(default)]
    action: String,
    #[serde(default)]
    delivery_date: String,
    #[serde(default)]
    phases: BTreeSet<Phase>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChapterDefinition {
    number: String,
    name: String,
    #[serde(default)]
    requirements: Vec<RequirementDefinition>,
    #[serde(default)]
    chapters: Vec<ChapterDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RequirementDefinition {
    position: String,
    text: String,
    #[serde(default)]
    reference: Option<ReferenceDefinition>,
    /// `None` when the key is absent, as opposed to an empty list.
    #[serde(default)]
    drds: Option<BTreeSet<String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReferenceDefinition {
    text: String,
    #[serde(default)]
    changed: bool,
    #[serde(default)]
    logo: Option<LogoDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
struct LogoDefinition {
    name: String,
    url: String,
}

impl TryFrom<CatalogDefinition> for Catalog {
    type Error = ValidationError;

    fn try_from(definition: CatalogDefinition) -> Result<Self, Self::Error> {
        let CatalogDefinition {
            version,
            drds,
            chapters,
        } = definition;

        let chapters = chapters
            .into_iter()
            .map(Chapter::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(version, chapters, drds.into_iter().map(Drd::from))
    }
}

impl TryFrom<ChapterDefinition> for Chapter {
    type Error = ValidationError;

    fn try_from(definition: ChapterDefinition) -> Result<Self, Self::Error> {
        let ChapterDefinition {
            number,
            name,
            requirements,
            chapters,
        } = definition;

        let Ok(number) = ChapterNumber::new(number.clone()) else {
            return Err(ValidationError::InvalidNumber { name, number });
        };

        let chapters = chapters
            .into_iter()
            .map(Self::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(number, name)
            .with_requirements(requirements.into_iter().map(Requirement::from).collect())
            .with_chapters(chapters))
    }
}

impl From<RequirementDefinition> for Requirement {
    fn from(definition: RequirementDefinition) -> Self {
        let RequirementDefinition {
            position,
            text,
            reference,
            drds,
        } = definition;

        let mut requirement = Self::new(position, text);
        if let Some(reference) = reference {
            requirement = requirement.with_reference(reference.into());
        }
        if let Some(drds) = drds {
            requirement = requirement.with_drds(drds);
        }
        requirement
    }
}

impl From<ReferenceDefinition> for Reference {
    fn from(definition: ReferenceDefinition) -> Self {
        Self {
            text: definition.text,
            changed: definition.changed,
            logo: definition.logo.map(|LogoDefinition { name, url }| Logo { name, url }),
        }
    }
}

impl From<DrdDefinition> for Drd {
    fn from(definition: DrdDefinition) -> Self {
        Self::new(definition.number, definition.title)
            .with_delivery(definition.action, definition.delivery_date)
            .with_phases(definition.phases)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::domain::CatalogRequirement;

    const CATALOG: &str = r#"
_version: "1"
version: "8.1"
drds:
  - number: DRD-1
    title: Software development plan
    action: delivery
    deliveryDate: SRR
    phases: [A, B]
chapters:
  - number: "1"
    name: Management
    requirements:
      - position: a
        text: The supplier shall establish a plan.
        reference:
          text: ECSS-Q-ST-80C 5.1
          logo:
            name: ECSS
            url: logos/ecss.png
        drds: [DRD-1]
      - position: b
        text: No deliverable.
        drds: []
    chapters:
      - number: "1.1"
        name: Reviews
"#;

    #[test]
    fn parses_the_whole_tree() {
        let catalog = parse_catalog(CATALOG).unwrap();

        assert_eq!(catalog.version(), "8.1");
        assert_eq!(catalog.walk().count(), 2);
        assert_eq!(catalog.requirement_count(), 2);

        let drd = catalog.drd("DRD-1").unwrap();
        assert_eq!(drd.delivery_date, "SRR");
        assert_eq!(drd.phases, BTreeSet::from([Phase::A, Phase::B]));

        let chapter = &catalog.chapters()[0];
        let first = &chapter.requirements()[0];
        assert!(first.has_drd());
        assert_eq!(
            first.reference().and_then(|r| r.logo.as_ref()).map(|l| l.url.as_str()),
            Some("logos/ecss.png")
        );

        let second = &chapter.requirements()[1];
        assert_eq!(second.drds(), Some(&BTreeSet::new()));
        assert!(!second.has_drd());
    }

    #[test]
    fn empty_number_names_the_chapter() {
        let yaml = r#"
_version: "1"
version: "8.1"
chapters:
  - number: ""
    name: Nameless
"#;
        let err = parse_catalog(yaml).unwrap_err();
        assert!(matches!(
            err,
            ImportError::Validation(ValidationError::InvalidNumber { ref name, .. }) if name == "Nameless"
        ));
    }

    #[test]
    fn duplicate_numbers_fail_validation() {
        let yaml = r#"
_version: "1"
version: "8.1"
chapters:
  - number: "1"
    name: One
  - number: "1"
    name: Again
"#;
        let err = parse_catalog(yaml).unwrap_err();
        assert!(matches!(
            err,
            ImportError::Validation(ValidationError::DuplicateNumber { .. })
        ));
    }

    #[test]
    fn unknown_version_is_a_parse_error() {
        let err = parse_catalog("_version: \"2\"\nversion: \"8.1\"\n").unwrap_err();
        assert!(matches!(err, ImportError::Parse(_)));
    }

    #[test]
    fn load_reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CATALOG.as_bytes()).unwrap();

        let catalog = load_catalog(file.path()).unwrap();
        assert_eq!(catalog.requirement_count(), 2);
    }

    #[test]
    fn load_missing_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yaml");

        let err = load_catalog(&path).unwrap_err();
        assert!(matches!(err, ImportError::Io { path: ref p, .. } if *p == path));
    }
}
