use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use rayon::prelude::*;
use tailoring::{
    storage::{load_project, Project},
    Config, DocumentKind, Placeholders, Tenant,
};
use tracing::instrument;

use super::terminal::Colorize;

/// Parse a `KEY=VALUE` placeholder.
fn parse_placeholder(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    if key.is_empty() {
        return Err(format!("placeholder name missing in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

#[derive(Debug, Parser)]
#[command(about = "Render documents from a tailoring")]
pub struct Render {
    /// The tailoring file (YAML)
    tailoring: PathBuf,

    /// The tenant whose templates are used
    #[arg(long, short, default_value = "plattform")]
    tenant: String,

    /// The documents to render (can be specified multiple times)
    ///
    /// Defaults to every document kind.
    #[arg(long = "kind", short, value_name = "KIND")]
    kinds: Vec<DocumentKind>,

    /// Also render the untailored catalog
    #[arg(long)]
    base_catalog: bool,

    /// Placeholder values (can be specified multiple times)
    #[arg(short = 'p', long = "placeholder", value_name = "KEY=VALUE", value_parser = parse_placeholder)]
    placeholders: Vec<(String, String)>,

    /// Identifier of the generated documents
    ///
    /// Defaults to the tailoring name. The document kind is appended.
    #[arg(long)]
    id: Option<String>,

    /// Directory the documents are written to
    #[arg(long, short, default_value = ".")]
    out: PathBuf,
}

impl Render {
    #[instrument(skip(config))]
    pub fn run(self, config: &Config, base: &Path) -> anyhow::Result<()> {
        let Project { catalog, tailoring } = load_project(&self.tailoring)
            .with_context(|| format!("failed to load tailoring {}", self.tailoring.display()))?;

        let service = config.document_service(base);
        let tenant = Tenant::new(self.tenant);
        let placeholders: Placeholders = self.placeholders.into_iter().collect();
        let id = self.id.unwrap_or_else(|| tailoring.name().to_string());

        let kinds = if self.kinds.is_empty() {
            DocumentKind::ALL.to_vec()
        } else {
            self.kinds
        };

        std::fs::create_dir_all(&self.out)
            .with_context(|| format!("failed to create {}", self.out.display()))?;

        let mut documents = kinds
            .par_iter()
            .map(|kind| {
                service.create(
                    &tenant,
                    *kind,
                    &format!("{id}-{kind}"),
                    &tailoring,
                    &placeholders,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        if self.base_catalog {
            documents.push(service.create_base_catalog(
                &tenant,
                &format!("{id}-basecatalog"),
                &catalog,
                &placeholders,
            )?);
        }

        for document in &documents {
            let path = document
                .save_to(&self.out)
                .with_context(|| format!("failed to write {}", document.name))?;
            println!("{} {}", "✓".success(), path.display());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::parse_placeholder;

    #[test_case("PROJECT=SAT", "PROJECT", "SAT")]
    #[test_case("EMPTY=", "EMPTY", "")]
    #[test_case("EQ=a=b", "EQ", "a=b")]
    fn parses_placeholders(input: &str, key: &str, value: &str) {
        assert_eq!(
            parse_placeholder(input).unwrap(),
            (key.to_string(), value.to_string())
        );
    }

    #[test_case("novalue")]
    #[test_case("=value")]
    fn rejects_malformed_placeholders(input: &str) {
        assert!(parse_placeholder(input).is_err());
    }
}
