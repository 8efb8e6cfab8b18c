use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tailoring::{storage::load_catalog, CatalogRequirement};
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, Parser)]
#[command(about = "Import a catalog and check that it is well formed")]
pub struct Validate {
    /// The catalog file (YAML)
    catalog: PathBuf,

    /// Suppress all output except errors
    #[arg(long, short)]
    quiet: bool,
}

impl Validate {
    #[instrument]
    pub fn run(self) -> anyhow::Result<()> {
        let catalog = load_catalog(&self.catalog)
            .with_context(|| format!("invalid catalog {}", self.catalog.display()))?;

        if self.quiet {
            return Ok(());
        }

        let chapters = catalog.walk().count();
        let requirements = catalog.requirement_count();
        let with_drds = catalog
            .walk()
            .flat_map(|chapter| chapter.requirements())
            .filter(|requirement| requirement.has_drd())
            .count();

        println!(
            "{} catalog {}",
            "✓".success(),
            catalog.version().to_string().heading()
        );
        println!("  {chapters} chapters");
        println!("  {requirements} requirements ({with_drds} calling for DRDs)");
        println!("  {} DRD definitions", catalog.drds().count());

        Ok(())
    }
}
