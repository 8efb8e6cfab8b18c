use std::{collections::BTreeSet, path::PathBuf};

use anyhow::Context;
use clap::Parser;
use tailoring::{aggregate, storage::load_catalog, Phase};
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, Parser)]
#[command(about = "List the deliverable documents of a catalog")]
pub struct Drds {
    /// The catalog file (YAML)
    catalog: PathBuf,

    /// Lifecycle phases in scope (can be specified multiple times)
    ///
    /// Defaults to every phase.
    #[arg(long = "phase", short, value_name = "PHASE")]
    phases: Vec<Phase>,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl Drds {
    #[instrument]
    pub fn run(self) -> anyhow::Result<()> {
        let catalog = load_catalog(&self.catalog)
            .with_context(|| format!("invalid catalog {}", self.catalog.display()))?;

        let phases: BTreeSet<Phase> = if self.phases.is_empty() {
            Phase::ALL.into_iter().collect()
        } else {
            self.phases.into_iter().collect()
        };

        let drds = aggregate(&catalog, &phases);

        match self.output {
            OutputFormat::Table => {
                if drds.is_empty() {
                    println!("{}", "No DRDs are due in these phases".warning());
                }
                for (drd, labels) in &drds {
                    println!("{} {}", drd.number.heading(), drd.title);
                    if !drd.delivery_date.is_empty() {
                        println!("  {}", format!("due: {}", drd.delivery_date).dim());
                    }
                    for label in labels {
                        println!("  {label}");
                    }
                }
            }
            OutputFormat::Json => {
                let output: Vec<_> = drds
                    .iter()
                    .map(|(drd, labels)| {
                        serde_json::json!({
                            "number": drd.number,
                            "title": drd.title,
                            "action": drd.action,
                            "deliveryDate": drd.delivery_date,
                            "phases": drd.phases,
                            "requirements": labels,
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
        }

        Ok(())
    }
}
