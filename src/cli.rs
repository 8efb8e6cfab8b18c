use std::path::{Path, PathBuf};

mod drds;
mod render;
mod terminal;
mod validate;

use clap::ArgAction;
use drds::Drds;
use render::Render;
use tailoring::Config;
use tracing::instrument;
use validate::Validate;

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// The path to the configuration file
    #[arg(short, long, default_value = "tailoring.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        self.command.run(&self.config)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Import a catalog and check that it is well formed
    Validate(Validate),

    /// List the deliverable documents (DRDs) of a catalog for some phases
    Drds(Drds),

    /// Render documents from a tailoring
    ///
    /// Each requested document kind is rendered with the engine of the given
    /// tenant and written to the output directory.
    Render(Render),
}

impl Command {
    fn run(self, config: &Path) -> anyhow::Result<()> {
        match self {
            Self::Validate(command) => command.run()?,
            Self::Drds(command) => command.run()?,
            Self::Render(command) => {
                let (config, base) = load_config(config)?;
                command.run(&config, &base)?;
            }
        }
        Ok(())
    }
}

/// Loads the configuration file, falling back to the defaults if it does not
/// exist.
///
/// Returns the configuration and the directory relative paths in it are
/// resolved against.
#[instrument]
fn load_config(path: &Path) -> anyhow::Result<(Config, PathBuf)> {
    let base = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

    if !path.exists() {
        tracing::info!("no configuration at {}, using defaults", path.display());
        return Ok((Config::default(), base));
    }

    let config = Config::load(path).map_err(anyhow::Error::msg)?;
    Ok((config, base))
}
