mod verbose;

use std::path::Path;

use clap::{FromArgMatches as _, IntoApp as _, Parser, Subcommand};
use tracing_error::ErrorLayer;
use tracing_subscriber::{prelude::*, EnvFilter, Registry};
use twelf::Layer;

use inkwell_common::Conf;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
struct Cli {
    #[clap(flatten)]
    verbose: verbose::Verbosity,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the catalog as a JSON API
    Serve,
    /// Check the catalog's counters and references
    Audit {
        /// Write reconciled fixtures to this directory
        #[clap(long)]
        output: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), inkwell_common::Report> {
    inkwell_common::install()?;

    let matches = Cli::command().args(&Conf::clap_args()).get_matches();
    let cli = Cli::from_arg_matches(&matches)?;

    let mut layers = Vec::with_capacity(4);
    if Path::new("inkwell.json").exists() {
        layers.push(Layer::Json("inkwell.json".into()));
    }
    if Path::new("inkwell.toml").exists() {
        layers.push(Layer::Toml("inkwell.toml".into()));
    }
    layers.push(Layer::Env(Some("INKWELL_".to_string())));
    layers.push(Layer::Clap(matches));

    let conf = Conf::with_layers(&layers)?;

    let subscriber = Registry::default()
        .with(ErrorLayer::default())
        .with(tracing_subscriber::fmt::Layer::default())
        .with(EnvFilter::from_default_env().add_directive(cli.verbose.log_level_filter().into()));

    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Serve => inkwell_command_serve::run(&conf).await?,
        Commands::Audit { output } => inkwell_command_audit::run(&conf, output.as_deref()).await?,
    }

    Ok(())
}
