use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use marian_metric_models::{
    core::{setup_logging, CliOptions, Settings},
    models::ModelStore,
};

#[derive(Parser, Debug)]
#[command(name = "marian-models")]
#[command(about = "Fetch and inspect Marian metric checkpoints", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to a JSON settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the cache directory
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Override the archive base URL
    #[arg(long)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List known models and their metric kind
    List,
    /// Show the cache status of models (all known models by default)
    Status { names: Vec<String> },
    /// Download and unpack models, printing checkpoint and vocab paths
    Fetch {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Render a JSON object of options as engine arguments
    Args { json: String },
}

fn main() -> Result<()> {
    setup_logging();
    let cli = Cli::parse();

    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };
    if let Some(dir) = cli.cache_dir {
        settings.cache_dir = dir;
    }
    if let Some(url) = cli.base_url {
        settings.base_url = url;
    }
    tracing::debug!(
        cache_dir = %settings.cache_dir.display(),
        base_url = %settings.base_url,
        "Settings loaded"
    );

    match cli.command {
        Command::List => {
            let store = ModelStore::from_settings(&settings)?;
            for model in store.known_models() {
                let status = store.status(model.name)?;
                println!("{}\t{}\t{status:?}", model.name, model.kind.as_str());
            }
        }
        Command::Status { names } => {
            let store = ModelStore::from_settings(&settings)?;
            let names = if names.is_empty() {
                store
                    .known_models()
                    .iter()
                    .map(|m| m.name.to_string())
                    .collect()
            } else {
                names
            };
            for name in names {
                let status = store.status(&name)?;
                println!("{name}\t{status:?}");
            }
        }
        Command::Fetch { names } => {
            let store = ModelStore::from_settings(&settings)?;
            tracing::info!(
                cache_dir = %store.root().display(),
                base_url = store.base_url(),
                "Fetching {} model(s)",
                names.len()
            );
            for name in names {
                let files = store
                    .resolve(&name)
                    .with_context(|| format!("resolve model {name}"))?;
                println!(
                    "{}\t{}",
                    files.checkpoint.display(),
                    files.vocab.display()
                );
            }
        }
        Command::Args { json } => {
            let value: serde_json::Value =
                serde_json::from_str(&json).context("options must be a json object")?;
            println!("{}", CliOptions::from_json(&value)?.to_cli());
        }
    }
    Ok(())
}
