use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use querystate_engine::codec;
use querystate_types::{InstanceId, ItemKey, Location};
use querystate_util::SessionConfig;

mod runtime;
mod scenario;

use scenario::Scenario;

/// Replay and inspect query-string synchronized component sessions.
#[derive(Parser, Debug)]
#[command(name = "querystate", version, about)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Session config file (defaults to QUERYSTATE_CONFIG_PATH or the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a YAML or JSON scenario and print the resulting report
    Run { scenario: PathBuf },
    /// Print the address that selects KEY for instance ID
    Encode {
        #[arg(long)]
        id: String,
        #[arg(long)]
        key: String,
        #[arg(long, default_value = "/")]
        location: String,
    },
    /// Print the key instance ID has selected in LOCATION
    Decode {
        #[arg(long)]
        id: String,
        #[arg(long)]
        location: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Run { scenario } => {
            let config = load_config(cli.config.as_deref())?;
            let scenario = Scenario::load(&scenario).await?;
            let report = runtime::run_scenario(scenario, &config).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Encode { id, key, location } => {
            let id = InstanceId::new(id)?;
            let key = ItemKey::new(key)?;
            let location = Location::parse(&location)?;
            println!("{}", codec::encode(&id, &key, &location));
        }
        Command::Decode { id, location } => {
            let id = InstanceId::new(id)?;
            let location = Location::parse(&location)?;
            let key = codec::decode(&id, &location).ok_or_else(|| anyhow!("no value for '{}' in '{}'", id, location))?;
            println!("{key}");
        }
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| default_level.into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(path: Option<&std::path::Path>) -> Result<SessionConfig> {
    match path {
        Some(path) => SessionConfig::load_from_path(path)
            .with_context(|| format!("failed to load session config {}", path.display())),
        None => SessionConfig::load().context("failed to load session config"),
    }
}
