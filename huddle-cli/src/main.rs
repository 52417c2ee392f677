mod commands;
mod prompt;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use huddle::HuddleConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "huddle")]
#[command(about = "Host/participant video sessions signaled through a shared store")]
struct Cli {
    /// JSON configuration file. `HUDDLE_*` variables override it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Used when RUST_LOG is not set.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enter the host code, then approve participants as they arrive.
    Host {
        /// Store directory shared with the other party.
        #[arg(long, default_value = "./huddle-store")]
        store: PathBuf,
    },
    /// Enter a student code and a name, then wait for the host.
    Join {
        /// Store directory shared with the other party.
        #[arg(long, default_value = "./huddle-store")]
        store: PathBuf,
    },
    /// Host and participant in one process over an in-memory store.
    Demo,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Host { store } => commands::host(config, store).await,
        Commands::Join { store } => commands::join(config, store).await,
        Commands::Demo => commands::demo(config).await,
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_config(path: Option<&std::path::Path>) -> Result<HuddleConfig> {
    let config = match path {
        Some(path) => HuddleConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => HuddleConfig::default(),
    };
    let config = config.with_env_overrides()?;
    config.validate()?;
    Ok(config)
}
