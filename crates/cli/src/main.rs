//! Marketplace CLI - storage setup and health checks.
//!
//! # Usage
//!
//! ```bash
//! # Apply PostgreSQL migrations
//! mp-cli migrate
//!
//! # Create MongoDB unique indexes
//! mp-cli indexes
//!
//! # Connect to the configured backend and ping it
//! mp-cli check
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run relational migrations (backend must be `postgres`)
//! - `indexes` - Create document indexes (backend must be `mongodb`)
//! - `check` - Connect and ping whichever backend is configured
//!
//! Connection settings come from the `MARKETPLACE_*` environment variables
//! (see `marketplace_repository::StorageConfig`). `--backend` overrides
//! `MARKETPLACE_BACKEND`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use marketplace_repository::{Backend, StorageConfig};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::CliError;

#[derive(Parser)]
#[command(name = "mp-cli")]
#[command(author, version, about = "Marketplace storage tools")]
struct Cli {
    /// Override the backend selected by `MARKETPLACE_BACKEND`
    #[arg(long, global = true)]
    backend: Option<Backend>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run PostgreSQL migrations
    Migrate,
    /// Create MongoDB unique indexes
    Indexes,
    /// Connect to the configured backend and ping it
    Check,
}

#[tokio::main]
async fn main() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "marketplace=info,mp_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = StorageConfig::from_env()?;
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }

    match cli.command {
        Commands::Migrate => commands::migrate::run(&config).await,
        Commands::Indexes => commands::indexes::run(&config).await,
        Commands::Check => commands::check::run(&config).await,
    }
}
