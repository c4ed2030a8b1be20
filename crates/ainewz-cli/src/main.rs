use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ainewz_core::AppConfig;

mod commands;

#[derive(Parser)]
#[command(name = "ainewz")]
#[command(author, version, about = "AI news feed aggregator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch all sources once and store the result
    Fetch,
    /// Check that every configured source is reachable and publishing
    Verify,
    /// Run the read API with the daily background refresh
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = Arc::new(AppConfig::load()?);

    match cli.command {
        Commands::Fetch => commands::fetch::run(config).await,
        Commands::Verify => commands::verify::run(config).await,
        Commands::Serve => commands::serve::run(config).await,
    }
}
