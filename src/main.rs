//! Lodestone - multi-index document search service
//!
//! A single binary serving named document indexes searchable by semantic
//! similarity, grep pattern, or a fusion of both.

mod api;
mod backend;
mod chunker;
mod cli;
mod config;
mod embedding;
mod error;
mod filter;
mod index;
mod search;
mod store;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lodestone=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Parse CLI args and run
    let cli = Cli::parse();
    cli.run().await
}
