//! CLI module - command definitions and handlers

mod add;
mod create;
mod list;
mod rebuild;
mod remove;
mod search;
mod serve;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

pub use add::AddArgs;
pub use create::CreateArgs;
pub use list::ListArgs;
pub use rebuild::RebuildArgs;
pub use remove::RemoveArgs;
pub use search::SearchArgs;
pub use serve::ServeArgs;

use crate::backend::BackendType;
use crate::config::Config;
use crate::embedding::{create_provider, EmbeddingProvider};
use crate::index::IndexManager;

/// Lodestone - multi-index document search service
#[derive(Parser)]
#[command(name = "lodestone")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Override the data directory
    #[arg(long, global = true, env = "LODESTONE_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server
    Serve(ServeArgs),

    /// Create a new index
    Create(CreateArgs),

    /// Add documents to an index from files
    Add(AddArgs),

    /// Search an index
    Search(SearchArgs),

    /// Rebuild an index's vector structure
    Rebuild(RebuildArgs),

    /// List all indexes
    List(ListArgs),

    /// Remove an index
    Remove(RemoveArgs),
}

/// Shared context for command handlers
pub struct CliContext {
    pub config: Config,
    pub data_dir: PathBuf,
}

impl CliContext {
    fn new(data_dir_override: Option<PathBuf>) -> Self {
        let config = Config::load();
        let data_dir = data_dir_override.unwrap_or_else(|| config.storage.resolve_data_dir());
        Self { config, data_dir }
    }

    /// Open the index manager with the configured collaborators
    pub fn open_manager(&self) -> anyhow::Result<(Arc<IndexManager>, Arc<dyn EmbeddingProvider>)> {
        let embedder = create_provider(&self.config.embedding)?;
        let backend = BackendType::Flat.create();
        let manager = IndexManager::open(&self.data_dir, embedder.clone(), backend)?;
        Ok((Arc::new(manager), embedder))
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let ctx = CliContext::new(self.data_dir.clone());
        match self.command {
            Commands::Serve(args) => serve::run(args, ctx).await,
            Commands::Create(args) => create::run(args, ctx).await,
            Commands::Add(args) => add::run(args, ctx, self.quiet).await,
            Commands::Search(args) => search::run(args, ctx).await,
            Commands::Rebuild(args) => rebuild::run(args, ctx, self.quiet).await,
            Commands::List(args) => list::run(args, ctx).await,
            Commands::Remove(args) => remove::run(args, ctx).await,
        }
    }
}
