//! Create command - create a new index

use clap::Args;

use crate::index::IndexSettings;

use super::CliContext;

#[derive(Args)]
pub struct CreateArgs {
    /// Index name ([A-Za-z0-9_-], max 64 chars)
    pub index_name: String,

    /// Chunk size in characters
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Chunk overlap in characters
    #[arg(long)]
    pub chunk_overlap: Option<usize>,
}

pub async fn run(args: CreateArgs, ctx: CliContext) -> anyhow::Result<()> {
    let settings = IndexSettings {
        chunk_size: args.chunk_size.unwrap_or(ctx.config.chunking.chunk_size),
        chunk_overlap: args
            .chunk_overlap
            .unwrap_or(ctx.config.chunking.chunk_overlap),
    };

    let (manager, _) = ctx.open_manager()?;
    let status = manager.create(&args.index_name, settings).await?;

    println!(
        "Created index '{}' (chunk size {}, overlap {})",
        status.name, status.settings.chunk_size, status.settings.chunk_overlap
    );
    println!("Add documents with: lodestone add {} <files...>", status.name);

    Ok(())
}
