//! List command - show all indexes

use clap::Args;

use super::CliContext;

#[derive(Args)]
pub struct ListArgs {
    /// Show detailed information
    #[arg(short, long)]
    pub detailed: bool,
}

pub async fn run(args: ListArgs, ctx: CliContext) -> anyhow::Result<()> {
    let (manager, _) = ctx.open_manager()?;
    let indexes = manager.list().await;

    println!("Lodestone indexes in {:?}", ctx.data_dir);
    println!("{}", "=".repeat(50));

    if indexes.is_empty() {
        println!("No indexes found");
        println!("\nGet started:");
        println!("   lodestone create my-docs");
        println!("   lodestone add my-docs ./documents/*.md");
        return Ok(());
    }

    for (i, status) in indexes.iter().enumerate() {
        print!(
            "{:2}. {} [{}] v{} - {} document(s), {} chunk(s)",
            i + 1,
            status.name,
            status.status,
            status.version,
            status.document_count,
            status.chunk_count
        );
        if args.detailed {
            print!(
                " (chunk size {}, overlap {}, created {})",
                status.settings.chunk_size,
                status.settings.chunk_overlap,
                status.created_at.format("%Y-%m-%d")
            );
        }
        println!();
        if let Some(cause) = &status.failure_cause {
            println!("      failed: {}", cause);
        }
    }

    println!("{}", "=".repeat(50));
    println!("Total: {} index(es)", indexes.len());

    Ok(())
}
