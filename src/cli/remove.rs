//! Remove command - delete an index

use clap::Args;

use super::CliContext;

#[derive(Args)]
pub struct RemoveArgs {
    /// Index name to remove
    pub index_name: String,

    /// Force removal without confirmation
    #[arg(short, long)]
    pub force: bool,
}

pub async fn run(args: RemoveArgs, ctx: CliContext) -> anyhow::Result<()> {
    let (manager, _) = ctx.open_manager()?;

    // Resolve first so a typo fails before the confirmation prompt
    let status = manager.get(&args.index_name).await?.status().await;

    if !args.force {
        print!(
            "Remove index '{}' ({} documents)? Type '{}' to confirm: ",
            args.index_name, status.document_count, args.index_name
        );
        std::io::Write::flush(&mut std::io::stdout())?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;

        if input.trim() != args.index_name {
            println!("Confirmation failed. Index not removed.");
            return Ok(());
        }
    }

    manager.delete(&args.index_name).await?;
    println!("Index '{}' removed.", args.index_name);

    Ok(())
}
