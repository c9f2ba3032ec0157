//! Rebuild command - reconstruct an index's vector structure

use std::time::{Duration, Instant};

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};

use super::CliContext;

#[derive(Args)]
pub struct RebuildArgs {
    /// Index name
    pub index_name: String,
}

pub async fn run(args: RebuildArgs, ctx: CliContext, quiet: bool) -> anyhow::Result<()> {
    let (manager, _) = ctx.open_manager()?;
    manager.rebuild(&args.index_name).await?;
    let handle = manager.get(&args.index_name).await?;

    let start = Instant::now();
    let spinner = if quiet {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.enable_steady_tick(Duration::from_millis(100));
        bar.set_message(format!("Rebuilding '{}'...", args.index_name));
        bar
    };

    // The build runs in the background; poll status until it leaves building
    let status = loop {
        let status = handle.status().await;
        if status.status != "building" {
            break status;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    };

    spinner.finish_and_clear();

    match status.failure_cause {
        Some(cause) => anyhow::bail!("Rebuild of '{}' failed: {}", args.index_name, cause),
        None => {
            println!(
                "Index '{}' rebuilt: version {}, {} chunks indexed, {:.1}s",
                args.index_name,
                status.version,
                status.indexed_chunk_count,
                start.elapsed().as_secs_f32()
            );
            Ok(())
        }
    }
}
