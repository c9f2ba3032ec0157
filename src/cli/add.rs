//! Add command - load documents into an index from files

use std::path::PathBuf;

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{Map, Value};

use crate::index::NewDocument;

use super::CliContext;

#[derive(Args)]
pub struct AddArgs {
    /// Index name
    pub index_name: String,

    /// Files to add as documents
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Metadata applied to every document, as key=value pairs
    #[arg(short, long)]
    pub metadata: Vec<String>,

    /// Replace documents whose ids already exist
    #[arg(long)]
    pub update: bool,
}

pub async fn run(args: AddArgs, ctx: CliContext, quiet: bool) -> anyhow::Result<()> {
    let metadata = parse_metadata(&args.metadata)?;

    let (manager, _) = ctx.open_manager()?;
    let handle = manager.get(&args.index_name).await?;

    let progress = if quiet {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(args.files.len() as u64);
        bar.set_style(
            ProgressStyle::with_template("{bar:30} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar
    };

    let mut added = 0;
    let mut failed = 0;

    for file in &args.files {
        progress.set_message(file.display().to_string());

        let content = std::fs::read_to_string(file)?;
        let id = file
            .file_name()
            .map(|n| n.to_string_lossy().replace(|c: char| c == ' ', "_"))
            .unwrap_or_else(|| file.display().to_string());

        let doc = NewDocument {
            id: Some(id.clone()),
            content,
            metadata: metadata.clone(),
        };

        let results = handle.add_documents(vec![doc], args.update).await?;
        for result in results {
            if result.error.is_some() {
                failed += 1;
                if !quiet {
                    progress.println(format!(
                        "  {}: {}",
                        result.id,
                        result.error.unwrap_or_default()
                    ));
                }
            } else {
                added += 1;
            }
        }
        progress.inc(1);
    }

    progress.finish_and_clear();

    println!(
        "Added {} document(s) to '{}'{}",
        added,
        args.index_name,
        if failed > 0 {
            format!(", {} failed", failed)
        } else {
            String::new()
        }
    );
    println!("Rebuild to make them searchable: lodestone rebuild {}", args.index_name);

    Ok(())
}

fn parse_metadata(pairs: &[String]) -> anyhow::Result<Option<Value>> {
    if pairs.is_empty() {
        return Ok(None);
    }

    let mut map = Map::new();
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("metadata must be key=value, got '{}'", pair))?;

        // Numbers and booleans keep their type, everything else is a string
        let value = if let Ok(n) = value.parse::<i64>() {
            Value::from(n)
        } else if let Ok(f) = value.parse::<f64>() {
            Value::from(f)
        } else if value == "true" || value == "false" {
            Value::from(value == "true")
        } else {
            Value::from(value)
        };
        map.insert(key.to_string(), value);
    }

    Ok(Some(Value::Object(map)))
}
