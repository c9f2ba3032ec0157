//! Search command - query an index

use clap::Args;

use crate::filter::MetadataFilter;
use crate::search::{GrepQuery, HybridQuery, SearchEngine, SearchResult, SemanticQuery};

use super::CliContext;

#[derive(Args)]
pub struct SearchArgs {
    /// Index name
    pub index_name: String,

    /// Query text (or grep pattern with --grep)
    pub query: String,

    /// Number of results
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Grep search instead of semantic
    #[arg(long, conflicts_with = "hybrid")]
    pub grep: bool,

    /// Hybrid search (semantic + grep, fused)
    #[arg(long)]
    pub hybrid: bool,

    /// Treat the query as a regex (grep/hybrid)
    #[arg(long)]
    pub regex: bool,

    /// Match case-sensitively (grep/hybrid)
    #[arg(long)]
    pub case_sensitive: bool,

    /// Metadata filter as JSON, e.g. '{"category": {"==": "manual"}}'
    #[arg(short, long)]
    pub filter: Option<String>,
}

pub async fn run(args: SearchArgs, ctx: CliContext) -> anyhow::Result<()> {
    let filter: Option<MetadataFilter> = args
        .filter
        .as_deref()
        .map(serde_json::from_str)
        .transpose()
        .map_err(|e| anyhow::anyhow!("invalid filter: {}", e))?;

    let (manager, embedder) = ctx.open_manager()?;
    let handle = manager.get(&args.index_name).await?;
    let engine = SearchEngine::new(embedder, ctx.config.search.clone());

    // Vector structures live in memory, so a fresh process starts without
    // one; semantic queries need a build first
    if !args.grep
        && handle.active().await.is_none()
        && handle.status().await.document_count > 0
    {
        eprintln!("Building vector structure for '{}'...", args.index_name);
        manager.rebuild(&args.index_name).await?.await?;
    }

    let results = if args.grep {
        engine
            .grep(
                &handle,
                &GrepQuery {
                    pattern: args.query.clone(),
                    top_k: args.top_k,
                    regex: args.regex,
                    case_insensitive: !args.case_sensitive,
                    filter,
                },
            )
            .await?
    } else if args.hybrid {
        engine
            .hybrid(
                &handle,
                &HybridQuery {
                    query: args.query.clone(),
                    pattern: None,
                    top_k: args.top_k,
                    regex: args.regex,
                    case_insensitive: !args.case_sensitive,
                    filter,
                    semantic_weight: None,
                    grep_weight: None,
                    rrf_constant: None,
                },
            )
            .await?
    } else {
        engine
            .semantic(
                &handle,
                &SemanticQuery {
                    query: args.query.clone(),
                    top_k: args.top_k,
                    filter,
                },
            )
            .await?
    };

    if results.is_empty() {
        println!("No results for '{}'", args.query);
        return Ok(());
    }

    println!("Results for '{}':", args.query);
    for (i, result) in results.iter().enumerate() {
        print_result(i + 1, result);
    }

    Ok(())
}

fn print_result(rank: usize, result: &SearchResult) {
    let snippet: String = result.content.chars().take(160).collect();
    let snippet = snippet.replace('\n', " ");
    println!(
        "{:2}. [{:.4}] {} ({})",
        rank, result.score, result.chunk_id, result.document_id
    );
    println!("      {}", snippet);
}
