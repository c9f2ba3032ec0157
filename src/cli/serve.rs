//! Serve command - HTTP API server

use std::sync::Arc;

use clap::Args;
use tracing::info;

use crate::api::{router, AppState};
use crate::search::SearchEngine;

use super::CliContext;

#[derive(Args)]
pub struct ServeArgs {
    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(long)]
    pub port: Option<u16>,

    /// Enable CORS for all origins
    #[arg(long)]
    pub cors: bool,
}

pub async fn run(args: ServeArgs, ctx: CliContext) -> anyhow::Result<()> {
    let (manager, embedder) = ctx.open_manager()?;

    let engine = Arc::new(SearchEngine::new(
        embedder.clone(),
        ctx.config.search.clone(),
    ));

    let state = Arc::new(AppState {
        manager,
        engine,
        embedding_provider: ctx.config.embedding.provider.clone(),
        embedding_model: embedder.model_name().to_string(),
    });

    let app = router(state, args.cors);

    let host = args.host.unwrap_or_else(|| ctx.config.server.host.clone());
    let port = args.port.unwrap_or(ctx.config.server.port);
    let addr = format!("{}:{}", host, port);

    info!("Serving indexes from {:?}", ctx.data_dir);
    println!("Lodestone server listening on http://{}", addr);
    println!("  GET    /indexes                         - List indexes");
    println!("  POST   /indexes                         - Create an index");
    println!("  POST   /indexes/:name/rebuild           - Rebuild an index");
    println!("  POST   /indexes/:name/documents         - Add documents");
    println!("  POST   /indexes/:name/search            - Semantic search");
    println!("  POST   /indexes/:name/search/grep       - Grep search");
    println!("  POST   /indexes/:name/search/hybrid     - Hybrid search");
    println!("  POST   /indexes/:name/search/batch      - Batch search");
    println!("  GET    /health                          - Health check");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
