//! Embedding module - compute embeddings from text
//!
//! Providers are injected behind [`EmbeddingProvider`]; the service acquires
//! one at startup and hands an `Arc` to the index manager, so no global
//! model handle exists.

mod ollama;
mod openai;
mod simulated;
mod traits;

pub use ollama::OllamaEmbedding;
pub use openai::OpenAIEmbedding;
pub use simulated::SimulatedEmbedding;
pub use traits::{EmbeddingError, EmbeddingProvider};

use std::sync::Arc;

use tracing::info;

use crate::config::EmbeddingConfig;

/// Build the configured embedding provider
pub fn create_provider(config: &EmbeddingConfig) -> anyhow::Result<Arc<dyn EmbeddingProvider>> {
    let provider: Arc<dyn EmbeddingProvider> = match config.provider.as_str() {
        "simulated" => Arc::new(SimulatedEmbedding::new(config.model.clone())),
        "ollama" => Arc::new(OllamaEmbedding::new(
            config.model.clone(),
            config.host.clone(),
        )),
        "openai" => Arc::new(OpenAIEmbedding::new(
            config.model.clone(),
            config.api_key.clone(),
            config.base_url.clone(),
        )?),
        other => anyhow::bail!("Unknown embedding provider: {}", other),
    };

    info!(
        "Initialized embedding provider: {} / {} ({} dims)",
        config.provider,
        provider.model_name(),
        provider.dimensions()
    );

    Ok(provider)
}
