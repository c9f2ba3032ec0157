//! Configuration file support for lodestone
//!
//! Config file location: ~/.config/lodestone/config.toml
//!
//! Example config:
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//!
//! [embedding]
//! provider = "simulated"  # simulated, ollama, openai
//! model = "nomic-embed-text"
//! # host = "http://localhost:11434"  # for ollama
//! # api_key = "sk-..."  # for openai
//!
//! [chunking]
//! chunk_size = 512
//! chunk_overlap = 64
//!
//! [search]
//! default_top_k = 10
//! max_top_k = 100
//! rrf_constant = 60.0
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub chunking: ChunkingConfig,

    #[serde(default)]
    pub search: SearchConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// Directory holding all index data
    pub data_dir: Option<PathBuf>,
}

impl StorageConfig {
    /// Resolve the data directory, falling back to the platform default
    pub fn resolve_data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("lodestone")
        })
    }
}

/// Embedding provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Provider type: simulated, ollama, openai
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Host for Ollama (e.g., http://localhost:11434)
    pub host: Option<String>,

    /// Base URL for OpenAI-compatible APIs
    pub base_url: Option<String>,

    /// API key for OpenAI
    pub api_key: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            host: None,
            base_url: None,
            api_key: None,
        }
    }
}

fn default_provider() -> String {
    "simulated".to_string()
}

fn default_model() -> String {
    "nomic-embed-text".to_string()
}

/// Chunking defaults applied to new indexes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Chunk size in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Chunk overlap in characters, must stay below chunk_size
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

fn default_chunk_size() -> usize {
    512
}

fn default_chunk_overlap() -> usize {
    64
}

/// Search and fusion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Default number of results when a query omits top_k
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,

    /// Hard cap on top_k; larger requests are clamped, not rejected
    #[serde(default = "default_max_top_k")]
    pub max_top_k: usize,

    /// Reciprocal-rank fusion constant
    #[serde(default = "default_rrf_constant")]
    pub rrf_constant: f32,

    /// Weight of the semantic list in hybrid fusion
    #[serde(default = "default_fusion_weight")]
    pub semantic_weight: f32,

    /// Weight of the grep list in hybrid fusion
    #[serde(default = "default_fusion_weight")]
    pub grep_weight: f32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_top_k: default_top_k(),
            max_top_k: default_max_top_k(),
            rrf_constant: default_rrf_constant(),
            semantic_weight: default_fusion_weight(),
            grep_weight: default_fusion_weight(),
        }
    }
}

fn default_top_k() -> usize {
    10
}

fn default_max_top_k() -> usize {
    100
}

fn default_rrf_constant() -> f32 {
    60.0
}

fn default_fusion_weight() -> f32 {
    1.0
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("lodestone")
            .join("config.toml")
    }

    /// Load config from file, returning defaults if not found
    pub fn load() -> Self {
        let path = Self::config_path();
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => {
                        tracing::debug!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file: {}", e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config file: {}", e);
                }
            }
        }
        Self::default()
    }

    /// Save config to file
    pub fn save(&self) -> anyhow::Result<()> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)?;
        Ok(())
    }
}
