//! Configuration management

use crate::error::{FrontdeskError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// LLM service configuration (chat completions + embeddings)
    #[serde(default)]
    pub llm_service: LlmServiceConfig,

    /// Vector index configuration
    #[serde(default)]
    pub vector_index: VectorIndexConfig,

    /// Reranker model registry configuration
    #[serde(default)]
    pub reranker: RerankerConfig,

    /// Router configuration
    #[serde(default)]
    pub router: RouterConfig,

    /// External appointment-data service configuration
    #[serde(default)]
    pub data_service: DataServiceConfig,
}

/// External appointment-data service (schedules, availability)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataServiceConfig {
    /// Base URL of the data query service
    pub url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for DataServiceConfig {
    fn default() -> Self {
        Self {
            url: std::env::var("FRONTDESK_DATA_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            timeout_secs: default_timeout(),
        }
    }
}

/// LLM service configuration for external inference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmServiceConfig {
    /// Base URL of the LLM service for chat/completions
    pub url: String,

    /// Model name for chat completions (routing, extraction, synthesis)
    #[serde(default = "default_chat_model")]
    pub model: String,

    /// Base URL for embeddings service (can be different from LLM URL)
    #[serde(default)]
    pub embedding_url: Option<String>,

    /// Model name for embeddings
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Embedding dimensions
    #[serde(default = "default_embedding_dimensions")]
    pub embedding_dimensions: usize,

    /// API key (optional, for authenticated services)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl LlmServiceConfig {
    /// Get the embeddings URL (falls back to main URL if not specified)
    pub fn embeddings_url(&self) -> &str {
        self.embedding_url.as_deref().unwrap_or(&self.url)
    }
}

impl Default for LlmServiceConfig {
    fn default() -> Self {
        Self {
            url: std::env::var("FRONTDESK_LLM_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            model: default_chat_model(),
            embedding_url: std::env::var("FRONTDESK_EMBEDDING_URL").ok(),
            embedding_model: default_embedding_model(),
            embedding_dimensions: std::env::var("FRONTDESK_EMBEDDING_DIMS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_embedding_dimensions),
            api_key: std::env::var("FRONTDESK_LLM_API_KEY").ok(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_chat_model() -> String {
    std::env::var("FRONTDESK_LLM_MODEL")
        .unwrap_or_else(|_| "meta-llama/Llama-3.1-70B-Instruct".to_string())
}

fn default_embedding_model() -> String {
    std::env::var("FRONTDESK_EMBEDDING_MODEL")
        .unwrap_or_else(|_| "Qwen/Qwen3-Embedding-8B".to_string())
}

fn default_embedding_dimensions() -> usize {
    4096
}

fn default_timeout() -> u64 {
    30
}

/// Vector index (Qdrant) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorIndexConfig {
    /// Base URL of the Qdrant HTTP API
    pub url: String,

    /// Collection to search
    #[serde(default = "default_collection")]
    pub collection: String,

    /// API key (optional)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for VectorIndexConfig {
    fn default() -> Self {
        Self {
            url: std::env::var("FRONTDESK_QDRANT_URL")
                .unwrap_or_else(|_| "http://localhost:6333".to_string()),
            collection: std::env::var("FRONTDESK_QDRANT_COLLECTION")
                .unwrap_or_else(|_| default_collection()),
            api_key: std::env::var("FRONTDESK_QDRANT_API_KEY").ok(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_collection() -> String {
    "clinic_knowledge".to_string()
}

/// Reranker model registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerankerConfig {
    /// Base URL of the model registry; empty disables the reranker
    #[serde(default)]
    pub registry_url: Option<String>,

    /// Registered model name
    #[serde(default = "default_reranker_model")]
    pub model_name: String,

    /// Registry stage to resolve at startup
    #[serde(default = "default_reranker_stage")]
    pub stage: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for RerankerConfig {
    fn default() -> Self {
        Self {
            registry_url: std::env::var("FRONTDESK_REGISTRY_URL").ok(),
            model_name: std::env::var("FRONTDESK_RERANKER_MODEL")
                .unwrap_or_else(|_| default_reranker_model()),
            stage: std::env::var("FRONTDESK_RERANKER_STAGE")
                .unwrap_or_else(|_| default_reranker_stage()),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_reranker_model() -> String {
    "passage-reranker".to_string()
}

fn default_reranker_stage() -> String {
    "staging".to_string()
}

/// Router / retrieval tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Maximum handler dispatches per turn before the turn is forced done
    #[serde(default = "default_max_hops")]
    pub max_hops: usize,

    /// How many candidates the vector search over-fetches for the reranker
    #[serde(default = "default_candidate_pool")]
    pub candidate_pool: usize,

    /// How many passages a retrieval call returns
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            max_hops: default_max_hops(),
            candidate_pool: default_candidate_pool(),
            top_k: default_top_k(),
        }
    }
}

fn default_max_hops() -> usize {
    2
}

fn default_candidate_pool() -> usize {
    40
}

fn default_top_k() -> usize {
    5
}

impl Config {
    /// Load config from default path, falling back to env-driven defaults
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Config::default())
        }
    }

    /// Load config from an explicit path
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to default path
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::CONFIG_DIR_NAME)
            .join("config.yml")
    }

    /// Reject configurations the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.router.top_k == 0 {
            return Err(FrontdeskError::Config("top_k must be at least 1".into()));
        }
        if self.router.candidate_pool <= self.router.top_k {
            return Err(FrontdeskError::Config(format!(
                "candidate_pool ({}) must exceed top_k ({})",
                self.router.candidate_pool, self.router.top_k
            )));
        }
        if self.router.max_hops == 0 {
            return Err(FrontdeskError::Config("max_hops must be at least 1".into()));
        }
        Ok(())
    }
}
