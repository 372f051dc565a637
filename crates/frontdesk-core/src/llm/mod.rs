//! LLM integration
//!
//! Traits and implementations for:
//! - Chat completions and embeddings via OpenAI-compatible services
//! - Intent classification over a closed route-label set

mod classifier;
mod client;
mod http_embedder;
mod traits;

pub use classifier::{IntentClassifier, LlmClassifier, StaticClassifier};
pub use client::{ApiMetrics, MetricsSnapshot, OpenAiClient};
pub use http_embedder::HttpEmbedder;
pub use traits::*;
