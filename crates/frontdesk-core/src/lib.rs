//! Frontdesk Core Library
//!
//! Conversational core for a clinic assistant:
//! - Turn routing over a closed label set with an LLM classifier
//! - Multi-turn handler task state with a single-owner invariant
//! - Retrieve-then-rerank pipeline (embed, vector search, learned rerank)
//! - Mandatory degraded modes: vector-score fallback, GENERAL fallback
//!
//! Transport, chat UI, and the appointment store are external; they drive
//! [`Router::process_turn`] and own per-session serialization.

pub mod config;
pub mod error;
pub mod handlers;
pub mod llm;
pub mod rerank;
pub mod retrieval;
pub mod router;
pub mod state;
pub mod vector;

pub use config::{
    Config, DataServiceConfig, LlmServiceConfig, RerankerConfig, RouterConfig, VectorIndexConfig,
};
pub use error::{Error, FrontdeskError, Result};
pub use handlers::{
    BookingHandler, DataBackend, DataQueryHandler, GeneralHandler, Handler, HandlerOutcome,
    HandlerReply, HttpDataBackend, InquiryHandler,
};
pub use llm::{
    ChatMessage, Embedder, HttpEmbedder, IntentClassifier, LlmClassifier, LlmClient,
    MetricsSnapshot, OpenAiClient, StaticClassifier,
};
pub use rerank::{
    extract, load_reranker, FeatureVector, LinearRerankModel, ModelRegistryClient, RerankModel,
    FEATURE_DIM,
};
pub use retrieval::{RetrievalCandidate, RetrievalPipeline};
pub use router::{HandlerSet, Router, TurnPhase};
pub use state::{ConversationState, HandlerKind, Message, Role, RouteLabel};
pub use vector::{QdrantIndex, SearchHit, VectorIndex};

/// Default config directory name
pub const CONFIG_DIR_NAME: &str = "frontdesk";
