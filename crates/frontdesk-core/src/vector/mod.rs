//! Vector index access
//!
//! The index is a stateless remote service (Qdrant HTTP API); one pooled
//! client per process, no local locking.

use crate::config::VectorIndexConfig;
use crate::error::{FrontdeskError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One nearest-neighbor hit
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// Stable identifier from the index
    pub id: String,
    /// Similarity score, comparable only within one query's result set
    pub score: f32,
    /// Stored payload (document text, headings, metadata)
    pub payload: serde_json::Value,
}

impl SearchHit {
    /// Payload string field, empty if absent
    pub fn payload_str(&self, key: &str) -> &str {
        self.payload.get(key).and_then(|v| v.as_str()).unwrap_or("")
    }
}

/// Nearest-neighbor search over stored vectors
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Return up to `limit` nearest hits, best first
    async fn search(&self, vector: &[f32], limit: usize) -> Result<Vec<SearchHit>>;
}

/// Qdrant-backed index client
pub struct QdrantIndex {
    http_client: reqwest::Client,
    config: VectorIndexConfig,
}

impl QdrantIndex {
    pub fn new(config: VectorIndexConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(FrontdeskError::Http)?;
        Ok(Self {
            http_client,
            config,
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(VectorIndexConfig::default())
    }

    pub fn collection(&self) -> &str {
        &self.config.collection
    }
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    query: &'a [f32],
    limit: usize,
    with_payload: bool,
}

#[derive(Deserialize)]
struct QueryResponse {
    result: QueryResult,
}

#[derive(Deserialize)]
struct QueryResult {
    points: Vec<ScoredPoint>,
}

#[derive(Deserialize)]
struct ScoredPoint {
    // Qdrant point ids are either integers or UUID strings
    id: serde_json::Value,
    score: f32,
    #[serde(default)]
    payload: serde_json::Value,
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn search(&self, vector: &[f32], limit: usize) -> Result<Vec<SearchHit>> {
        let url = format!(
            "{}/collections/{}/points/query",
            self.config.url, self.config.collection
        );

        let request = QueryRequest {
            query: vector,
            limit,
            with_payload: true,
        };

        let mut req = self.http_client.post(&url).json(&request);
        if let Some(ref api_key) = self.config.api_key {
            req = req.header("api-key", api_key);
        }

        let response = req
            .send()
            .await
            .map_err(|e| FrontdeskError::Index(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(FrontdeskError::Index(format!(
                "Qdrant error (HTTP {}): {}",
                status, body
            )));
        }

        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| FrontdeskError::Index(e.to_string()))?;

        Ok(parsed
            .result
            .points
            .into_iter()
            .map(|p| SearchHit {
                id: match p.id {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                },
                score: p.score,
                payload: p.payload,
            })
            .collect())
    }
}
