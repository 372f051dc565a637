//! Retrieve-then-rerank pipeline
//!
//! embed -> vector search (over-fetched pool) -> feature extraction ->
//! batched rerank -> sort -> truncate. Recall is the vector search's job,
//! precision the reranker's; the reranker only discriminates inside an
//! already-relevant pool. Reranker loss is a degraded mode, never a
//! failure: the call falls back to vector-score ordering.

use crate::error::{FrontdeskError, Result};
use crate::llm::Embedder;
use crate::rerank::{extract, FeatureVector, RerankModel};
use crate::vector::VectorIndex;
use std::cmp::Ordering;
use std::sync::Arc;

/// One document chunk under consideration for an answer's context
#[derive(Debug, Clone)]
pub struct RetrievalCandidate {
    /// Stable identifier from the vector index
    pub id: String,
    /// Retrievable content
    pub text: String,
    /// Document heading, used as a rerank feature
    pub title: String,
    /// Similarity score from the nearest-neighbor search
    pub vector_score: f32,
    /// Fixed-schema reranker input
    pub features: FeatureVector,
    /// Present only after reranking succeeds
    pub rerank_score: Option<f32>,
}

impl RetrievalCandidate {
    /// Best available sort key: rerank score when present, else vector
    /// score. Within one returned set the kind is uniform, never mixed.
    pub fn best_score(&self) -> f32 {
        self.rerank_score.unwrap_or(self.vector_score)
    }
}

/// Orchestrates embed, search, feature extraction, rerank, truncate
pub struct RetrievalPipeline {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    /// Resolved once at startup; `None` means permanent fallback mode
    reranker: Option<Arc<dyn RerankModel>>,
    /// Over-fetch size for the vector search; must exceed any `top_k`
    candidate_pool: usize,
}

impl RetrievalPipeline {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        reranker: Option<Arc<dyn RerankModel>>,
        candidate_pool: usize,
    ) -> Self {
        if reranker.is_none() {
            tracing::info!("Reranker unavailable; ordering by vector score");
        }
        Self {
            embedder,
            index,
            reranker,
            candidate_pool,
        }
    }

    /// Whether a reranker model is loaded
    pub fn reranker_loaded(&self) -> bool {
        self.reranker.is_some()
    }

    /// Retrieve the `top_k` most relevant passages for `query`
    pub async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<RetrievalCandidate>> {
        if query.trim().is_empty() {
            return Err(FrontdeskError::InvalidInput(
                "empty retrieval query".to_string(),
            ));
        }

        // Stage 1: embed. No vector means nothing to search with.
        let vector = self.embedder.embed(query).await?;

        // Stage 2: over-fetched nearest-neighbor search
        let hits = self.index.search(&vector, self.candidate_pool).await?;
        if hits.is_empty() {
            tracing::info!(query = %query, "No hits in vector index");
            return Ok(Vec::new());
        }

        // Stage 3: pure feature extraction per candidate
        let mut candidates: Vec<RetrievalCandidate> = hits
            .into_iter()
            .map(|hit| {
                let text = hit.payload_str("full_text").to_string();
                let title = hit.payload_str("h1").to_string();
                let features = extract(query, &text, &title, hit.score);
                RetrievalCandidate {
                    id: hit.id,
                    text,
                    title,
                    vector_score: hit.score,
                    features,
                    rerank_score: None,
                }
            })
            .collect();

        // Stage 4: one batched rerank call, skippable
        if let Some(ref model) = self.reranker {
            let batch: Vec<FeatureVector> = candidates.iter().map(|c| c.features).collect();
            match model.score(&batch) {
                Ok(scores) if scores.len() == candidates.len() => {
                    for (candidate, score) in candidates.iter_mut().zip(scores) {
                        candidate.rerank_score = Some(score);
                    }
                }
                Ok(scores) => {
                    tracing::warn!(
                        expected = candidates.len(),
                        got = scores.len(),
                        "Reranker returned wrong batch size, falling back to vector order"
                    );
                }
                Err(e) => {
                    tracing::warn!("Reranking failed: {}, falling back to vector order", e);
                }
            }
        }

        // Stage 5: sort by a single score kind, truncate.
        // Candidates never mix kinds: either every rerank_score was set
        // above, or none was.
        candidates.sort_by(|a, b| {
            b.best_score()
                .partial_cmp(&a.best_score())
                .unwrap_or(Ordering::Equal)
        });
        candidates.truncate(top_k);
        Ok(candidates)
    }
}
