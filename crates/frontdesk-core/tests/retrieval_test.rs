//! Retrieval pipeline integration tests over mock services

use async_trait::async_trait;
use frontdesk_core::{
    ChatMessage, ConversationState, Embedder, FeatureVector, FrontdeskError, Handler,
    HandlerOutcome, InquiryHandler, LlmClient, RerankModel, Result, RetrievalPipeline, SearchHit,
    VectorIndex,
};
use std::sync::Arc;

struct FixedEmbedder;

#[async_trait]
impl Embedder for FixedEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![0.1, 0.2, 0.3, 0.4])
    }

    fn dimensions(&self) -> usize {
        4
    }

    fn model_name(&self) -> &str {
        "mock-embedder"
    }
}

struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(FrontdeskError::provider("embedding", "provider timeout"))
    }

    fn dimensions(&self) -> usize {
        4
    }

    fn model_name(&self) -> &str {
        "failing-embedder"
    }
}

struct StaticIndex {
    hits: Vec<(&'static str, f32, &'static str)>,
}

#[async_trait]
impl VectorIndex for StaticIndex {
    async fn search(&self, _vector: &[f32], limit: usize) -> Result<Vec<SearchHit>> {
        Ok(self
            .hits
            .iter()
            .take(limit)
            .map(|(id, score, text)| SearchHit {
                id: id.to_string(),
                score: *score,
                payload: serde_json::json!({ "full_text": text, "h1": "Treatments" }),
            })
            .collect())
    }
}

struct DownIndex;

#[async_trait]
impl VectorIndex for DownIndex {
    async fn search(&self, _vector: &[f32], _limit: usize) -> Result<Vec<SearchHit>> {
        Err(FrontdeskError::Index("connection refused".to_string()))
    }
}

/// Inverts the vector-score order so reranking visibly changes results
struct InvertingModel;

impl RerankModel for InvertingModel {
    fn score(&self, batch: &[FeatureVector]) -> Result<Vec<f32>> {
        Ok(batch.iter().map(|row| -row[0]).collect())
    }

    fn version(&self) -> &str {
        "inverting-test-model"
    }
}

struct FailingModel;

impl RerankModel for FailingModel {
    fn score(&self, _batch: &[FeatureVector]) -> Result<Vec<f32>> {
        Err(FrontdeskError::ModelUnavailable("scoring blew up".to_string()))
    }

    fn version(&self) -> &str {
        "failing-test-model"
    }
}

fn sample_index() -> Arc<StaticIndex> {
    Arc::new(StaticIndex {
        hits: vec![
            ("doc-a", 0.95, "Facial glow treatment starts at Rp. 250.000"),
            ("doc-b", 0.90, "Chemical peel pricing and aftercare"),
            ("doc-c", 0.85, "Acne consultation overview"),
            ("doc-d", 0.80, "Laser resurfacing availability"),
            ("doc-e", 0.75, "Clinic opening hours and location"),
            ("doc-f", 0.70, "Sunscreen product catalogue"),
            ("doc-g", 0.65, "Dermatology staff introductions"),
        ],
    })
}

fn pipeline_with(model: Option<Arc<dyn RerankModel>>) -> RetrievalPipeline {
    RetrievalPipeline::new(Arc::new(FixedEmbedder), sample_index(), model, 40)
}

#[tokio::test]
async fn reranked_output_is_bounded_and_sorted() {
    let pipeline = pipeline_with(Some(Arc::new(InvertingModel)));
    let results = pipeline.retrieve("harga facial", 5).await.unwrap();

    assert!(results.len() <= 5);
    assert!(results.iter().all(|c| c.rerank_score.is_some()));
    for pair in results.windows(2) {
        assert!(pair[0].rerank_score.unwrap() >= pair[1].rerank_score.unwrap());
    }
    // Inverted scores: the weakest vector hit comes first
    assert_eq!(results[0].id, "doc-g");
}

#[tokio::test]
async fn fallback_orders_by_vector_score() {
    let pipeline = pipeline_with(None);
    let results = pipeline.retrieve("harga facial", 5).await.unwrap();

    assert_eq!(results.len(), 5);
    assert!(results.iter().all(|c| c.rerank_score.is_none()));
    for pair in results.windows(2) {
        assert!(pair[0].vector_score >= pair[1].vector_score);
    }
    assert_eq!(results[0].id, "doc-a");
}

#[tokio::test]
async fn reranker_failure_degrades_not_fails() {
    let pipeline = pipeline_with(Some(Arc::new(FailingModel)));
    let results = pipeline.retrieve("harga facial", 5).await.unwrap();

    assert!(results.len() <= 5);
    assert!(results.iter().all(|c| c.rerank_score.is_none()));
    assert_eq!(results[0].id, "doc-a");
}

#[tokio::test]
async fn empty_index_returns_empty_not_error() {
    let empty = Arc::new(StaticIndex { hits: vec![] });
    let pipeline = RetrievalPipeline::new(Arc::new(FixedEmbedder), empty, None, 40);
    let results = pipeline.retrieve("facial price", 5).await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn retrieval_is_idempotent() {
    let pipeline = pipeline_with(Some(Arc::new(InvertingModel)));
    let first = pipeline.retrieve("harga facial", 5).await.unwrap();
    let second = pipeline.retrieve("harga facial", 5).await.unwrap();

    let first_ids: Vec<_> = first.iter().map(|c| c.id.as_str()).collect();
    let second_ids: Vec<_> = second.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(first_ids, second_ids);
}

#[tokio::test]
async fn embedding_failure_is_fatal_to_the_call() {
    let pipeline = RetrievalPipeline::new(Arc::new(FailingEmbedder), sample_index(), None, 40);
    let err = pipeline.retrieve("anything", 5).await.unwrap_err();
    assert!(matches!(
        err,
        FrontdeskError::Provider {
            stage: "embedding",
            ..
        }
    ));
}

#[tokio::test]
async fn unreachable_index_surfaces_index_error() {
    let pipeline = RetrievalPipeline::new(Arc::new(FixedEmbedder), Arc::new(DownIndex), None, 40);
    let err = pipeline.retrieve("anything", 5).await.unwrap_err();
    assert!(matches!(err, FrontdeskError::Index(_)));
}

/// Chat client that always answers the same thing
struct EchoLlm;

#[async_trait]
impl LlmClient for EchoLlm {
    async fn chat_completion(&self, _messages: Vec<ChatMessage>) -> Result<String> {
        Ok("synthesized answer".to_string())
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(FrontdeskError::Llm("not an embedder".to_string()))
    }

    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(FrontdeskError::Llm("not an embedder".to_string()))
    }

    fn embedding_dimensions(&self) -> usize {
        0
    }

    fn model_name(&self) -> &str {
        "echo"
    }
}

#[tokio::test]
async fn inquiry_survives_unreachable_index() {
    let pipeline = Arc::new(RetrievalPipeline::new(
        Arc::new(FixedEmbedder),
        Arc::new(DownIndex),
        None,
        40,
    ));
    let handler = InquiryHandler::new(Arc::new(EchoLlm), pipeline, 5);

    let mut state = ConversationState::new();
    let reply = handler.handle(&mut state, "harga facial?").await.unwrap();

    assert_eq!(reply.outcome, HandlerOutcome::Closed);
    assert!(reply.text.contains("unreachable"));
}

#[tokio::test]
async fn inquiry_answers_honestly_on_empty_index() {
    let empty = Arc::new(StaticIndex { hits: vec![] });
    let pipeline = Arc::new(RetrievalPipeline::new(
        Arc::new(FixedEmbedder),
        empty,
        None,
        40,
    ));
    let handler = InquiryHandler::new(Arc::new(EchoLlm), pipeline, 5);

    let mut state = ConversationState::new();
    let reply = handler.handle(&mut state, "harga facial?").await.unwrap();

    assert_eq!(reply.outcome, HandlerOutcome::Closed);
    assert!(reply.text.contains("could not find"));
}

#[tokio::test]
async fn inquiry_synthesizes_from_passages() {
    let pipeline = Arc::new(RetrievalPipeline::new(
        Arc::new(FixedEmbedder),
        sample_index(),
        None,
        40,
    ));
    let handler = InquiryHandler::new(Arc::new(EchoLlm), pipeline, 5);

    let mut state = ConversationState::new();
    let reply = handler.handle(&mut state, "harga facial?").await.unwrap();

    assert_eq!(reply.outcome, HandlerOutcome::Closed);
    assert_eq!(reply.text, "synthesized answer");
}

#[tokio::test]
async fn empty_query_is_rejected() {
    let pipeline = pipeline_with(None);
    let err = pipeline.retrieve("   ", 5).await.unwrap_err();
    assert!(matches!(err, FrontdeskError::InvalidInput(_)));
}
