//! Knowledge-base inquiry handler
//!
//! Retrieves and reranks supporting passages, then synthesizes an answer
//! grounded in them. An unreachable index degrades the answer instead of
//! failing the turn.

use crate::error::{FrontdeskError, Result};
use crate::handlers::{Handler, HandlerReply};
use crate::llm::{ChatMessage, LlmClient};
use crate::retrieval::{RetrievalCandidate, RetrievalPipeline};
use crate::state::{ConversationState, HandlerKind};
use async_trait::async_trait;
use std::sync::Arc;

const NO_RESULTS_MESSAGE: &str =
    "I could not find anything about that in our clinic documentation. \
     Could you rephrase, or ask about our treatments and prices?";

const INDEX_DOWN_MESSAGE: &str =
    "Our knowledge base is temporarily unreachable, so I cannot look that \
     up right now. Please try again in a moment.";

/// Answers informational questions from the clinic knowledge base
pub struct InquiryHandler {
    client: Arc<dyn LlmClient>,
    pipeline: Arc<RetrievalPipeline>,
    top_k: usize,
}

impl InquiryHandler {
    pub fn new(client: Arc<dyn LlmClient>, pipeline: Arc<RetrievalPipeline>, top_k: usize) -> Self {
        Self {
            client,
            pipeline,
            top_k,
        }
    }

    fn build_synthesis_messages(query: &str, passages: &[RetrievalCandidate]) -> Vec<ChatMessage> {
        let mut context = String::new();
        for (i, passage) in passages.iter().enumerate() {
            context.push_str(&format!("[{}] {}\n{}\n\n", i + 1, passage.title, passage.text));
        }

        vec![
            ChatMessage::system(
                "You are a dermatology clinic assistant. Answer the user's \
                 question using ONLY the passages below. If the passages do \
                 not contain the answer, say so honestly. Be concise.",
            ),
            ChatMessage::user(format!("Passages:\n{}\nQuestion: {}", context, query)),
        ]
    }
}

#[async_trait]
impl Handler for InquiryHandler {
    fn kind(&self) -> HandlerKind {
        HandlerKind::Inquiry
    }

    async fn handle(&self, _state: &mut ConversationState, query: &str) -> Result<HandlerReply> {
        let passages = match self.pipeline.retrieve(query, self.top_k).await {
            Ok(passages) => passages,
            Err(FrontdeskError::Index(e)) => {
                tracing::warn!("Vector index unreachable: {}", e);
                return Ok(HandlerReply::closed(INDEX_DOWN_MESSAGE));
            }
            Err(e) => return Err(e),
        };

        if passages.is_empty() {
            return Ok(HandlerReply::closed(NO_RESULTS_MESSAGE));
        }

        let messages = Self::build_synthesis_messages(query, &passages);
        let answer = self.client.chat_completion(messages).await?;
        Ok(HandlerReply::closed(answer))
    }
}
