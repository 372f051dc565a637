//! Small-talk handler

use crate::error::Result;
use crate::handlers::{Handler, HandlerReply};
use crate::llm::{ChatMessage, LlmClient};
use crate::state::{ConversationState, HandlerKind, Role};
use async_trait::async_trait;
use std::sync::Arc;

/// How much history the conversational prompt carries
const CONTEXT_WINDOW: usize = 6;

/// Handles greetings and chit-chat with one chat completion
pub struct GeneralHandler {
    client: Arc<dyn LlmClient>,
}

impl GeneralHandler {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Handler for GeneralHandler {
    fn kind(&self) -> HandlerKind {
        HandlerKind::General
    }

    async fn handle(&self, state: &mut ConversationState, query: &str) -> Result<HandlerReply> {
        let mut messages = vec![ChatMessage::system(
            "You are a friendly receptionist at a dermatology clinic. \
             Answer greetings and small talk warmly and briefly. Do not \
             invent medical advice, prices, or schedules.",
        )];

        let start = state.history.len().saturating_sub(CONTEXT_WINDOW);
        for msg in &state.history[start..] {
            messages.push(match msg.role {
                Role::User => ChatMessage::user(&msg.content),
                Role::Assistant => ChatMessage::assistant(&msg.content),
            });
        }
        messages.push(ChatMessage::user(query));

        let response = self.client.chat_completion(messages).await?;
        Ok(HandlerReply::closed(response))
    }
}
