//! Real-time data handler
//!
//! Doctor schedules and availability live in the external appointment
//! store, reached through an injected backend. This handler fetches the
//! raw answer and phrases it for the user.

use crate::error::{FrontdeskError, Result};
use crate::handlers::{Handler, HandlerReply};
use crate::llm::{ChatMessage, LlmClient};
use crate::state::{ConversationState, HandlerKind};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// The appointment-store query service
#[async_trait]
pub trait DataBackend: Send + Sync {
    /// Answer a natural-language question against live clinic data
    async fn query(&self, question: &str) -> Result<String>;
}

/// HTTP backend for the external data service
pub struct HttpDataBackend {
    http_client: reqwest::Client,
    url: String,
}

impl HttpDataBackend {
    pub fn new(url: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(FrontdeskError::Http)?;
        Ok(Self {
            http_client,
            url: url.into(),
        })
    }
}

#[derive(Serialize)]
struct DataRequest<'a> {
    question: &'a str,
}

#[derive(Deserialize)]
struct DataResponse {
    answer: String,
}

#[async_trait]
impl DataBackend for HttpDataBackend {
    async fn query(&self, question: &str) -> Result<String> {
        let url = format!("{}/query", self.url);
        let response = self
            .http_client
            .post(&url)
            .json(&DataRequest { question })
            .send()
            .await
            .map_err(|e| FrontdeskError::handler("data_query", e.to_string()))?;

        if !response.status().is_success() {
            return Err(FrontdeskError::handler(
                "data_query",
                format!("data service error (HTTP {})", response.status()),
            ));
        }

        let parsed: DataResponse = response
            .json()
            .await
            .map_err(|e| FrontdeskError::handler("data_query", e.to_string()))?;
        Ok(parsed.answer)
    }
}

/// Answers schedule and availability questions
pub struct DataQueryHandler {
    client: Arc<dyn LlmClient>,
    backend: Arc<dyn DataBackend>,
}

impl DataQueryHandler {
    pub fn new(client: Arc<dyn LlmClient>, backend: Arc<dyn DataBackend>) -> Self {
        Self { client, backend }
    }
}

#[async_trait]
impl Handler for DataQueryHandler {
    fn kind(&self) -> HandlerKind {
        HandlerKind::DataQuery
    }

    async fn handle(&self, _state: &mut ConversationState, query: &str) -> Result<HandlerReply> {
        let raw_answer = self.backend.query(query).await?;

        let messages = vec![
            ChatMessage::system(
                "You are a clinic receptionist. Rephrase the raw data below \
                 into one short friendly answer to the user's question. Do \
                 not add information that is not in the data.",
            ),
            ChatMessage::user(format!("Data: {}\nQuestion: {}", raw_answer, query)),
        ];

        let answer = self.client.chat_completion(messages).await?;
        Ok(HandlerReply::closed(answer))
    }
}
