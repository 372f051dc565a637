//! Intent classification over a closed label set
//!
//! The LLM decides which handler runs next, but it is never trusted to
//! produce control values: anything outside the closed set, and any
//! provider failure, is coerced to `GENERAL` at this boundary.

use crate::llm::{ChatMessage, LlmClient};
use crate::state::{Message, Role, RouteLabel};
use async_trait::async_trait;
use std::sync::Arc;

/// How many trailing history messages the classifier sees
const CONTEXT_WINDOW: usize = 8;

/// Routing decision step, abstracted for testing
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    /// Produce exactly one label for the next hop. Implementations must
    /// not fail: unclassifiable input maps to `RouteLabel::General`.
    async fn classify(&self, history: &[Message], query: &str) -> RouteLabel;
}

/// Classifier backed by a chat-completion call
pub struct LlmClassifier {
    client: Arc<dyn LlmClient>,
}

impl LlmClassifier {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }

    fn build_messages(&self, history: &[Message], query: &str) -> Vec<ChatMessage> {
        let system = r#"You are the dispatcher for a dermatology clinic assistant.
Pick exactly one route for the user's latest message:

- INQUIRY: questions about prices, treatments, locations, or medical info.
- DATA_QUERY: real-time doctor schedules or appointment availability.
- BOOKING: the user wants to create or cancel an appointment.
- GENERAL: greetings, thanks, small talk.
- FINISH: the previous assistant message already fully answers the user
  and no further work is needed.

Respond ONLY with JSON: {"route": "<LABEL>"}"#;

        let mut messages = vec![ChatMessage::system(system)];
        let start = history.len().saturating_sub(CONTEXT_WINDOW);
        for msg in &history[start..] {
            messages.push(match msg.role {
                Role::User => ChatMessage::user(&msg.content),
                Role::Assistant => ChatMessage::assistant(&msg.content),
            });
        }
        messages.push(ChatMessage::user(query));
        messages
    }
}

#[async_trait]
impl IntentClassifier for LlmClassifier {
    async fn classify(&self, history: &[Message], query: &str) -> RouteLabel {
        let messages = self.build_messages(history, query);

        let response = match self.client.chat_completion(messages).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Classification call failed: {}, routing to GENERAL", e);
                return RouteLabel::General;
            }
        };

        match parse_route_response(&response) {
            Ok(label) => label,
            Err(raw) => {
                tracing::debug!(raw = %raw, "Unrecognized route label, coercing to GENERAL");
                RouteLabel::General
            }
        }
    }
}

/// Extract a route label from the model's output. Returns the offending
/// text on failure so the caller can log it.
fn parse_route_response(response: &str) -> std::result::Result<RouteLabel, String> {
    // The model may wrap JSON in prose or code fences
    let json_str = match (response.find('{'), response.rfind('}')) {
        (Some(start), Some(end)) if start < end => &response[start..=end],
        _ => return RouteLabel::parse(response).ok_or_else(|| response.to_string()),
    };

    let parsed: serde_json::Value = match serde_json::from_str(json_str) {
        Ok(value) => value,
        Err(_) => return Err(response.to_string()),
    };

    parsed["route"]
        .as_str()
        .and_then(RouteLabel::parse)
        .ok_or_else(|| response.to_string())
}

/// A fixed-answer classifier for tests and offline runs
pub struct StaticClassifier(pub RouteLabel);

#[async_trait]
impl IntentClassifier for StaticClassifier {
    async fn classify(&self, _history: &[Message], _query: &str) -> RouteLabel {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_json() {
        let label = parse_route_response(r#"{"route": "BOOKING"}"#).unwrap();
        assert_eq!(label, RouteLabel::Booking);
    }

    #[test]
    fn parses_fenced_json() {
        let response = "Sure, here you go:\n```json\n{\"route\": \"DATA_QUERY\"}\n```";
        assert_eq!(
            parse_route_response(response).unwrap(),
            RouteLabel::DataQuery
        );
    }

    #[test]
    fn parses_bare_label() {
        assert_eq!(parse_route_response("inquiry").unwrap(), RouteLabel::Inquiry);
    }

    #[test]
    fn unknown_label_is_an_error_here() {
        assert!(parse_route_response(r#"{"route": "XYZ"}"#).is_err());
        assert!(parse_route_response("garbage output").is_err());
        assert_eq!(
            parse_route_response(r#"{"route": "XYZ"}"#).unwrap_or(RouteLabel::General),
            RouteLabel::General
        );
    }
}
