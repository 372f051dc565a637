//! Appointment booking handler
//!
//! Multi-turn: extracts whatever booking fields the user has provided so
//! far, keeps them in the session's task data, and asks for what is still
//! missing. The task stays open across turns until every field is present
//! or the user cancels.

use crate::error::Result;
use crate::handlers::{Handler, HandlerReply};
use crate::llm::{ChatMessage, LlmClient};
use crate::state::{ConversationState, HandlerKind, Role};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Fields a complete booking needs, in display order
pub const REQUIRED_FIELDS: [&str; 4] = ["patient_name", "phone", "preferred_date", "treatment"];

/// Marker entry keeping the task non-empty while fields trickle in
const STAGE_KEY: &str = "stage";

const CANCEL_KEYWORDS: [&str; 3] = ["cancel", "batal", "nevermind"];

const CANCELLED_MESSAGE: &str =
    "No problem, I've cancelled the booking. Let me know if you need anything else.";

/// Collects booking details across turns
pub struct BookingHandler {
    client: Arc<dyn LlmClient>,
}

impl BookingHandler {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }

    /// Pull booking fields out of the recent conversation as JSON
    async fn extract_fields(
        &self,
        state: &ConversationState,
        query: &str,
    ) -> Result<BTreeMap<String, String>> {
        let mut messages = vec![ChatMessage::system(
            "You extract appointment booking details from a conversation. \
             Respond ONLY with JSON holding these keys: patient_name, phone, \
             preferred_date, treatment. Use null for anything the user has \
             not provided. Never guess or invent values.",
        )];

        let start = state.history.len().saturating_sub(8);
        for msg in &state.history[start..] {
            messages.push(match msg.role {
                Role::User => ChatMessage::user(&msg.content),
                Role::Assistant => ChatMessage::assistant(&msg.content),
            });
        }
        messages.push(ChatMessage::user(query));

        let response = self.client.chat_completion(messages).await?;
        Ok(parse_extracted_fields(&response))
    }

    /// Phrase the request for whatever is still missing
    async fn ask_for_missing(
        &self,
        collected: &BTreeMap<String, String>,
        missing: &[&str],
    ) -> Result<String> {
        let known: Vec<String> = collected
            .iter()
            .filter(|(k, _)| *k != STAGE_KEY)
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect();

        let messages = vec![
            ChatMessage::system(
                "You are a friendly clinic receptionist finishing a booking. \
                 Politely ask the user for the missing details in one short \
                 message. Acknowledge what you already have.",
            ),
            ChatMessage::user(format!(
                "Already collected: {}\nStill missing: {}",
                if known.is_empty() {
                    "nothing yet".to_string()
                } else {
                    known.join(", ")
                },
                missing.join(", ")
            )),
        ];

        self.client.chat_completion(messages).await
    }

    fn confirmation_message(collected: &BTreeMap<String, String>) -> String {
        let mut lines = vec!["Your booking is noted:".to_string()];
        for field in REQUIRED_FIELDS {
            if let Some(value) = collected.get(field) {
                lines.push(format!("- {}: {}", field.replace('_', " "), value));
            }
        }
        lines.push("We'll confirm your appointment shortly. Anything else?".to_string());
        lines.join("\n")
    }
}

/// Parse the extractor's JSON, keeping only non-null, non-empty strings
fn parse_extracted_fields(response: &str) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();

    let json_str = match (response.find('{'), response.rfind('}')) {
        (Some(start), Some(end)) if start < end => &response[start..=end],
        _ => return fields,
    };

    let parsed: serde_json::Value = match serde_json::from_str(json_str) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!("Booking extraction returned non-JSON: {}", e);
            return fields;
        }
    };

    for field in REQUIRED_FIELDS {
        if let Some(value) = parsed.get(field).and_then(|v| v.as_str()) {
            if !value.trim().is_empty() {
                fields.insert(field.to_string(), value.trim().to_string());
            }
        }
    }
    fields
}

fn is_cancellation(query: &str) -> bool {
    let q = query.to_lowercase();
    CANCEL_KEYWORDS.iter().any(|w| q.contains(w))
}

#[async_trait]
impl Handler for BookingHandler {
    fn kind(&self) -> HandlerKind {
        HandlerKind::Booking
    }

    async fn handle(&self, state: &mut ConversationState, query: &str) -> Result<HandlerReply> {
        if is_cancellation(query) {
            state.close_task();
            return Ok(HandlerReply::closed(CANCELLED_MESSAGE));
        }

        // Carry forward fields from previous turns, then merge new ones
        let mut collected: BTreeMap<String, String> = state
            .task_data()
            .iter()
            .filter(|(k, _)| *k != STAGE_KEY)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        collected.extend(self.extract_fields(state, query).await?);

        let missing: Vec<&str> = REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|f| !collected.contains_key(*f))
            .collect();

        if missing.is_empty() {
            let text = Self::confirmation_message(&collected);
            state.close_task();
            return Ok(HandlerReply::closed(text));
        }

        let text = self.ask_for_missing(&collected, &missing).await?;

        let mut task_data = collected;
        task_data.insert(STAGE_KEY.to_string(), "collecting".to_string());
        state.open_task(HandlerKind::Booking, task_data);

        Ok(HandlerReply::open(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extraction_keeps_non_null_fields() {
        let fields = parse_extracted_fields(
            r#"{"patient_name": "Sari", "phone": null, "preferred_date": "", "treatment": "facial"}"#,
        );
        assert_eq!(fields.len(), 2);
        assert_eq!(fields["patient_name"], "Sari");
        assert_eq!(fields["treatment"], "facial");
    }

    #[test]
    fn extraction_survives_junk() {
        assert!(parse_extracted_fields("not json at all").is_empty());
        assert!(parse_extracted_fields("{broken").is_empty());
    }

    #[test]
    fn cancellation_detection() {
        assert!(is_cancellation("please CANCEL my booking"));
        assert!(is_cancellation("batal saja"));
        assert!(!is_cancellation("book me tomorrow"));
    }
}
