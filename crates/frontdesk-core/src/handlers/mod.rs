//! Specialized turn handlers
//!
//! Each handler takes the session state and the current query and returns
//! its user-visible text plus a completion flag. The router owns history
//! appends and output streaming; handlers own their task data.

mod booking;
mod data_query;
mod general;
mod inquiry;

pub use booking::BookingHandler;
pub use data_query::{DataBackend, DataQueryHandler, HttpDataBackend};
pub use general::GeneralHandler;
pub use inquiry::InquiryHandler;

use crate::error::Result;
use crate::state::{ConversationState, HandlerKind};
use async_trait::async_trait;

/// Whether a handler's multi-turn task remains open after this hop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerOutcome {
    /// Task finished (or was single-shot); the router may route again
    Closed,
    /// Handler needs more user input; the turn ends awaiting the user
    Open,
}

/// One handler hop's result
#[derive(Debug, Clone)]
pub struct HandlerReply {
    /// Assistant-visible text; empty means a purely internal hop
    pub text: String,
    pub outcome: HandlerOutcome,
}

impl HandlerReply {
    pub fn closed(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            outcome: HandlerOutcome::Closed,
        }
    }

    pub fn open(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            outcome: HandlerOutcome::Open,
        }
    }
}

/// A specialized handler dispatched by the router
#[async_trait]
pub trait Handler: Send + Sync {
    fn kind(&self) -> HandlerKind;

    /// Process one hop. Errors propagate to the router, which converts
    /// them into a generic apology and ends the turn.
    async fn handle(&self, state: &mut ConversationState, query: &str) -> Result<HandlerReply>;
}
