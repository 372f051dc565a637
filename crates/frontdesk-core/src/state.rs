//! Conversation state: the unit of orchestration
//!
//! One `ConversationState` per session. The caller serializes access per
//! session; a turn takes `&mut` ownership for its whole duration, so
//! concurrent turns on the same session are rejected by the borrow checker
//! rather than by locking.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Message author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single turn entry in the session history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// The specialized handlers a turn can be dispatched to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerKind {
    Inquiry,
    Booking,
    General,
    DataQuery,
}

impl HandlerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inquiry => "inquiry",
            Self::Booking => "booking",
            Self::General => "general",
            Self::DataQuery => "data_query",
        }
    }
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed label set produced by the routing decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RouteLabel {
    Inquiry,
    Booking,
    DataQuery,
    General,
    Finish,
}

impl RouteLabel {
    /// Parse a classifier output, tolerant of case and surrounding noise.
    /// Returns `None` for anything outside the closed set.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "INQUIRY" => Some(Self::Inquiry),
            "BOOKING" => Some(Self::Booking),
            "DATA_QUERY" | "DATABASE" => Some(Self::DataQuery),
            "GENERAL" => Some(Self::General),
            "FINISH" => Some(Self::Finish),
            _ => None,
        }
    }

    /// The handler this label dispatches to; `Finish` dispatches nothing
    pub fn handler(&self) -> Option<HandlerKind> {
        match self {
            Self::Inquiry => Some(HandlerKind::Inquiry),
            Self::Booking => Some(HandlerKind::Booking),
            Self::DataQuery => Some(HandlerKind::DataQuery),
            Self::General => Some(HandlerKind::General),
            Self::Finish => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inquiry => "INQUIRY",
            Self::Booking => "BOOKING",
            Self::DataQuery => "DATA_QUERY",
            Self::General => "GENERAL",
            Self::Finish => "FINISH",
        }
    }
}

impl fmt::Display for RouteLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-session orchestration state
///
/// `task_data` is owned exclusively by the handler named in
/// `active_handler`; the only mutators are [`ConversationState::open_task`],
/// [`ConversationState::update_task`] and [`ConversationState::close_task`],
/// which keep the two fields consistent: `active_handler` is set if and
/// only if `task_data` is non-empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationState {
    /// Ordered message history; insertion order is the LLM context
    pub history: Vec<Message>,

    /// The user utterance currently being processed
    pub current_query: String,

    /// Last routing decision; valid only during the current turn and
    /// cleared when the turn completes. Observing a decision outside a
    /// turn means the turn was abandoned mid-stream.
    pub routing_decision: Option<RouteLabel>,

    task_data: BTreeMap<String, String>,

    active_handler: Option<HandlerKind>,
}

impl ConversationState {
    /// Create an empty session
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.history.push(Message::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.history.push(Message::assistant(content));
    }

    /// Which handler holds an open multi-turn task, if any
    pub fn active_handler(&self) -> Option<HandlerKind> {
        self.active_handler
    }

    /// Read-only view of the active task's scratch data
    pub fn task_data(&self) -> &BTreeMap<String, String> {
        &self.task_data
    }

    /// Open a multi-turn task for `handler`, seeding it with `data`.
    /// `data` must not be empty, otherwise the open is a no-op that keeps
    /// the state consistent.
    pub fn open_task(&mut self, handler: HandlerKind, data: BTreeMap<String, String>) {
        if data.is_empty() {
            tracing::warn!(handler = %handler, "refusing to open a task with no data");
            return;
        }
        self.task_data = data;
        self.active_handler = Some(handler);
    }

    /// Update one entry in the active task; ignored when no task is open
    pub fn update_task(&mut self, key: impl Into<String>, value: impl Into<String>) {
        if self.active_handler.is_some() {
            self.task_data.insert(key.into(), value.into());
        }
    }

    /// Close the active task and discard its data
    pub fn close_task(&mut self) {
        self.task_data.clear();
        self.active_handler = None;
    }

    /// Invariant check used by tests: a handler owns task data if and
    /// only if there is data to own
    pub fn task_invariant_holds(&self) -> bool {
        self.active_handler.is_some() == !self.task_data.is_empty()
    }
}
