//! Turn routing state machine
//!
//! One turn: decide a route, dispatch the handler, re-evaluate. An open
//! multi-turn task pins the decision to its handler, bypassing
//! classification, until that handler closes it. A configurable hop bound
//! stops a misbehaving classifier from cycling handlers forever.
//!
//! Failure policy: classification failures route to GENERAL; handler
//! failures end the turn with a generic apology. Nothing propagates past
//! the router.

use crate::handlers::{Handler, HandlerOutcome};
use crate::llm::IntentClassifier;
use crate::state::{ConversationState, HandlerKind, RouteLabel};
use std::sync::Arc;
use tokio::sync::mpsc;

const APOLOGY_MESSAGE: &str =
    "I'm sorry, something went wrong on our side while handling that. \
     Please try again.";

/// Where a turn ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    /// Deciding the next hop
    Routing,
    /// A handler is executing
    Dispatched(HandlerKind),
    /// A multi-turn handler wants more input; the turn is over
    AwaitingUser,
    /// Terminal for the turn
    Done,
}

/// The four dispatchable handlers
pub struct HandlerSet {
    pub inquiry: Arc<dyn Handler>,
    pub booking: Arc<dyn Handler>,
    pub general: Arc<dyn Handler>,
    pub data_query: Arc<dyn Handler>,
}

impl HandlerSet {
    fn get(&self, kind: HandlerKind) -> &Arc<dyn Handler> {
        match kind {
            HandlerKind::Inquiry => &self.inquiry,
            HandlerKind::Booking => &self.booking,
            HandlerKind::General => &self.general,
            HandlerKind::DataQuery => &self.data_query,
        }
    }
}

/// Decides, per turn, which handler runs next and when the turn is done
pub struct Router {
    classifier: Arc<dyn IntentClassifier>,
    handlers: HandlerSet,
    max_hops: usize,
}

impl Router {
    pub fn new(classifier: Arc<dyn IntentClassifier>, handlers: HandlerSet, max_hops: usize) -> Self {
        Self {
            classifier,
            handlers,
            max_hops: max_hops.max(1),
        }
    }

    /// Process one user turn, streaming output chunks through `out`.
    ///
    /// The caller serializes turns per session: this takes `&mut` on the
    /// state for the whole turn. If the receiver side of `out` goes away
    /// (client disconnect), the turn stops between suspension points and
    /// the state keeps its `routing_decision`, marking the turn abandoned
    /// rather than done; already-streamed chunks stand.
    pub async fn process_turn(
        &self,
        session_id: &str,
        state: &mut ConversationState,
        user_text: &str,
        out: &mpsc::Sender<String>,
    ) -> TurnPhase {
        state.current_query = user_text.to_string();
        state.push_user(user_text);

        let mut phase = TurnPhase::Routing;
        let mut dispatches = 0usize;

        loop {
            if dispatches >= self.max_hops {
                tracing::warn!(
                    session_id,
                    max_hops = self.max_hops,
                    "Hop bound reached, forcing turn done"
                );
                phase = TurnPhase::Done;
                break;
            }

            // An open task pins the route to its handler; otherwise ask
            // the classifier (which never fails, only degrades to GENERAL).
            let label = match state.active_handler() {
                Some(active) => RouteLabel::from(active),
                None => self.classifier.classify(&state.history, user_text).await,
            };
            state.routing_decision = Some(label);
            tracing::info!(session_id, label = %label, "Routing decision");

            let Some(kind) = label.handler() else {
                // FINISH: the last handler output already answers the turn
                phase = TurnPhase::Done;
                break;
            };

            phase = TurnPhase::Dispatched(kind);
            dispatches += 1;

            let reply = match self.handlers.get(kind).handle(state, user_text).await {
                Ok(reply) => reply,
                Err(e) => {
                    tracing::error!(session_id, handler = %kind, "Handler failed: {}", e);
                    if !self.emit(state, out, APOLOGY_MESSAGE).await {
                        return phase; // abandoned mid-stream
                    }
                    phase = TurnPhase::Done;
                    break;
                }
            };

            if !reply.text.is_empty() && !self.emit(state, out, &reply.text).await {
                return phase; // abandoned mid-stream
            }

            match reply.outcome {
                HandlerOutcome::Open => {
                    phase = TurnPhase::AwaitingUser;
                    break;
                }
                HandlerOutcome::Closed => {
                    // A closed outcome releases any task the handler
                    // still holds; the next decision is unconstrained
                    if state.active_handler() == Some(kind) {
                        state.close_task();
                    }
                    phase = TurnPhase::Routing;
                }
            }
        }

        // Turn complete: the decision is only meaningful inside a turn
        state.routing_decision = None;
        phase
    }

    /// Convenience wrapper gathering the streamed chunks (CLI, tests)
    pub async fn process_turn_collected(
        &self,
        session_id: &str,
        state: &mut ConversationState,
        user_text: &str,
    ) -> (String, TurnPhase) {
        // Buffered so the turn never blocks on the collector
        let (tx, mut rx) = mpsc::channel(self.max_hops + 1);
        let phase = self.process_turn(session_id, state, user_text, &tx).await;
        drop(tx);

        let mut output = String::new();
        while let Some(chunk) = rx.recv().await {
            if !output.is_empty() {
                output.push('\n');
            }
            output.push_str(&chunk);
        }
        (output, phase)
    }

    /// Stream a chunk and append it to history. Returns false when the
    /// receiver is gone and the turn should be considered abandoned.
    async fn emit(&self, state: &mut ConversationState, out: &mpsc::Sender<String>, text: &str) -> bool {
        if out.send(text.to_string()).await.is_err() {
            tracing::warn!("Output receiver dropped, abandoning turn");
            return false;
        }
        state.push_assistant(text);
        true
    }
}

impl From<HandlerKind> for RouteLabel {
    fn from(kind: HandlerKind) -> Self {
        match kind {
            HandlerKind::Inquiry => RouteLabel::Inquiry,
            HandlerKind::Booking => RouteLabel::Booking,
            HandlerKind::General => RouteLabel::General,
            HandlerKind::DataQuery => RouteLabel::DataQuery,
        }
    }
}
