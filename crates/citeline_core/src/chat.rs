//! Stream assembly: applies one decoded event at a time to the message list.
//!
//! The assistant message a turn streams into is reached through an explicit
//! [`ActiveTurn`] handle, never by looking at whatever happens to be last in
//! the list.

use std::fmt;

use serde::Serialize;

use citeline_logging::{citeline_debug, citeline_info, citeline_warn};

use crate::{
    Message, MessageId, Role, StreamError, StreamEvent, ToolCallTracker, TurnDone, UiFragment,
};

/// Message shown when the user aborts an in-flight turn.
pub const CANCELLED_MESSAGE: &str = "Request cancelled";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TurnId(pub u64);

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "turn-{}", self.0)
    }
}

/// One prior message as sent back to the backend for context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
}

/// What a newly accepted submission needs from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnStart {
    pub turn_id: TurnId,
    pub message: String,
    pub history: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TurnPhase {
    Streaming,
    Completed,
    Failed,
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ActiveTurn {
    turn_id: TurnId,
    message_index: usize,
    phase: TurnPhase,
}

/// How an incoming event was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    Applied,
    /// Tagged with a turn other than the active one.
    Stale,
    /// Belongs to a turn the user aborted.
    Discarded,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChatState {
    messages: Vec<Message>,
    active: Option<ActiveTurn>,
    tracker: ToolCallTracker,
    error: Option<String>,
    loading: bool,
    next_message_id: u64,
    next_turn_id: u64,
    next_fragment_id: u64,
}

impl ChatState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn message(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|message| message.id() == id)
    }

    pub fn tracker(&self) -> &ToolCallTracker {
        &self.tracker
    }

    /// Error retained from the last failed turn, until a turn succeeds.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn active_turn(&self) -> Option<TurnId> {
        self.active.map(|active| active.turn_id)
    }

    /// The message the active turn streams into.
    pub fn active_message(&self) -> Option<&Message> {
        self.active
            .and_then(|active| self.messages.get(active.message_index))
    }

    /// Starts a turn for `text`. Rejected while a turn is loading or when the
    /// input is blank.
    pub fn begin_turn(&mut self, text: &str, history_window: usize) -> Option<TurnStart> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        if self.loading {
            citeline_debug!("submission ignored while a turn is in flight");
            return None;
        }

        let history = self.history_tail(history_window);

        let user_id = self.allocate_message_id();
        self.messages.push(Message::user(user_id, text));

        let assistant_id = self.allocate_message_id();
        self.messages
            .push(Message::assistant_placeholder(assistant_id));

        self.next_turn_id += 1;
        let turn_id = TurnId(self.next_turn_id);
        self.active = Some(ActiveTurn {
            turn_id,
            message_index: self.messages.len() - 1,
            phase: TurnPhase::Streaming,
        });
        self.tracker.clear();
        self.loading = true;

        citeline_logging::set_active_turn(turn_id.0);
        citeline_info!(
            "turn started: {} history={} chars={}",
            assistant_id,
            history.len(),
            text.len()
        );

        Some(TurnStart {
            turn_id,
            message: text.to_string(),
            history,
        })
    }

    /// Applies one event of `turn_id`, in arrival order.
    pub fn apply_event(&mut self, turn_id: TurnId, event: StreamEvent) -> EventOutcome {
        let Some(active) = self.active else {
            citeline_debug!("event for {turn_id} with no active turn dropped");
            return EventOutcome::Stale;
        };
        if active.turn_id != turn_id {
            citeline_debug!("stale event for {turn_id} dropped (active {})", active.turn_id);
            return EventOutcome::Stale;
        }
        if active.phase == TurnPhase::Aborted {
            return EventOutcome::Discarded;
        }
        if active.phase != TurnPhase::Streaming {
            citeline_warn!("event after terminal event of {turn_id}; applying anyway");
        }

        match event {
            StreamEvent::Text(delta) => {
                let message = &mut self.messages[active.message_index];
                message.append_text(&delta.content);
                if delta.is_complete {
                    message.finish_streaming();
                }
            }
            StreamEvent::ToolCall(update) => {
                self.tracker.upsert(update.kind, update.status, update.message);
            }
            StreamEvent::Citation(citation) => {
                self.messages[active.message_index].add_citation(citation);
            }
            StreamEvent::UiComponent(fragment) => {
                let fragment = self.with_fragment_id(fragment);
                self.messages[active.message_index].add_fragment(fragment);
            }
            StreamEvent::Error(error) => self.fail_turn(&error),
            StreamEvent::Done(done) => self.complete_turn(&done),
        }

        EventOutcome::Applied
    }

    /// Aborts the in-flight turn. The turn ends in the error state so nothing
    /// is left marked as streaming; later events for it are discarded.
    pub fn abort_turn(&mut self) -> Option<TurnId> {
        let active = self.active?;
        if active.phase != TurnPhase::Streaming {
            return None;
        }

        self.fail_turn(&StreamError {
            error: CANCELLED_MESSAGE.to_string(),
            message: CANCELLED_MESSAGE.to_string(),
        });
        if let Some(active) = self.active.as_mut() {
            active.phase = TurnPhase::Aborted;
        }
        Some(active.turn_id)
    }

    fn fail_turn(&mut self, error: &StreamError) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        if active.phase == TurnPhase::Streaming {
            active.phase = TurnPhase::Failed;
        }

        let message = &mut self.messages[active.message_index];
        message.replace_content(format!("Error: {}", error.display_text()));
        message.finish_streaming();
        self.error = Some(error.detail().to_string());
        self.loading = false;

        citeline_warn!("turn failed: {}", error.detail());
        citeline_logging::set_active_turn(0);
    }

    fn complete_turn(&mut self, done: &TurnDone) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        let failed = active.phase == TurnPhase::Failed;
        if active.phase == TurnPhase::Streaming {
            active.phase = TurnPhase::Completed;
        }

        let message = &mut self.messages[active.message_index];
        message.finish_streaming();
        let registered = message.citations().len();
        if let Some(expected) = done.citation_count {
            if expected != registered {
                citeline_warn!(
                    "done reported {expected} citations but {registered} were received"
                );
            }
        }

        self.tracker.clear();
        self.loading = false;
        if !failed {
            self.error = None;
        }

        citeline_info!("turn complete: citations={registered}");
        citeline_logging::set_active_turn(0);
    }

    fn with_fragment_id(&mut self, mut fragment: UiFragment) -> UiFragment {
        if fragment.id.is_empty() {
            self.next_fragment_id += 1;
            fragment.id = format!("fragment-{}", self.next_fragment_id);
        }
        fragment
    }

    /// Messages of the last `turns` turns, oldest first.
    fn history_tail(&self, turns: usize) -> Vec<HistoryEntry> {
        if turns == 0 {
            return Vec::new();
        }
        let start = self
            .messages
            .iter()
            .enumerate()
            .rev()
            .filter(|(_, message)| message.role() == Role::User)
            .map(|(index, _)| index)
            .nth(turns - 1)
            .unwrap_or(0);
        self.messages[start..]
            .iter()
            .map(|message| HistoryEntry {
                role: message.role(),
                content: message.content().to_string(),
            })
            .collect()
    }

    fn allocate_message_id(&mut self) -> MessageId {
        self.next_message_id += 1;
        MessageId(self.next_message_id)
    }
}
