use serde::{Deserialize, Serialize};

use crate::{Citation, ToolCallKind, ToolCallState, UiFragment};

/// One decoded record of the answer stream. Wire shape is
/// `{"type": <kind>, "data": {...}, "timestamp": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum StreamEvent {
    Text(TextDelta),
    ToolCall(ToolCallUpdate),
    Citation(Citation),
    UiComponent(UiFragment),
    Error(StreamError),
    Done(TurnDone),
}

impl StreamEvent {
    /// Wire names of every event kind this client understands.
    pub const KIND_NAMES: [&'static str; 6] = [
        "text",
        "tool_call",
        "citation",
        "ui_component",
        "error",
        "done",
    ];

    pub fn is_known_kind(kind: &str) -> bool {
        Self::KIND_NAMES.contains(&kind)
    }

    /// True for `done` and `error`, the events that end a turn.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Done(_) | StreamEvent::Error(_))
    }

    pub fn text(content: impl Into<String>, is_complete: bool) -> Self {
        StreamEvent::Text(TextDelta {
            content: content.into(),
            is_complete,
        })
    }

    pub fn error(error: impl Into<String>, message: impl Into<String>) -> Self {
        StreamEvent::Error(StreamError {
            error: error.into(),
            message: message.into(),
        })
    }

    pub fn done() -> Self {
        StreamEvent::Done(TurnDone::default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextDelta {
    pub content: String,
    #[serde(default)]
    pub is_complete: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallUpdate {
    #[serde(rename = "type")]
    pub kind: ToolCallKind,
    #[serde(default)]
    pub status: ToolCallState,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StreamError {
    /// Technical detail.
    #[serde(default)]
    pub error: String,
    /// Human-readable summary.
    #[serde(default)]
    pub message: String,
}

impl StreamError {
    /// Text shown in place of the failed answer.
    pub fn display_text(&self) -> &str {
        if self.message.trim().is_empty() {
            &self.error
        } else {
            &self.message
        }
    }

    /// Text retained as the session error.
    pub fn detail(&self) -> &str {
        if self.error.trim().is_empty() {
            &self.message
        } else {
            &self.error
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TurnDone {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub citation_count: Option<usize>,
}
