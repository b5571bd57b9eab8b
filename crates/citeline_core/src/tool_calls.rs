use serde::{Deserialize, Serialize};

/// Reasoning-step categories reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallKind {
    Thinking,
    SearchingDocuments,
    RetrievingPdf,
    AnalyzingContent,
    GeneratingResponse,
    /// Any kind this client does not know about; all of them share one slot.
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallState {
    Completed,
    Error,
    /// Also stands in for any status text this client does not recognise.
    #[default]
    #[serde(other)]
    InProgress,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCallStatus {
    pub id: String,
    pub kind: ToolCallKind,
    pub state: ToolCallState,
    pub message: String,
    touched: u64,
}

/// Turn-scoped set of reasoning-step indicators, at most one per kind.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ToolCallTracker {
    entries: Vec<ToolCallStatus>,
    next_id: u64,
    clock: u64,
}

impl ToolCallTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates the entry for `kind` in place, or appends a new one.
    pub fn upsert(
        &mut self,
        kind: ToolCallKind,
        state: ToolCallState,
        message: impl Into<String>,
    ) -> &ToolCallStatus {
        self.clock += 1;
        let touched = self.clock;
        let message = message.into();

        if let Some(index) = self.entries.iter().position(|entry| entry.kind == kind) {
            let entry = &mut self.entries[index];
            entry.state = state;
            entry.message = message;
            entry.touched = touched;
            return &self.entries[index];
        }

        self.next_id += 1;
        self.entries.push(ToolCallStatus {
            id: format!("tool-{}", self.next_id),
            kind,
            state,
            message,
            touched,
        });
        &self.entries[self.entries.len() - 1]
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[ToolCallStatus] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entry surfaced as the single status line: the most recently
    /// touched in-progress entry, else the last entry.
    pub fn current(&self) -> Option<&ToolCallStatus> {
        self.entries
            .iter()
            .filter(|entry| entry.state == ToolCallState::InProgress)
            .max_by_key(|entry| entry.touched)
            .or_else(|| self.entries.last())
    }
}
