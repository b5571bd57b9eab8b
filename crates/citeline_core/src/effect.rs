#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Open the answer stream for a new turn.
    SubmitTurn {
        turn_id: crate::TurnId,
        request: TurnRequest,
    },
    /// Stop consuming the stream of an aborted turn.
    AbortTurn { turn_id: crate::TurnId },
    SearchDocument(crate::SearchRequest),
    /// Fetch document bytes for the renderer.
    LoadDocument { document_id: String },
    UploadDocument { path: String },
    ListDocuments,
    /// Re-read one document's metadata.
    RefreshDocument { document_id: String },
    /// Delete every stored document.
    ClearDocuments,
}

/// Everything the backend needs to answer one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnRequest {
    pub message: String,
    /// Groups the session's turns on the backend.
    pub conversation_id: Option<String>,
    pub history: Vec<crate::HistoryEntry>,
    pub document_ids: Vec<String>,
}
