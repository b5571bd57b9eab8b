#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// User submitted the chat input.
    InputSubmitted(String),
    /// User aborted the in-flight turn.
    CancelClicked,
    /// Decoded stream event for a turn.
    Stream {
        turn_id: crate::TurnId,
        event: crate::StreamEvent,
    },
    /// User clicked citation badge `number` of a message.
    CitationClicked {
        message_id: crate::MessageId,
        number: u32,
    },
    /// Viewer navigation.
    Viewer(ViewerCommand),
    /// Document search response.
    SearchCompleted {
        request_id: u64,
        result: Result<Vec<crate::SearchHit>, String>,
    },
    /// User asked to upload a local document.
    UploadRequested { path: String },
    /// Upload accepted by the backend.
    DocumentUploaded(crate::DocumentInfo),
    /// A document request failed.
    DocumentRequestFailed(String),
    /// User asked for a fresh document list.
    DocumentsRefreshRequested,
    /// Document list from the backend.
    DocumentsListed(Vec<crate::DocumentInfo>),
    /// Fresh metadata for one document.
    DocumentRefreshed(crate::DocumentInfo),
    /// The backend no longer has this document.
    DocumentRemoved(String),
    /// User asked to delete every stored document.
    ClearDocumentsRequested,
    /// The backend deleted every stored document.
    DocumentsCleared,
    /// User toggled whether a document scopes the next turn.
    DocumentSelectionToggled(String),
    /// The renderer finished loading a document.
    DocumentLoaded {
        document_id: String,
        page_count: Option<u32>,
    },
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerCommand {
    Open {
        document_id: String,
        page: u32,
        highlight: Option<String>,
    },
    Close,
    SetPage(u32),
    NextPage,
    PreviousPage,
    ZoomIn,
    ZoomOut,
    ResetZoom,
    Search(String),
    SearchResultClicked(usize),
    SearchDismissed,
}
