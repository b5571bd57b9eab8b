use crate::{
    Citation, MessageId, RenderTree, Role, ToolCallKind, ToolCallState, UiFragment, ViewerView,
};

#[derive(Debug, Clone, PartialEq)]
pub struct AppViewModel {
    pub messages: Vec<MessageView>,
    /// Single "what is happening now" line while a turn is loading.
    pub status_line: Option<StatusLine>,
    pub error: Option<String>,
    pub notice: Option<String>,
    pub is_loading: bool,
    pub can_submit: bool,
    pub viewer: ViewerView,
    pub documents: Vec<DocumentRow>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MessageView {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    pub tree: RenderTree,
    pub citations: Vec<Citation>,
    pub fragments: Vec<UiFragment>,
    pub streaming: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub kind: ToolCallKind,
    pub state: ToolCallState,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRow {
    pub id: String,
    pub filename: String,
    pub page_count: u32,
    pub selected: bool,
}
