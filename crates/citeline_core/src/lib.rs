//! Citeline core: pure stream assembly, citation cross-reference, markup
//! rendering and viewer navigation state.
mod chat;
mod citation;
mod effect;
mod event;
mod fragment;
mod library;
pub mod markup;
mod message;
mod msg;
mod state;
mod tool_calls;
mod update;
mod view_model;
mod viewer;

pub use chat::{ChatState, EventOutcome, HistoryEntry, TurnId, TurnStart, CANCELLED_MESSAGE};
pub use citation::{Citation, CitationLookup, CitationRegistry};
pub use effect::{Effect, TurnRequest};
pub use event::{StreamError, StreamEvent, TextDelta, ToolCallUpdate, TurnDone};
pub use fragment::{
    ChartDataset, ChartSpec, DataTable, FragmentBody, InfoCard, SourceCard, UiFragment,
};
pub use library::{DocumentInfo, DocumentLibrary};
pub use markup::{Block, CitationBadge, CitationTarget, Inline, ListItem, RenderTree};
pub use message::{Message, MessageId, Role};
pub use msg::{Msg, ViewerCommand};
pub use state::{AppState, SessionSettings, DEFAULT_HISTORY_WINDOW};
pub use tool_calls::{ToolCallKind, ToolCallState, ToolCallStatus, ToolCallTracker};
pub use update::update;
pub use view_model::{AppViewModel, DocumentRow, MessageView, StatusLine};
pub use viewer::{
    SearchHit, SearchRequest, SearchState, ViewerController, ViewerView, DEFAULT_ZOOM, MAX_ZOOM,
    MIN_SEARCH_QUERY_CHARS, MIN_ZOOM, ZOOM_STEP,
};
