use crate::view_model::{AppViewModel, DocumentRow, MessageView, StatusLine};
use crate::{markup, ChatState, DocumentLibrary, ViewerController};

/// Trailing turns (question plus answer) sent along with each submission.
pub const DEFAULT_HISTORY_WINDOW: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub history_window: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            history_window: DEFAULT_HISTORY_WINDOW,
        }
    }
}

/// Top-level composition of the independent session containers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    chat: ChatState,
    viewer: ViewerController,
    library: DocumentLibrary,
    settings: SessionSettings,
    conversation_id: Option<String>,
    notice: Option<String>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: SessionSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Tags every turn of this session with `id`.
    pub fn with_conversation_id(mut self, id: impl Into<String>) -> Self {
        self.conversation_id = Some(id.into());
        self
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    pub fn chat(&self) -> &ChatState {
        &self.chat
    }

    pub fn viewer(&self) -> &ViewerController {
        &self.viewer
    }

    pub fn library(&self) -> &DocumentLibrary {
        &self.library
    }

    pub fn settings(&self) -> SessionSettings {
        self.settings
    }

    /// Last non-turn failure or document notice, if any.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub(crate) fn chat_mut(&mut self) -> &mut ChatState {
        &mut self.chat
    }

    pub(crate) fn viewer_mut(&mut self) -> &mut ViewerController {
        &mut self.viewer
    }

    pub(crate) fn library_mut(&mut self) -> &mut DocumentLibrary {
        &mut self.library
    }

    pub(crate) fn set_notice(&mut self, notice: Option<String>) {
        self.notice = notice;
    }

    pub fn view(&self) -> AppViewModel {
        let messages = self
            .chat
            .messages()
            .iter()
            .map(|message| MessageView {
                id: message.id(),
                role: message.role(),
                content: message.content().to_string(),
                tree: markup::render(message.content(), message.citations()),
                citations: message.citations().to_vec(),
                fragments: message.fragments().to_vec(),
                streaming: message.is_streaming(),
            })
            .collect();

        let status_line = if self.chat.is_loading() {
            self.chat.tracker().current().map(|status| StatusLine {
                kind: status.kind,
                state: status.state,
                message: status.message.clone(),
            })
        } else {
            None
        };

        let documents = self
            .library
            .documents()
            .iter()
            .map(|doc| DocumentRow {
                id: doc.id.clone(),
                filename: doc.filename.clone(),
                page_count: doc.page_count,
                selected: self.library.is_selected(&doc.id),
            })
            .collect();

        AppViewModel {
            messages,
            status_line,
            error: self.chat.error().map(str::to_string),
            notice: self.notice.clone(),
            is_loading: self.chat.is_loading(),
            can_submit: !self.chat.is_loading(),
            viewer: self.viewer.view(),
            documents,
            dirty: self.dirty,
        }
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Returns whether a render is due and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}
