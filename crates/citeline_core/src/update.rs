use citeline_logging::{citeline_debug, citeline_info, citeline_warn};

use crate::{AppState, EventOutcome, Effect, Msg, TurnRequest, ViewerCommand};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::InputSubmitted(text) => {
            let window = state.settings().history_window;
            let Some(start) = state.chat_mut().begin_turn(&text, window) else {
                return (state, Vec::new());
            };
            let document_ids = state.library().selected_ids();
            state.mark_dirty();
            vec![Effect::SubmitTurn {
                turn_id: start.turn_id,
                request: TurnRequest {
                    message: start.message,
                    conversation_id: state.conversation_id().map(str::to_string),
                    history: start.history,
                    document_ids,
                },
            }]
        }
        Msg::CancelClicked => match state.chat_mut().abort_turn() {
            Some(turn_id) => {
                state.mark_dirty();
                vec![Effect::AbortTurn { turn_id }]
            }
            None => Vec::new(),
        },
        Msg::Stream { turn_id, event } => {
            if state.chat_mut().apply_event(turn_id, event) == EventOutcome::Applied {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::CitationClicked { message_id, number } => {
            let citation = state
                .chat()
                .message(message_id)
                .and_then(|message| message.citations().resolve(number))
                .cloned();
            match citation {
                Some(citation) => {
                    let effects = open_document(&mut state, |viewer| {
                        viewer.open_citation(&citation)
                    });
                    state.mark_dirty();
                    effects
                }
                None => {
                    citeline_debug!("citation [{number}] of {message_id} is unresolved");
                    Vec::new()
                }
            }
        }
        Msg::Viewer(command) => apply_viewer_command(&mut state, command),
        Msg::SearchCompleted { request_id, result } => {
            if state.viewer_mut().apply_search_results(request_id, result) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::UploadRequested { path } => {
            let path = path.trim().to_string();
            if path.is_empty() {
                Vec::new()
            } else {
                vec![Effect::UploadDocument { path }]
            }
        }
        Msg::DocumentUploaded(document) => {
            state.library_mut().upsert(document);
            state.set_notice(None);
            state.mark_dirty();
            Vec::new()
        }
        Msg::DocumentRequestFailed(message) => {
            citeline_warn!("document request failed: {message}");
            state.set_notice(Some(message));
            state.mark_dirty();
            Vec::new()
        }
        Msg::DocumentsRefreshRequested => vec![Effect::ListDocuments],
        Msg::DocumentsListed(documents) => {
            state.library_mut().replace_all(documents);
            sync_page_count(&mut state);
            state.mark_dirty();
            Vec::new()
        }
        Msg::DocumentRefreshed(document) => {
            state.library_mut().upsert(document);
            sync_page_count(&mut state);
            state.mark_dirty();
            Vec::new()
        }
        Msg::DocumentRemoved(document_id) => {
            if state.library_mut().remove(&document_id).is_some() {
                citeline_info!("document {document_id} removed from the library");
            }
            if state.viewer().document_id() == Some(document_id.as_str()) {
                state.viewer_mut().close();
            }
            state.set_notice(Some(format!("Document {document_id} is no longer available")));
            state.mark_dirty();
            Vec::new()
        }
        Msg::ClearDocumentsRequested => vec![Effect::ClearDocuments],
        Msg::DocumentsCleared => {
            state.library_mut().replace_all(Vec::new());
            if state.viewer().is_open() {
                state.viewer_mut().close();
            }
            state.set_notice(None);
            state.mark_dirty();
            Vec::new()
        }
        Msg::DocumentSelectionToggled(id) => {
            if state.library_mut().toggle_selected(&id) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::DocumentLoaded {
            document_id,
            page_count,
        } => {
            if let Some(page_count) = page_count {
                state.viewer_mut().set_page_count(&document_id, page_count);
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn apply_viewer_command(state: &mut AppState, command: ViewerCommand) -> Vec<Effect> {
    let mut effects = Vec::new();
    let changed = match command {
        ViewerCommand::Open {
            document_id,
            page,
            highlight,
        } => {
            effects = open_document(state, |viewer| viewer.open(document_id, page, highlight));
            true
        }
        ViewerCommand::Close => {
            state.viewer_mut().close();
            true
        }
        ViewerCommand::SetPage(page) => state.viewer_mut().set_page(page),
        ViewerCommand::NextPage => state.viewer_mut().next_page(),
        ViewerCommand::PreviousPage => state.viewer_mut().previous_page(),
        ViewerCommand::ZoomIn => state.viewer_mut().zoom_in(),
        ViewerCommand::ZoomOut => state.viewer_mut().zoom_out(),
        ViewerCommand::ResetZoom => state.viewer_mut().reset_zoom(),
        ViewerCommand::Search(query) => match state.viewer_mut().submit_search(&query) {
            Some(request) => {
                effects.push(Effect::SearchDocument(request));
                true
            }
            None => false,
        },
        ViewerCommand::SearchResultClicked(index) => state.viewer_mut().select_search_result(index),
        ViewerCommand::SearchDismissed => state.viewer_mut().clear_search(),
    };
    if changed {
        state.mark_dirty();
    }
    effects
}

/// Runs an open on the viewer, applies the known page count, and asks for the
/// document bytes when the document changed. Documents missing from the
/// library also get their metadata refreshed.
fn open_document(
    state: &mut AppState,
    open: impl FnOnce(&mut crate::ViewerController) -> bool,
) -> Vec<Effect> {
    let changed = open(state.viewer_mut());
    sync_page_count(state);
    let Some(document_id) = state.viewer().document_id().filter(|_| changed) else {
        return Vec::new();
    };
    let mut effects = vec![Effect::LoadDocument {
        document_id: document_id.to_string(),
    }];
    if state.library().get(document_id).is_none() {
        effects.push(Effect::RefreshDocument {
            document_id: document_id.to_string(),
        });
    }
    effects
}

fn sync_page_count(state: &mut AppState) {
    let Some(document_id) = state.viewer().document_id().map(str::to_string) else {
        return;
    };
    if let Some(page_count) = state.library().page_count(&document_id) {
        state.viewer_mut().set_page_count(&document_id, page_count);
    }
}
