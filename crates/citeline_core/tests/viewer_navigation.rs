use std::sync::Once;

use citeline_core::{
    update, AppState, Citation, DocumentInfo, Effect, Msg, SearchHit, SearchRequest, SearchState,
    StreamEvent, ViewerCommand, ViewerController, DEFAULT_ZOOM, MAX_ZOOM, MIN_ZOOM,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(citeline_logging::initialize_for_tests);
}

fn hit(page: u32, snippet: &str) -> SearchHit {
    SearchHit {
        page,
        snippet: snippet.to_string(),
        start: 0,
        end: snippet.len(),
    }
}

fn viewer(state: AppState, command: ViewerCommand) -> (AppState, Vec<Effect>) {
    update(state, Msg::Viewer(command))
}

#[test]
fn second_open_replaces_first_intent() {
    init_logging();
    let mut viewer = ViewerController::new();
    viewer.open("doc-a", 4, Some("alpha".to_string()));
    viewer.open("doc-b", 9, Some("beta".to_string()));

    assert!(viewer.is_open());
    assert_eq!(viewer.document_id(), Some("doc-b"));
    assert_eq!(viewer.page(), 9);
    assert_eq!(viewer.highlight(), Some("beta"));

    viewer.open("doc-c", 1, None);
    assert_eq!(viewer.highlight(), None);
}

#[test]
fn close_resets_page_and_highlight_but_keeps_zoom() {
    init_logging();
    let mut viewer = ViewerController::new();
    viewer.open("doc", 7, Some("snippet".to_string()));
    viewer.zoom_in();
    viewer.close();

    let view = viewer.view();
    assert!(!view.open);
    assert_eq!(view.document_id, None);
    assert_eq!(view.page, 1);
    assert_eq!(view.highlight, None);
    assert_eq!(view.zoom, 1.25);
}

#[test]
fn zoom_in_twenty_times_stops_at_max_after_eight() {
    init_logging();
    let mut viewer = ViewerController::new();
    viewer.open("doc", 1, None);
    for call in 1..=20 {
        viewer.zoom_in();
        let expected = (DEFAULT_ZOOM + 0.25 * call as f32).min(MAX_ZOOM);
        assert_eq!(viewer.zoom(), expected, "after call {call}");
    }
    assert_eq!(viewer.zoom(), 3.0);
}

#[test]
fn zoom_stays_in_bounds_for_any_sequence() {
    init_logging();
    let mut viewer = ViewerController::new();
    viewer.open("doc", 1, None);
    // deterministic pseudo-random walk over the three zoom commands
    let mut seed: u32 = 0x2545_f491;
    for _ in 0..500 {
        seed ^= seed << 13;
        seed ^= seed >> 17;
        seed ^= seed << 5;
        match seed % 7 {
            0 => {
                viewer.reset_zoom();
                assert_eq!(viewer.zoom(), DEFAULT_ZOOM);
            }
            1..=3 => {
                viewer.zoom_in();
            }
            _ => {
                viewer.zoom_out();
            }
        }
        assert!((MIN_ZOOM..=MAX_ZOOM).contains(&viewer.zoom()));
    }
}

#[test]
fn navigation_while_closed_is_a_noop() {
    init_logging();
    let mut viewer = ViewerController::new();
    assert!(!viewer.set_page(3));
    assert!(!viewer.zoom_in());
    assert!(!viewer.reset_zoom());
    assert!(viewer.submit_search("capital").is_none());
    assert_eq!(viewer, ViewerController::new());
}

#[test]
fn invalid_pages_are_rejected() {
    init_logging();
    let mut viewer = ViewerController::new();
    viewer.open("doc", 2, None);

    assert!(!viewer.set_page(0));
    assert_eq!(viewer.page(), 2);

    viewer.set_page_count("doc", 5);
    assert!(!viewer.set_page(6));
    assert!(viewer.set_page(5));
    assert!(!viewer.next_page());
    assert!(viewer.previous_page());
    assert_eq!(viewer.page(), 4);

    // page 0 on open lands on the first page
    viewer.open("doc", 0, None);
    assert_eq!(viewer.page(), 1);
    assert!(!viewer.previous_page());
}

#[test]
fn search_result_click_sets_page_and_closes_results() {
    init_logging();
    let mut viewer = ViewerController::new();
    viewer.open("doc", 1, None);
    viewer.zoom_in();

    let request = viewer.submit_search("  capital ").unwrap();
    assert_eq!(
        request,
        SearchRequest {
            request_id: 1,
            document_id: "doc".to_string(),
            query: "capital".to_string(),
        }
    );
    assert!(viewer.apply_search_results(1, Ok(vec![hit(3, "a"), hit(8, "b")])));
    assert!(viewer.select_search_result(1));

    assert_eq!(viewer.page(), 8);
    assert_eq!(viewer.search(), &SearchState::Idle);
    assert_eq!(viewer.zoom(), 1.25);
    assert_eq!(viewer.document_id(), Some("doc"));
    assert!(!viewer.select_search_result(0));
}

#[test]
fn stale_search_responses_are_discarded() {
    init_logging();
    let mut viewer = ViewerController::new();
    viewer.open("doc", 1, None);

    assert!(viewer.submit_search("x").is_none());
    let first = viewer.submit_search("first").unwrap();
    let second = viewer.submit_search("second").unwrap();

    assert!(!viewer.apply_search_results(first.request_id, Ok(vec![hit(2, "old")])));
    assert!(viewer.apply_search_results(second.request_id, Err("timeout".to_string())));
    assert_eq!(
        viewer.search(),
        &SearchState::Failed {
            query: "second".to_string(),
            message: "timeout".to_string(),
        }
    );

    let third = viewer.submit_search("third").unwrap();
    viewer.open("other-doc", 1, None);
    assert!(!viewer.apply_search_results(third.request_id, Ok(vec![hit(1, "gone")])));
}

#[test]
fn citation_click_opens_viewer_at_cited_page() {
    init_logging();
    let (state, effects) = update(AppState::new(), Msg::InputSubmitted("capital?".to_string()));
    let Effect::SubmitTurn { turn_id, .. } = effects[0].clone() else {
        panic!("expected SubmitTurn");
    };
    let citation = Citation {
        number: 1,
        document_id: "doc7".to_string(),
        page: 3,
        snippet: "Paris is the capital".to_string(),
        highlight_start: 0,
        highlight_end: 20,
        confidence: 0.8,
    };
    let (state, _) = update(
        state,
        Msg::Stream {
            turn_id,
            event: StreamEvent::Citation(citation),
        },
    );
    let message_id = state.chat().active_message().unwrap().id();

    // doc7 is not in the library yet, so its metadata is fetched too
    let (state, effects) = update(state, Msg::CitationClicked { message_id, number: 1 });
    assert_eq!(
        effects,
        vec![
            Effect::LoadDocument {
                document_id: "doc7".to_string()
            },
            Effect::RefreshDocument {
                document_id: "doc7".to_string()
            }
        ]
    );
    let view = state.view().viewer;
    assert!(view.open);
    assert_eq!(view.document_id.as_deref(), Some("doc7"));
    assert_eq!(view.page, 3);
    assert_eq!(view.highlight.as_deref(), Some("Paris is the capital"));

    // same document again: no reload
    let (state, effects) = update(state, Msg::CitationClicked { message_id, number: 1 });
    assert!(effects.is_empty());

    // unknown number: nothing happens
    let before = state.view().viewer;
    let (state, effects) = update(state, Msg::CitationClicked { message_id, number: 9 });
    assert!(effects.is_empty());
    assert_eq!(state.view().viewer, before);
}

#[test]
fn viewer_commands_interleave_with_streaming() {
    init_logging();
    let (state, effects) = update(AppState::new(), Msg::InputSubmitted("q".to_string()));
    let Effect::SubmitTurn { turn_id, .. } = effects[0].clone() else {
        panic!("expected SubmitTurn");
    };

    let (state, _) = viewer(
        state,
        ViewerCommand::Open {
            document_id: "doc".to_string(),
            page: 2,
            highlight: None,
        },
    );
    let (state, _) = update(
        state,
        Msg::Stream {
            turn_id,
            event: StreamEvent::text("partial", false),
        },
    );
    let (state, _) = viewer(state, ViewerCommand::ZoomIn);
    let (state, effects) = viewer(state, ViewerCommand::Search("needle".to_string()));

    assert_eq!(effects.len(), 1);
    assert!(matches!(&effects[0], Effect::SearchDocument(req) if req.document_id == "doc"));
    assert!(state.chat().is_loading());
    assert_eq!(state.chat().active_message().unwrap().content(), "partial");
    assert_eq!(state.viewer().zoom(), 1.25);
}

#[test]
fn library_page_count_bounds_navigation() {
    init_logging();
    let (state, _) = update(
        AppState::new(),
        Msg::DocumentsListed(vec![DocumentInfo {
            id: "doc".to_string(),
            filename: "doc.pdf".to_string(),
            page_count: 3,
        }]),
    );
    let (state, effects) = viewer(
        state,
        ViewerCommand::Open {
            document_id: "doc".to_string(),
            page: 1,
            highlight: None,
        },
    );
    assert_eq!(
        effects,
        vec![Effect::LoadDocument {
            document_id: "doc".to_string()
        }]
    );

    let (mut state, _) = viewer(state, ViewerCommand::SetPage(4));
    assert_eq!(state.viewer().page(), 1);
    assert!(state.consume_dirty());
    let (mut state, _) = viewer(state, ViewerCommand::SetPage(4));
    assert!(!state.consume_dirty());
    let (state, _) = viewer(state, ViewerCommand::SetPage(3));
    assert_eq!(state.viewer().page(), 3);
}

#[test]
fn search_completion_flows_through_update() {
    init_logging();
    let (state, _) = viewer(
        AppState::new(),
        ViewerCommand::Open {
            document_id: "doc".to_string(),
            page: 1,
            highlight: None,
        },
    );
    let (state, effects) = viewer(state, ViewerCommand::Search("paris".to_string()));
    let Effect::SearchDocument(request) = effects[0].clone() else {
        panic!("expected SearchDocument");
    };

    let (state, _) = update(
        state,
        Msg::SearchCompleted {
            request_id: request.request_id,
            result: Ok(vec![hit(6, "...Paris...")]),
        },
    );
    let (state, _) = viewer(state, ViewerCommand::SearchResultClicked(0));

    let view = state.view().viewer;
    assert_eq!(view.page, 6);
    assert_eq!(view.search, SearchState::Idle);
}
