//! Document viewer navigation state.
//!
//! Only *which* document, page, zoom and highlight the external renderer shows
//! is tracked here. Every command is synchronous and independent of any turn
//! that may be streaming.

use serde::{Deserialize, Serialize};

use citeline_logging::{citeline_debug, citeline_info};

use crate::Citation;

pub const MIN_ZOOM: f32 = 0.5;
pub const MAX_ZOOM: f32 = 3.0;
pub const ZOOM_STEP: f32 = 0.25;
pub const DEFAULT_ZOOM: f32 = 1.0;
/// Shorter queries are not sent to the search endpoint.
pub const MIN_SEARCH_QUERY_CHARS: usize = 2;

/// One ranked match returned by document search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(rename = "page_number")]
    pub page: u32,
    pub snippet: String,
    #[serde(rename = "start_position", alias = "start_offset", default)]
    pub start: usize,
    #[serde(rename = "end_position", alias = "end_offset", default)]
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub request_id: u64,
    pub document_id: String,
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SearchState {
    #[default]
    Idle,
    Pending {
        request_id: u64,
        query: String,
    },
    Results {
        query: String,
        hits: Vec<SearchHit>,
    },
    Failed {
        query: String,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewerView {
    pub open: bool,
    pub document_id: Option<String>,
    pub page: u32,
    pub page_count: Option<u32>,
    pub highlight: Option<String>,
    pub zoom: f32,
    pub search: SearchState,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewerController {
    open: bool,
    document_id: Option<String>,
    page: u32,
    page_count: Option<u32>,
    highlight: Option<String>,
    zoom: f32,
    search: SearchState,
    next_search_id: u64,
}

impl Default for ViewerController {
    fn default() -> Self {
        Self {
            open: false,
            document_id: None,
            page: 1,
            page_count: None,
            highlight: None,
            zoom: DEFAULT_ZOOM,
            search: SearchState::Idle,
            next_search_id: 0,
        }
    }
}

impl ViewerController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn document_id(&self) -> Option<&str> {
        self.document_id.as_deref()
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn highlight(&self) -> Option<&str> {
        self.highlight.as_deref()
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn search(&self) -> &SearchState {
        &self.search
    }

    /// Opens `document_id` at `page`, replacing whatever was shown before.
    /// Returns true when the document differs from the previous one.
    pub fn open(
        &mut self,
        document_id: impl Into<String>,
        page: u32,
        highlight: Option<String>,
    ) -> bool {
        let document_id = document_id.into();
        let changed = self.document_id.as_deref() != Some(document_id.as_str());
        if changed {
            self.page_count = None;
            self.search = SearchState::Idle;
        }

        citeline_info!("viewer open {document_id} p.{page}");
        self.open = true;
        self.document_id = Some(document_id);
        self.page = page.max(1);
        self.highlight = highlight.filter(|text| !text.trim().is_empty());
        changed
    }

    pub fn open_citation(&mut self, citation: &Citation) -> bool {
        self.open(
            citation.document_id.clone(),
            citation.page,
            Some(citation.snippet.clone()),
        )
    }

    /// Closes the viewer; zoom is the only thing that survives.
    pub fn close(&mut self) {
        self.open = false;
        self.document_id = None;
        self.page = 1;
        self.page_count = None;
        self.highlight = None;
        self.search = SearchState::Idle;
    }

    /// Records the open document's page count once it is known.
    pub fn set_page_count(&mut self, document_id: &str, page_count: u32) {
        if self.document_id.as_deref() == Some(document_id) && page_count > 0 {
            self.page_count = Some(page_count);
        }
    }

    /// Moves to page `page`. Rejected while closed, below 1, or past the
    /// known page count. Returns whether the page was applied.
    pub fn set_page(&mut self, page: u32) -> bool {
        if !self.open {
            return false;
        }
        let beyond_end = self.page_count.is_some_and(|count| page > count);
        if page < 1 || beyond_end {
            citeline_debug!("page {page} rejected (page_count {:?})", self.page_count);
            return false;
        }
        self.page = page;
        true
    }

    pub fn next_page(&mut self) -> bool {
        self.set_page(self.page.saturating_add(1))
    }

    pub fn previous_page(&mut self) -> bool {
        self.set_page(self.page.saturating_sub(1))
    }

    pub fn zoom_in(&mut self) -> bool {
        self.set_zoom(self.zoom + ZOOM_STEP)
    }

    pub fn zoom_out(&mut self) -> bool {
        self.set_zoom(self.zoom - ZOOM_STEP)
    }

    pub fn reset_zoom(&mut self) -> bool {
        self.set_zoom(DEFAULT_ZOOM)
    }

    fn set_zoom(&mut self, zoom: f32) -> bool {
        if !self.open {
            return false;
        }
        let zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        let changed = zoom != self.zoom;
        self.zoom = zoom;
        changed
    }

    /// Starts a search in the open document. Returns the request to send, or
    /// `None` when closed or the query is too short.
    pub fn submit_search(&mut self, query: &str) -> Option<SearchRequest> {
        let query = query.trim();
        if !self.open || query.chars().count() < MIN_SEARCH_QUERY_CHARS {
            return None;
        }
        let document_id = self.document_id.clone()?;

        self.next_search_id += 1;
        let request_id = self.next_search_id;
        self.search = SearchState::Pending {
            request_id,
            query: query.to_string(),
        };
        Some(SearchRequest {
            request_id,
            document_id,
            query: query.to_string(),
        })
    }

    /// Applies a search response. Responses to anything but the pending
    /// request are discarded. Returns whether state changed.
    pub fn apply_search_results(
        &mut self,
        request_id: u64,
        result: Result<Vec<SearchHit>, String>,
    ) -> bool {
        let query = match &self.search {
            SearchState::Pending {
                request_id: pending,
                query,
            } if *pending == request_id => query.clone(),
            _ => {
                citeline_debug!("search response {request_id} discarded");
                return false;
            }
        };

        self.search = match result {
            Ok(hits) => SearchState::Results { query, hits },
            Err(message) => SearchState::Failed { query, message },
        };
        true
    }

    /// Jumps to the page of result `index` and dismisses the result list.
    /// Zoom and document are left alone.
    pub fn select_search_result(&mut self, index: usize) -> bool {
        let page = match &self.search {
            SearchState::Results { hits, .. } => match hits.get(index) {
                Some(hit) => hit.page,
                None => return false,
            },
            _ => return false,
        };
        self.set_page(page);
        self.search = SearchState::Idle;
        true
    }

    pub fn clear_search(&mut self) -> bool {
        let had_search = self.search != SearchState::Idle;
        self.search = SearchState::Idle;
        had_search
    }

    pub fn view(&self) -> ViewerView {
        ViewerView {
            open: self.open,
            document_id: self.document_id.clone(),
            page: self.page,
            page_count: self.page_count,
            highlight: self.highlight.clone(),
            zoom: self.zoom,
            search: self.search.clone(),
        }
    }
}
