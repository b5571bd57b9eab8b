use serde::{Deserialize, Serialize};

use citeline_logging::citeline_warn;

fn default_confidence() -> f32 {
    0.9
}

/// A numbered reference from answer text to a page of a source document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub number: u32,
    #[serde(rename = "pdf_id")]
    pub document_id: String,
    #[serde(rename = "page_number")]
    pub page: u32,
    #[serde(rename = "text_snippet", default)]
    pub snippet: String,
    #[serde(default)]
    pub highlight_start: usize,
    #[serde(default)]
    pub highlight_end: usize,
    /// Advisory only; not validated against [0, 1].
    #[serde(default = "default_confidence")]
    pub confidence: f32,
}

/// Read-only access to citations by number, as needed at render time.
pub trait CitationLookup {
    fn resolve(&self, number: u32) -> Option<&Citation>;
}

/// Citations owned by one message, unique by number, in arrival order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CitationRegistry {
    entries: Vec<Citation>,
}

impl CitationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a citation. A number that is already present is overwritten
    /// in place (last write wins); retargeting to another page is logged.
    pub fn register(&mut self, citation: Citation) {
        match self
            .entries
            .iter_mut()
            .find(|existing| existing.number == citation.number)
        {
            Some(existing) => {
                if existing.document_id != citation.document_id || existing.page != citation.page {
                    citeline_warn!(
                        "citation [{}] re-registered: {} p.{} -> {} p.{}",
                        citation.number,
                        existing.document_id,
                        existing.page,
                        citation.document_id,
                        citation.page
                    );
                }
                *existing = citation;
            }
            None => self.entries.push(citation),
        }
    }

    pub fn resolve(&self, number: u32) -> Option<&Citation> {
        self.entries.iter().find(|citation| citation.number == number)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Citation> {
        self.entries.iter()
    }

    pub fn to_vec(&self) -> Vec<Citation> {
        self.entries.clone()
    }
}

impl CitationLookup for CitationRegistry {
    fn resolve(&self, number: u32) -> Option<&Citation> {
        CitationRegistry::resolve(self, number)
    }
}
