use serde::{Deserialize, Serialize};

/// A document known to the backend, as reported by upload or listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInfo {
    #[serde(rename = "pdf_id")]
    pub id: String,
    pub filename: String,
    pub page_count: u32,
}

/// Documents available to the session, and which of them scope the next turn.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DocumentLibrary {
    documents: Vec<DocumentInfo>,
    selected: Vec<String>,
}

impl DocumentLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn documents(&self) -> &[DocumentInfo] {
        &self.documents
    }

    pub fn get(&self, id: &str) -> Option<&DocumentInfo> {
        self.documents.iter().find(|doc| doc.id == id)
    }

    pub fn page_count(&self, id: &str) -> Option<u32> {
        self.get(id).map(|doc| doc.page_count)
    }

    /// Adds a document or refreshes its metadata, keeping its position.
    pub fn upsert(&mut self, document: DocumentInfo) {
        match self.documents.iter_mut().find(|doc| doc.id == document.id) {
            Some(existing) => *existing = document,
            None => self.documents.push(document),
        }
    }

    /// Replaces the list wholesale; selections of vanished documents drop.
    pub fn replace_all(&mut self, documents: Vec<DocumentInfo>) {
        self.documents = documents;
        let documents = &self.documents;
        self.selected
            .retain(|id| documents.iter().any(|doc| &doc.id == id));
    }

    pub fn remove(&mut self, id: &str) -> Option<DocumentInfo> {
        self.selected.retain(|selected| selected != id);
        let index = self.documents.iter().position(|doc| doc.id == id)?;
        Some(self.documents.remove(index))
    }

    /// Flips whether `id` scopes the next turn. Unknown ids are ignored.
    pub fn toggle_selected(&mut self, id: &str) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        if let Some(index) = self.selected.iter().position(|selected| selected == id) {
            self.selected.remove(index);
        } else {
            self.selected.push(id.to_string());
        }
        true
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.iter().any(|selected| selected == id)
    }

    pub fn selected_ids(&self) -> Vec<String> {
        self.selected.clone()
    }
}
