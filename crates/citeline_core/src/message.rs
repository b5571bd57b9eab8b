use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Citation, CitationRegistry, UiFragment};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "msg-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    id: MessageId,
    role: Role,
    content: String,
    citations: CitationRegistry,
    fragments: Vec<UiFragment>,
    streaming: bool,
}

impl Message {
    /// A submitted user message; terminal from creation.
    pub(crate) fn user(id: MessageId, content: impl Into<String>) -> Self {
        Self {
            id,
            role: Role::User,
            content: content.into(),
            citations: CitationRegistry::new(),
            fragments: Vec::new(),
            streaming: false,
        }
    }

    /// The empty assistant message a turn streams into.
    pub(crate) fn assistant_placeholder(id: MessageId) -> Self {
        Self {
            id,
            role: Role::Assistant,
            content: String::new(),
            citations: CitationRegistry::new(),
            fragments: Vec::new(),
            streaming: true,
        }
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn citations(&self) -> &CitationRegistry {
        &self.citations
    }

    pub fn fragments(&self) -> &[UiFragment] {
        &self.fragments
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    pub(crate) fn append_text(&mut self, delta: &str) {
        self.content.push_str(delta);
    }

    pub(crate) fn replace_content(&mut self, content: String) {
        self.content = content;
    }

    pub(crate) fn add_citation(&mut self, citation: Citation) {
        self.citations.register(citation);
    }

    pub(crate) fn add_fragment(&mut self, fragment: UiFragment) {
        self.fragments.push(fragment);
    }

    pub(crate) fn finish_streaming(&mut self) {
        self.streaming = false;
    }
}
