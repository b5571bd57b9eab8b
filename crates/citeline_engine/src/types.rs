use std::fmt;

use bytes::Bytes;
use citeline_core::{DocumentInfo, SearchHit, StreamEvent, TurnId};

/// Everything the engine reports back to the app loop.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// One decoded (or synthetic) stream event of a turn, in arrival order.
    Stream { turn_id: TurnId, event: StreamEvent },
    SearchCompleted {
        request_id: u64,
        result: Result<Vec<SearchHit>, ClientError>,
    },
    UploadCompleted(Result<DocumentInfo, ClientError>),
    DocumentsListed(Result<Vec<DocumentInfo>, ClientError>),
    DocumentDescribed {
        document_id: String,
        result: Result<DocumentInfo, ClientError>,
    },
    DocumentsCleared(Result<(), ClientError>),
    DocumentFetched {
        document_id: String,
        result: Result<DocumentBytes, ClientError>,
    },
}

/// Raw document bytes as served by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentBytes {
    pub bytes: Bytes,
    pub content_type: Option<String>,
}

/// How a turn's stream ended when no transport error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// A `done` or `error` event was delivered.
    Finished,
    /// The turn was aborted locally; nothing more is emitted for it.
    Cancelled,
    /// The body ended before any terminal event.
    Truncated,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ClientError {
    pub kind: FailureKind,
    pub message: String,
}

impl ClientError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Text suitable for a user-facing notice.
    pub fn user_message(&self) -> String {
        match &self.kind {
            FailureKind::HttpStatus(_) | FailureKind::InvalidUpload | FailureKind::InvalidQuery
                if !self.message.is_empty() =>
            {
                self.message.clone()
            }
            _ => self.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    Decode,
    InvalidUpload,
    InvalidQuery,
    Cancelled,
    /// The engine could not start its runtime.
    Unavailable,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Decode => write!(f, "malformed response"),
            FailureKind::InvalidUpload => write!(f, "invalid upload"),
            FailureKind::InvalidQuery => write!(f, "invalid query"),
            FailureKind::Cancelled => write!(f, "cancelled"),
            FailureKind::Unavailable => write!(f, "engine unavailable"),
        }
    }
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        return ClientError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return ClientError::new(FailureKind::Decode, err.to_string());
    }
    ClientError::new(FailureKind::Network, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::{ClientError, FailureKind};

    #[test]
    fn display_names_kind_and_detail() {
        let err = ClientError::new(FailureKind::HttpStatus(404), "PDF not found");
        assert_eq!(err.to_string(), "http status 404: PDF not found");
        assert_eq!(err.user_message(), "PDF not found");

        let err = ClientError::new(FailureKind::Timeout, "operation timed out");
        assert_eq!(err.user_message(), "timeout: operation timed out");
    }
}
