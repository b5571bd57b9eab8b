use std::path::Path;

use citeline_core::{DocumentInfo, HistoryEntry, SearchHit, StreamEvent, TurnId, TurnRequest};
use citeline_logging::{citeline_debug, citeline_info, citeline_warn};
use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::sse::{decode_payload, map_stream_error};
use crate::types::map_reqwest_error;
use crate::upload::read_upload;
use crate::{ClientError, ClientSettings, DocumentBytes, EngineEvent, FailureKind, TurnOutcome};

/// Receives engine events as they are produced.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

#[derive(Clone)]
pub struct ChannelEventSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

/// The answer/document backend.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    /// Submits a turn and emits its decoded events to `sink` in arrival order.
    /// Returns once the stream ends or `cancel` fires.
    async fn stream_turn(
        &self,
        turn_id: TurnId,
        request: &TurnRequest,
        sink: &dyn EventSink,
        cancel: &CancellationToken,
    ) -> Result<TurnOutcome, ClientError>;

    async fn search(&self, document_id: &str, query: &str) -> Result<Vec<SearchHit>, ClientError>;

    async fn upload(&self, path: &Path) -> Result<DocumentInfo, ClientError>;

    async fn fetch_document(&self, document_id: &str) -> Result<DocumentBytes, ClientError>;

    async fn list_documents(&self) -> Result<Vec<DocumentInfo>, ClientError>;

    /// Current metadata of one stored document.
    async fn document_metadata(&self, document_id: &str) -> Result<DocumentInfo, ClientError>;

    /// Removes every stored document.
    async fn clear_documents(&self) -> Result<(), ClientError>;
}

#[derive(Serialize)]
struct ChatBody<'a> {
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    conversation_id: Option<&'a str>,
    history: &'a [HistoryEntry],
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    pdf_ids: &'a [String],
}

#[derive(Deserialize)]
struct SearchResponse {
    results: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: String,
}

#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    settings: ClientSettings,
    base: Url,
    client: reqwest::Client,
}

impl ReqwestBackend {
    pub fn new(settings: ClientSettings) -> Result<Self, ClientError> {
        let base = Url::parse(&settings.base_url)
            .map_err(|err| ClientError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::new(
                FailureKind::InvalidUrl,
                format!("{} cannot be used as a base url", settings.base_url),
            ));
        }
        // No total timeout on the client: it would cut long answer streams.
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|err| ClientError::new(FailureKind::Network, err.to_string()))?;

        Ok(Self {
            settings,
            base,
            client,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::new(FailureKind::InvalidUrl, self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get(&self, url: Url) -> Result<reqwest::Response, ClientError> {
        citeline_debug!("GET {url}");
        let response = self
            .client
            .get(url)
            .timeout(self.settings.request_timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        check_status(response).await
    }

    /// Decodes and emits one frame. Returns whether it ended the turn.
    fn emit_payload(
        &self,
        turn_id: TurnId,
        payload: &str,
        sink: &dyn EventSink,
    ) -> Result<bool, ClientError> {
        if payload.trim().is_empty() {
            return Ok(false);
        }
        let Some(event) = decode_payload(payload)? else {
            return Ok(false);
        };
        let terminal = event.is_terminal();
        sink.emit(EngineEvent::Stream { turn_id, event });
        Ok(terminal)
    }
}

#[async_trait::async_trait]
impl Backend for ReqwestBackend {
    async fn stream_turn(
        &self,
        turn_id: TurnId,
        request: &TurnRequest,
        sink: &dyn EventSink,
        cancel: &CancellationToken,
    ) -> Result<TurnOutcome, ClientError> {
        let url = self.endpoint(&["api", "chat", "stream"])?;
        let body = ChatBody {
            message: &request.message,
            conversation_id: request.conversation_id.as_deref(),
            history: &request.history,
            pdf_ids: &request.document_ids,
        };
        citeline_info!(
            "POST {url} ({} history entries, {} documents)",
            request.history.len(),
            request.document_ids.len()
        );

        let send = self.client.post(url).json(&body).send();
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(TurnOutcome::Cancelled),
            response = send => response.map_err(map_reqwest_error)?,
        };
        let response = check_status(response).await?;

        let mut frames = response.bytes_stream().eventsource();
        let mut finished = false;

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(TurnOutcome::Cancelled),
                next = frames.next() => next,
            };
            let Some(next) = next else {
                break;
            };
            let emitted = next
                .map_err(map_stream_error)
                .and_then(|frame| self.emit_payload(turn_id, &frame.data, sink));
            match emitted {
                Ok(terminal) => finished |= terminal,
                // Errors after a terminal event leave the turn as delivered.
                Err(err) if finished => {
                    citeline_debug!("stream error after terminal event ignored: {err}");
                    break;
                }
                Err(err) => return Err(err),
            }
        }

        if finished {
            Ok(TurnOutcome::Finished)
        } else {
            citeline_warn!("answer stream ended without a terminal event");
            Ok(TurnOutcome::Truncated)
        }
    }

    async fn search(&self, document_id: &str, query: &str) -> Result<Vec<SearchHit>, ClientError> {
        let query = query.trim();
        if query.chars().count() < citeline_core::MIN_SEARCH_QUERY_CHARS {
            return Err(ClientError::new(
                FailureKind::InvalidQuery,
                "Search query must be at least 2 characters",
            ));
        }
        let mut url = self.endpoint(&["api", "pdf", document_id, "search"])?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("max_results", &self.settings.search_max_results.to_string());

        let response = self.get(url).await?;
        let body: SearchResponse = response.json().await.map_err(map_reqwest_error)?;
        citeline_debug!("search {query:?} in {document_id}: {} hits", body.results.len());
        Ok(body.results)
    }

    async fn upload(&self, path: &Path) -> Result<DocumentInfo, ClientError> {
        let file = read_upload(path, self.settings.max_upload_bytes).await?;
        citeline_info!("uploading {} ({} bytes)", file.filename, file.bytes.len());

        let part = reqwest::multipart::Part::bytes(file.bytes)
            .file_name(file.filename)
            .mime_str("application/pdf")
            .map_err(map_reqwest_error)?;
        let form = reqwest::multipart::Form::new().part("file", part);
        let url = self.endpoint(&["api", "pdf", "upload"])?;

        let response = self
            .client
            .post(url)
            .timeout(self.settings.request_timeout)
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = check_status(response).await?;
        response.json().await.map_err(map_reqwest_error)
    }

    async fn fetch_document(&self, document_id: &str) -> Result<DocumentBytes, ClientError> {
        let url = self.endpoint(&["api", "pdf", document_id, "file"])?;
        let response = self.get(url).await?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());
        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        Ok(DocumentBytes {
            bytes,
            content_type,
        })
    }

    async fn list_documents(&self) -> Result<Vec<DocumentInfo>, ClientError> {
        let url = self.endpoint(&["api", "pdf", "list"])?;
        let response = self.get(url).await?;
        response.json().await.map_err(map_reqwest_error)
    }

    async fn document_metadata(&self, document_id: &str) -> Result<DocumentInfo, ClientError> {
        let url = self.endpoint(&["api", "pdf", document_id])?;
        let response = self.get(url).await?;
        response.json().await.map_err(map_reqwest_error)
    }

    async fn clear_documents(&self) -> Result<(), ClientError> {
        let url = self.endpoint(&["api", "pdf", "clear-all"])?;
        citeline_info!("DELETE {url}");
        let response = self
            .client
            .delete(url)
            .timeout(self.settings.request_timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        check_status(response).await?;
        Ok(())
    }
}

/// Turns a non-success response into an error, preferring the backend's
/// `detail` text.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|err| err.detail)
        .unwrap_or_else(|_| status.to_string());
    Err(ClientError::new(
        FailureKind::HttpStatus(status.as_u16()),
        message,
    ))
}

/// Builds the event that stands in for a turn whose stream failed.
pub fn synthetic_failure(detail: impl Into<String>) -> StreamEvent {
    StreamEvent::error(detail, TRANSPORT_FAILURE_MESSAGE)
}

/// Shown when no well-formed terminal event could be received.
pub const TRANSPORT_FAILURE_MESSAGE: &str = "Failed to get a response. Please try again.";
