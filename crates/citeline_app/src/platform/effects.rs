use std::fs;
use std::path::{Path, PathBuf};

use citeline_core::{Effect, Msg};
use citeline_engine::{
    ClientError, ClientSettings, DocumentBytes, EngineEvent, EngineHandle, FailureKind,
};
use citeline_logging::{citeline_info, citeline_warn};

/// Executes core effects on the engine and maps engine events back to `Msg`.
pub struct EffectRunner {
    engine: EngineHandle,
    document_dir: PathBuf,
}

impl EffectRunner {
    pub fn new(settings: ClientSettings) -> Result<Self, ClientError> {
        let document_dir = std::env::temp_dir().join("citeline");
        Ok(Self::with_engine(EngineHandle::new(settings)?, document_dir))
    }

    pub fn with_engine(engine: EngineHandle, document_dir: PathBuf) -> Self {
        Self {
            engine,
            document_dir,
        }
    }

    pub fn run(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::SubmitTurn { turn_id, request } => {
                    citeline_info!(
                        "SubmitTurn {} message_len={} history={}",
                        turn_id,
                        request.message.len(),
                        request.history.len()
                    );
                    self.engine.submit_turn(turn_id, request);
                }
                Effect::AbortTurn { turn_id } => self.engine.abort_turn(turn_id),
                Effect::SearchDocument(request) => self.engine.search(request),
                Effect::LoadDocument { document_id } => self.engine.fetch_document(document_id),
                Effect::UploadDocument { path } => self.engine.upload(path),
                Effect::ListDocuments => self.engine.list_documents(),
                Effect::RefreshDocument { document_id } => {
                    self.engine.describe_document(document_id)
                }
                Effect::ClearDocuments => self.engine.clear_documents(),
            }
        }
    }

    /// Drains every engine event that is ready.
    pub fn poll(&self) -> Vec<Msg> {
        let mut inbox = Vec::new();
        while let Some(event) = self.engine.try_recv() {
            inbox.push(map_event(event, &self.document_dir));
        }
        inbox
    }
}

pub(crate) fn map_event(event: EngineEvent, document_dir: &Path) -> Msg {
    match event {
        EngineEvent::Stream { turn_id, event } => Msg::Stream { turn_id, event },
        EngineEvent::SearchCompleted { request_id, result } => Msg::SearchCompleted {
            request_id,
            result: result.map_err(|err| {
                citeline_warn!("search {} failed: {}", request_id, err);
                err.user_message()
            }),
        },
        EngineEvent::UploadCompleted(Ok(document)) => Msg::DocumentUploaded(document),
        EngineEvent::DocumentsListed(Ok(documents)) => Msg::DocumentsListed(documents),
        EngineEvent::DocumentsCleared(Ok(())) => Msg::DocumentsCleared,
        EngineEvent::UploadCompleted(Err(err))
        | EngineEvent::DocumentsListed(Err(err))
        | EngineEvent::DocumentsCleared(Err(err)) => Msg::DocumentRequestFailed(err.user_message()),
        EngineEvent::DocumentDescribed {
            result: Ok(document),
            ..
        } => Msg::DocumentRefreshed(document),
        EngineEvent::DocumentDescribed {
            document_id,
            result: Err(err),
        } if err.kind == FailureKind::HttpStatus(404) => Msg::DocumentRemoved(document_id),
        EngineEvent::DocumentDescribed {
            document_id,
            result: Err(err),
        } => Msg::DocumentRequestFailed(format!(
            "could not refresh document {document_id}: {}",
            err.user_message()
        )),
        EngineEvent::DocumentFetched {
            document_id,
            result: Ok(document),
        } => match store_document(document_dir, &document_id, &document) {
            Ok(path) => {
                citeline_info!("document {} stored at {:?}", document_id, path);
                Msg::DocumentLoaded {
                    document_id,
                    page_count: None,
                }
            }
            Err(err) => Msg::DocumentRequestFailed(format!(
                "could not store document {document_id}: {err}"
            )),
        },
        EngineEvent::DocumentFetched {
            document_id,
            result: Err(err),
        } => Msg::DocumentRequestFailed(format!(
            "could not load document {document_id}: {}",
            err.user_message()
        )),
    }
}

/// Writes fetched bytes where an external viewer can open them.
fn store_document(
    document_dir: &Path,
    document_id: &str,
    document: &DocumentBytes,
) -> std::io::Result<PathBuf> {
    let stem: String = document_id
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' { ch } else { '_' })
        .collect();
    fs::create_dir_all(document_dir)?;
    let path = document_dir.join(format!("{stem}.pdf"));
    fs::write(&path, &document.bytes)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::map_event;
    use citeline_core::{DocumentInfo, Msg, StreamEvent, TurnId};
    use citeline_engine::{ClientError, DocumentBytes, EngineEvent, FailureKind};
    use pretty_assertions::assert_eq;

    fn document(content: &'static [u8]) -> DocumentBytes {
        DocumentBytes {
            bytes: content.into(),
            content_type: Some("application/pdf".to_string()),
        }
    }

    #[test]
    fn stream_events_pass_through_with_their_turn() {
        let dir = tempfile::tempdir().unwrap();
        let msg = map_event(
            EngineEvent::Stream {
                turn_id: TurnId(3),
                event: StreamEvent::done(),
            },
            dir.path(),
        );
        assert_eq!(
            msg,
            Msg::Stream {
                turn_id: TurnId(3),
                event: StreamEvent::done()
            }
        );
    }

    #[test]
    fn failures_become_user_notices() {
        let dir = tempfile::tempdir().unwrap();
        let err = ClientError {
            kind: FailureKind::HttpStatus(400),
            message: "Only PDF files are allowed".to_string(),
        };
        assert_eq!(
            map_event(EngineEvent::UploadCompleted(Err(err.clone())), dir.path()),
            Msg::DocumentRequestFailed("Only PDF files are allowed".to_string())
        );
        assert_eq!(
            map_event(
                EngineEvent::SearchCompleted {
                    request_id: 4,
                    result: Err(err)
                },
                dir.path()
            ),
            Msg::SearchCompleted {
                request_id: 4,
                result: Err("Only PDF files are allowed".to_string())
            }
        );
    }

    #[test]
    fn metadata_refresh_maps_missing_documents_to_removal() {
        let dir = tempfile::tempdir().unwrap();
        let document = DocumentInfo {
            id: "doc7".to_string(),
            filename: "atlas.pdf".to_string(),
            page_count: 40,
        };
        assert_eq!(
            map_event(
                EngineEvent::DocumentDescribed {
                    document_id: "doc7".to_string(),
                    result: Ok(document.clone()),
                },
                dir.path()
            ),
            Msg::DocumentRefreshed(document)
        );

        let not_found = ClientError {
            kind: FailureKind::HttpStatus(404),
            message: "PDF not found".to_string(),
        };
        assert_eq!(
            map_event(
                EngineEvent::DocumentDescribed {
                    document_id: "doc7".to_string(),
                    result: Err(not_found),
                },
                dir.path()
            ),
            Msg::DocumentRemoved("doc7".to_string())
        );

        let timeout = ClientError {
            kind: FailureKind::Timeout,
            message: "operation timed out".to_string(),
        };
        assert_eq!(
            map_event(
                EngineEvent::DocumentDescribed {
                    document_id: "doc7".to_string(),
                    result: Err(timeout),
                },
                dir.path()
            ),
            Msg::DocumentRequestFailed(
                "could not refresh document doc7: timeout: operation timed out".to_string()
            )
        );
    }

    #[test]
    fn clear_all_result_maps_to_cleared_or_notice() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            map_event(EngineEvent::DocumentsCleared(Ok(())), dir.path()),
            Msg::DocumentsCleared
        );
        let err = ClientError {
            kind: FailureKind::HttpStatus(500),
            message: "disk busy".to_string(),
        };
        assert_eq!(
            map_event(EngineEvent::DocumentsCleared(Err(err)), dir.path()),
            Msg::DocumentRequestFailed("disk busy".to_string())
        );
    }

    #[test]
    fn fetched_document_is_stored_for_the_viewer() {
        let dir = tempfile::tempdir().unwrap();
        let msg = map_event(
            EngineEvent::DocumentFetched {
                document_id: "a/b".to_string(),
                result: Ok(document(b"%PDF-1.7")),
            },
            dir.path(),
        );
        assert_eq!(
            msg,
            Msg::DocumentLoaded {
                document_id: "a/b".to_string(),
                page_count: None
            }
        );
        let stored = std::fs::read(dir.path().join("a_b.pdf")).unwrap();
        assert_eq!(stored, b"%PDF-1.7");
    }
}
