use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use citeline_core::{SearchRequest, TurnId, TurnRequest};
use citeline_logging::{citeline_debug, citeline_error, citeline_info};
use tokio_util::sync::CancellationToken;

use crate::client::{synthetic_failure, ChannelEventSink, EventSink};
use crate::{Backend, ClientError, ClientSettings, EngineEvent, FailureKind, ReqwestBackend, TurnOutcome};

enum EngineCommand {
    SubmitTurn {
        turn_id: TurnId,
        request: TurnRequest,
    },
    AbortTurn {
        turn_id: TurnId,
    },
    Request(Request),
}

/// One-shot backend calls that answer with a single event.
enum Request {
    Search(SearchRequest),
    Upload {
        path: PathBuf,
    },
    FetchDocument {
        document_id: String,
    },
    DescribeDocument {
        document_id: String,
    },
    ListDocuments,
    ClearDocuments,
}

impl Request {
    /// The event this request answers with when it cannot run at all.
    fn failed(self, err: ClientError) -> EngineEvent {
        match self {
            Request::Search(request) => EngineEvent::SearchCompleted {
                request_id: request.request_id,
                result: Err(err),
            },
            Request::Upload { .. } => EngineEvent::UploadCompleted(Err(err)),
            Request::FetchDocument { document_id } => EngineEvent::DocumentFetched {
                document_id,
                result: Err(err),
            },
            Request::DescribeDocument { document_id } => EngineEvent::DocumentDescribed {
                document_id,
                result: Err(err),
            },
            Request::ListDocuments => EngineEvent::DocumentsListed(Err(err)),
            Request::ClearDocuments => EngineEvent::DocumentsCleared(Err(err)),
        }
    }
}

type TurnTokens = Arc<Mutex<HashMap<TurnId, CancellationToken>>>;

/// Runs backend requests on a background tokio runtime. Commands go in over
/// a channel; results come back as [`EngineEvent`]s polled with `try_recv`.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(settings: ClientSettings) -> Result<Self, ClientError> {
        let backend = ReqwestBackend::new(settings)?;
        Ok(Self::with_backend(Arc::new(backend)))
    }

    pub fn with_backend(backend: Arc<dyn Backend>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let sink = ChannelEventSink::new(event_tx);
            match tokio::runtime::Runtime::new() {
                Ok(runtime) => serve(&runtime, backend, &cmd_rx, &sink),
                Err(err) => {
                    citeline_error!("engine runtime failed to start: {err}");
                    reject_commands(&cmd_rx, &sink, &err.to_string());
                }
            }
            citeline_debug!("engine command channel closed");
        });

        Self { cmd_tx, event_rx }
    }

    pub fn submit_turn(&self, turn_id: TurnId, request: TurnRequest) {
        self.send(EngineCommand::SubmitTurn { turn_id, request });
    }

    /// Stops the turn's stream; no further events are emitted for it.
    pub fn abort_turn(&self, turn_id: TurnId) {
        self.send(EngineCommand::AbortTurn { turn_id });
    }

    pub fn search(&self, request: SearchRequest) {
        self.send(EngineCommand::Request(Request::Search(request)));
    }

    pub fn upload(&self, path: impl Into<PathBuf>) {
        self.send(EngineCommand::Request(Request::Upload { path: path.into() }));
    }

    pub fn fetch_document(&self, document_id: impl Into<String>) {
        self.send(EngineCommand::Request(Request::FetchDocument {
            document_id: document_id.into(),
        }));
    }

    pub fn describe_document(&self, document_id: impl Into<String>) {
        self.send(EngineCommand::Request(Request::DescribeDocument {
            document_id: document_id.into(),
        }));
    }

    pub fn list_documents(&self) {
        self.send(EngineCommand::Request(Request::ListDocuments));
    }

    pub fn clear_documents(&self) {
        self.send(EngineCommand::Request(Request::ClearDocuments));
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Blocks until the next event or until `timeout` elapses.
    pub fn recv_timeout(&self, timeout: std::time::Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            citeline_error!("engine thread is gone; command dropped");
        }
    }
}

fn serve(
    runtime: &tokio::runtime::Runtime,
    backend: Arc<dyn Backend>,
    cmd_rx: &mpsc::Receiver<EngineCommand>,
    sink: &ChannelEventSink,
) {
    let tokens: TurnTokens = Arc::default();
    while let Ok(command) = cmd_rx.recv() {
        let backend = backend.clone();
        let sink = sink.clone();
        match command {
            EngineCommand::SubmitTurn { turn_id, request } => {
                // registered before spawning so an abort right behind
                // the submission still finds it
                let cancel = CancellationToken::new();
                if let Ok(mut map) = tokens.lock() {
                    map.insert(turn_id, cancel.clone());
                }
                let tokens = tokens.clone();
                runtime.spawn(async move {
                    run_turn(backend.as_ref(), turn_id, &request, &sink, &cancel).await;
                    if let Ok(mut map) = tokens.lock() {
                        map.remove(&turn_id);
                    }
                });
            }
            EngineCommand::AbortTurn { turn_id } => abort(&tokens, turn_id),
            EngineCommand::Request(request) => {
                runtime.spawn(async move {
                    handle_request(backend.as_ref(), request, &sink).await;
                });
            }
        }
    }
}

/// Answers every command with a failure. Used when there is no runtime to
/// run them on, so a submitted turn still reaches a terminal event.
fn reject_commands(cmd_rx: &mpsc::Receiver<EngineCommand>, sink: &dyn EventSink, reason: &str) {
    while let Ok(command) = cmd_rx.recv() {
        let err = ClientError::new(FailureKind::Unavailable, reason);
        match command {
            EngineCommand::SubmitTurn { turn_id, .. } => sink.emit(EngineEvent::Stream {
                turn_id,
                event: synthetic_failure(err.to_string()),
            }),
            EngineCommand::AbortTurn { .. } => {}
            EngineCommand::Request(request) => sink.emit(request.failed(err)),
        }
    }
}

fn abort(tokens: &TurnTokens, turn_id: TurnId) {
    let token = tokens.lock().ok().and_then(|mut map| map.remove(&turn_id));
    match token {
        Some(token) => {
            citeline_info!("aborting {turn_id}");
            token.cancel();
        }
        None => citeline_debug!("abort for {turn_id} ignored, not running"),
    }
}

async fn handle_request(backend: &dyn Backend, request: Request, sink: &dyn EventSink) {
    match request {
        Request::Search(request) => {
            let result = backend.search(&request.document_id, &request.query).await;
            sink.emit(EngineEvent::SearchCompleted {
                request_id: request.request_id,
                result,
            });
        }
        Request::Upload { path } => {
            let result = backend.upload(&path).await;
            sink.emit(EngineEvent::UploadCompleted(result));
        }
        Request::FetchDocument { document_id } => {
            let result = backend.fetch_document(&document_id).await;
            sink.emit(EngineEvent::DocumentFetched {
                document_id,
                result,
            });
        }
        Request::DescribeDocument { document_id } => {
            let result = backend.document_metadata(&document_id).await;
            sink.emit(EngineEvent::DocumentDescribed {
                document_id,
                result,
            });
        }
        Request::ListDocuments => {
            let result = backend.list_documents().await;
            sink.emit(EngineEvent::DocumentsListed(result));
        }
        Request::ClearDocuments => {
            let result = backend.clear_documents().await;
            sink.emit(EngineEvent::DocumentsCleared(result));
        }
    }
}

/// Streams one turn, guaranteeing a terminal event unless it was cancelled.
pub async fn run_turn(
    backend: &dyn Backend,
    turn_id: TurnId,
    request: &TurnRequest,
    sink: &dyn EventSink,
    cancel: &CancellationToken,
) {
    let detail = match backend.stream_turn(turn_id, request, sink, cancel).await {
        Ok(TurnOutcome::Finished) => return,
        Ok(TurnOutcome::Cancelled) => {
            citeline_debug!("{turn_id} cancelled");
            return;
        }
        Err(err) if err.kind == FailureKind::Cancelled => return,
        Ok(TurnOutcome::Truncated) => "stream ended before completion".to_string(),
        Err(err) => {
            citeline_error!("{turn_id} failed: {err}");
            err.to_string()
        }
    };
    if cancel.is_cancelled() {
        return;
    }
    sink.emit(EngineEvent::Stream {
        turn_id,
        event: synthetic_failure(detail),
    });
}

#[cfg(test)]
mod tests {
    use std::sync::{mpsc, Mutex};

    use citeline_core::{SearchRequest, StreamEvent, TurnId, TurnRequest};

    use super::{reject_commands, EngineCommand, Request};
    use crate::client::EventSink;
    use crate::{EngineEvent, FailureKind, TRANSPORT_FAILURE_MESSAGE};

    #[derive(Default)]
    struct Collect(Mutex<Vec<EngineEvent>>);

    impl EventSink for Collect {
        fn emit(&self, event: EngineEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    #[test]
    fn without_a_runtime_every_command_still_gets_an_answer() {
        let (tx, rx) = mpsc::channel();
        tx.send(EngineCommand::SubmitTurn {
            turn_id: TurnId(1),
            request: TurnRequest {
                message: "q".to_string(),
                conversation_id: None,
                history: Vec::new(),
                document_ids: Vec::new(),
            },
        })
        .unwrap();
        tx.send(EngineCommand::AbortTurn { turn_id: TurnId(1) }).unwrap();
        tx.send(EngineCommand::Request(Request::Search(SearchRequest {
            request_id: 4,
            document_id: "doc7".to_string(),
            query: "capital".to_string(),
        })))
        .unwrap();
        tx.send(EngineCommand::Request(Request::ClearDocuments)).unwrap();
        drop(tx);

        let sink = Collect::default();
        reject_commands(&rx, &sink, "no threads left");
        let events = sink.0.into_inner().unwrap();
        assert_eq!(events.len(), 3);

        match &events[0] {
            EngineEvent::Stream {
                turn_id,
                event: StreamEvent::Error(err),
            } => {
                assert_eq!(*turn_id, TurnId(1));
                assert_eq!(err.message, TRANSPORT_FAILURE_MESSAGE);
                assert!(err.error.contains("no threads left"));
            }
            other => panic!("unexpected event {other:?}"),
        }
        match &events[1] {
            EngineEvent::SearchCompleted {
                request_id: 4,
                result: Err(err),
            } => assert_eq!(err.kind, FailureKind::Unavailable),
            other => panic!("unexpected event {other:?}"),
        }
        assert!(matches!(&events[2], EngineEvent::DocumentsCleared(Err(_))));
    }
}
