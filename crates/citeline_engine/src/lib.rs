//! Citeline engine: backend transport and effect execution.
mod client;
mod engine;
mod settings;
mod sse;
mod types;
mod upload;

pub use client::{
    synthetic_failure, Backend, ChannelEventSink, EventSink, ReqwestBackend,
    TRANSPORT_FAILURE_MESSAGE,
};
pub use engine::{run_turn, EngineHandle};
pub use settings::ClientSettings;
pub use sse::decode_payload;
pub use types::{ClientError, DocumentBytes, EngineEvent, FailureKind, TurnOutcome};
pub use upload::{read_upload, UploadError, UploadFile};
