//! Answer-stream payload decoding.
//!
//! Framing (`data:` joining, comments, retry fields) is handled by
//! `eventsource_stream`; this module only turns a frame's data into a
//! [`StreamEvent`].

use citeline_core::StreamEvent;
use citeline_logging::citeline_warn;
use eventsource_stream::EventStreamError;
use serde::Deserialize;

use crate::types::map_reqwest_error;
use crate::{ClientError, FailureKind};

#[derive(Deserialize)]
struct EnvelopeKind {
    #[serde(rename = "type")]
    kind: String,
}

/// Decodes one frame payload.
///
/// Unknown kinds are skipped (`Ok(None)`), and so is a known auxiliary kind
/// whose body does not decode: one bad chart or status frame must not end
/// the turn. A payload that is not an envelope at all, or a `done`/`error`
/// event that cannot be read, is a decode failure.
pub fn decode_payload(payload: &str) -> Result<Option<StreamEvent>, ClientError> {
    let envelope: EnvelopeKind = serde_json::from_str(payload)
        .map_err(|err| ClientError::new(FailureKind::Decode, err.to_string()))?;
    if !StreamEvent::is_known_kind(&envelope.kind) {
        citeline_warn!("skipping unknown stream event type {:?}", envelope.kind);
        return Ok(None);
    }
    match serde_json::from_str::<StreamEvent>(payload) {
        Ok(event) => Ok(Some(event)),
        Err(err) if is_terminal_kind(&envelope.kind) => Err(ClientError::new(
            FailureKind::Decode,
            format!("{} event: {err}", envelope.kind),
        )),
        Err(err) => {
            citeline_warn!("skipping undecodable {} event: {err}", envelope.kind);
            Ok(None)
        }
    }
}

fn is_terminal_kind(kind: &str) -> bool {
    matches!(kind, "done" | "error")
}

/// Maps a framing failure onto the client taxonomy.
pub(crate) fn map_stream_error(err: EventStreamError<reqwest::Error>) -> ClientError {
    match err {
        EventStreamError::Transport(err) => map_reqwest_error(err),
        other => ClientError::new(FailureKind::Decode, other.to_string()),
    }
}
