//! Inbound payload classification
//!
//! One wire channel carries both data and control messages. A payload that
//! parses as a JSON object with a string `error` field is a control signal
//! from the backend (task gone, auth rejected, pipeline fault); anything
//! else is one opaque JPEG-encoded frame.

use serde_json::Value;

/// A classified inbound payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// One opaque binary video frame
    Frame(Vec<u8>),
    /// Remote-reported error; surfaced to the caller, no frame delivered
    ControlError(String),
}

/// Classify one inbound payload (text frames arrive as their UTF-8 bytes)
pub fn classify(payload: Vec<u8>) -> Inbound {
    match control_error(&payload) {
        Some(message) => Inbound::ControlError(message),
        None => Inbound::Frame(payload),
    }
}

fn control_error(payload: &[u8]) -> Option<String> {
    // JPEG bytes fail the JSON parse on the first byte, so the probe is
    // cheap on the frame path.
    let value: Value = serde_json::from_slice(payload).ok()?;
    value
        .as_object()?
        .get("error")?
        .as_str()
        .map(str::to_owned)
}
