//! `data:` line filtering and payload parsing

use serde_json::Value;

/// Prefix that marks a line carrying an event payload
pub const DATA_PREFIX: &str = "data: ";

/// Payload the upstream sends to mark the end of its stream
pub const DONE_SENTINEL: &str = "[DONE]";

/// Extract the payload of a `data:` line.
///
/// Returns `None` for comment/keep-alive/field lines, blank payloads and the
/// `[DONE]` sentinel.
pub fn data_payload(line: &str) -> Option<&str> {
    let payload = line.trim().strip_prefix(DATA_PREFIX)?.trim();
    if payload.is_empty() || payload == DONE_SENTINEL {
        return None;
    }
    Some(payload)
}

/// Decode one line into a JSON document.
///
/// Malformed payloads produce nothing; they are not surfaced as errors.
pub fn decode_line(line: &str) -> Option<Value> {
    let payload = data_payload(line)?;
    match serde_json::from_str(payload) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::trace!(error = %e, "Dropping malformed event payload");
            None
        }
    }
}
