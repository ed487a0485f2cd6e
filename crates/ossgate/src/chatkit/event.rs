//! Classification of decoded ChatKit events
//!
//! ChatKit emits many event shapes; the gateway only cares about a handful.
//! `classify` maps one parsed payload onto a closed set of categories. The
//! match order is significant: a reasoning entry is checked before a content
//! delta, which is checked before the finish marker.

use serde_json::Value;

pub const THREAD_ITEM_UPDATED: &str = "thread.item_updated";
pub const THREAD_ITEM_DONE: &str = "thread.item_done";
pub const COT_ENTRY_ADDED: &str = "cot.entry_added";
pub const TEXT_DELTA: &str = "assistant_message.content_part.text_delta";
pub const ASSISTANT_MESSAGE: &str = "assistant_message";

/// Logical category of one upstream event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamEvent {
    /// A chain-of-thought entry, whitespace-trimmed (may still be trivial)
    ReasoningEntry { text: String },
    /// A non-empty piece of assistant answer text
    ContentDelta { text: String },
    /// The assistant message is complete
    Finish,
    /// Anything the gateway does not translate
    Ignored,
}

/// A classified event plus the thread id it carried, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub event: UpstreamEvent,
    pub thread_id: Option<String>,
}

/// Classify one parsed payload
pub fn classify(evt: &Value) -> Classified {
    Classified {
        event: classify_event(evt),
        thread_id: thread_id_candidate(evt),
    }
}

fn classify_event(evt: &Value) -> UpstreamEvent {
    let kind = str_at(evt, &["type"]);
    let update_kind = str_at(evt, &["update", "type"]);

    match (kind, update_kind) {
        (Some(THREAD_ITEM_UPDATED), Some(COT_ENTRY_ADDED)) => {
            let entry = evt.pointer("/update/entry");
            let text = entry
                .and_then(|e| non_empty_str(e.get("content")))
                .or_else(|| entry.and_then(|e| non_empty_str(e.get("summary"))))
                .unwrap_or_default();
            UpstreamEvent::ReasoningEntry {
                text: text.trim().to_string(),
            }
        }
        (Some(TEXT_DELTA), _) | (Some(THREAD_ITEM_UPDATED), Some(TEXT_DELTA)) => {
            // A top-level `delta` wins even when it is not a string
            let delta = evt
                .get("delta")
                .or_else(|| evt.get("update").and_then(|u| u.get("delta")));
            match delta.and_then(Value::as_str) {
                Some(text) if !text.is_empty() => UpstreamEvent::ContentDelta {
                    text: text.to_string(),
                },
                _ => UpstreamEvent::Ignored,
            }
        }
        (Some(THREAD_ITEM_DONE), _) if str_at(evt, &["item", "type"]) == Some(ASSISTANT_MESSAGE) => {
            UpstreamEvent::Finish
        }
        _ => UpstreamEvent::Ignored,
    }
}

/// `threadId`, else `thread.id`
///
/// Non-empty strings are taken as-is and non-zero numbers as their decimal
/// text. Booleans, arrays and objects are never ids.
fn thread_id_candidate(evt: &Value) -> Option<String> {
    id_text(evt.get("threadId"))
        .or_else(|| id_text(evt.get("thread").and_then(|t| t.get("id"))))
}

fn id_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        _ => None,
    }
}

fn str_at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    path.iter()
        .try_fold(value, |v, key| v.get(*key))
        .and_then(Value::as_str)
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// First-seen-wins holder for the upstream thread id
#[derive(Debug, Default, Clone)]
pub struct ThreadIdCapture {
    captured: Option<String>,
}

impl ThreadIdCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a candidate; ignored once an id has been captured
    pub fn offer(&mut self, candidate: Option<&str>) {
        if self.captured.is_none() {
            self.captured = candidate.map(str::to_string);
        }
    }

    pub fn get(&self) -> Option<&str> {
        self.captured.as_deref()
    }

    pub fn into_inner(self) -> Option<String> {
        self.captured
    }
}
