//! Lenient parsing of incoming chat-completion requests
//!
//! Clients in the wild send loosely-typed bodies, so the request is read as a
//! JSON value and each field is extracted on its own instead of failing the
//! whole request on one odd field.

use serde_json::{Map, Value};

/// The parts of an OpenAI chat request the gateway uses
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    /// Requested model, or `None` when the client named none
    pub model: Option<String>,
    pub stream: bool,
    pub messages: Vec<Value>,
    pub metadata: Map<String, Value>,
}

impl ChatRequest {
    /// Parse a request body; anything that is not a JSON object reads as `{}`
    pub fn from_body(body: &[u8]) -> Self {
        let value: Value = serde_json::from_slice(body).unwrap_or(Value::Null);
        let empty = Map::new();
        let object = value.as_object().unwrap_or(&empty);

        let model = object.get("model").filter(|m| is_truthy(m)).map(|m| match m {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        });

        Self {
            model,
            stream: object.get("stream").is_some_and(is_truthy),
            messages: object
                .get("messages")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default(),
            metadata: object
                .get("metadata")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default(),
        }
    }

    /// The requested model, falling back to `default`
    pub fn model_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.model.as_deref().unwrap_or(default)
    }

    pub fn last_user_text(&self) -> String {
        last_user_text(&self.messages)
    }
}

/// JavaScript truthiness of a JSON value
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Text of the most recent user message
///
/// Array content keeps text parts (typed `text` or untyped) and bare strings in
/// order; other content is rendered as its JSON text.
pub fn last_user_text(messages: &[Value]) -> String {
    let Some(message) = messages
        .iter()
        .rev()
        .find(|m| m.get("role").and_then(Value::as_str) == Some("user"))
    else {
        return String::new();
    };

    match message.get("content") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(parts)) => parts.iter().map(part_text).collect(),
        Some(Value::Null) | None => Value::String(String::new()).to_string(),
        Some(other) => other.to_string(),
    }
}

fn part_text(part: &Value) -> &str {
    match part {
        Value::String(s) => s,
        Value::Object(obj) => {
            let kind = obj.get("type");
            if kind.is_none() || kind.and_then(Value::as_str) == Some("text") {
                obj.get("text").and_then(Value::as_str).unwrap_or("")
            } else {
                ""
            }
        }
        _ => "",
    }
}
