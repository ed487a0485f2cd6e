//! Per-request upstream options read from headers and request metadata
//!
//! Headers win over `metadata` fields; absent or unrecognised values fall back
//! to the defaults.

use axum::http::HeaderMap;
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

pub const REASONING_EFFORT_HEADER: &str = "x-reasoning-effort";
pub const SHOW_REASONING_HEADER: &str = "x-show-reasoning";
pub const THREAD_ID_HEADER: &str = "x-gptoss-thread-id";
pub const USER_ID_HEADER: &str = "x-gptoss-user-id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReasoningEffort {
    None,
    Low,
    #[default]
    Medium,
    High,
}

impl ReasoningEffort {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasoningEffort::None => "none",
            ReasoningEffort::Low => "low",
            ReasoningEffort::Medium => "medium",
            ReasoningEffort::High => "high",
        }
    }
}

impl FromStr for ReasoningEffort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(ReasoningEffort::None),
            "low" => Ok(ReasoningEffort::Low),
            "medium" => Ok(ReasoningEffort::Medium),
            "high" => Ok(ReasoningEffort::High),
            other => Err(format!("unknown reasoning effort: {other}")),
        }
    }
}

impl fmt::Display for ReasoningEffort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options forwarded to the upstream for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOptions {
    pub reasoning_effort: ReasoningEffort,
    pub show_reasoning: bool,
    pub thread_id: Option<String>,
    pub user_id: Option<String>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            reasoning_effort: ReasoningEffort::default(),
            show_reasoning: true,
            thread_id: None,
            user_id: None,
        }
    }
}

impl RequestOptions {
    pub fn extract(headers: &HeaderMap, metadata: &Map<String, Value>) -> Self {
        Self {
            reasoning_effort: reasoning_effort(headers, metadata),
            show_reasoning: show_reasoning(headers, metadata),
            thread_id: header_str(headers, THREAD_ID_HEADER)
                .or_else(|| meta_str(metadata, "gptoss_thread_id"))
                .map(str::to_string),
            user_id: header_str(headers, USER_ID_HEADER)
                .or_else(|| meta_str(metadata, "gptoss_user_id"))
                .map(str::to_string),
        }
    }
}

fn reasoning_effort(headers: &HeaderMap, metadata: &Map<String, Value>) -> ReasoningEffort {
    header_str(headers, REASONING_EFFORT_HEADER)
        .or_else(|| meta_str(metadata, "reasoning_effort"))
        .and_then(|level| level.parse().ok())
        .unwrap_or_default()
}

fn show_reasoning(headers: &HeaderMap, metadata: &Map<String, Value>) -> bool {
    let header = header_str(headers, SHOW_REASONING_HEADER)
        .map(str::to_lowercase)
        .unwrap_or_default();
    match header.as_str() {
        "true" | "1" | "yes" => return true,
        "false" | "0" | "no" => return false,
        _ => {}
    }

    metadata
        .get("show_reasoning")
        .and_then(Value::as_bool)
        .unwrap_or(true)
}

/// Non-empty header value
fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}

/// Non-empty string metadata field
fn meta_str<'a>(metadata: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    metadata
        .get(key)
        .and_then(Value::as_str)
        .filter(|v| !v.is_empty())
}
