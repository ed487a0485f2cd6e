//! Outbound ChatKit request construction

use serde::Serialize;

use crate::proxy::RequestOptions;

/// Body of a `threads.create` / `threads.addMessage` call
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ThreadRequest {
    pub op: &'static str,
    pub params: ThreadParams,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ThreadParams {
    pub input: ThreadInput,
    #[serde(rename = "threadId")]
    pub thread_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ThreadInput {
    pub text: String,
    pub content: Vec<InputContent>,
    pub quoted_text: String,
    pub attachments: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InputContent {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
}

impl ThreadRequest {
    /// Continue an existing thread when one is known, otherwise start one
    pub fn new(text: String, thread_id: Option<String>) -> Self {
        let op = if thread_id.is_some() {
            "threads.addMessage"
        } else {
            "threads.create"
        };

        Self {
            op,
            params: ThreadParams {
                input: ThreadInput {
                    content: vec![InputContent {
                        kind: "input_text",
                        text: text.clone(),
                    }],
                    text,
                    quoted_text: String::new(),
                    attachments: Vec::new(),
                },
                thread_id,
            },
        }
    }
}

/// Per-request headers layered on top of the configured base set
pub fn request_headers(model: &str, options: &RequestOptions) -> Vec<(&'static str, String)> {
    let mut headers = vec![
        ("x-selected-model", model.to_string()),
        (
            "x-reasoning-effort",
            options.reasoning_effort.as_str().to_string(),
        ),
        ("x-show-reasoning", options.show_reasoning.to_string()),
    ];
    if let Some(user_id) = &options.user_id {
        headers.push(("cookie", format!("user_id={user_id}")));
    }
    headers
}
