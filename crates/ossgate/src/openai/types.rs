//! OpenAI chat-completions response shapes

use serde::Serialize;
use uuid::Uuid;

/// Header shared by every chunk of one streamed response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkHeader {
    pub id: String,
    pub created: i64,
    pub model: String,
}

impl ChunkHeader {
    /// Fresh header with a random `chatcmpl_` id and the current timestamp
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            id: completion_id(),
            created: chrono::Utc::now().timestamp(),
            model: model.into(),
        }
    }

    pub fn chunk(&self, delta: Delta, finish_reason: Option<FinishReason>) -> ChatCompletionChunk<'_> {
        ChatCompletionChunk {
            id: &self.id,
            object: "chat.completion.chunk",
            created: self.created,
            model: &self.model,
            choices: [ChunkChoice {
                index: 0,
                delta,
                finish_reason,
            }],
        }
    }
}

/// `chatcmpl_` followed by 24 alphanumerics
pub fn completion_id() -> String {
    let raw = Uuid::new_v4().simple().to_string();
    format!("chatcmpl_{}", &raw[..24])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
}

/// One frame of a streamed completion
#[derive(Debug, Serialize)]
pub struct ChatCompletionChunk<'a> {
    pub id: &'a str,
    pub object: &'static str,
    pub created: i64,
    pub model: &'a str,
    pub choices: [ChunkChoice; 1],
}

#[derive(Debug, Serialize)]
pub struct ChunkChoice {
    pub index: u32,
    pub delta: Delta,
    pub finish_reason: Option<FinishReason>,
}

/// Incremental message content; an empty delta serializes as `{}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Delta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_content: Option<String>,
}

impl Delta {
    pub fn content(text: impl Into<String>) -> Self {
        Self {
            content: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn reasoning(text: impl Into<String>) -> Self {
        Self {
            reasoning_content: Some(text.into()),
            ..Self::default()
        }
    }
}

/// Non-streaming completion document
#[derive(Debug, Serialize)]
pub struct ChatCompletion {
    pub id: String,
    pub object: &'static str,
    pub created: i64,
    pub model: String,
    pub choices: Vec<CompletionChoice>,
    pub usage: Usage,
    pub system_fingerprint: String,
}

#[derive(Debug, Serialize)]
pub struct CompletionChoice {
    pub index: u32,
    pub message: AssistantMessage,
    pub finish_reason: FinishReason,
}

#[derive(Debug, Serialize)]
pub struct AssistantMessage {
    pub role: &'static str,
    pub content: String,
}

/// Token accounting is not available upstream; every field is null
#[derive(Debug, Default, Serialize)]
pub struct Usage {
    pub prompt_tokens: Option<u64>,
    pub completion_tokens: Option<u64>,
    pub total_tokens: Option<u64>,
}

/// Thread id and reasoning smuggled through `system_fingerprint`
#[derive(Debug, Serialize)]
struct Fingerprint<'a> {
    gptoss_thread_id: Option<&'a str>,
    reasoning_joined: String,
}

impl ChatCompletion {
    pub fn new(
        header: ChunkHeader,
        content: String,
        reasoning: &[String],
        thread_id: Option<&str>,
    ) -> crate::error::Result<Self> {
        let system_fingerprint = serde_json::to_string(&Fingerprint {
            gptoss_thread_id: thread_id,
            reasoning_joined: reasoning.join("\n"),
        })?;

        Ok(Self {
            id: header.id,
            object: "chat.completion",
            created: header.created,
            model: header.model,
            choices: vec![CompletionChoice {
                index: 0,
                message: AssistantMessage {
                    role: "assistant",
                    content,
                },
                finish_reason: FinishReason::Stop,
            }],
            usage: Usage::default(),
            system_fingerprint,
        })
    }
}

/// `/v1/models` listing
#[derive(Debug, Serialize)]
pub struct ModelList {
    pub object: &'static str,
    pub data: Vec<ModelCard>,
}

#[derive(Debug, Serialize)]
pub struct ModelCard {
    pub id: String,
    pub object: &'static str,
    pub created: i64,
    pub owned_by: String,
    pub permission: Vec<serde_json::Value>,
    pub root: String,
    pub parent: Option<String>,
}

impl ModelList {
    pub fn new<'a>(models: impl IntoIterator<Item = &'a String>, owned_by: &str) -> Self {
        let created = chrono::Utc::now().timestamp();
        Self {
            object: "list",
            data: models
                .into_iter()
                .map(|id| ModelCard {
                    id: id.clone(),
                    object: "model",
                    created,
                    owned_by: owned_by.to_string(),
                    permission: Vec::new(),
                    root: id.clone(),
                    parent: None,
                })
                .collect(),
        }
    }
}
