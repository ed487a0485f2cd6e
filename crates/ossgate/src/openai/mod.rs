//! OpenAI-compatible wire format spoken to clients

mod request;
mod types;

pub use request::{ChatRequest, is_truthy, last_user_text};
pub use types::{
    AssistantMessage, ChatCompletion, ChatCompletionChunk, ChunkChoice, ChunkHeader,
    CompletionChoice, Delta, FinishReason, ModelCard, ModelList, Usage, completion_id,
};
