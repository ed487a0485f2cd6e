//! ossgate - OpenAI-compatible gateway for the gpt-oss ChatKit API
//!
//! Accepts chat-completion requests, forwards the latest user turn to the
//! upstream thread API and translates its SSE event stream back into either
//! streamed completion chunks or a single aggregated completion.

pub mod chatkit;
pub mod config;
pub mod error;
pub mod openai;
pub mod proxy;
pub mod sse;
pub mod translate;

pub use error::GatewayError;
