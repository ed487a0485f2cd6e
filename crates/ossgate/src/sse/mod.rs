//! Server-Sent Events ingestion: frames to lines, lines to JSON payloads

mod decode;
mod lines;

pub use decode::{DATA_PREFIX, DONE_SENTINEL, data_payload, decode_line};
pub use lines::{LineReassembler, lines};
