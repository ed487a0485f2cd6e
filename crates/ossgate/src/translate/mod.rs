//! ChatKit event stream to OpenAI response translation
//!
//! Both consumers share one pipeline: frames are reassembled into lines,
//! `data:` payloads are decoded, and each document is classified. The
//! streaming encoder re-emits events as chunks; the aggregator folds them into
//! a single completion.

mod aggregate;
mod stream;

pub use aggregate::{AggregatedResult, Aggregator, aggregate};
pub use stream::{FinishPolicy, StreamEncoder, encode_stream, sse_frame};

use bytes::Bytes;
use futures::stream::{Stream, StreamExt};

use crate::chatkit::{Classified, classify};
use crate::sse::{decode_line, lines};

/// Classified events in upstream arrival order.
///
/// Lines that do not decode are skipped. A transport error is yielded once and
/// ends the stream.
pub fn events<S, E>(frames: S) -> impl Stream<Item = Result<Classified, E>>
where
    S: Stream<Item = Result<Bytes, E>>,
{
    lines(frames).filter_map(|line| async move {
        match line {
            Ok(line) => decode_line(&line).map(|doc| Ok(classify(&doc))),
            Err(e) => Some(Err(e)),
        }
    })
}
