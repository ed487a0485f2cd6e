//! Live re-encoding of ChatKit events as OpenAI SSE chunks

use bytes::Bytes;
use futures::stream::{Stream, StreamExt};
use serde::Serialize;
use std::convert::Infallible;
use std::fmt::Display;

use crate::chatkit::{UpstreamEvent, is_trivial_reasoning};
use crate::error::Result;
use crate::openai::{ChunkHeader, Delta, FinishReason};
use crate::sse::{DATA_PREFIX, DONE_SENTINEL};

/// Frame `value` as one `data: <json>\n\n` SSE event
pub fn sse_frame<T: Serialize>(value: &T) -> Result<Bytes> {
    let json = serde_json::to_string(value)?;
    Ok(Bytes::from(format!("{DATA_PREFIX}{json}\n\n")))
}

fn done_frame() -> Bytes {
    Bytes::from(format!("{DATA_PREFIX}{DONE_SENTINEL}\n\n"))
}

/// What to do with the upstream connection once the finish event was encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FinishPolicy {
    /// Stop reading and drop the upstream response
    #[default]
    Close,
    /// Keep reading the upstream body to its end without emitting anything
    Drain,
}

impl FinishPolicy {
    pub fn from_drain_flag(drain_after_finish: bool) -> Self {
        if drain_after_finish {
            FinishPolicy::Drain
        } else {
            FinishPolicy::Close
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EncoderState {
    Init,
    Streaming,
    Finished,
}

/// State machine turning classified events into outgoing frames.
///
/// `Init -> Streaming` emits the empty opening chunk; `Finish` emits the stop
/// chunk and the `[DONE]` frame and moves to `Finished`, after which nothing
/// more is produced.
#[derive(Debug)]
pub struct StreamEncoder {
    header: ChunkHeader,
    state: EncoderState,
}

impl StreamEncoder {
    pub fn new(header: ChunkHeader) -> Self {
        Self {
            header,
            state: EncoderState::Init,
        }
    }

    /// Opening chunk with an empty delta; `None` after the first call
    pub fn start(&mut self) -> Option<Bytes> {
        if self.state != EncoderState::Init {
            return None;
        }
        self.state = EncoderState::Streaming;
        self.frame(Delta::default(), None)
    }

    /// Frames for one event, in emission order
    pub fn encode(&mut self, event: &UpstreamEvent) -> Vec<Bytes> {
        let mut out = Vec::new();
        if self.state == EncoderState::Finished {
            return out;
        }
        out.extend(self.start());

        match event {
            UpstreamEvent::ContentDelta { text } if !text.is_empty() => {
                out.extend(self.frame(Delta::content(text.as_str()), None));
            }
            UpstreamEvent::ReasoningEntry { text } if !is_trivial_reasoning(text) => {
                out.extend(self.frame(Delta::reasoning(text.as_str()), None));
            }
            UpstreamEvent::Finish => {
                out.extend(self.frame(Delta::default(), Some(FinishReason::Stop)));
                out.push(done_frame());
                self.state = EncoderState::Finished;
            }
            _ => {}
        }

        out
    }

    pub fn is_finished(&self) -> bool {
        self.state == EncoderState::Finished
    }

    pub fn header(&self) -> &ChunkHeader {
        &self.header
    }

    fn frame(&self, delta: Delta, finish_reason: Option<FinishReason>) -> Option<Bytes> {
        match sse_frame(&self.header.chunk(delta, finish_reason)) {
            Ok(frame) => Some(frame),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize chunk");
                None
            }
        }
    }
}

/// Build the live response body for one streaming request.
///
/// The opening chunk is produced before the upstream is polled. Read errors
/// end the body quietly with no error chunk. The returned stream owns the
/// upstream frames, so dropping it (e.g. on client disconnect) closes the
/// upstream connection.
pub fn encode_stream<S, E>(
    frames: S,
    header: ChunkHeader,
    policy: FinishPolicy,
) -> impl Stream<Item = std::result::Result<Bytes, Infallible>> + Send + 'static
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    async_stream::stream! {
        let mut encoder = StreamEncoder::new(header);
        if let Some(opening) = encoder.start() {
            yield Ok(opening);
        }

        let events = super::events(frames);
        futures::pin_mut!(events);

        while let Some(item) = events.next().await {
            match item {
                Ok(classified) => {
                    for frame in encoder.encode(&classified.event) {
                        yield Ok(frame);
                    }
                    if encoder.is_finished() && policy == FinishPolicy::Close {
                        tracing::debug!(id = %encoder.header().id, "Finish received, closing upstream");
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!(id = %encoder.header().id, error = %e, "Upstream stream failed, closing response");
                    break;
                }
            }
        }

        if !encoder.is_finished() {
            tracing::debug!(id = %encoder.header().id, "Upstream ended without a finish event");
        }
    }
}
