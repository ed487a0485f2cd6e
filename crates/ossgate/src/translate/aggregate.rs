//! Folding a ChatKit event stream into one completion

use bytes::Bytes;
use futures::stream::{Stream, StreamExt};
use std::fmt::Display;

use crate::chatkit::{Classified, ThreadIdCapture, UpstreamEvent, is_trivial_reasoning};

/// Everything a non-streaming response needs from the upstream stream
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregatedResult {
    pub text: String,
    pub reasoning: Vec<String>,
    pub thread_id: Option<String>,
}

/// Accumulator fed one classified event at a time
#[derive(Debug, Default)]
pub struct Aggregator {
    text: String,
    reasoning: Vec<String>,
    thread_id: ThreadIdCapture,
    finished: bool,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accept(&mut self, classified: &Classified) {
        self.thread_id.offer(classified.thread_id.as_deref());

        match &classified.event {
            UpstreamEvent::ContentDelta { text } => self.text.push_str(text),
            UpstreamEvent::ReasoningEntry { text } if !is_trivial_reasoning(text) => {
                self.reasoning.push(text.clone());
            }
            UpstreamEvent::Finish => self.finished = true,
            _ => {}
        }
    }

    /// Whether a finish event was seen; completion does not depend on it
    pub fn saw_finish(&self) -> bool {
        self.finished
    }

    pub fn finish(self) -> AggregatedResult {
        AggregatedResult {
            text: self.text,
            reasoning: self.reasoning,
            thread_id: self.thread_id.into_inner(),
        }
    }
}

/// Consume the whole upstream body and compose the result.
///
/// A read error ends aggregation early; whatever was accumulated so far is
/// returned.
pub async fn aggregate<S, E>(frames: S) -> AggregatedResult
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Display,
{
    let mut aggregator = Aggregator::new();
    let events = super::events(frames);
    futures::pin_mut!(events);

    while let Some(item) = events.next().await {
        match item {
            Ok(classified) => aggregator.accept(&classified),
            Err(e) => {
                tracing::warn!(error = %e, "Upstream stream failed, returning partial completion");
                break;
            }
        }
    }

    if !aggregator.saw_finish() {
        tracing::debug!("Upstream ended without a finish event");
    }
    aggregator.finish()
}
