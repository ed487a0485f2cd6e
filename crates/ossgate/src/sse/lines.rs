//! Incremental byte-to-line reassembly
//!
//! Transport frames carry no boundary guarantees: a frame may end in the
//! middle of a line or in the middle of a multi-byte UTF-8 character. Bytes
//! are buffered raw and only decoded once a full line (terminated by `\n`) is
//! available. A newline byte never occurs inside a multi-byte UTF-8 sequence,
//! so a character split across frames is always reassembled before decoding.

use bytes::{Bytes, BytesMut};
use futures::stream::{Stream, StreamExt};

const BOM: char = '\u{FEFF}';

/// Pending-bytes buffer that yields complete lines as frames arrive
#[derive(Debug, Default)]
pub struct LineReassembler {
    pending: BytesMut,
    /// Bytes of `pending` already known to contain no `\n`
    scanned: usize,
    /// Whether the first line has been handed out (and its BOM stripped)
    started: bool,
}

impl LineReassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a newly arrived frame to the pending buffer
    pub fn push(&mut self, frame: &[u8]) {
        self.pending.extend_from_slice(frame);
    }

    /// Take the next complete line out of the buffer, without its `\n`
    ///
    /// Returns `None` when only a partial line (or nothing) remains.
    /// Invalid UTF-8 is replaced with U+FFFD. A byte-order mark opening the
    /// first line is dropped.
    pub fn next_line(&mut self) -> Option<String> {
        let Some(offset) = self.pending[self.scanned..].iter().position(|&b| b == b'\n') else {
            self.scanned = self.pending.len();
            return None;
        };
        let pos = self.scanned + offset;
        self.scanned = 0;

        let mut line = self.pending.split_to(pos + 1);
        line.truncate(pos);
        let mut text = String::from_utf8_lossy(&line).into_owned();

        if !self.started {
            self.started = true;
            if text.starts_with(BOM) {
                text.replace_range(..BOM.len_utf8(), "");
            }
        }
        Some(text)
    }

    /// Number of buffered bytes not yet part of a complete line
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

/// Turn a stream of transport frames into a lazy stream of complete lines.
///
/// A transport error is yielded once and ends the stream. A trailing line
/// without a terminating newline is dropped when the frames run out.
pub fn lines<S, E>(frames: S) -> impl Stream<Item = Result<String, E>>
where
    S: Stream<Item = Result<Bytes, E>>,
{
    async_stream::stream! {
        let mut reassembler = LineReassembler::new();
        futures::pin_mut!(frames);

        while let Some(frame) = frames.next().await {
            match frame {
                Ok(frame) => {
                    reassembler.push(&frame);
                    while let Some(line) = reassembler.next_line() {
                        yield Ok(line);
                    }
                }
                Err(e) => {
                    yield Err(e);
                    return;
                }
            }
        }

        if reassembler.pending_len() > 0 {
            tracing::trace!(
                bytes = reassembler.pending_len(),
                "Discarding unterminated trailing line"
            );
        }
    }
}
