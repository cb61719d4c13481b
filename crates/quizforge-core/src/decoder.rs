//! Incremental stream-to-object decoding.
//!
//! A model-generation stream delivers arbitrary text fragments; the decoder
//! reassembles them into complete, depth-balanced `{...}` spans and emits
//! one `GenerationEvent` per span, in arrival order.
//!
//! Two deliberate limitations, carried over from the behavior this replaces:
//! every fragment is stripped of whitespace before scanning, so string
//! values containing spaces lose them; and object boundaries are detected by
//! brace depth alone, so a literal `{` or `}` inside a generated string
//! value desynchronizes the counter. Generated quiz payloads are compact
//! key/value JSON where neither case arises in practice.

use std::mem;

use crate::error::ScoreError;
use crate::model::GenerationEvent;

/// Decoder lifecycle. `Idle` between objects, `Accumulating` while inside
/// one; the terminal states are reached exactly once per stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    Idle,
    Accumulating,
    Completed,
    Failed,
}

/// State machine over one generation stream.
#[derive(Debug)]
pub struct StreamDecoder {
    /// Brace depth. Signed: a stray closer at depth 0 drives it negative,
    /// which suppresses all further emission until the stream fails at end.
    depth: i32,
    buf: String,
    next_seq: u64,
    state: DecoderState,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self {
            depth: 0,
            buf: String::new(),
            next_seq: 0,
            state: DecoderState::Idle,
        }
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// Consume one fragment, returning every event it completes.
    ///
    /// Whitespace is stripped first; then `{` raises the depth, characters
    /// accumulate while the depth is positive, and the `}` that returns the
    /// depth to zero seals the buffer into an event. Input after a terminal
    /// state is ignored.
    pub fn feed(&mut self, fragment: &str) -> Vec<GenerationEvent> {
        if matches!(self.state, DecoderState::Completed | DecoderState::Failed) {
            return Vec::new();
        }

        let mut events = Vec::new();
        for c in fragment.chars().filter(|c| !c.is_whitespace()) {
            if c == '{' {
                self.depth += 1;
            }
            if self.depth > 0 {
                self.buf.push(c);
            }
            if c == '}' {
                self.depth -= 1;
                if self.depth == 0 {
                    events.push(GenerationEvent {
                        seq: self.next_seq,
                        text: mem::take(&mut self.buf),
                    });
                    self.next_seq += 1;
                }
            }
        }

        self.state = if self.depth > 0 {
            DecoderState::Accumulating
        } else {
            DecoderState::Idle
        };
        events
    }

    /// Signal end of stream. Clean only at depth zero; a dangling span is a
    /// `ParseFailure` and the partial buffer is discarded, never emitted.
    pub fn finish(&mut self) -> Result<(), ScoreError> {
        if self.depth != 0 {
            self.state = DecoderState::Failed;
            return Err(ScoreError::ParseFailure(format!(
                "stream ended inside an object (depth {})",
                self.depth
            )));
        }
        self.state = DecoderState::Completed;
        Ok(())
    }

    /// Mark the stream failed after an upstream error. Events already
    /// emitted remain valid.
    pub fn fail(&mut self) {
        self.state = DecoderState::Failed;
    }
}

impl Default for StreamDecoder {
    fn default() -> Self {
        Self::new()
    }
}
