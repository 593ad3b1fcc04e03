//! Stateful line/literal framer.
//!
//! Transforms an incoming byte stream into complete logical lines, honoring
//! IMAP literal syntax: a literal's declared length may embed arbitrary
//! bytes (including CR/LF) that must not be mistaken for a line terminator,
//! and a literal whose length exceeds the configured cap is handed to the
//! caller as raw chunks instead of being buffered whole.

use bytes::BytesMut;
use tracing::{debug, trace};

use crate::config::Limits;
use crate::error::Error;

/// One unit of output from [`Framer::parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameEvent {
    /// A complete logical line, CRLF included, with any literal payloads
    /// that fit under the configured caps inlined at their original
    /// position (literal headers like `{4}\r\n` remain in the bytes
    /// verbatim; the grammar parser is what interprets them).
    Line(Vec<u8>),
    /// A chunk of a literal's payload that was too large to buffer whole.
    /// Emitted repeatedly (possibly once) until the literal's declared
    /// length has been fully delivered.
    LiteralBytes(Vec<u8>),
}

#[derive(Debug)]
enum FramerState {
    /// Scanning forward for the next LF. `pending_inline_literal`, when
    /// set, means we're partway through copying a small literal's payload
    /// into `line` before the LF search resumes.
    Scanning {
        line: Vec<u8>,
        pending_inline_literal: Option<usize>,
    },
    /// Streaming a literal's payload directly to the caller, bypassing
    /// `line` entirely.
    Streaming { remaining: usize },
}

/// Incrementally frames a byte stream into logical lines and literal chunks.
///
/// One `Framer` is owned per connection. It is *not* restartable across
/// `Incomplete` the way grammar productions are — its whole purpose is to
/// hold the in-progress accumulator between `parse` calls.
#[derive(Debug)]
pub struct Framer {
    limits: Limits,
    continuations_owed: usize,
    state: FramerState,
    force_next_literal_streaming: bool,
}

impl Framer {
    /// Creates a framer with the given limits.
    #[must_use]
    pub fn new(limits: Limits) -> Self {
        Self {
            limits,
            continuations_owed: 0,
            state: FramerState::Scanning {
                line: Vec::new(),
                pending_inline_literal: None,
            },
            force_next_literal_streaming: false,
        }
    }

    /// Requests that the *next* literal header encountered during scanning
    /// be streamed regardless of its declared size, even if it would
    /// otherwise fit comfortably under `buffer_size_limit`.
    ///
    /// Used by [`crate::command::stream::CommandParser`] for APPEND message
    /// payloads and by [`crate::response::stream::ResponseParser`] for
    /// body-section FETCH attributes: both always want a uniform streaming
    /// API regardless of how small a particular message happens to be.
    pub fn request_streaming_for_next_literal(&mut self) {
        self.force_next_literal_streaming = true;
    }

    /// Drains and returns the count of synchronizing-literal continuations
    /// owed to the peer since the last call.
    pub fn take_continuations_owed(&mut self) -> usize {
        std::mem::take(&mut self.continuations_owed)
    }

    /// Consumes as much of `input` as is available and returns the next
    /// ready event, or `None` if more bytes are needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LineTooLong`] if the accumulator exceeds
    /// `buffer_size_limit` without finding a line terminator or entering
    /// streaming mode.
    pub fn parse(&mut self, input: &mut BytesMut) -> Result<Option<FrameEvent>, Error> {
        loop {
            match &mut self.state {
                FramerState::Streaming { remaining } => {
                    if input.is_empty() {
                        return Ok(None);
                    }
                    let take = (*remaining).min(input.len());
                    let chunk = input.split_to(take);
                    *remaining -= take;
                    trace!(take, remaining = *remaining, "framer streamed literal chunk");
                    if *remaining == 0 {
                        self.state = FramerState::Scanning {
                            line: Vec::new(),
                            pending_inline_literal: None,
                        };
                    }
                    return Ok(Some(FrameEvent::LiteralBytes(chunk.to_vec())));
                }
                FramerState::Scanning {
                    line,
                    pending_inline_literal,
                } => {
                    if let Some(remaining) = pending_inline_literal {
                        if input.is_empty() {
                            return Ok(None);
                        }
                        let take = (*remaining).min(input.len());
                        let chunk = input.split_to(take);
                        line.extend_from_slice(&chunk);
                        *remaining -= take;
                        if *remaining > 0 {
                            return Ok(None);
                        }
                        *pending_inline_literal = None;
                        // fall through to resume the LF scan below
                    }

                    let Some(lf_pos) = input.iter().position(|&b| b == b'\n') else {
                        if line.len() + input.len() > self.limits.buffer_size_limit {
                            return Err(Error::LineTooLong {
                                limit: self.limits.buffer_size_limit,
                                offset: line.len() + input.len(),
                            });
                        }
                        line.extend_from_slice(input);
                        input.clear();
                        return Ok(None);
                    };

                    let fragment = input.split_to(lf_pos + 1);
                    line.extend_from_slice(&fragment);

                    match detect_literal_header(line) {
                        Some(LiteralHeader { length, synchronizing }) => {
                            if synchronizing {
                                self.continuations_owed += 1;
                            }
                            let forced = std::mem::take(&mut self.force_next_literal_streaming);
                            let fits = !forced
                                && line.len() + length <= self.limits.buffer_size_limit
                                && length <= self.limits.max_literal_size;
                            debug!(length, synchronizing, forced, fits, "framer saw literal header");
                            if fits {
                                if length == 0 {
                                    // zero-length literal: nothing to consume, resume scanning.
                                    continue;
                                }
                                *pending_inline_literal = Some(length);
                                continue;
                            }
                            let flushed = std::mem::take(line);
                            self.state = FramerState::Streaming { remaining: length };
                            return Ok(Some(FrameEvent::Line(flushed)));
                        }
                        None => {
                            if line.len() > self.limits.buffer_size_limit {
                                return Err(Error::LineTooLong {
                                    limit: self.limits.buffer_size_limit,
                                    offset: line.len(),
                                });
                            }
                            let complete = std::mem::take(line);
                            *pending_inline_literal = None;
                            return Ok(Some(FrameEvent::Line(complete)));
                        }
                    }
                }
            }
        }
    }
}

struct LiteralHeader {
    length: usize,
    synchronizing: bool,
}

/// Scans backward from the end of `line` looking for a literal header
/// (`{N}`, `{N+}`, or `{N-}`) immediately preceding the terminating LF.
///
/// Returns `None` if the tail of `line` is a plain terminator with no
/// literal header, meaning the line is complete as-is.
fn detect_literal_header(line: &[u8]) -> Option<LiteralHeader> {
    let mut idx = line.len();
    if idx == 0 || line[idx - 1] != b'\n' {
        return None;
    }
    idx -= 1;
    if idx > 0 && line[idx - 1] == b'\r' {
        idx -= 1;
    }
    if idx == 0 || line[idx - 1] != b'}' {
        return None;
    }
    idx -= 1;

    let mut synchronizing = true;
    if idx > 0 && (line[idx - 1] == b'+' || line[idx - 1] == b'-') {
        synchronizing = false;
        idx -= 1;
    }

    let digits_end = idx;
    while idx > 0 && line[idx - 1].is_ascii_digit() {
        idx -= 1;
    }
    let digits_start = idx;
    if digits_start == digits_end {
        return None;
    }
    if idx == 0 || line[idx - 1] != b'{' {
        return None;
    }
    idx -= 1;
    let _ = idx;

    let digits = std::str::from_utf8(&line[digits_start..digits_end]).ok()?;
    let length: usize = digits.parse().ok()?;
    Some(LiteralHeader {
        length,
        synchronizing,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buf(s: &[u8]) -> BytesMut {
        BytesMut::from(s)
    }

    #[test]
    fn simple_line_no_literal() {
        let mut framer = Framer::new(Limits::default());
        let mut input = buf(b"a001 CAPABILITY\r\n");
        let event = framer.parse(&mut input).unwrap().unwrap();
        assert_eq!(event, FrameEvent::Line(b"a001 CAPABILITY\r\n".to_vec()));
        assert_eq!(framer.take_continuations_owed(), 0);
    }

    #[test]
    fn incomplete_line_returns_none() {
        let mut framer = Framer::new(Limits::default());
        let mut input = buf(b"a001 CAPAB");
        assert_eq!(framer.parse(&mut input).unwrap(), None);
    }

    #[test]
    fn synchronizing_literal_inlined_and_counted() {
        let mut framer = Framer::new(Limits::default());
        let mut input = buf(b"a002 LOGIN {4}\r\nuser {4}\r\npass\r\n");
        let event = framer.parse(&mut input).unwrap().unwrap();
        assert_eq!(
            event,
            FrameEvent::Line(b"a002 LOGIN {4}\r\nuser {4}\r\npass\r\n".to_vec())
        );
        assert_eq!(framer.take_continuations_owed(), 2);
    }

    #[test]
    fn zero_length_literal_owes_one_continuation() {
        let mut framer = Framer::new(Limits::default());
        let mut input = buf(b"a001 LOGIN {0}\r\n {0}\r\n\r\n");
        let event = framer.parse(&mut input).unwrap().unwrap();
        assert_eq!(
            event,
            FrameEvent::Line(b"a001 LOGIN {0}\r\n {0}\r\n\r\n".to_vec())
        );
        assert_eq!(framer.take_continuations_owed(), 2);
    }

    #[test]
    fn non_synchronizing_literal_owes_no_continuation() {
        let mut framer = Framer::new(Limits::default());
        let mut input = buf(b"a001 LOGIN {4+}\r\nuser {4+}\r\npass\r\n");
        framer.parse(&mut input).unwrap();
        assert_eq!(framer.take_continuations_owed(), 0);
    }

    #[test]
    fn oversized_literal_streams_in_chunks() {
        let limits = Limits::builder().buffer_size_limit(8).build();
        let mut framer = Framer::new(limits);
        let mut input = buf(b"a001 APPEND INBOX {10}\r\n");
        let event = framer.parse(&mut input).unwrap().unwrap();
        assert_eq!(
            event,
            FrameEvent::Line(b"a001 APPEND INBOX {10}\r\n".to_vec())
        );

        let mut more = buf(b"0123456789\r\n");
        let chunk = framer.parse(&mut more).unwrap().unwrap();
        assert_eq!(chunk, FrameEvent::LiteralBytes(b"0123456789".to_vec()));

        let trailing = framer.parse(&mut more).unwrap().unwrap();
        assert_eq!(trailing, FrameEvent::Line(b"\r\n".to_vec()));
    }

    #[test]
    fn forced_streaming_ignores_small_length() {
        let mut framer = Framer::new(Limits::default());
        framer.request_streaming_for_next_literal();
        let mut input = buf(b"a001 APPEND INBOX {3}\r\n");
        let event = framer.parse(&mut input).unwrap().unwrap();
        assert_eq!(
            event,
            FrameEvent::Line(b"a001 APPEND INBOX {3}\r\n".to_vec())
        );

        let mut more = buf(b"abc\r\n");
        let chunk = framer.parse(&mut more).unwrap().unwrap();
        assert_eq!(chunk, FrameEvent::LiteralBytes(b"abc".to_vec()));
    }

    #[test]
    fn line_too_long_without_literal_or_lf() {
        let limits = Limits::builder().buffer_size_limit(4).build();
        let mut framer = Framer::new(limits);
        let mut input = buf(b"abcdefgh");
        assert!(matches!(
            framer.parse(&mut input),
            Err(Error::LineTooLong { limit: 4, .. })
        ));
    }

    #[test]
    fn parse_is_idempotent_on_unchanged_input() {
        let mut framer = Framer::new(Limits::default());
        let mut input = buf(b"a001 NO");
        let first = framer.parse(&mut input).unwrap();
        let second = framer.parse(&mut input).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, None);
    }

    #[test]
    fn split_across_multiple_reads() {
        let mut framer = Framer::new(Limits::default());
        let mut input = buf(b"a001 NO");
        assert_eq!(framer.parse(&mut input).unwrap(), None);
        let mut more = buf(b"OP\r\n");
        let event = framer.parse(&mut more).unwrap().unwrap();
        assert_eq!(event, FrameEvent::Line(b"a001 NOOP\r\n".to_vec()));
    }
}
