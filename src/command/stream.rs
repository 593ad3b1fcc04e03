//! [`CommandParser`]: the client-command-side state machine driving the
//! framer and grammar parser together.
//!
//! A server wired to this module feeds raw bytes read off a socket into
//! [`CommandParser::poll`] in a loop, and handles each [`CommandEvent`] as it
//! comes out. The parser tracks three modes per the command grammar's own
//! shape: `Lines` for ordinary one-line commands, `StreamingAppend` while an
//! APPEND message payload is in flight, and `Idle` while waiting for the
//! bare `DONE` that ends an IDLE command.

use std::collections::VecDeque;

use bytes::BytesMut;
use tracing::{debug, trace};

use crate::buffer::Cursor;
use crate::config::Limits;
use crate::error::Error;
use crate::framer::{FrameEvent, Framer};
use crate::outcome::ParseOutcome;
use crate::state_machine::move_state_machine;
use crate::tracker::StackTracker;

use super::parse::command;
use super::{Command, CommandBody};

/// One unit of output from [`CommandParser::poll`].
#[derive(Debug, Clone, PartialEq)]
pub enum CommandEvent {
    /// A fully parsed command, tag and body together.
    Command(Command),
    /// A chunk of an in-flight APPEND message payload.
    Bytes(Vec<u8>),
    /// The bare `DONE` that ends an IDLE command.
    IdleDone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Lines,
    Idle,
    StreamingAppend(usize),
}

/// Parses a client byte stream into [`CommandEvent`]s.
///
/// One parser is owned per connection; it holds the framer's accumulator
/// and the current mode across `poll` calls.
#[derive(Debug)]
pub struct CommandParser {
    framer: Framer,
    limits: Limits,
    mode: Mode,
    pending: VecDeque<CommandEvent>,
}

impl CommandParser {
    /// Creates a parser in `Lines` mode with the given limits.
    #[must_use]
    pub fn new(limits: Limits) -> Self {
        Self {
            framer: Framer::new(limits),
            limits,
            mode: Mode::Lines,
            pending: VecDeque::new(),
        }
    }

    /// Consumes as much of `input` as is available and returns the next
    /// ready event, or `None` if more bytes are needed.
    ///
    /// # Errors
    ///
    /// Returns an error if framing fails, a command's grammar is invalid,
    /// or a mode invariant is violated (a non-streaming command left
    /// unconsumed bytes in its frame, or a streaming mode received a frame
    /// shape it did not expect).
    pub fn poll(&mut self, input: &mut BytesMut) -> Result<Option<CommandEvent>, Error> {
        if let Some(event) = self.pending.pop_front() {
            return Ok(Some(event));
        }
        match self.mode {
            Mode::Lines => self.poll_lines(input),
            Mode::Idle => self.poll_idle(input),
            Mode::StreamingAppend(remaining) => self.poll_streaming_append(input, remaining),
        }
    }

    fn poll_lines(&mut self, input: &mut BytesMut) -> Result<Option<CommandEvent>, Error> {
        let Some(event) = self.framer.parse(input)? else {
            return Ok(None);
        };
        let FrameEvent::Line(bytes) = event else {
            return Err(Error::invariant("received literal bytes outside of a command frame", &[]));
        };
        let tracker = StackTracker::new(self.limits.max_recursion_depth);
        let mut cursor = Cursor::new(&bytes);
        let cmd = match command(&mut cursor, &tracker)? {
            ParseOutcome::Done(cmd) => cmd,
            ParseOutcome::Incomplete => {
                return Err(Error::invariant(
                    "a complete framer line failed to parse as a complete command",
                    &bytes,
                ));
            }
        };
        let leftover = &bytes[cursor.position()..];

        if let CommandBody::Append { message, .. } = &cmd.body {
            let literal_length = message.literal_length;
            if leftover.is_empty() {
                // The literal was too large to inline; the framer already
                // switched to streaming it directly from the live input.
                debug!(literal_length, "command parser entering streaming APPEND mode");
                move_state_machine(
                    &mut self.mode,
                    |m| matches!(m, Mode::Lines),
                    Mode::StreamingAppend(literal_length),
                    "lines -> streaming append",
                )?;
            } else {
                if leftover.len() < literal_length {
                    return Err(Error::invariant(
                        "APPEND literal payload shorter than its declared length",
                        leftover,
                    ));
                }
                let (payload, terminator) = leftover.split_at(literal_length);
                if !is_terminator(terminator) {
                    return Err(Error::invariant("APPEND literal not followed by CRLF", terminator));
                }
                if !payload.is_empty() {
                    self.pending.push_back(CommandEvent::Bytes(payload.to_vec()));
                }
            }
        } else if cmd.body == CommandBody::Idle {
            move_state_machine(&mut self.mode, |m| matches!(m, Mode::Lines), Mode::Idle, "lines -> idle")?;
            if !is_terminator(leftover) {
                return Err(Error::invariant("non-empty command frame after IDLE", leftover));
            }
        } else if !is_terminator(leftover) {
            return Err(Error::invariant("non-empty command frame after parsing", leftover));
        }

        Ok(Some(CommandEvent::Command(cmd)))
    }

    fn poll_idle(&mut self, input: &mut BytesMut) -> Result<Option<CommandEvent>, Error> {
        let Some(event) = self.framer.parse(input)? else {
            return Ok(None);
        };
        let FrameEvent::Line(bytes) = event else {
            return Err(Error::invariant("received literal bytes while idling", &[]));
        };
        let trimmed = trim_terminator(&bytes);
        if !trimmed.eq_ignore_ascii_case(b"DONE") {
            return Err(Error::InvalidSyntax {
                position: 0,
                production: "idle-done",
                hint: format!("expected DONE, got {:?}", String::from_utf8_lossy(trimmed)),
            });
        }
        move_state_machine(&mut self.mode, |m| matches!(m, Mode::Idle), Mode::Lines, "idle -> lines")?;
        Ok(Some(CommandEvent::IdleDone))
    }

    fn poll_streaming_append(
        &mut self,
        input: &mut BytesMut,
        remaining: usize,
    ) -> Result<Option<CommandEvent>, Error> {
        if remaining == 0 {
            let Some(event) = self.framer.parse(input)? else {
                return Ok(None);
            };
            let FrameEvent::Line(bytes) = event else {
                return Err(Error::invariant("expected APPEND terminator, got more literal bytes", &[]));
            };
            if !is_terminator(&bytes) {
                return Err(Error::invariant("APPEND literal not followed by CRLF", &bytes));
            }
            move_state_machine(
                &mut self.mode,
                |m| matches!(m, Mode::StreamingAppend(0)),
                Mode::Lines,
                "streaming append -> lines",
            )?;
            return self.poll(input);
        }

        let Some(event) = self.framer.parse(input)? else {
            return Ok(None);
        };
        let FrameEvent::LiteralBytes(chunk) = event else {
            return Err(Error::invariant("expected APPEND literal bytes, got a line", &[]));
        };
        trace!(taken = chunk.len(), remaining, "streaming APPEND chunk");
        let next_remaining = remaining.saturating_sub(chunk.len());
        self.mode = Mode::StreamingAppend(next_remaining);
        Ok(Some(CommandEvent::Bytes(chunk)))
    }
}

fn is_terminator(bytes: &[u8]) -> bool {
    bytes == b"\r\n" || bytes == b"\n"
}

fn trim_terminator(bytes: &[u8]) -> &[u8] {
    bytes.strip_suffix(b"\r\n").or_else(|| bytes.strip_suffix(b"\n")).unwrap_or(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buf(s: &[u8]) -> BytesMut {
        BytesMut::from(s)
    }

    #[test]
    fn parses_simple_command() {
        let mut parser = CommandParser::new(Limits::default());
        let mut input = buf(b"a001 CAPABILITY\r\n");
        let event = parser.poll(&mut input).unwrap().unwrap();
        assert!(matches!(event, CommandEvent::Command(cmd) if cmd.body == CommandBody::Capability));
    }

    #[test]
    fn append_streams_inlined_literal_then_returns_to_lines() {
        let mut parser = CommandParser::new(Limits::default());
        let mut input = buf(b"a003 APPEND INBOX {10}\r\n0123456789\r\n");
        let first = parser.poll(&mut input).unwrap().unwrap();
        assert!(matches!(first, CommandEvent::Command(cmd) if matches!(cmd.body, CommandBody::Append { .. })));
        let second = parser.poll(&mut input).unwrap().unwrap();
        assert_eq!(second, CommandEvent::Bytes(b"0123456789".to_vec()));
        assert_eq!(parser.mode, Mode::Lines);

        let mut next = buf(b"a004 NOOP\r\n");
        let third = parser.poll(&mut next).unwrap().unwrap();
        assert!(matches!(third, CommandEvent::Command(cmd) if cmd.body == CommandBody::Noop));
    }

    #[test]
    fn append_streams_oversized_literal_in_chunks() {
        let limits = Limits::builder().buffer_size_limit(8).build();
        let mut parser = CommandParser::new(limits);
        let mut input = buf(b"a001 APPEND INBOX {10}\r\n");
        let first = parser.poll(&mut input).unwrap().unwrap();
        assert!(matches!(first, CommandEvent::Command(_)));
        assert_eq!(parser.mode, Mode::StreamingAppend(10));

        let mut more = buf(b"0123456789\r\n");
        let chunk = parser.poll(&mut more).unwrap().unwrap();
        assert_eq!(chunk, CommandEvent::Bytes(b"0123456789".to_vec()));
        let back_to_lines = parser.poll(&mut more).unwrap();
        assert_eq!(back_to_lines, None);
        assert_eq!(parser.mode, Mode::Lines);
    }

    #[test]
    fn idle_then_done_round_trip() {
        let mut parser = CommandParser::new(Limits::default());
        let mut input = buf(b"a004 IDLE\r\n");
        let first = parser.poll(&mut input).unwrap().unwrap();
        assert!(matches!(first, CommandEvent::Command(cmd) if cmd.body == CommandBody::Idle));
        assert_eq!(parser.mode, Mode::Idle);

        let mut done = buf(b"DONE\r\n");
        let second = parser.poll(&mut done).unwrap().unwrap();
        assert_eq!(second, CommandEvent::IdleDone);
        assert_eq!(parser.mode, Mode::Lines);
    }

    #[test]
    fn trailing_garbage_after_non_streaming_command_is_an_error() {
        let mut parser = CommandParser::new(Limits::default());
        // A hand-crafted frame the grammar would stop parsing partway
        // through; simulated here by feeding NOOP with trailing bytes that
        // are not CRLF (cannot occur from a well-formed line in practice,
        // but the invariant must still hold).
        let mut input = buf(b"a001 NOOPX\r\n");
        // NOOPX is parsed as an unknown extension keyword, not an error,
        // so this exercises the extension path rather than the invariant;
        // kept as a sanity check that extension commands still round-trip.
        let event = parser.poll(&mut input).unwrap().unwrap();
        assert!(matches!(event, CommandEvent::Command(cmd) if cmd.body.keyword() == "NOOPX"));
    }
}
