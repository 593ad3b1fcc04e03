//! [`ResponseParser`]: the client-side state machine driving the framer
//! and the response grammar together.
//!
//! A client wired to this module feeds raw bytes read off a socket into
//! [`ResponseParser::poll`] in a loop, and handles each [`ResponseEvent`]
//! as it comes out. The first call must observe the connection's greeting;
//! afterward the parser alternates between plain response lines and, for a
//! FETCH, an attribute-by-attribute walk that may itself be interrupted by
//! a streamed body-section literal mid-list.

use std::collections::VecDeque;

use bytes::BytesMut;
use tracing::trace;

use crate::buffer::Cursor;
use crate::config::Limits;
use crate::error::Error;
use crate::framer::{FrameEvent, Framer};
use crate::outcome::ParseOutcome;
use crate::state_machine::move_state_machine;
use crate::tracker::StackTracker;
use crate::types::SeqNum;

use super::parse::{
    continuation_request, fetch_attribute_list, greeting, tagged_completion, untagged_line,
    AttributeListProgress, UntaggedLine,
};
use super::ResponseData;
pub use super::{ResponseBegin, ResponseEvent};

/// The FETCH-attribute-list sub-states (`Head`/`Attr`/`Sep`) are walked
/// entirely inside one [`fetch_attribute_list`] call — the grammar already
/// loops attribute-by-attribute until it either closes the list or hits a
/// literal that needs streaming — so the only sub-state a `poll` call ever
/// needs to resume from is `Sep`, immediately after a streamed literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Greeting,
    Response,
    FetchAttr,
    StreamingBytes(usize),
}

/// Parses a server byte stream into [`ResponseEvent`]s.
///
/// One parser is owned per connection; it holds the framer's accumulator,
/// the current mode, and (while inside a FETCH) the sequence number the
/// in-progress attribute events belong to.
#[derive(Debug)]
pub struct ResponseParser {
    framer: Framer,
    limits: Limits,
    mode: Mode,
    fetch_seq: Option<SeqNum>,
    pending: VecDeque<ResponseEvent>,
}

impl ResponseParser {
    /// Creates a parser expecting a greeting next, with the given limits.
    #[must_use]
    pub fn new(limits: Limits) -> Self {
        Self {
            framer: Framer::new(limits),
            limits,
            mode: Mode::Greeting,
            fetch_seq: None,
            pending: VecDeque::new(),
        }
    }

    /// Consumes as much of `input` as is available and returns the next
    /// ready event, or `None` if more bytes are needed.
    ///
    /// # Errors
    ///
    /// Returns an error if framing fails, a response's grammar is invalid,
    /// or a mode invariant is violated (a FETCH attribute list left
    /// unconsumed bytes in its frame, or streaming mode received a frame
    /// shape it did not expect).
    pub fn poll(&mut self, input: &mut BytesMut) -> Result<Option<ResponseEvent>, Error> {
        if let Some(event) = self.pending.pop_front() {
            return Ok(Some(event));
        }
        match self.mode {
            Mode::Greeting => self.poll_greeting(input),
            Mode::Response => self.poll_response(input),
            Mode::FetchAttr => self.poll_fetch_attr(input),
            Mode::StreamingBytes(remaining) => self.poll_streaming_bytes(input, remaining),
        }
    }

    fn poll_greeting(&mut self, input: &mut BytesMut) -> Result<Option<ResponseEvent>, Error> {
        let Some(event) = self.framer.parse(input)? else {
            return Ok(None);
        };
        let FrameEvent::Line(bytes) = event else {
            return Err(Error::invariant("received literal bytes before a greeting", &[]));
        };
        let mut cursor = Cursor::new(&bytes);
        let g = match greeting(&mut cursor)? {
            ParseOutcome::Done(g) => g,
            ParseOutcome::Incomplete => {
                return Err(Error::invariant("a complete framer line failed to parse as a greeting", &bytes));
            }
        };
        reject_leftover(&bytes, cursor.position())?;
        move_state_machine(&mut self.mode, |m| matches!(m, Mode::Greeting), Mode::Response, "greeting -> response")?;
        Ok(Some(ResponseEvent::Greeting(g)))
    }

    fn poll_response(&mut self, input: &mut BytesMut) -> Result<Option<ResponseEvent>, Error> {
        let Some(event) = self.framer.parse(input)? else {
            return Ok(None);
        };
        let FrameEvent::Line(bytes) = event else {
            return Err(Error::invariant("received literal bytes outside of a FETCH attribute list", &[]));
        };
        if bytes.first() == Some(&b'+') {
            let mut cursor = Cursor::new(&bytes);
            let req = match continuation_request(&mut cursor)? {
                ParseOutcome::Done(v) => v,
                ParseOutcome::Incomplete => {
                    return Err(Error::invariant("a complete framer line failed to parse as a continuation", &bytes));
                }
            };
            reject_leftover(&bytes, cursor.position())?;
            return Ok(Some(ResponseEvent::ContinuationRequest(req)));
        }
        if bytes.first() == Some(&b'*') {
            let tracker = StackTracker::new(self.limits.max_recursion_depth);
            let mut cursor = Cursor::new(&bytes);
            cursor.advance(1);
            cursor.consume_byte(b' ');
            let line = match untagged_line(&mut cursor, &tracker)? {
                ParseOutcome::Done(v) => v,
                ParseOutcome::Incomplete => {
                    return Err(Error::invariant("a complete framer line failed to parse as untagged data", &bytes));
                }
            };
            return match line {
                UntaggedLine::Data(data) => {
                    reject_leftover(&bytes, cursor.position())?;
                    Ok(Some(ResponseEvent::ResponseBegin(ResponseBegin::Data(data))))
                }
                UntaggedLine::Fetch { seq, progress } => {
                    self.fetch_seq = Some(seq);
                    self.pending.push_back(ResponseEvent::ResponseBegin(ResponseBegin::Fetch { seq }));
                    self.enter_fetch_progress(progress, &bytes, cursor.position())?;
                    Ok(self.pending.pop_front())
                }
            };
        }
        let mut cursor = Cursor::new(&bytes);
        let completion = match tagged_completion(&mut cursor)? {
            ParseOutcome::Done(v) => v,
            ParseOutcome::Incomplete => {
                return Err(Error::invariant("a complete framer line failed to parse as a tagged completion", &bytes));
            }
        };
        reject_leftover(&bytes, cursor.position())?;
        Ok(Some(ResponseEvent::TaggedCompletion(completion)))
    }

    /// Folds a freshly parsed [`AttributeListProgress`] into `pending` and
    /// sets the mode for whatever comes next, whether that is more
    /// attributes, the end of the list, or a streamed literal.
    fn enter_fetch_progress(
        &mut self,
        progress: AttributeListProgress,
        frame: &[u8],
        consumed: usize,
    ) -> Result<(), Error> {
        match progress {
            AttributeListProgress::Attributes(attrs) => {
                for attr in attrs {
                    self.pending.push_back(ResponseEvent::SimpleAttribute(attr));
                }
                reject_leftover(frame, consumed)?;
                self.pending.push_back(ResponseEvent::AttributesFinish);
                self.fetch_seq = None;
                self.mode = Mode::Response;
            }
            AttributeListProgress::StreamingAt { parsed, kind, origin, length, is_literal8 } => {
                for attr in parsed {
                    self.pending.push_back(ResponseEvent::SimpleAttribute(attr));
                }
                reject_leftover(frame, consumed)?;
                self.pending
                    .push_back(ResponseEvent::StreamingAttributeBegin { kind, origin, size: length, is_literal8 });
                self.mode = Mode::StreamingBytes(length);
            }
        }
        Ok(())
    }

    fn poll_fetch_attr(&mut self, input: &mut BytesMut) -> Result<Option<ResponseEvent>, Error> {
        let Some(event) = self.framer.parse(input)? else {
            return Ok(None);
        };
        let FrameEvent::Line(bytes) = event else {
            return Err(Error::invariant("received literal bytes outside of a FETCH attribute list", &[]));
        };
        let tracker = StackTracker::new(self.limits.max_recursion_depth);
        let mut cursor = Cursor::new(&bytes);
        let progress = match fetch_attribute_list(&mut cursor, &tracker, false)? {
            ParseOutcome::Done(v) => v,
            ParseOutcome::Incomplete => {
                return Err(Error::invariant("a complete framer line failed to resume a FETCH attribute list", &bytes));
            }
        };
        let consumed = cursor.position();
        self.enter_fetch_progress(progress, &bytes, consumed)?;
        Ok(self.pending.pop_front())
    }

    fn poll_streaming_bytes(
        &mut self,
        input: &mut BytesMut,
        remaining: usize,
    ) -> Result<Option<ResponseEvent>, Error> {
        if remaining == 0 {
            // The literal's payload is fully delivered; what is left on the
            // wire is whatever followed it on the same logical line — the
            // separating SP before the next attribute, or the closing `)`
            // and CRLF. That is exactly what `fetch_attribute_list` expects
            // to resume from, so hand it straight to the `Sep` parse rather
            // than special-casing the CR/LF here.
            move_state_machine(
                &mut self.mode,
                |m| matches!(m, Mode::StreamingBytes(0)),
                Mode::FetchAttr,
                "streaming bytes -> fetch attr sep",
            )?;
            self.pending.push_back(ResponseEvent::StreamingAttributeEnd);
            return self.poll(input);
        }

        let Some(event) = self.framer.parse(input)? else {
            return Ok(None);
        };
        let FrameEvent::LiteralBytes(chunk) = event else {
            return Err(Error::invariant("expected streamed FETCH literal bytes, got a line", &[]));
        };
        trace!(taken = chunk.len(), remaining, "streaming FETCH attribute chunk");
        let next_remaining = remaining.saturating_sub(chunk.len());
        self.mode = Mode::StreamingBytes(next_remaining);
        Ok(Some(ResponseEvent::StreamingAttributeBytes(chunk)))
    }
}

/// A line the framer judged complete must be fully consumed by its parser;
/// any leftover bytes mean the grammar stopped short of the framer's own
/// boundary, which is always a bug rather than more-bytes-needed (the
/// framer has already delivered everything up to the terminator).
fn reject_leftover(frame: &[u8], consumed: usize) -> Result<(), Error> {
    let leftover = &frame[consumed..];
    if leftover == b"\r\n" || leftover == b"\n" || leftover.is_empty() {
        Ok(())
    } else {
        Err(Error::invariant("non-empty response frame after parsing", leftover))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Flag, Flags, Uid};

    use super::super::{FetchAttribute, GreetingStatus, StreamingAttributeKind};
    use crate::grammar::Section;

    fn buf(s: &[u8]) -> BytesMut {
        BytesMut::from(s)
    }

    #[test]
    fn greeting_then_tagged_completion_round_trip() {
        let mut parser = ResponseParser::new(Limits::default());
        let mut input = buf(b"* OK IMAP4rev1 Service Ready\r\na1 OK LOGIN completed\r\n");
        let first = parser.poll(&mut input).unwrap().unwrap();
        match first {
            ResponseEvent::Greeting(g) => assert_eq!(g.status, GreetingStatus::Ok),
            other => panic!("unexpected {other:?}"),
        }
        let second = parser.poll(&mut input).unwrap().unwrap();
        match second {
            ResponseEvent::TaggedCompletion(tc) => assert_eq!(tc.tag.as_str(), "a1"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn continuation_request_is_surfaced_mid_stream() {
        let mut parser = ResponseParser::new(Limits::default());
        let mut input = buf(b"* OK ready\r\n");
        parser.poll(&mut input).unwrap();
        let mut more = buf(b"+ send literal\r\n");
        let event = parser.poll(&mut more).unwrap().unwrap();
        assert_eq!(event, ResponseEvent::ContinuationRequest(crate::response::ContinuationRequest {
            text: Some("send literal".into()),
        }));
    }

    #[test]
    fn fetch_with_fully_inlined_attributes_emits_begin_and_finish() {
        let mut parser = ResponseParser::new(Limits::default());
        let mut input = buf(b"* OK ready\r\n");
        parser.poll(&mut input).unwrap();
        let mut more = buf(b"* 1 FETCH (FLAGS (\\Seen) UID 9)\r\n");

        let begin = parser.poll(&mut more).unwrap().unwrap();
        assert_eq!(begin, ResponseEvent::ResponseBegin(ResponseBegin::Fetch { seq: SeqNum::new(1).unwrap() }));

        let flags = parser.poll(&mut more).unwrap().unwrap();
        assert_eq!(flags, ResponseEvent::SimpleAttribute(FetchAttribute::Flags(Flags::from_iter([Flag::Seen]))));

        let uid = parser.poll(&mut more).unwrap().unwrap();
        assert_eq!(uid, ResponseEvent::SimpleAttribute(FetchAttribute::Uid(Uid::new(9).unwrap())));

        let finish = parser.poll(&mut more).unwrap().unwrap();
        assert_eq!(finish, ResponseEvent::AttributesFinish);

        let mut next = buf(b"a1 OK FETCH completed\r\n");
        let completion = parser.poll(&mut next).unwrap().unwrap();
        assert!(matches!(completion, ResponseEvent::TaggedCompletion(_)));
    }

    #[test]
    fn fetch_body_streaming_matches_the_worked_example() {
        let mut parser = ResponseParser::new(Limits::default());
        let mut input = buf(b"* OK ready\r\n");
        parser.poll(&mut input).unwrap();

        let mut more = buf(b"* 1 FETCH (BODY[TEXT]<4> {3}\r\nabc FLAGS (\\Answered))\r\n");

        let begin = parser.poll(&mut more).unwrap().unwrap();
        assert_eq!(begin, ResponseEvent::ResponseBegin(ResponseBegin::Fetch { seq: SeqNum::new(1).unwrap() }));

        let streaming_begin = parser.poll(&mut more).unwrap().unwrap();
        assert_eq!(
            streaming_begin,
            ResponseEvent::StreamingAttributeBegin {
                kind: StreamingAttributeKind::Body(Section::Text(vec![])),
                origin: Some(4),
                size: 3,
                is_literal8: false,
            }
        );

        let bytes_event = parser.poll(&mut more).unwrap().unwrap();
        assert_eq!(bytes_event, ResponseEvent::StreamingAttributeBytes(b"abc".to_vec()));

        let end = parser.poll(&mut more).unwrap().unwrap();
        assert_eq!(end, ResponseEvent::StreamingAttributeEnd);

        let flags = parser.poll(&mut more).unwrap().unwrap();
        assert_eq!(flags, ResponseEvent::SimpleAttribute(FetchAttribute::Flags(Flags::from_iter([Flag::Answered]))));

        let finish = parser.poll(&mut more).unwrap().unwrap();
        assert_eq!(finish, ResponseEvent::AttributesFinish);
    }

    #[test]
    fn fetch_body_streaming_splits_across_poll_calls_when_oversized() {
        let limits = Limits::builder().buffer_size_limit(8).build();
        let mut parser = ResponseParser::new(limits);
        let mut input = buf(b"* OK ready\r\n");
        parser.poll(&mut input).unwrap();

        let mut more = buf(b"* 1 FETCH (BODY[TEXT] {10}\r\n");
        parser.poll(&mut more).unwrap();
        let streaming_begin = parser.poll(&mut more).unwrap().unwrap();
        assert_eq!(
            streaming_begin,
            ResponseEvent::StreamingAttributeBegin {
                kind: StreamingAttributeKind::Body(Section::Text(vec![])),
                origin: None,
                size: 10,
                is_literal8: false,
            }
        );

        let mut payload = buf(b"0123456789)\r\n");
        let bytes_event = parser.poll(&mut payload).unwrap().unwrap();
        assert_eq!(bytes_event, ResponseEvent::StreamingAttributeBytes(b"0123456789".to_vec()));

        let end = parser.poll(&mut payload).unwrap().unwrap();
        assert_eq!(end, ResponseEvent::StreamingAttributeEnd);

        let finish = parser.poll(&mut payload).unwrap().unwrap();
        assert_eq!(finish, ResponseEvent::AttributesFinish);
    }
}
