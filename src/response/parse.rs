//! Grammar-level parsing of server response bodies.
//!
//! Operates on a logical line the framer has already reconstructed, the
//! same contract as [`crate::command::parse`]. FETCH responses are the one
//! shape that can legitimately span more than one framer event (a
//! parenthesized attribute list may carry several body-section literals,
//! each independently subject to the framer's streaming threshold) — see
//! [`fetch_attribute_list`] and [`stream::ResponseParser`](super::stream::ResponseParser)
//! for how the two halves of that list are stitched back together.

use crate::buffer::Cursor;
use crate::error::Error;
use crate::grammar::combinators::{parse_nz_number, parse_space, parse_unsigned_integer};
use crate::grammar::primitives::{
    fetch_attribute_keyword, literal_header, nstring_inline, quoted_string, LiteralHeader,
};
use crate::grammar::{
    body_structure, envelope, flag_list, mailbox_name, section_spec, status_att_list, uid_set, Section,
};
use crate::outcome::{done, ParseOutcome, ParseResult};
use crate::tracker::StackTracker;
use crate::types::{Mailbox, SeqNum, Tag, Uid, UidValidity};

use super::types::{
    CompletionStatus, ContinuationRequest, FetchAttribute, Greeting, GreetingStatus, ResponseCode,
    ResponseData, StreamingAttributeKind, TaggedCompletion, UntaggedStatusKind,
};

fn atom_upper<'a>(cursor: &mut Cursor<'a>) -> ParseResult<String> {
    crate::grammar::primitives::atom(cursor).map(|o| o.map(str::to_ascii_uppercase))
}

/// Parses the text following a status keyword: `["[" resp-text-code "]"]
/// [SP] text`, up to (not including) the trailing CRLF.
fn resp_text(cursor: &mut Cursor<'_>) -> ParseResult<(Option<ResponseCode>, String)> {
    let start = cursor.checkpoint();
    // A leading space always separates the keyword from resp-text, except
    // when resp-text is itself empty (bare `+\r\n` continuations handle
    // that case separately; every status line has a resp-text-code or text).
    let had_space = cursor.consume_byte(b' ');
    let code = if cursor.peek() == Some(b'[') {
        match response_code(cursor)? {
            ParseOutcome::Done(c) => {
                // resp-text-code is followed by its own SP before text.
                cursor.consume_byte(b' ');
                Some(c)
            }
            ParseOutcome::Incomplete => {
                cursor.rewind(start);
                return crate::outcome::incomplete();
            }
        }
    } else {
        None
    };
    if !had_space && code.is_none() {
        cursor.rewind(start);
        return Err(Error::InvalidSyntax {
            position: start,
            production: "resp-text",
            hint: "expected SP before resp-text".to_string(),
        });
    }
    let text_bytes = cursor.take_while(|b| b != b'\r' && b != b'\n');
    if cursor.is_empty() {
        cursor.rewind(start);
        return crate::outcome::incomplete();
    }
    let text = String::from_utf8_lossy(text_bytes).into_owned();
    done((code, text))
}

/// Parses `"[" resp-text-code "]"`.
fn response_code(cursor: &mut Cursor<'_>) -> ParseResult<ResponseCode> {
    let start = cursor.checkpoint();
    if !cursor.consume_byte(b'[') {
        return Err(Error::InvalidSyntax {
            position: start,
            production: "resp-text-code",
            hint: "expected '['".to_string(),
        });
    }
    let keyword = match atom_upper(cursor)? {
        ParseOutcome::Done(v) => v,
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            return crate::outcome::incomplete();
        }
    };
    let code = match keyword.as_str() {
        "ALERT" => ResponseCode::Alert,
        "PARSE" => ResponseCode::Parse,
        "READ-ONLY" => ResponseCode::ReadOnly,
        "READ-WRITE" => ResponseCode::ReadWrite,
        "TRYCREATE" => ResponseCode::TryCreate,
        "NOMODSEQ" => ResponseCode::NoModSeq,
        "CAPABILITY" => {
            let caps = match crate::grammar::capability_data(cursor)? {
                ParseOutcome::Done(v) => v,
                ParseOutcome::Incomplete => {
                    cursor.rewind(start);
                    return crate::outcome::incomplete();
                }
            };
            ResponseCode::Capability(caps)
        }
        "PERMANENTFLAGS" => {
            match parse_space(cursor)? {
                ParseOutcome::Done(()) => {}
                ParseOutcome::Incomplete => {
                    cursor.rewind(start);
                    return crate::outcome::incomplete();
                }
            }
            let flags = match flag_list(cursor)? {
                ParseOutcome::Done(v) => v,
                ParseOutcome::Incomplete => {
                    cursor.rewind(start);
                    return crate::outcome::incomplete();
                }
            };
            ResponseCode::PermanentFlags(flags)
        }
        "UIDNEXT" => ResponseCode::UidNext(match space_then_nz(cursor, start)? {
            ParseOutcome::Done(n) => Uid::new(n).expect("parse_nz_number guarantees non-zero"),
            ParseOutcome::Incomplete => return crate::outcome::incomplete(),
        }),
        "UIDVALIDITY" => ResponseCode::UidValidity(match space_then_number(cursor, start)? {
            ParseOutcome::Done(n) => UidValidity(n),
            ParseOutcome::Incomplete => return crate::outcome::incomplete(),
        }),
        "UNSEEN" => ResponseCode::Unseen(match space_then_nz(cursor, start)? {
            ParseOutcome::Done(n) => SeqNum::new(n).expect("parse_nz_number guarantees non-zero"),
            ParseOutcome::Incomplete => return crate::outcome::incomplete(),
        }),
        "HIGHESTMODSEQ" => ResponseCode::HighestModSeq(match space_then_number(cursor, start)? {
            ParseOutcome::Done(n) => u64::from(n),
            ParseOutcome::Incomplete => return crate::outcome::incomplete(),
        }),
        "APPENDUID" => {
            let uid_validity = match space_then_number(cursor, start)? {
                ParseOutcome::Done(n) => UidValidity(n),
                ParseOutcome::Incomplete => return crate::outcome::incomplete(),
            };
            let uid = match space_then_nz(cursor, start)? {
                ParseOutcome::Done(n) => Uid::new(n).expect("parse_nz_number guarantees non-zero"),
                ParseOutcome::Incomplete => return crate::outcome::incomplete(),
            };
            ResponseCode::AppendUid { uid_validity, uid }
        }
        "COPYUID" => {
            let uid_validity = match space_then_number(cursor, start)? {
                ParseOutcome::Done(n) => UidValidity(n),
                ParseOutcome::Incomplete => return crate::outcome::incomplete(),
            };
            match parse_space(cursor)? {
                ParseOutcome::Done(()) => {}
                ParseOutcome::Incomplete => {
                    cursor.rewind(start);
                    return crate::outcome::incomplete();
                }
            }
            let source = match uid_set(cursor)? {
                ParseOutcome::Done(v) => v,
                ParseOutcome::Incomplete => {
                    cursor.rewind(start);
                    return crate::outcome::incomplete();
                }
            };
            match parse_space(cursor)? {
                ParseOutcome::Done(()) => {}
                ParseOutcome::Incomplete => {
                    cursor.rewind(start);
                    return crate::outcome::incomplete();
                }
            }
            let destination = match uid_set(cursor)? {
                ParseOutcome::Done(v) => v,
                ParseOutcome::Incomplete => {
                    cursor.rewind(start);
                    return crate::outcome::incomplete();
                }
            };
            ResponseCode::CopyUid { uid_validity, source, destination }
        }
        other => {
            let had_space = cursor.consume_byte(b' ');
            let text_bytes = cursor.take_while(|b| b != b']' && b != b'\r' && b != b'\n');
            if cursor.is_empty() {
                cursor.rewind(start);
                return crate::outcome::incomplete();
            }
            let text = if had_space || !text_bytes.is_empty() {
                Some(String::from_utf8_lossy(text_bytes).into_owned())
            } else {
                None
            };
            ResponseCode::Other(other.to_string(), text)
        }
    };
    if !cursor.consume_byte(b']') {
        cursor.rewind(start);
        return Err(Error::InvalidSyntax {
            position: start,
            production: "resp-text-code",
            hint: "expected ']'".to_string(),
        });
    }
    done(code)
}

fn space_then_nz(cursor: &mut Cursor<'_>, start: usize) -> ParseResult<u32> {
    match parse_space(cursor)? {
        ParseOutcome::Done(()) => {}
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            return crate::outcome::incomplete();
        }
    }
    match parse_nz_number(cursor)? {
        ParseOutcome::Done(n) => done(n),
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            crate::outcome::incomplete()
        }
    }
}

fn space_then_number(cursor: &mut Cursor<'_>, start: usize) -> ParseResult<u32> {
    match parse_space(cursor)? {
        ParseOutcome::Done(()) => {}
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            return crate::outcome::incomplete();
        }
    }
    match parse_unsigned_integer(cursor)? {
        ParseOutcome::Done(n) => done(n),
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            crate::outcome::incomplete()
        }
    }
}

/// Parses the connection-opening greeting: `"*" SP ("OK"/"PREAUTH"/"BYE")
/// SP resp-text`.
pub fn greeting(cursor: &mut Cursor<'_>) -> ParseResult<Greeting> {
    let start = cursor.checkpoint();
    if !cursor.consume_byte(b'*') {
        return Err(Error::InvalidSyntax {
            position: start,
            production: "greeting",
            hint: "expected '*'".to_string(),
        });
    }
    match parse_space(cursor)? {
        ParseOutcome::Done(()) => {}
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            return crate::outcome::incomplete();
        }
    }
    let keyword = match atom_upper(cursor)? {
        ParseOutcome::Done(v) => v,
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            return crate::outcome::incomplete();
        }
    };
    let status = match keyword.as_str() {
        "OK" => GreetingStatus::Ok,
        "PREAUTH" => GreetingStatus::PreAuth,
        "BYE" => GreetingStatus::Bye,
        other => {
            cursor.rewind(start);
            return Err(Error::InvalidSyntax {
                position: start,
                production: "greeting",
                hint: format!("unexpected greeting status {other:?}"),
            });
        }
    };
    match resp_text(cursor)? {
        ParseOutcome::Done((code, text)) => done(Greeting { status, code, text }),
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            crate::outcome::incomplete()
        }
    }
}

/// Parses a continuation request: `"+" [SP text]`.
pub fn continuation_request(cursor: &mut Cursor<'_>) -> ParseResult<ContinuationRequest> {
    let start = cursor.checkpoint();
    if !cursor.consume_byte(b'+') {
        return Err(Error::InvalidSyntax {
            position: start,
            production: "continue-req",
            hint: "expected '+'".to_string(),
        });
    }
    cursor.consume_byte(b' ');
    let text_bytes = cursor.take_while(|b| b != b'\r' && b != b'\n');
    if cursor.is_empty() {
        cursor.rewind(start);
        return crate::outcome::incomplete();
    }
    let text = if text_bytes.is_empty() {
        None
    } else {
        Some(String::from_utf8_lossy(text_bytes).into_owned())
    };
    done(ContinuationRequest { text })
}

/// Parses a tagged completion: `tag SP ("OK"/"NO"/"BAD") SP resp-text`.
pub fn tagged_completion(cursor: &mut Cursor<'_>) -> ParseResult<TaggedCompletion> {
    let start = cursor.checkpoint();
    let tag = match crate::grammar::primitives::atom(cursor)? {
        ParseOutcome::Done(t) => Tag::new(t),
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            return crate::outcome::incomplete();
        }
    };
    match parse_space(cursor)? {
        ParseOutcome::Done(()) => {}
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            return crate::outcome::incomplete();
        }
    }
    let keyword = match atom_upper(cursor)? {
        ParseOutcome::Done(v) => v,
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            return crate::outcome::incomplete();
        }
    };
    let status = match keyword.as_str() {
        "OK" => CompletionStatus::Ok,
        "NO" => CompletionStatus::No,
        "BAD" => CompletionStatus::Bad,
        other => {
            cursor.rewind(start);
            return Err(Error::InvalidSyntax {
                position: start,
                production: "response-tagged",
                hint: format!("unexpected completion status {other:?}"),
            });
        }
    };
    match resp_text(cursor)? {
        ParseOutcome::Done((code, text)) => done(TaggedCompletion { tag, status, code, text }),
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            crate::outcome::incomplete()
        }
    }
}

/// What an untagged line (everything after `"* "`) turned out to be.
#[derive(Debug, Clone, PartialEq)]
pub enum UntaggedLine {
    /// A leaf response fully describable without further framer events.
    Data(ResponseData),
    /// The start of a FETCH response: `nz-number SP "FETCH" SP "(" ...`.
    /// `progress` is however much of the attribute list this logical line
    /// managed to cover before ending (either the full list, or a
    /// streaming hand-off partway through).
    Fetch {
        /// Which message this FETCH response describes.
        seq: SeqNum,
        /// How far the attribute list got.
        progress: AttributeListProgress,
    },
}

/// Parses everything after the leading `"* "` of an untagged response.
pub fn untagged_line(cursor: &mut Cursor<'_>, tracker: &StackTracker) -> ParseResult<UntaggedLine> {
    let start = cursor.checkpoint();
    if cursor.peek().is_some_and(|b| b.is_ascii_digit()) {
        return numeric_untagged(cursor, tracker);
    }
    let keyword = match atom_upper(cursor)? {
        ParseOutcome::Done(v) => v,
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            return crate::outcome::incomplete();
        }
    };
    match keyword.as_str() {
        "OK" | "NO" | "BAD" | "PREAUTH" | "BYE" => {
            let kind = match keyword.as_str() {
                "OK" => UntaggedStatusKind::Ok,
                "NO" => UntaggedStatusKind::No,
                "BAD" => UntaggedStatusKind::Bad,
                "PREAUTH" => UntaggedStatusKind::PreAuth,
                _ => UntaggedStatusKind::Bye,
            };
            match resp_text(cursor)? {
                ParseOutcome::Done((code, text)) => {
                    done(UntaggedLine::Data(ResponseData::Status { kind, code, text }))
                }
                ParseOutcome::Incomplete => {
                    cursor.rewind(start);
                    crate::outcome::incomplete()
                }
            }
        }
        "CAPABILITY" => match crate::grammar::capability_data(cursor)? {
            ParseOutcome::Done(caps) => done(UntaggedLine::Data(ResponseData::Capability(caps))),
            ParseOutcome::Incomplete => {
                cursor.rewind(start);
                crate::outcome::incomplete()
            }
        },
        "ENABLED" => match crate::grammar::capability_data(cursor)? {
            ParseOutcome::Done(caps) => done(UntaggedLine::Data(ResponseData::Enabled(caps))),
            ParseOutcome::Incomplete => {
                cursor.rewind(start);
                crate::outcome::incomplete()
            }
        },
        "FLAGS" => {
            match parse_space(cursor)? {
                ParseOutcome::Done(()) => {}
                ParseOutcome::Incomplete => {
                    cursor.rewind(start);
                    return crate::outcome::incomplete();
                }
            }
            match flag_list(cursor)? {
                ParseOutcome::Done(flags) => done(UntaggedLine::Data(ResponseData::Flags(flags))),
                ParseOutcome::Incomplete => {
                    cursor.rewind(start);
                    crate::outcome::incomplete()
                }
            }
        }
        "LIST" | "LSUB" => match list_response(cursor)? {
            ParseOutcome::Done(list) => done(UntaggedLine::Data(if keyword == "LIST" {
                ResponseData::List(list)
            } else {
                ResponseData::Lsub(list)
            })),
            ParseOutcome::Incomplete => {
                cursor.rewind(start);
                crate::outcome::incomplete()
            }
        },
        "SEARCH" => {
            let numbers = match crate::grammar::combinators::zero_or_more(cursor, |c| {
                let before = c.checkpoint();
                match parse_space(c)? {
                    ParseOutcome::Done(()) => {}
                    ParseOutcome::Incomplete => return crate::outcome::incomplete(),
                }
                match parse_unsigned_integer(c)? {
                    ParseOutcome::Done(n) => done(n),
                    ParseOutcome::Incomplete => {
                        c.rewind(before);
                        crate::outcome::incomplete()
                    }
                }
            })? {
                ParseOutcome::Done(v) => v,
                ParseOutcome::Incomplete => {
                    cursor.rewind(start);
                    return crate::outcome::incomplete();
                }
            };
            done(UntaggedLine::Data(ResponseData::Search(numbers)))
        }
        "STATUS" => match status_response(cursor)? {
            ParseOutcome::Done(data) => done(UntaggedLine::Data(data)),
            ParseOutcome::Incomplete => {
                cursor.rewind(start);
                crate::outcome::incomplete()
            }
        },
        other => {
            cursor.consume_byte(b' ');
            let text_bytes = cursor.take_while(|b| b != b'\r' && b != b'\n');
            if cursor.is_empty() {
                cursor.rewind(start);
                return crate::outcome::incomplete();
            }
            done(UntaggedLine::Data(ResponseData::Extension {
                keyword: other.to_string(),
                text: String::from_utf8_lossy(text_bytes).into_owned(),
            }))
        }
    }
}

fn numeric_untagged(cursor: &mut Cursor<'_>, tracker: &StackTracker) -> ParseResult<UntaggedLine> {
    let start = cursor.checkpoint();
    let number = match parse_unsigned_integer(cursor)? {
        ParseOutcome::Done(n) => n,
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            return crate::outcome::incomplete();
        }
    };
    match parse_space(cursor)? {
        ParseOutcome::Done(()) => {}
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            return crate::outcome::incomplete();
        }
    }
    let keyword = match atom_upper(cursor)? {
        ParseOutcome::Done(v) => v,
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            return crate::outcome::incomplete();
        }
    };
    match keyword.as_str() {
        "EXISTS" => done(UntaggedLine::Data(ResponseData::Exists(number))),
        "RECENT" => done(UntaggedLine::Data(ResponseData::Recent(number))),
        "EXPUNGE" => {
            let Some(seq) = SeqNum::new(number) else {
                cursor.rewind(start);
                return Err(Error::InvalidSyntax {
                    position: start,
                    production: "message-data",
                    hint: "EXPUNGE sequence number must be non-zero".to_string(),
                });
            };
            done(UntaggedLine::Data(ResponseData::Expunge(seq)))
        }
        "FETCH" => {
            let Some(seq) = SeqNum::new(number) else {
                cursor.rewind(start);
                return Err(Error::InvalidSyntax {
                    position: start,
                    production: "message-data",
                    hint: "FETCH sequence number must be non-zero".to_string(),
                });
            };
            match parse_space(cursor)? {
                ParseOutcome::Done(()) => {}
                ParseOutcome::Incomplete => {
                    cursor.rewind(start);
                    return crate::outcome::incomplete();
                }
            }
            if !cursor.consume_byte(b'(') {
                cursor.rewind(start);
                return Err(Error::InvalidSyntax {
                    position: start,
                    production: "msg-att",
                    hint: "expected '('".to_string(),
                });
            }
            match fetch_attribute_list(cursor, tracker, true)? {
                ParseOutcome::Done(progress) => done(UntaggedLine::Fetch { seq, progress }),
                ParseOutcome::Incomplete => {
                    cursor.rewind(start);
                    crate::outcome::incomplete()
                }
            }
        }
        other => {
            cursor.rewind(start);
            Err(Error::InvalidSyntax {
                position: start,
                production: "message-data",
                hint: format!("unexpected numeric response keyword {other:?}"),
            })
        }
    }
}

fn list_response(cursor: &mut Cursor<'_>) -> ParseResult<crate::types::ListResponse> {
    use crate::types::{ListResponse, MailboxAttribute};

    let start = cursor.checkpoint();
    match parse_space(cursor)? {
        ParseOutcome::Done(()) => {}
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            return crate::outcome::incomplete();
        }
    }
    if !cursor.consume_byte(b'(') {
        cursor.rewind(start);
        return Err(Error::InvalidSyntax { position: start, production: "mailbox-list", hint: "expected '('".into() });
    }
    let mut attributes = Vec::new();
    loop {
        if cursor.peek() == Some(b')') {
            cursor.advance(1);
            break;
        }
        match crate::grammar::primitives::atom(cursor)? {
            ParseOutcome::Done(text) => attributes.push(MailboxAttribute::parse(text)),
            ParseOutcome::Incomplete => {
                cursor.rewind(start);
                return crate::outcome::incomplete();
            }
        }
        cursor.consume_byte(b' ');
    }
    match parse_space(cursor)? {
        ParseOutcome::Done(()) => {}
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            return crate::outcome::incomplete();
        }
    }
    let delimiter = match nstring_inline(cursor)? {
        ParseOutcome::Done(v) => v.and_then(|s| s.chars().next()),
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            return crate::outcome::incomplete();
        }
    };
    match parse_space(cursor)? {
        ParseOutcome::Done(()) => {}
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            return crate::outcome::incomplete();
        }
    }
    match mailbox_name(cursor)? {
        ParseOutcome::Done(mailbox) => done(ListResponse { attributes, delimiter, mailbox }),
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            crate::outcome::incomplete()
        }
    }
}

fn status_response(cursor: &mut Cursor<'_>) -> ParseResult<ResponseData> {
    let start = cursor.checkpoint();
    match parse_space(cursor)? {
        ParseOutcome::Done(()) => {}
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            return crate::outcome::incomplete();
        }
    }
    let mailbox = match mailbox_name(cursor)? {
        ParseOutcome::Done(v) => v,
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            return crate::outcome::incomplete();
        }
    };
    match parse_space(cursor)? {
        ParseOutcome::Done(()) => {}
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            return crate::outcome::incomplete();
        }
    }
    match status_att_list(cursor)? {
        ParseOutcome::Done(items) => done(ResponseData::MailboxStatus { mailbox, items }),
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            crate::outcome::incomplete()
        }
    }
}

/// Whether a single FETCH attribute could be fully assembled from the
/// bytes on hand, or its literal payload was forced into streaming mode
/// by the framer.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchAttributeParse {
    /// The attribute's value is fully available.
    Simple(FetchAttribute),
    /// A body-section/RFC822-form literal was too large to inline; the
    /// cursor is positioned immediately after the literal's header.
    NeedsStreaming {
        /// Which section/form is being streamed.
        kind: StreamingAttributeKind,
        /// `<origin>` partial-fetch offset, if present.
        origin: Option<u32>,
        /// Declared payload length.
        length: usize,
        /// Whether the literal header was the `literal8` (`~{N}`) form.
        is_literal8: bool,
    },
}

/// How far a FETCH attribute list got before running out of either
/// attributes or buffered bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeListProgress {
    /// The list is complete, including its closing `)`.
    Attributes(Vec<FetchAttribute>),
    /// A literal mid-list needs streaming; `parsed` holds every attribute
    /// read so far.
    StreamingAt {
        /// Attributes parsed before the streaming literal was hit.
        parsed: Vec<FetchAttribute>,
        /// Which section/form is being streamed.
        kind: StreamingAttributeKind,
        /// `<origin>` partial-fetch offset, if present.
        origin: Option<u32>,
        /// Declared payload length.
        length: usize,
        /// Whether the literal header was the `literal8` (`~{N}`) form.
        is_literal8: bool,
    },
}

/// Parses a FETCH attribute list from just after its opening `(`, one
/// attribute at a time, stopping either at the closing `)` or at a literal
/// the framer truncated the line in front of.
///
/// `first` is `true` immediately after the `(` (no separator expected
/// before the next attribute) and `false` when resuming after a streamed
/// literal completed (a leading `SP` or the closing `)` is expected).
pub fn fetch_attribute_list(
    cursor: &mut Cursor<'_>,
    tracker: &StackTracker,
    first: bool,
) -> ParseResult<AttributeListProgress> {
    let start = cursor.checkpoint();
    let mut parsed = Vec::new();
    let mut need_separator = !first;
    loop {
        if need_separator {
            if cursor.peek() == Some(b')') {
                cursor.advance(1);
                return done(AttributeListProgress::Attributes(parsed));
            }
            match parse_space(cursor)? {
                ParseOutcome::Done(()) => {}
                ParseOutcome::Incomplete => {
                    cursor.rewind(start);
                    return crate::outcome::incomplete();
                }
            }
        } else if parsed.is_empty() && cursor.peek() == Some(b')') {
            cursor.advance(1);
            return done(AttributeListProgress::Attributes(parsed));
        }
        match fetch_attribute(cursor, tracker)? {
            ParseOutcome::Done(FetchAttributeParse::Simple(attr)) => {
                parsed.push(attr);
                need_separator = true;
            }
            ParseOutcome::Done(FetchAttributeParse::NeedsStreaming { kind, origin, length, is_literal8 }) => {
                return done(AttributeListProgress::StreamingAt { parsed, kind, origin, length, is_literal8 });
            }
            ParseOutcome::Incomplete => {
                // The framer only truncates a line in front of a literal
                // header it forced into streaming mode, which
                // `fetch_attribute` reports as `NeedsStreaming`, not
                // `Incomplete` — so running dry here always means more
                // bytes are genuinely owed for this attribute.
                cursor.rewind(start);
                return crate::outcome::incomplete();
            }
        }
    }
}

/// Parses one FETCH attribute: `fetch-att ["[" ...]` plus its value, or a
/// literal header if the value is too large to have been inlined.
fn fetch_attribute(cursor: &mut Cursor<'_>, tracker: &StackTracker) -> ParseResult<FetchAttributeParse> {
    let start = cursor.checkpoint();
    let keyword = match fetch_attribute_keyword(cursor)? {
        ParseOutcome::Done(text) => text.to_ascii_uppercase(),
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            return crate::outcome::incomplete();
        }
    };
    match keyword.as_str() {
        "FLAGS" => {
            match parse_space(cursor)? {
                ParseOutcome::Done(()) => {}
                ParseOutcome::Incomplete => {
                    cursor.rewind(start);
                    return crate::outcome::incomplete();
                }
            }
            match flag_list(cursor)? {
                ParseOutcome::Done(flags) => done(FetchAttributeParse::Simple(FetchAttribute::Flags(flags))),
                ParseOutcome::Incomplete => {
                    cursor.rewind(start);
                    crate::outcome::incomplete()
                }
            }
        }
        "INTERNALDATE" => {
            match parse_space(cursor)? {
                ParseOutcome::Done(()) => {}
                ParseOutcome::Incomplete => {
                    cursor.rewind(start);
                    return crate::outcome::incomplete();
                }
            }
            match quoted_string(cursor)? {
                ParseOutcome::Done(text) => {
                    done(FetchAttributeParse::Simple(FetchAttribute::InternalDate(text)))
                }
                ParseOutcome::Incomplete => {
                    cursor.rewind(start);
                    crate::outcome::incomplete()
                }
            }
        }
        "RFC822.SIZE" => match space_then_number(cursor, start)? {
            ParseOutcome::Done(n) => done(FetchAttributeParse::Simple(FetchAttribute::Rfc822Size(n))),
            ParseOutcome::Incomplete => crate::outcome::incomplete(),
        },
        "ENVELOPE" => {
            match parse_space(cursor)? {
                ParseOutcome::Done(()) => {}
                ParseOutcome::Incomplete => {
                    cursor.rewind(start);
                    return crate::outcome::incomplete();
                }
            }
            match envelope(cursor)? {
                ParseOutcome::Done(env) => done(FetchAttributeParse::Simple(FetchAttribute::Envelope(env))),
                ParseOutcome::Incomplete => {
                    cursor.rewind(start);
                    crate::outcome::incomplete()
                }
            }
        }
        "BODYSTRUCTURE" | "BODY" if cursor.peek() != Some(b'[') => {
            match parse_space(cursor)? {
                ParseOutcome::Done(()) => {}
                ParseOutcome::Incomplete => {
                    cursor.rewind(start);
                    return crate::outcome::incomplete();
                }
            }
            match body_structure(cursor, tracker)? {
                ParseOutcome::Done(bs) => {
                    done(FetchAttributeParse::Simple(FetchAttribute::BodyStructure(bs)))
                }
                ParseOutcome::Incomplete => {
                    cursor.rewind(start);
                    crate::outcome::incomplete()
                }
            }
        }
        "UID" => match space_then_nz(cursor, start)? {
            ParseOutcome::Done(n) => done(FetchAttributeParse::Simple(FetchAttribute::Uid(
                Uid::new(n).expect("parse_nz_number guarantees non-zero"),
            ))),
            ParseOutcome::Incomplete => crate::outcome::incomplete(),
        },
        "MODSEQ" => {
            match parse_space(cursor)? {
                ParseOutcome::Done(()) => {}
                ParseOutcome::Incomplete => {
                    cursor.rewind(start);
                    return crate::outcome::incomplete();
                }
            }
            if !cursor.consume_byte(b'(') {
                cursor.rewind(start);
                return Err(Error::InvalidSyntax {
                    position: start,
                    production: "fetch-att",
                    hint: "expected '(' after MODSEQ".to_string(),
                });
            }
            let value = match parse_unsigned_integer(cursor)? {
                ParseOutcome::Done(n) => u64::from(n),
                ParseOutcome::Incomplete => {
                    cursor.rewind(start);
                    return crate::outcome::incomplete();
                }
            };
            if !cursor.consume_byte(b')') {
                cursor.rewind(start);
                return Err(Error::InvalidSyntax {
                    position: start,
                    production: "fetch-att",
                    hint: "expected ')' after MODSEQ value".to_string(),
                });
            }
            done(FetchAttributeParse::Simple(FetchAttribute::ModSeq(value)))
        }
        "RFC822" => streaming_attribute(cursor, start, StreamingAttributeKind::Rfc822),
        "RFC822.HEADER" => streaming_attribute(cursor, start, StreamingAttributeKind::Rfc822Header),
        "RFC822.TEXT" => streaming_attribute(cursor, start, StreamingAttributeKind::Rfc822Text),
        "BODY" | "BINARY" => {
            let section = match section_spec(cursor)? {
                ParseOutcome::Done(s) => s,
                ParseOutcome::Incomplete => {
                    cursor.rewind(start);
                    return crate::outcome::incomplete();
                }
            };
            let origin = match partial_origin(cursor)? {
                ParseOutcome::Done(v) => v,
                ParseOutcome::Incomplete => {
                    cursor.rewind(start);
                    return crate::outcome::incomplete();
                }
            };
            let kind = if keyword.starts_with("BODY") {
                StreamingAttributeKind::Body(section)
            } else {
                StreamingAttributeKind::Binary(section)
            };
            streaming_attribute_with_origin(cursor, start, kind, origin)
        }
        "BINARY.SIZE" => {
            let section = match section_spec(cursor)? {
                ParseOutcome::Done(s) => s,
                ParseOutcome::Incomplete => {
                    cursor.rewind(start);
                    return crate::outcome::incomplete();
                }
            };
            match space_then_number(cursor, start)? {
                ParseOutcome::Done(size) => {
                    done(FetchAttributeParse::Simple(FetchAttribute::BinarySize { section, size }))
                }
                ParseOutcome::Incomplete => crate::outcome::incomplete(),
            }
        }
        other => {
            cursor.rewind(start);
            Err(Error::InvalidSyntax {
                position: start,
                production: "fetch-att",
                hint: format!("unknown FETCH attribute {other:?}"),
            })
        }
    }
}

fn partial_origin(cursor: &mut Cursor<'_>) -> ParseResult<Option<u32>> {
    let start = cursor.checkpoint();
    if cursor.peek() != Some(b'<') {
        return done(None);
    }
    cursor.advance(1);
    let origin = match parse_unsigned_integer(cursor)? {
        ParseOutcome::Done(n) => n,
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            return crate::outcome::incomplete();
        }
    };
    if !cursor.consume_byte(b'>') {
        cursor.rewind(start);
        return Err(Error::InvalidSyntax {
            position: start,
            production: "fetch-att",
            hint: "expected '>' after partial origin".to_string(),
        });
    }
    done(Some(origin))
}

fn streaming_attribute(
    cursor: &mut Cursor<'_>,
    start: usize,
    kind: StreamingAttributeKind,
) -> ParseResult<FetchAttributeParse> {
    streaming_attribute_with_origin(cursor, start, kind, None)
}

/// Parses the `SP nstring` (inlined literal or plain nstring) or literal
/// header that follows a body-section/RFC822-form keyword, deciding
/// between [`FetchAttributeParse::Simple`] and
/// [`FetchAttributeParse::NeedsStreaming`] per [`LiteralHeader`]'s declared
/// length against what the framer actually inlined.
fn streaming_attribute_with_origin(
    cursor: &mut Cursor<'_>,
    start: usize,
    kind: StreamingAttributeKind,
    origin: Option<u32>,
) -> ParseResult<FetchAttributeParse> {
    match parse_space(cursor)? {
        ParseOutcome::Done(()) => {}
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            return crate::outcome::incomplete();
        }
    }
    if !matches!(cursor.peek(), Some(b'{') | Some(b'~')) {
        // NIL or a quoted/atom nstring: treated as a fully inlined,
        // zero-or-small-length body value.
        return match nstring_inline(cursor)? {
            ParseOutcome::Done(v) => done(FetchAttributeParse::Simple(FetchAttribute::BodySection {
                kind,
                origin,
                data: v.map(String::into_bytes).unwrap_or_default(),
            })),
            ParseOutcome::Incomplete => {
                cursor.rewind(start);
                crate::outcome::incomplete()
            }
        };
    }
    let LiteralHeader { length, is_literal8, .. } = match literal_header(cursor)? {
        ParseOutcome::Done(h) => h,
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            return crate::outcome::incomplete();
        }
    };
    if cursor.remaining_len() >= length {
        let data = cursor.take(length).expect("length already checked").to_vec();
        done(FetchAttributeParse::Simple(FetchAttribute::BodySection { kind, origin, data }))
    } else if cursor.is_empty() {
        done(FetchAttributeParse::NeedsStreaming { kind, origin, length, is_literal8 })
    } else {
        Err(Error::invariant(
            "literal payload shorter than its declared length but not empty",
            cursor.remaining(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Flag, Flags};

    fn tracker() -> StackTracker {
        StackTracker::new(32)
    }

    #[test]
    fn parses_ok_greeting_with_capability_code() {
        let mut cursor = Cursor::new(b"* OK [CAPABILITY IMAP4rev1 IDLE] server ready");
        let g = greeting(&mut cursor).unwrap().done().unwrap();
        assert_eq!(g.status, GreetingStatus::Ok);
        assert_eq!(g.code, Some(ResponseCode::Capability(vec![
            crate::types::Capability::Imap4Rev1,
            crate::types::Capability::Idle,
        ])));
        assert_eq!(g.text, "server ready");
    }

    #[test]
    fn parses_tagged_completion_with_uidnext_code() {
        let mut cursor = Cursor::new(b"a1 OK [UIDNEXT 4392] SELECT completed");
        let tc = tagged_completion(&mut cursor).unwrap().done().unwrap();
        assert_eq!(tc.tag.as_str(), "a1");
        assert_eq!(tc.status, CompletionStatus::Ok);
        assert_eq!(tc.code, Some(ResponseCode::UidNext(Uid::new(4392).unwrap())));
    }

    #[test]
    fn parses_continuation_with_text() {
        let mut cursor = Cursor::new(b"+ Ready for literal data");
        let c = continuation_request(&mut cursor).unwrap().done().unwrap();
        assert_eq!(c.text.as_deref(), Some("Ready for literal data"));
    }

    #[test]
    fn parses_bare_continuation() {
        let mut cursor = Cursor::new(b"+");
        let c = continuation_request(&mut cursor).unwrap().done().unwrap();
        assert_eq!(c.text, None);
    }

    #[test]
    fn parses_exists_untagged() {
        let mut cursor = Cursor::new(b"23 EXISTS");
        let line = untagged_line(&mut cursor, &tracker()).unwrap().done().unwrap();
        assert_eq!(line, UntaggedLine::Data(ResponseData::Exists(23)));
    }

    #[test]
    fn parses_flags_untagged() {
        let mut cursor = Cursor::new(b"FLAGS (\\Seen \\Deleted)");
        let line = untagged_line(&mut cursor, &tracker()).unwrap().done().unwrap();
        assert_eq!(
            line,
            UntaggedLine::Data(ResponseData::Flags(Flags::from_iter([Flag::Seen, Flag::Deleted])))
        );
    }

    #[test]
    fn parses_fetch_with_fully_inlined_attributes() {
        let mut cursor = Cursor::new(b"12 FETCH (FLAGS (\\Seen) UID 100)");
        let line = untagged_line(&mut cursor, &tracker()).unwrap().done().unwrap();
        match line {
            UntaggedLine::Fetch { seq, progress } => {
                assert_eq!(seq.get(), 12);
                match progress {
                    AttributeListProgress::Attributes(attrs) => {
                        assert_eq!(attrs.len(), 2);
                        assert_eq!(attrs[0], FetchAttribute::Flags(Flags::from_iter([Flag::Seen])));
                        assert_eq!(attrs[1], FetchAttribute::Uid(Uid::new(100).unwrap()));
                    }
                    other => panic!("unexpected {other:?}"),
                }
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn fetch_body_section_literal_header_needs_streaming_when_cursor_runs_dry() {
        let mut cursor = Cursor::new(b"4 FETCH (BODY[TEXT] {12}");
        let line = untagged_line(&mut cursor, &tracker()).unwrap().done().unwrap();
        match line {
            UntaggedLine::Fetch {
                progress: AttributeListProgress::StreamingAt { parsed, kind, length, is_literal8, .. },
                ..
            } => {
                assert!(parsed.is_empty());
                assert_eq!(kind, StreamingAttributeKind::Body(Section::Text(vec![])));
                assert_eq!(length, 12);
                assert!(!is_literal8);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn fetch_binary_section_literal8_header_is_recognized() {
        let mut cursor = Cursor::new(b"4 FETCH (BINARY[1] ~{12}");
        let line = untagged_line(&mut cursor, &tracker()).unwrap().done().unwrap();
        match line {
            UntaggedLine::Fetch {
                progress: AttributeListProgress::StreamingAt { parsed, kind, length, is_literal8, .. },
                ..
            } => {
                assert!(parsed.is_empty());
                assert_eq!(kind, StreamingAttributeKind::Binary(Section::Part(vec![1])));
                assert_eq!(length, 12);
                assert!(is_literal8);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn fetch_body_section_literal8_small_enough_to_inline_is_simple() {
        let mut cursor = Cursor::new(b"4 FETCH (BODY[1] ~{3}\r\na\x00b)");
        let line = untagged_line(&mut cursor, &tracker()).unwrap().done().unwrap();
        match line {
            UntaggedLine::Fetch { progress: AttributeListProgress::Attributes(attrs), .. } => {
                assert_eq!(
                    attrs,
                    vec![FetchAttribute::BodySection {
                        kind: StreamingAttributeKind::Body(Section::Part(vec![1])),
                        origin: None,
                        data: b"a\x00b".to_vec(),
                    }]
                );
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn resumes_attribute_list_after_streamed_literal() {
        let mut cursor = Cursor::new(b" UID 9)");
        let progress = fetch_attribute_list(&mut cursor, &tracker(), false).unwrap().done().unwrap();
        assert_eq!(
            progress,
            AttributeListProgress::Attributes(vec![FetchAttribute::Uid(Uid::new(9).unwrap())])
        );
    }

    #[test]
    fn parses_list_response_with_delimiter() {
        let mut cursor = Cursor::new(b"LIST (\\HasNoChildren) \"/\" INBOX.Sent");
        let line = untagged_line(&mut cursor, &tracker()).unwrap().done().unwrap();
        match line {
            UntaggedLine::Data(ResponseData::List(list)) => {
                assert_eq!(list.delimiter, Some('/'));
                assert_eq!(list.mailbox.as_str(), "INBOX.Sent");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parses_copyuid_code() {
        let mut cursor = Cursor::new(b"a1 OK [COPYUID 38505 304,319:320 3956:3958] COPY completed");
        let tc = tagged_completion(&mut cursor).unwrap().done().unwrap();
        match tc.code {
            Some(ResponseCode::CopyUid { uid_validity, .. }) => assert_eq!(uid_validity.0, 38505),
            other => panic!("unexpected {other:?}"),
        }
    }
}
