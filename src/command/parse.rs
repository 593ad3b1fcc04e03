//! Grammar-level parsing of command bodies.
//!
//! Operates on a logical line the framer has already reconstructed (literal
//! payloads inlined). [`command`] parses everything up to, but not
//! including, the trailing CRLF — [`crate::command::stream::CommandParser`]
//! owns the CRLF/literal-transition decisions described in the command
//! parser's state machine.

use crate::buffer::Cursor;
use crate::error::Error;
use crate::grammar::{flag_list, search_key, section_spec, sequence_set};
use crate::outcome::{done, ParseOutcome, ParseResult};
use crate::tracker::StackTracker;
use crate::types::{Flag, Flags, Mailbox, Status, Tag};

use crate::grammar::combinators::{fixed_string, parse_space, parse_unsigned_integer};
use crate::grammar::primitives::{atom, astring_inline, fetch_attribute_keyword, quoted_string};

use super::{
    AppendMessage, Command, CommandBody, FetchAttributeRequest, FetchRequest, IdSpace, StoreAction,
    StoreRequest,
};

/// Parses `tag SP command`, stopping before the trailing CRLF (or, for
/// APPEND, before the literal header that follows the flag/date args).
pub fn command(cursor: &mut Cursor<'_>, tracker: &StackTracker) -> ParseResult<Command> {
    let start = cursor.checkpoint();
    let tag = match tag_token(cursor)? {
        ParseOutcome::Done(t) => t,
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
    let uid_prefixed = match fixed_string(cursor, "UID", false) {
        Ok(ParseOutcome::Done(())) => {
            match parse_space(cursor)? {
                ParseOutcome::Done(()) => true,
                ParseOutcome::Incomplete => {
                    cursor.rewind(start);
                    return crate::outcome::incomplete();
                }
            }
        }
        _ => false,
    };
    let keyword = match atom(cursor)? {
        ParseOutcome::Done(text) => text.to_ascii_uppercase(),
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            return crate::outcome::incomplete();
        }
    };
    match command_body(cursor, tracker, &keyword, uid_prefixed)? {
        ParseOutcome::Done(body) => done(Command { tag, body }),
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            crate::outcome::incomplete()
        }
    }
}

fn tag_token(cursor: &mut Cursor<'_>) -> ParseResult<Tag> {
    atom(cursor).map(|o| o.map(Tag::new))
}

fn id_space(uid_prefixed: bool) -> IdSpace {
    if uid_prefixed { IdSpace::Uid } else { IdSpace::SequenceNumber }
}

fn command_body(
    cursor: &mut Cursor<'_>,
    tracker: &StackTracker,
    keyword: &str,
    uid_prefixed: bool,
) -> ParseResult<CommandBody> {
    if uid_prefixed {
        return match keyword {
            "EXPUNGE" => done(CommandBody::Expunge { id_space: IdSpace::Uid }),
            "SEARCH" => search_command(cursor, tracker, IdSpace::Uid),
            "FETCH" => fetch_command(cursor, tracker, IdSpace::Uid),
            "STORE" => store_command(cursor, IdSpace::Uid),
            "COPY" => copy_command(cursor, IdSpace::Uid),
            "MOVE" => move_command(cursor, IdSpace::Uid),
            _ => extension_command(cursor, &format!("UID {keyword}")),
        };
    }
    match keyword {
        "CAPABILITY" => done(CommandBody::Capability),
        "NOOP" => done(CommandBody::Noop),
        "LOGOUT" => done(CommandBody::Logout),
        "STARTTLS" => done(CommandBody::StartTls),
        "CHECK" => done(CommandBody::Check),
        "CLOSE" => done(CommandBody::Close),
        "DONE" => done(CommandBody::IdleDone),
        "IDLE" => done(CommandBody::Idle),
        "LOGIN" => login_command(cursor),
        "SELECT" => mailbox_arg_command(cursor, |mailbox| CommandBody::Select { mailbox }),
        "EXAMINE" => mailbox_arg_command(cursor, |mailbox| CommandBody::Examine { mailbox }),
        "CREATE" => mailbox_arg_command(cursor, |mailbox| CommandBody::Create { mailbox }),
        "DELETE" => mailbox_arg_command(cursor, |mailbox| CommandBody::Delete { mailbox }),
        "SUBSCRIBE" => mailbox_arg_command(cursor, |mailbox| CommandBody::Subscribe { mailbox }),
        "UNSUBSCRIBE" => mailbox_arg_command(cursor, |mailbox| CommandBody::Unsubscribe { mailbox }),
        "RENAME" => rename_command(cursor),
        "LIST" => list_command(cursor, false),
        "LSUB" => list_command(cursor, true),
        "STATUS" => status_command(cursor),
        "APPEND" => append_command(cursor),
        "EXPUNGE" => done(CommandBody::Expunge { id_space: IdSpace::SequenceNumber }),
        "SEARCH" => search_command(cursor, tracker, IdSpace::SequenceNumber),
        "FETCH" => fetch_command(cursor, tracker, IdSpace::SequenceNumber),
        "STORE" => store_command(cursor, IdSpace::SequenceNumber),
        "COPY" => copy_command(cursor, IdSpace::SequenceNumber),
        "MOVE" => move_command(cursor, IdSpace::SequenceNumber),
        "ENABLE" => enable_command(cursor),
        "AUTHENTICATE" => authenticate_command(cursor),
        _ => extension_command(cursor, keyword),
    }
}

fn astring_arg(cursor: &mut Cursor<'_>) -> ParseResult<String> {
    let start = cursor.checkpoint();
    match parse_space(cursor)? {
        ParseOutcome::Done(()) => {}
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            return crate::outcome::incomplete();
        }
    }
    astring_inline(cursor)
}

fn mailbox_arg(cursor: &mut Cursor<'_>) -> ParseResult<Mailbox> {
    astring_arg(cursor).map(|o| o.map(|s| Mailbox::new(s)))
}

fn mailbox_arg_command(
    cursor: &mut Cursor<'_>,
    build: impl FnOnce(Mailbox) -> CommandBody,
) -> ParseResult<CommandBody> {
    mailbox_arg(cursor).map(|o| o.map(build))
}

fn login_command(cursor: &mut Cursor<'_>) -> ParseResult<CommandBody> {
    let start = cursor.checkpoint();
    let user = match astring_arg(cursor)? {
        ParseOutcome::Done(v) => v,
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            return crate::outcome::incomplete();
        }
    };
    match astring_arg(cursor)? {
        ParseOutcome::Done(password) => done(CommandBody::Login { user, password }),
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            crate::outcome::incomplete()
        }
    }
}

fn authenticate_command(cursor: &mut Cursor<'_>) -> ParseResult<CommandBody> {
    astring_arg(cursor).map(|o| {
        o.map(|mechanism| CommandBody::Authenticate { mechanism, initial_response: None })
    })
}

fn rename_command(cursor: &mut Cursor<'_>) -> ParseResult<CommandBody> {
    let start = cursor.checkpoint();
    let from = match mailbox_arg(cursor)? {
        ParseOutcome::Done(v) => v,
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            return crate::outcome::incomplete();
        }
    };
    match mailbox_arg(cursor)? {
        ParseOutcome::Done(to) => done(CommandBody::Rename { from, to }),
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            crate::outcome::incomplete()
        }
    }
}

fn list_command(cursor: &mut Cursor<'_>, lsub: bool) -> ParseResult<CommandBody> {
    let start = cursor.checkpoint();
    let reference = match mailbox_arg(cursor)? {
        ParseOutcome::Done(v) => v,
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            return crate::outcome::incomplete();
        }
    };
    match astring_arg(cursor)? {
        ParseOutcome::Done(pattern) => done(if lsub {
            CommandBody::Lsub { reference, pattern }
        } else {
            CommandBody::List { reference, pattern }
        }),
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            crate::outcome::incomplete()
        }
    }
}

fn status_command(cursor: &mut Cursor<'_>) -> ParseResult<CommandBody> {
    let start = cursor.checkpoint();
    let mailbox = match mailbox_arg(cursor)? {
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
    if !cursor.consume_byte(b'(') {
        cursor.rewind(start);
        return Err(Error::InvalidSyntax {
            position: start,
            production: "STATUS",
            hint: "expected '('".to_string(),
        });
    }
    let mut items = Vec::new();
    loop {
        match atom(cursor)? {
            ParseOutcome::Done(name) => {
                let item = match name.to_ascii_uppercase().as_str() {
                    "MESSAGES" => Status::Messages,
                    "RECENT" => Status::Recent,
                    "UIDNEXT" => Status::UidNext,
                    "UIDVALIDITY" => Status::UidValidity,
                    "UNSEEN" => Status::Unseen,
                    "HIGHESTMODSEQ" => Status::HighestModSeq,
                    other => {
                        cursor.rewind(start);
                        return Err(Error::InvalidSyntax {
                            position: start,
                            production: "status-att",
                            hint: format!("unknown status attribute {other:?}"),
                        });
                    }
                };
                items.push(item);
            }
            ParseOutcome::Incomplete => {
                cursor.rewind(start);
                return crate::outcome::incomplete();
            }
        }
        if cursor.consume_byte(b' ') {
            continue;
        }
        if cursor.consume_byte(b')') {
            break;
        }
        cursor.rewind(start);
        return Err(Error::InvalidSyntax {
            position: start,
            production: "STATUS",
            hint: "expected SP or ')'".to_string(),
        });
    }
    done(CommandBody::Status { mailbox, items })
}

fn append_command(cursor: &mut Cursor<'_>) -> ParseResult<CommandBody> {
    let start = cursor.checkpoint();
    let mailbox = match mailbox_arg(cursor)? {
        ParseOutcome::Done(v) => v,
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            return crate::outcome::incomplete();
        }
    };
    let flags = match crate::grammar::combinators::optional(cursor, |c| {
        let before = c.checkpoint();
        match parse_space(c)? {
            ParseOutcome::Done(()) => {}
            ParseOutcome::Incomplete => return crate::outcome::incomplete(),
        }
        crate::grammar::combinators::composite(c, |c2| {
            if c2.peek() != Some(b'(') {
                return Err(Error::InvalidSyntax { position: before, production: "flag-list", hint: "not a flag list".into() });
            }
            flag_list(c2)
        })
    })? {
        ParseOutcome::Done(f) => f.unwrap_or_default(),
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            return crate::outcome::incomplete();
        }
    };
    let internal_date = match crate::grammar::combinators::optional(cursor, |c| {
        let before = c.checkpoint();
        match parse_space(c)? {
            ParseOutcome::Done(()) => {}
            ParseOutcome::Incomplete => return crate::outcome::incomplete(),
        }
        if c.peek() != Some(b'"') {
            c.rewind(before);
            return Err(Error::InvalidSyntax { position: before, production: "date-time", hint: "not a quoted date".into() });
        }
        quoted_string(c)
    })? {
        ParseOutcome::Done(d) => d,
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
    match crate::grammar::primitives::literal_header(cursor)? {
        ParseOutcome::Done(header) => done(CommandBody::Append {
            mailbox,
            message: AppendMessage {
                flags,
                internal_date,
                literal_length: header.length,
                is_literal8: header.is_literal8,
            },
        }),
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            crate::outcome::incomplete()
        }
    }
}

fn search_command(cursor: &mut Cursor<'_>, tracker: &StackTracker, id_space: IdSpace) -> ParseResult<CommandBody> {
    let start = cursor.checkpoint();
    match parse_space(cursor)? {
        ParseOutcome::Done(()) => {}
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            return crate::outcome::incomplete();
        }
    }
    let charset = match crate::grammar::combinators::optional(cursor, |c| {
        let before = c.checkpoint();
        match fixed_string(c, "CHARSET", false)? {
            ParseOutcome::Done(()) => {}
            ParseOutcome::Incomplete => return crate::outcome::incomplete(),
        }
        match parse_space(c)? {
            ParseOutcome::Done(()) => {}
            ParseOutcome::Incomplete => {
                c.rewind(before);
                return crate::outcome::incomplete();
            }
        }
        let name = match astring_inline(c)? {
            ParseOutcome::Done(v) => v,
            ParseOutcome::Incomplete => {
                c.rewind(before);
                return crate::outcome::incomplete();
            }
        };
        match parse_space(c)? {
            ParseOutcome::Done(()) => done(name),
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
    match search_key(cursor, tracker)? {
        ParseOutcome::Done(criteria) => done(CommandBody::Search { id_space, criteria, charset }),
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            crate::outcome::incomplete()
        }
    }
}

fn fetch_command(cursor: &mut Cursor<'_>, _tracker: &StackTracker, id_space: IdSpace) -> ParseResult<CommandBody> {
    let start = cursor.checkpoint();
    match parse_space(cursor)? {
        ParseOutcome::Done(()) => {}
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            return crate::outcome::incomplete();
        }
    }
    let sequence = match sequence_set(cursor)? {
        ParseOutcome::Done(s) => s,
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
    match fetch_request(cursor)? {
        ParseOutcome::Done(request) => done(CommandBody::Fetch { id_space, sequence, request }),
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            crate::outcome::incomplete()
        }
    }
}

fn fetch_request(cursor: &mut Cursor<'_>) -> ParseResult<FetchRequest> {
    let start = cursor.checkpoint();
    if cursor.peek() == Some(b'(') {
        cursor.advance(1);
        let mut attrs = Vec::new();
        loop {
            match fetch_attribute(cursor)? {
                ParseOutcome::Done(attr) => attrs.push(attr),
                ParseOutcome::Incomplete => {
                    cursor.rewind(start);
                    return crate::outcome::incomplete();
                }
            }
            if cursor.consume_byte(b' ') {
                continue;
            }
            if cursor.consume_byte(b')') {
                break;
            }
            cursor.rewind(start);
            return Err(Error::InvalidSyntax {
                position: start,
                production: "fetch-att-list",
                hint: "expected SP or ')'".to_string(),
            });
        }
        return done(FetchRequest::Attributes(attrs));
    }
    match atom(cursor)? {
        ParseOutcome::Done(text) => match text.to_ascii_uppercase().as_str() {
            "ALL" => done(FetchRequest::All),
            "FULL" => done(FetchRequest::Full),
            "FAST" => done(FetchRequest::Fast),
            _ => {
                cursor.rewind(start);
                match fetch_attribute(cursor)? {
                    ParseOutcome::Done(attr) => done(FetchRequest::Attributes(vec![attr])),
                    ParseOutcome::Incomplete => crate::outcome::incomplete(),
                }
            }
        },
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            crate::outcome::incomplete()
        }
    }
}

fn fetch_attribute(cursor: &mut Cursor<'_>) -> ParseResult<FetchAttributeRequest> {
    let start = cursor.checkpoint();
    let keyword = match fetch_attribute_keyword(cursor)? {
        ParseOutcome::Done(text) => text.to_ascii_uppercase(),
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            return crate::outcome::incomplete();
        }
    };
    let attr = match keyword.as_str() {
        "FLAGS" => FetchAttributeRequest::Flags,
        "INTERNALDATE" => FetchAttributeRequest::InternalDate,
        "RFC822.SIZE" => FetchAttributeRequest::Rfc822Size,
        "ENVELOPE" => FetchAttributeRequest::Envelope,
        "BODYSTRUCTURE" => FetchAttributeRequest::BodyStructure,
        "UID" => FetchAttributeRequest::Uid,
        "RFC822" => FetchAttributeRequest::Rfc822,
        "RFC822.HEADER" => FetchAttributeRequest::Rfc822Header,
        "RFC822.TEXT" => FetchAttributeRequest::Rfc822Text,
        "MODSEQ" => FetchAttributeRequest::ModSeq,
        "BODY" | "BODY.PEEK" | "BINARY" | "BINARY.PEEK" | "BINARY.SIZE" => {
            let peek = keyword.ends_with(".PEEK");
            let (section, partial) = match section_spec(cursor)? {
                ParseOutcome::Done(s) => {
                    let partial = partial_range(cursor)?;
                    let ParseOutcome::Done(partial) = partial else {
                        cursor.rewind(start);
                        return crate::outcome::incomplete();
                    };
                    (s, partial)
                }
                ParseOutcome::Incomplete => {
                    cursor.rewind(start);
                    return crate::outcome::incomplete();
                }
            };
            match keyword.as_str() {
                "BODY" | "BODY.PEEK" => FetchAttributeRequest::Body { section, peek, partial },
                "BINARY" | "BINARY.PEEK" => FetchAttributeRequest::Binary { section, peek, partial },
                _ => FetchAttributeRequest::BinarySize { section },
            }
        }
        other => {
            cursor.rewind(start);
            return Err(Error::InvalidSyntax {
                position: start,
                production: "fetch-att",
                hint: format!("unknown FETCH attribute {other:?}"),
            });
        }
    };
    done(attr)
}

fn partial_range(cursor: &mut Cursor<'_>) -> ParseResult<Option<(u32, u32)>> {
    let start = cursor.checkpoint();
    if cursor.peek() != Some(b'<') {
        return done(None);
    }
    cursor.advance(1);
    let from = match parse_unsigned_integer(cursor)? {
        ParseOutcome::Done(n) => n,
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            return crate::outcome::incomplete();
        }
    };
    if !cursor.consume_byte(b'.') {
        cursor.rewind(start);
        return Err(Error::InvalidSyntax {
            position: start,
            production: "partial",
            hint: "expected '.'".to_string(),
        });
    }
    let len = match parse_unsigned_integer(cursor)? {
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
            production: "partial",
            hint: "expected '>'".to_string(),
        });
    }
    done(Some((from, len)))
}

fn store_command(cursor: &mut Cursor<'_>, id_space: IdSpace) -> ParseResult<CommandBody> {
    let start = cursor.checkpoint();
    match parse_space(cursor)? {
        ParseOutcome::Done(()) => {}
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            return crate::outcome::incomplete();
        }
    }
    let sequence = match sequence_set(cursor)? {
        ParseOutcome::Done(s) => s,
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
    let unchanged_since = match crate::grammar::combinators::optional(cursor, unchangedsince_clause)? {
        ParseOutcome::Done(v) => v,
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            return crate::outcome::incomplete();
        }
    };
    let (sign, silent) = match store_sign(cursor)? {
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
    match flag_list(cursor)? {
        ParseOutcome::Done(flags) => {
            let action = match sign {
                Sign::Set => StoreAction::Set(flags),
                Sign::Add => StoreAction::Add(flags),
                Sign::Remove => StoreAction::Remove(flags),
            };
            done(CommandBody::Store {
                id_space,
                sequence,
                request: StoreRequest { action, silent, unchanged_since },
            })
        }
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            crate::outcome::incomplete()
        }
    }
}

fn unchangedsince_clause(cursor: &mut Cursor<'_>) -> ParseResult<u64> {
    let start = cursor.checkpoint();
    if !cursor.consume_byte(b'(') {
        return Err(Error::InvalidSyntax { position: start, production: "store-modifier", hint: "not present".into() });
    }
    match fixed_string(cursor, "UNCHANGEDSINCE", false)? {
        ParseOutcome::Done(()) => {}
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            return crate::outcome::incomplete();
        }
    }
    match parse_space(cursor)? {
        ParseOutcome::Done(()) => {}
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            return crate::outcome::incomplete();
        }
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
        return Err(Error::InvalidSyntax { position: start, production: "store-modifier", hint: "expected ')'".into() });
    }
    match parse_space(cursor)? {
        ParseOutcome::Done(()) => done(value),
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            crate::outcome::incomplete()
        }
    }
}

enum Sign {
    Set,
    Add,
    Remove,
}

fn store_sign(cursor: &mut Cursor<'_>) -> ParseResult<(Sign, bool)> {
    let start = cursor.checkpoint();
    let sign = match cursor.peek() {
        Some(b'+') => {
            cursor.advance(1);
            Sign::Add
        }
        Some(b'-') => {
            cursor.advance(1);
            Sign::Remove
        }
        Some(_) => Sign::Set,
        None => return crate::outcome::incomplete(),
    };
    match fixed_string(cursor, "FLAGS", false)? {
        ParseOutcome::Done(()) => {}
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            return crate::outcome::incomplete();
        }
    }
    let silent = match crate::grammar::combinators::optional(cursor, |c| fixed_string(c, ".SILENT", false))? {
        ParseOutcome::Done(v) => v.is_some(),
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            return crate::outcome::incomplete();
        }
    };
    done((sign, silent))
}

fn copy_command(cursor: &mut Cursor<'_>, id_space: IdSpace) -> ParseResult<CommandBody> {
    let start = cursor.checkpoint();
    let (sequence, mailbox) = match sequence_and_mailbox(cursor)? {
        ParseOutcome::Done(v) => v,
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            return crate::outcome::incomplete();
        }
    };
    done(CommandBody::Copy { id_space, sequence, mailbox })
}

fn move_command(cursor: &mut Cursor<'_>, id_space: IdSpace) -> ParseResult<CommandBody> {
    let start = cursor.checkpoint();
    let (sequence, mailbox) = match sequence_and_mailbox(cursor)? {
        ParseOutcome::Done(v) => v,
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            return crate::outcome::incomplete();
        }
    };
    done(CommandBody::Move { id_space, sequence, mailbox })
}

fn sequence_and_mailbox(cursor: &mut Cursor<'_>) -> ParseResult<(crate::types::SequenceSet, Mailbox)> {
    let start = cursor.checkpoint();
    match parse_space(cursor)? {
        ParseOutcome::Done(()) => {}
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            return crate::outcome::incomplete();
        }
    }
    let sequence = match sequence_set(cursor)? {
        ParseOutcome::Done(s) => s,
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            return crate::outcome::incomplete();
        }
    };
    match mailbox_arg(cursor)? {
        ParseOutcome::Done(mailbox) => done((sequence, mailbox)),
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            crate::outcome::incomplete()
        }
    }
}

fn enable_command(cursor: &mut Cursor<'_>) -> ParseResult<CommandBody> {
    let start = cursor.checkpoint();
    let mut capabilities = Vec::new();
    loop {
        match crate::grammar::combinators::optional(cursor, |c| {
            let before = c.checkpoint();
            match parse_space(c)? {
                ParseOutcome::Done(()) => {}
                ParseOutcome::Incomplete => return crate::outcome::incomplete(),
            }
            match atom(c)? {
                ParseOutcome::Done(text) => done(text.to_string()),
                ParseOutcome::Incomplete => {
                    c.rewind(before);
                    crate::outcome::incomplete()
                }
            }
        })? {
            ParseOutcome::Done(Some(cap)) => capabilities.push(cap),
            ParseOutcome::Done(None) => break,
            ParseOutcome::Incomplete => {
                cursor.rewind(start);
                return crate::outcome::incomplete();
            }
        }
    }
    done(CommandBody::Enable { capabilities })
}

fn extension_command(cursor: &mut Cursor<'_>, keyword: &str) -> ParseResult<CommandBody> {
    let rest = cursor.take_while(|b| b != b'\r' && b != b'\n');
    done(CommandBody::Extension { keyword: keyword.to_string(), arguments: rest.to_vec() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::StackTracker;

    fn tracker() -> StackTracker {
        StackTracker::new(32)
    }

    #[test]
    fn parses_simple_noop() {
        let mut cursor = Cursor::new(b"a1 NOOP");
        let cmd = command(&mut cursor, &tracker()).unwrap().done().unwrap();
        assert_eq!(cmd.tag.as_str(), "a1");
        assert_eq!(cmd.body, CommandBody::Noop);
    }

    #[test]
    fn parses_login() {
        let mut cursor = Cursor::new(br#"a1 LOGIN "bob" "secret""#);
        let cmd = command(&mut cursor, &tracker()).unwrap().done().unwrap();
        assert_eq!(cmd.body, CommandBody::Login { user: "bob".into(), password: "secret".into() });
    }

    #[test]
    fn parses_select() {
        let mut cursor = Cursor::new(b"a1 SELECT INBOX");
        let cmd = command(&mut cursor, &tracker()).unwrap().done().unwrap();
        match cmd.body {
            CommandBody::Select { mailbox } => assert!(mailbox.is_inbox()),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parses_uid_fetch() {
        let mut cursor = Cursor::new(b"a1 UID FETCH 1:5 (FLAGS UID)");
        let cmd = command(&mut cursor, &tracker()).unwrap().done().unwrap();
        match cmd.body {
            CommandBody::Fetch { id_space: IdSpace::Uid, request: FetchRequest::Attributes(attrs), .. } => {
                assert_eq!(attrs, vec![FetchAttributeRequest::Flags, FetchAttributeRequest::Uid]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parses_store_with_silent() {
        let mut cursor = Cursor::new(b"a1 STORE 1:3 +FLAGS.SILENT (\\Seen)");
        let cmd = command(&mut cursor, &tracker()).unwrap().done().unwrap();
        match cmd.body {
            CommandBody::Store { request, .. } => {
                assert!(request.silent);
                assert_eq!(request.action, StoreAction::Add(Flags::from_iter([Flag::Seen])));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parses_append_with_literal_header() {
        let mut cursor = Cursor::new(b"a1 APPEND Drafts (\\Draft) {42}\r\n");
        let cmd = command(&mut cursor, &tracker()).unwrap().done().unwrap();
        match cmd.body {
            CommandBody::Append { message, .. } => {
                assert_eq!(message.literal_length, 42);
                assert!(!message.is_literal8);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parses_append_with_literal8_header() {
        let mut cursor = Cursor::new(b"a1 APPEND Drafts ~{42}\r\n");
        let cmd = command(&mut cursor, &tracker()).unwrap().done().unwrap();
        match cmd.body {
            CommandBody::Append { message, .. } => {
                assert_eq!(message.literal_length, 42);
                assert!(message.is_literal8);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parses_fetch_body_section_with_partial_range() {
        let mut cursor = Cursor::new(b"a1 FETCH 1 (BODY[1]<0.512>)");
        let cmd = command(&mut cursor, &tracker()).unwrap().done().unwrap();
        match cmd.body {
            CommandBody::Fetch { request: FetchRequest::Attributes(attrs), .. } => {
                assert_eq!(
                    attrs,
                    vec![FetchAttributeRequest::Body {
                        section: crate::grammar::Section::Part(vec![1]),
                        peek: false,
                        partial: Some((0, 512)),
                    }]
                );
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_command_falls_through_to_extension() {
        let mut cursor = Cursor::new(b"a1 XLIST INBOX");
        let cmd = command(&mut cursor, &tracker()).unwrap().done().unwrap();
        match cmd.body {
            CommandBody::Extension { keyword, arguments } => {
                assert_eq!(keyword, "XLIST");
                assert_eq!(arguments, b"INBOX");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
