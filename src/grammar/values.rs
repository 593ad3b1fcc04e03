//! Flags, mailbox names, capability data, and status attributes.
//!
//! Grounded on the teacher's token-matching style in its response-parsing
//! helpers, rewritten over the cursor/combinator vocabulary used throughout
//! this parser instead of a pre-lexed token stream.

use crate::buffer::Cursor;
use crate::error::Error;
use crate::outcome::{done, ParseOutcome, ParseResult};
use crate::types::{Capability, Flag, Flags, Mailbox, Status};

use super::combinators::{one_or_more, parse_space, zero_or_more};
use super::primitives::{astring_inline, atom};

/// Parses a single `flag` token (including its leading `\` for system
/// flags, or bare for keywords).
fn flag(cursor: &mut Cursor<'_>) -> ParseResult<Flag> {
    let start = cursor.checkpoint();
    if cursor.is_empty() {
        return crate::outcome::incomplete();
    }
    if cursor.peek() == Some(b'\\') {
        cursor.advance(1);
        match atom(cursor)? {
            ParseOutcome::Done(rest) => done(Flag::parse(&format!("\\{rest}"))),
            ParseOutcome::Incomplete => {
                cursor.rewind(start);
                crate::outcome::incomplete()
            }
        }
    } else {
        atom(cursor).map(|o| o.map(Flag::parse))
    }
}

/// Parses `"(" [flag *(SP flag)] ")"`.
pub fn flag_list(cursor: &mut Cursor<'_>) -> ParseResult<Flags> {
    let start = cursor.checkpoint();
    if cursor.is_empty() {
        return crate::outcome::incomplete();
    }
    if !cursor.consume_byte(b'(') {
        return Err(Error::InvalidSyntax {
            position: start,
            production: "flag-list",
            hint: "expected '('".to_string(),
        });
    }
    let mut flags = Flags::new();
    if cursor.peek() == Some(b')') {
        cursor.advance(1);
        return done(flags);
    }
    let first = match flag(cursor)? {
        ParseOutcome::Done(f) => f,
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            return crate::outcome::incomplete();
        }
    };
    flags.push(first);
    loop {
        let before_sep = cursor.checkpoint();
        if cursor.is_empty() {
            cursor.rewind(start);
            return crate::outcome::incomplete();
        }
        if cursor.consume_byte(b')') {
            return done(flags);
        }
        if !cursor.consume_byte(b' ') {
            cursor.rewind(start);
            return Err(Error::InvalidSyntax {
                position: before_sep,
                production: "flag-list",
                hint: "expected SP or ')'".to_string(),
            });
        }
        match flag(cursor)? {
            ParseOutcome::Done(f) => flags.push(f),
            ParseOutcome::Incomplete => {
                cursor.rewind(start);
                return crate::outcome::incomplete();
            }
        }
    }
}

/// Parses a mailbox name as an inline `astring` (atom or quoted string),
/// applying INBOX case-folding. Mailbox names delivered as literals are
/// assembled by the caller from the framer's inlined payload bytes before
/// being handed to [`Mailbox::new`] directly.
pub fn mailbox_name(cursor: &mut Cursor<'_>) -> ParseResult<Mailbox> {
    astring_inline(cursor).map(|o| o.map(|s| Mailbox::new(s)))
}

/// Parses the space-prefixed capability tokens following `CAPABILITY`.
pub fn capability_data(cursor: &mut Cursor<'_>) -> ParseResult<Vec<Capability>> {
    let parsed = zero_or_more(cursor, |c| {
        composite_capability(c)
    })?;
    done(parsed.done().unwrap_or_default())
}

fn composite_capability(cursor: &mut Cursor<'_>) -> ParseResult<Capability> {
    let start = cursor.checkpoint();
    match parse_space(cursor)? {
        ParseOutcome::Done(()) => {}
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            return crate::outcome::incomplete();
        }
    }
    match atom(cursor)? {
        ParseOutcome::Done(text) => done(Capability::parse(text)),
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            crate::outcome::incomplete()
        }
    }
}

/// A single `STATUS-ATT-LIST` entry: `(name, value)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusAttribute {
    /// Which attribute this is.
    pub name: Status,
    /// Its reported value. `HIGHESTMODSEQ` is the only 64-bit attribute;
    /// it is still carried in this `u64` field for the others (zero-cost,
    /// since `u32` always fits) to keep the type uniform.
    pub value: u64,
}

/// Parses `"(" status-att SP number *(SP status-att SP number) ")"`.
pub fn status_att_list(cursor: &mut Cursor<'_>) -> ParseResult<Vec<StatusAttribute>> {
    let start = cursor.checkpoint();
    if cursor.is_empty() {
        return crate::outcome::incomplete();
    }
    if !cursor.consume_byte(b'(') {
        return Err(Error::InvalidSyntax {
            position: start,
            production: "status-att-list",
            hint: "expected '('".to_string(),
        });
    }
    if cursor.peek() == Some(b')') {
        cursor.advance(1);
        return done(Vec::new());
    }
    let items = one_or_more(cursor, |c| composite_status_attribute(c))?;
    match items {
        ParseOutcome::Done(items) => {
            if !cursor.consume_byte(b')') {
                cursor.rewind(start);
                return Err(Error::InvalidSyntax {
                    position: cursor.position(),
                    production: "status-att-list",
                    hint: "expected ')'".to_string(),
                });
            }
            done(items)
        }
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            crate::outcome::incomplete()
        }
    }
}

fn composite_status_attribute(cursor: &mut Cursor<'_>) -> ParseResult<StatusAttribute> {
    let start = cursor.checkpoint();
    // Each entry (after the first) is separated by a space; the caller
    // loop in `one_or_more` retries this production at the current
    // position, so we must tolerate a leading space for entries 2..n and
    // its absence for entry 1 by trying the separator optionally.
    let _ = super::combinators::optional(cursor, parse_space)?;
    let name_atom = match atom(cursor)? {
        ParseOutcome::Done(text) => text.to_ascii_uppercase(),
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            return crate::outcome::incomplete();
        }
    };
    let name = match name_atom.as_str() {
        "MESSAGES" => Status::Messages,
        "RECENT" => Status::Recent,
        "UIDNEXT" => Status::UidNext,
        "UIDVALIDITY" => Status::UidValidity,
        "UNSEEN" => Status::Unseen,
        "HIGHESTMODSEQ" => Status::HighestModSeq,
        _ => {
            cursor.rewind(start);
            return Err(Error::InvalidSyntax {
                position: start,
                production: "status-att",
                hint: format!("unknown status attribute {name_atom:?}"),
            });
        }
    };
    match parse_space(cursor)? {
        ParseOutcome::Done(()) => {}
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            return crate::outcome::incomplete();
        }
    }
    match super::combinators::parse_unsigned_integer(cursor)? {
        ParseOutcome::Done(value) => done(StatusAttribute { name, value: u64::from(value) }),
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            crate::outcome::incomplete()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_list_parses_mixed_flags() {
        let mut cursor = Cursor::new(b"(\\Seen \\Flagged Important)");
        let flags = flag_list(&mut cursor).unwrap().done().unwrap();
        assert_eq!(flags.len(), 3);
        assert!(flags.contains(&Flag::Seen));
        assert!(flags.contains(&Flag::Keyword("Important".into())));
    }

    #[test]
    fn flag_list_empty() {
        let mut cursor = Cursor::new(b"()");
        let flags = flag_list(&mut cursor).unwrap().done().unwrap();
        assert!(flags.is_empty());
    }

    #[test]
    fn mailbox_name_case_folds_inbox() {
        let mut cursor = Cursor::new(b"inbox");
        let mailbox = mailbox_name(&mut cursor).unwrap().done().unwrap();
        assert!(mailbox.is_inbox());
    }

    #[test]
    fn capability_data_reads_space_prefixed_tokens() {
        let mut cursor = Cursor::new(b" IMAP4rev1 IDLE AUTH=PLAIN\r\n");
        let caps = capability_data(&mut cursor).unwrap().done().unwrap();
        assert_eq!(caps.len(), 3);
        assert_eq!(caps[2], Capability::Auth("PLAIN".into()));
    }

    #[test]
    fn status_att_list_parses_pairs() {
        let mut cursor = Cursor::new(b"(MESSAGES 231 UIDNEXT 44292)");
        let items = status_att_list(&mut cursor).unwrap().done().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, Status::Messages);
        assert_eq!(items[0].value, 231);
        assert_eq!(items[1].value, 44292);
    }
}
