//! `envelope` and `address` structure productions (RFC 3501 §7.4.2).

use crate::buffer::Cursor;
use crate::error::Error;
use crate::outcome::{done, ParseOutcome, ParseResult};

use super::primitives::nstring_inline;

/// One `address` structure: `(name adl mailbox host)`, any field `NIL`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Address {
    /// Display name, if given.
    pub name: Option<String>,
    /// At-domain-list (source routing), rarely present on modern mail.
    pub adl: Option<String>,
    /// Mailbox local-part.
    pub mailbox: Option<String>,
    /// Host/domain part.
    pub host: Option<String>,
}

/// A parsed `ENVELOPE` FETCH attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Envelope {
    /// `Date:` header text, as a raw nstring (already-parsed `date-time`
    /// values live on [`super::DateTime`]; this field is left as text
    /// since RFC 3501 does not require the envelope date to be
    /// well-formed for the client to still receive it verbatim).
    pub date: Option<String>,
    /// `Subject:` header text.
    pub subject: Option<String>,
    /// `From:` addresses.
    pub from: Vec<Address>,
    /// `Sender:` addresses.
    pub sender: Vec<Address>,
    /// `Reply-To:` addresses.
    pub reply_to: Vec<Address>,
    /// `To:` addresses.
    pub to: Vec<Address>,
    /// `Cc:` addresses.
    pub cc: Vec<Address>,
    /// `Bcc:` addresses.
    pub bcc: Vec<Address>,
    /// `In-Reply-To:` header text.
    pub in_reply_to: Option<String>,
    /// `Message-ID:` header text.
    pub message_id: Option<String>,
}

/// Parses one `address`.
pub fn address(cursor: &mut Cursor<'_>) -> ParseResult<Address> {
    let start = cursor.checkpoint();
    if cursor.is_empty() {
        return crate::outcome::incomplete();
    }
    if !cursor.consume_byte(b'(') {
        return Err(Error::InvalidSyntax {
            position: start,
            production: "address",
            hint: "expected '('".to_string(),
        });
    }
    let name = field(cursor, start)?;
    let ParseOutcome::Done(name) = name else { return crate::outcome::incomplete() };
    sep(cursor, start)?;
    let ParseOutcome::Done(adl) = field(cursor, start)? else { return crate::outcome::incomplete() };
    sep(cursor, start)?;
    let ParseOutcome::Done(mailbox) = field(cursor, start)? else { return crate::outcome::incomplete() };
    sep(cursor, start)?;
    let ParseOutcome::Done(host) = field(cursor, start)? else { return crate::outcome::incomplete() };
    if !cursor.consume_byte(b')') {
        cursor.rewind(start);
        return Err(Error::InvalidSyntax {
            position: start,
            production: "address",
            hint: "expected ')'".to_string(),
        });
    }
    done(Address { name, adl, mailbox, host })
}

fn field(cursor: &mut Cursor<'_>, start: usize) -> ParseResult<Option<String>> {
    match nstring_field(cursor)? {
        ParseOutcome::Done(v) => done(v),
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            crate::outcome::incomplete()
        }
    }
}

fn nstring_field(cursor: &mut Cursor<'_>) -> ParseResult<Option<String>> {
    nstring_inline(cursor)
}

fn sep(cursor: &mut Cursor<'_>, start: usize) -> Result<(), crate::error::Error> {
    if cursor.consume_byte(b' ') {
        Ok(())
    } else {
        cursor.rewind(start);
        Err(Error::InvalidSyntax {
            position: start,
            production: "address",
            hint: "expected SP between fields".to_string(),
        })
    }
}

/// Parses `"(" 1*address ")"` or `NIL`.
fn address_list(cursor: &mut Cursor<'_>) -> ParseResult<Vec<Address>> {
    let start = cursor.checkpoint();
    if cursor.remaining_len() >= 3 && cursor.remaining()[..3].eq_ignore_ascii_case(b"NIL") {
        cursor.advance(3);
        return done(Vec::new());
    }
    if cursor.is_empty() {
        return crate::outcome::incomplete();
    }
    if !cursor.consume_byte(b'(') {
        return Err(Error::InvalidSyntax {
            position: start,
            production: "address-list",
            hint: "expected '(' or NIL".to_string(),
        });
    }
    let mut addresses = Vec::new();
    loop {
        match address(cursor)? {
            ParseOutcome::Done(addr) => addresses.push(addr),
            ParseOutcome::Incomplete => {
                cursor.rewind(start);
                return crate::outcome::incomplete();
            }
        }
        if cursor.peek() == Some(b')') {
            cursor.advance(1);
            break;
        }
    }
    done(addresses)
}

fn quoted_or_nil(cursor: &mut Cursor<'_>) -> ParseResult<Option<String>> {
    nstring_inline(cursor)
}

/// Parses a full `ENVELOPE` value: `"(" env-date SP env-subject SP
/// env-from SP env-sender SP env-reply-to SP env-to SP env-cc SP env-bcc
/// SP env-in-reply-to SP env-message-id ")"`.
pub fn envelope(cursor: &mut Cursor<'_>) -> ParseResult<Envelope> {
    let start = cursor.checkpoint();
    if cursor.is_empty() {
        return crate::outcome::incomplete();
    }
    if !cursor.consume_byte(b'(') {
        return Err(Error::InvalidSyntax {
            position: start,
            production: "envelope",
            hint: "expected '('".to_string(),
        });
    }
    macro_rules! field_or_incomplete {
        ($parser:expr) => {{
            match $parser(cursor)? {
                ParseOutcome::Done(v) => v,
                ParseOutcome::Incomplete => {
                    cursor.rewind(start);
                    return crate::outcome::incomplete();
                }
            }
        }};
    }
    let date = field_or_incomplete!(quoted_or_nil);
    sep(cursor, start)?;
    let subject = field_or_incomplete!(quoted_or_nil);
    sep(cursor, start)?;
    let from = field_or_incomplete!(address_list);
    sep(cursor, start)?;
    let sender = field_or_incomplete!(address_list);
    sep(cursor, start)?;
    let reply_to = field_or_incomplete!(address_list);
    sep(cursor, start)?;
    let to = field_or_incomplete!(address_list);
    sep(cursor, start)?;
    let cc = field_or_incomplete!(address_list);
    sep(cursor, start)?;
    let bcc = field_or_incomplete!(address_list);
    sep(cursor, start)?;
    let in_reply_to = field_or_incomplete!(quoted_or_nil);
    sep(cursor, start)?;
    let message_id = field_or_incomplete!(quoted_or_nil);
    if !cursor.consume_byte(b')') {
        cursor.rewind(start);
        return Err(Error::InvalidSyntax {
            position: start,
            production: "envelope",
            hint: "expected ')'".to_string(),
        });
    }
    done(Envelope { date, subject, from, sender, reply_to, to, cc, bcc, in_reply_to, message_id })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_parses_full_fields() {
        let mut cursor = Cursor::new(br#"("Alice" NIL "alice" "example.com")"#);
        let addr = address(&mut cursor).unwrap().done().unwrap();
        assert_eq!(addr.name.as_deref(), Some("Alice"));
        assert_eq!(addr.adl, None);
        assert_eq!(addr.mailbox.as_deref(), Some("alice"));
        assert_eq!(addr.host.as_deref(), Some("example.com"));
    }

    #[test]
    fn envelope_with_nil_fields() {
        let mut cursor = Cursor::new(
            br#"(NIL "Hi" NIL NIL NIL (("Bob" NIL "bob" "example.com")) NIL NIL NIL NIL)"#,
        );
        let env = envelope(&mut cursor).unwrap().done().unwrap();
        assert_eq!(env.date, None);
        assert_eq!(env.subject.as_deref(), Some("Hi"));
        assert!(env.from.is_empty());
        assert_eq!(env.to.len(), 1);
        assert_eq!(env.to[0].mailbox.as_deref(), Some("bob"));
    }
}
