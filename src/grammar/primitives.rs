//! Lexical primitives: atoms, strings, numbers.
//!
//! These operate purely on the reconstructed line bytes a [`crate::framer::Framer`]
//! has already handed back — literal payloads appear inline here as raw bytes
//! following a `{N}\r\n` header the framer left untouched.

use crate::buffer::Cursor;
use crate::error::Error;
use crate::outcome::{done, incomplete, ParseOutcome, ParseResult};

use super::combinators::{parse_digits, parse_unsigned_integer};

const ATOM_SPECIALS: &[u8] = b"(){ %*\"\\]\r\n";

fn is_atom_char(b: u8) -> bool {
    b > 0x1f && b != 0x7f && !ATOM_SPECIALS.contains(&b)
}

/// Parses `atom`: one or more non-special, non-control characters.
pub fn atom<'a>(cursor: &mut Cursor<'a>) -> ParseResult<&'a str> {
    let start = cursor.checkpoint();
    let bytes = cursor.take_while(is_atom_char);
    if bytes.is_empty() {
        if cursor.is_empty() {
            return incomplete();
        }
        return Err(Error::InvalidSyntax {
            position: start,
            production: "atom",
            hint: "expected at least one atom character".to_string(),
        });
    }
    if cursor.is_empty() {
        // the atom might continue once more bytes arrive
        cursor.rewind(start);
        return incomplete();
    }
    std::str::from_utf8(bytes).map_or_else(
        |_| {
            Err(Error::InvalidSyntax {
                position: start,
                production: "atom",
                hint: "atom was not valid UTF-8".to_string(),
            })
        },
        done,
    )
}

/// Parses a FETCH attribute keyword, stopping before a `[` (the ABNF
/// allows `[` inside a bare `atom`, but `BODY[section]`/`BINARY[section]`
/// need the keyword split from the section spec with no separator between
/// them).
pub fn fetch_attribute_keyword<'a>(cursor: &mut Cursor<'a>) -> ParseResult<&'a str> {
    let start = cursor.checkpoint();
    let bytes = cursor.take_while(|b| is_atom_char(b) && b != b'[');
    if bytes.is_empty() {
        if cursor.is_empty() {
            return incomplete();
        }
        return Err(Error::InvalidSyntax {
            position: start,
            production: "fetch-att",
            hint: "expected a FETCH attribute keyword".to_string(),
        });
    }
    if cursor.is_empty() {
        cursor.rewind(start);
        return incomplete();
    }
    std::str::from_utf8(bytes).map_or_else(
        |_| {
            Err(Error::InvalidSyntax {
                position: start,
                production: "fetch-att",
                hint: "keyword was not valid UTF-8".to_string(),
            })
        },
        done,
    )
}

/// Parses `quoted` (RFC 3501 `quoted = DQUOTE *QUOTED-CHAR DQUOTE`),
/// unescaping `\"` and `\\`.
pub fn quoted_string(cursor: &mut Cursor<'_>) -> ParseResult<String> {
    let start = cursor.checkpoint();
    if cursor.is_empty() {
        return incomplete();
    }
    if !cursor.consume_byte(b'"') {
        return Err(Error::InvalidSyntax {
            position: start,
            production: "quoted",
            hint: "expected opening DQUOTE".to_string(),
        });
    }
    let mut out = Vec::new();
    loop {
        match cursor.peek() {
            None => {
                cursor.rewind(start);
                return incomplete();
            }
            Some(b'"') => {
                cursor.advance(1);
                return String::from_utf8(out).map_or_else(
                    |_| {
                        Err(Error::InvalidSyntax {
                            position: start,
                            production: "quoted",
                            hint: "quoted string was not valid UTF-8".to_string(),
                        })
                    },
                    done,
                );
            }
            Some(b'\\') => {
                if cursor.remaining_len() < 2 {
                    cursor.rewind(start);
                    return incomplete();
                }
                let escaped = cursor.peek_at(1).expect("length checked");
                if escaped == b'"' || escaped == b'\\' {
                    out.push(escaped);
                    cursor.advance(2);
                } else {
                    cursor.rewind(start);
                    return Err(Error::InvalidSyntax {
                        position: start,
                        production: "quoted",
                        hint: "invalid escape sequence".to_string(),
                    });
                }
            }
            Some(b'\r' | b'\n') => {
                cursor.rewind(start);
                return Err(Error::InvalidSyntax {
                    position: start,
                    production: "quoted",
                    hint: "unescaped CR/LF inside quoted string".to_string(),
                });
            }
            Some(b) => {
                out.push(b);
                cursor.advance(1);
            }
        }
    }
}

/// A decoded `literal`: just the declared byte length and the
/// synchronizing/non-synchronizing marker, per `{N}` / `{N+}` / `{N-}`, plus
/// whether it was the RFC 3516 `literal8` form `~{N}` that permits NUL and
/// other octets a plain `literal` forbids.
///
/// Parsing the header is the only part of literal handling that belongs to
/// the grammar layer; the framer has already inlined the payload bytes
/// immediately after the header's CRLF for anything small enough to buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiteralHeader {
    /// Declared payload length in bytes.
    pub length: usize,
    /// `false` for `{N+}` (non-synchronizing, RFC 7888).
    pub synchronizing: bool,
    /// `true` for `~{N}` (literal8, RFC 3516): the payload may contain NUL.
    pub is_literal8: bool,
}

/// Parses a literal header `["~"] "{"` number [`+` / `-`] `}` CRLF and
/// returns the declared length, leaving the cursor positioned at the first
/// payload byte.
pub fn literal_header(cursor: &mut Cursor<'_>) -> ParseResult<LiteralHeader> {
    let start = cursor.checkpoint();
    if cursor.is_empty() {
        return incomplete();
    }
    let is_literal8 = cursor.consume_byte(b'~');
    if cursor.is_empty() {
        cursor.rewind(start);
        return incomplete();
    }
    if !cursor.consume_byte(b'{') {
        return Err(Error::InvalidSyntax {
            position: start,
            production: "literal",
            hint: "expected '{'".to_string(),
        });
    }
    let length = match parse_unsigned_integer(cursor)? {
        ParseOutcome::Done(n) => n,
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            return incomplete();
        }
    };
    if cursor.is_empty() {
        cursor.rewind(start);
        return incomplete();
    }
    let synchronizing = !(cursor.consume_byte(b'+') || cursor.consume_byte(b'-'));
    if !cursor.consume_byte(b'}') {
        cursor.rewind(start);
        return Err(Error::InvalidSyntax {
            position: start,
            production: "literal",
            hint: "expected '}'".to_string(),
        });
    }
    match super::combinators::parse_newline(cursor)? {
        ParseOutcome::Done(()) => done(LiteralHeader {
            length: length as usize,
            synchronizing,
            is_literal8,
        }),
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            incomplete()
        }
    }
}

/// Parses `astring` as anything other than a literal (atom or quoted
/// string); literal astrings are handled by the caller since they require
/// coordinating with the byte accumulator rather than the cursor alone.
pub fn astring_inline(cursor: &mut Cursor<'_>) -> ParseResult<String> {
    if cursor.peek() == Some(b'"') {
        return quoted_string(cursor);
    }
    atom(cursor).map(|o| o.map(ToOwned::to_owned))
}

/// Parses `nstring` (`NIL` or a `string`) restricted to the inline forms;
/// literal nstrings route through the same caller coordination as
/// [`astring_inline`].
pub fn nstring_inline(cursor: &mut Cursor<'_>) -> ParseResult<Option<String>> {
    let start = cursor.checkpoint();
    if cursor.remaining_len() >= 3 && cursor.remaining()[..3].eq_ignore_ascii_case(b"NIL") {
        cursor.advance(3);
        return done(None);
    }
    if cursor.peek() == Some(b'"') {
        return quoted_string(cursor).map(|o| o.map(Some));
    }
    if cursor.remaining_len() < 3 && b"NIL"[..cursor.remaining_len().min(3)].eq_ignore_ascii_case(cursor.remaining()) {
        return incomplete();
    }
    let _ = start;
    Err(Error::InvalidSyntax {
        position: cursor.position(),
        production: "nstring",
        hint: "expected NIL, a quoted string, or a literal header".to_string(),
    })
}

/// Parses a `SP`-separated `nz-number` sequence, such as a mailbox-id list.
pub fn nz_number(cursor: &mut Cursor<'_>) -> ParseResult<u32> {
    super::combinators::parse_nz_number(cursor)
}

/// Parses an `n`-digit fixed-width number (used by date/time fields).
pub fn fixed_digits_number(cursor: &mut Cursor<'_>, n: usize) -> ParseResult<u32> {
    match parse_digits(cursor, n)? {
        ParseOutcome::Done(text) => text.parse().map_or_else(
            |_| {
                Err(Error::InvalidSyntax {
                    position: cursor.position(),
                    production: "fixed-digits",
                    hint: "integer overflow".to_string(),
                })
            },
            done,
        ),
        ParseOutcome::Incomplete => incomplete(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atom_stops_at_space() {
        let mut cursor = Cursor::new(b"INBOX more");
        assert_eq!(atom(&mut cursor).unwrap(), ParseOutcome::Done("INBOX"));
        assert_eq!(cursor.remaining(), b" more");
    }

    #[test]
    fn quoted_string_unescapes() {
        let mut cursor = Cursor::new(br#""hello \"world\"" rest"#);
        let value = quoted_string(&mut cursor).unwrap().done().unwrap();
        assert_eq!(value, "hello \"world\"");
        assert_eq!(cursor.remaining(), b" rest");
    }

    #[test]
    fn quoted_string_rejects_raw_crlf() {
        let mut cursor = Cursor::new(b"\"abc\r\ndef\"");
        assert!(quoted_string(&mut cursor).is_err());
    }

    #[test]
    fn literal_header_parses_synchronizing() {
        let mut cursor = Cursor::new(b"{12}\r\nbody...");
        let header = literal_header(&mut cursor).unwrap().done().unwrap();
        assert_eq!(header, LiteralHeader { length: 12, synchronizing: true, is_literal8: false });
        assert_eq!(cursor.remaining(), b"body...");
    }

    #[test]
    fn literal_header_parses_literal8() {
        let mut cursor = Cursor::new(b"~{5}\r\nbody...");
        let header = literal_header(&mut cursor).unwrap().done().unwrap();
        assert_eq!(header, LiteralHeader { length: 5, synchronizing: true, is_literal8: true });
        assert_eq!(cursor.remaining(), b"body...");
    }

    #[test]
    fn literal_header_parses_non_synchronizing() {
        let mut cursor = Cursor::new(b"{12+}\r\n");
        let header = literal_header(&mut cursor).unwrap().done().unwrap();
        assert!(!header.synchronizing);
    }

    #[test]
    fn nstring_inline_recognizes_nil_case_insensitively() {
        let mut cursor = Cursor::new(b"nil rest");
        assert_eq!(nstring_inline(&mut cursor).unwrap(), ParseOutcome::Done(None));
    }

    #[test]
    fn fetch_attribute_keyword_stops_before_bracket() {
        let mut cursor = Cursor::new(b"BODY[1]<0> rest");
        assert_eq!(fetch_attribute_keyword(&mut cursor).unwrap(), ParseOutcome::Done("BODY"));
        assert_eq!(cursor.remaining(), b"[1]<0> rest");
    }

    #[test]
    fn fetch_attribute_keyword_plain_atom_unaffected() {
        let mut cursor = Cursor::new(b"FLAGS UID");
        assert_eq!(fetch_attribute_keyword(&mut cursor).unwrap(), ParseOutcome::Done("FLAGS"));
    }
}
