//! Restartable parser combinators shared by every grammar production.
//!
//! Every combinator here follows the same contract as the productions it
//! wraps: a value, [`ParseOutcome::Incomplete`], or a fatal [`Error`].
//! `Incomplete` and a cursor-rewinding `Invalid` both propagate without
//! side effects on the cursor; only a successful [`ParseOutcome::Done`]
//! leaves the cursor advanced.

use crate::buffer::Cursor;
use crate::error::Error;
use crate::outcome::{incomplete, done, ParseOutcome, ParseResult};

/// Tries each alternative in order, checkpointing the cursor before each.
/// Returns the first success; if every alternative is `Invalid`, returns
/// the last one's error. An `Incomplete` from any alternative propagates
/// immediately without trying the rest (we cannot know whether a later
/// alternative would have matched with more bytes, but neither can we
/// know that waiting is wrong — so the cursor is always rewound first).
pub fn one_of<'a, T>(
    cursor: &mut Cursor<'a>,
    alternatives: &[fn(&mut Cursor<'a>) -> ParseResult<T>],
) -> ParseResult<T> {
    let start = cursor.checkpoint();
    let mut last_err = None;
    for alt in alternatives {
        cursor.rewind(start);
        match alt(cursor) {
            Ok(ParseOutcome::Done(value)) => return done(value),
            Ok(ParseOutcome::Incomplete) => {
                cursor.rewind(start);
                return incomplete();
            }
            Err(e) => last_err = Some(e),
        }
    }
    cursor.rewind(start);
    Err(last_err.unwrap_or_else(|| Error::InvalidSyntax {
        position: start,
        production: "oneOf",
        hint: "no alternatives supplied".to_string(),
    }))
}

/// Returns `Some(value)` on success, `None` on any parse failure (the
/// cursor is rewound to its entry point on failure). `Incomplete` still
/// propagates: we cannot decide "absent" until we know more.
pub fn optional<'a, T>(
    cursor: &mut Cursor<'a>,
    parser: impl FnOnce(&mut Cursor<'a>) -> ParseResult<T>,
) -> ParseResult<Option<T>> {
    let start = cursor.checkpoint();
    match parser(cursor) {
        Ok(ParseOutcome::Done(value)) => done(Some(value)),
        Ok(ParseOutcome::Incomplete) => {
            cursor.rewind(start);
            incomplete()
        }
        Err(_) => {
            cursor.rewind(start);
            done(None)
        }
    }
}

/// Runs `body` with cursor protection: on `Invalid` failure, rewinds the
/// cursor to the entry point before propagating the error.
pub fn composite<'a, T>(
    cursor: &mut Cursor<'a>,
    body: impl FnOnce(&mut Cursor<'a>) -> ParseResult<T>,
) -> ParseResult<T> {
    let start = cursor.checkpoint();
    match body(cursor) {
        ok @ Ok(ParseOutcome::Done(_)) => ok,
        Ok(ParseOutcome::Incomplete) => {
            cursor.rewind(start);
            incomplete()
        }
        Err(e) => {
            cursor.rewind(start);
            Err(e)
        }
    }
}

/// Lazy Kleene star: repeats `parser` until it fails, collecting successes.
/// Never fails itself (zero repetitions is valid); propagates `Incomplete`
/// from a partially-started repetition rather than silently stopping,
/// since the caller may get more bytes and complete one more iteration.
pub fn zero_or_more<'a, T>(
    cursor: &mut Cursor<'a>,
    mut parser: impl FnMut(&mut Cursor<'a>) -> ParseResult<T>,
) -> ParseResult<Vec<T>> {
    let mut items = Vec::new();
    loop {
        let start = cursor.checkpoint();
        match parser(cursor) {
            Ok(ParseOutcome::Done(value)) => items.push(value),
            Ok(ParseOutcome::Incomplete) => {
                cursor.rewind(start);
                return incomplete();
            }
            Err(_) => {
                cursor.rewind(start);
                return done(items);
            }
        }
    }
}

/// Like [`zero_or_more`] but fails if the first attempt fails.
pub fn one_or_more<'a, T>(
    cursor: &mut Cursor<'a>,
    mut parser: impl FnMut(&mut Cursor<'a>) -> ParseResult<T>,
) -> ParseResult<Vec<T>> {
    let start = cursor.checkpoint();
    match parser(cursor) {
        Ok(ParseOutcome::Done(first)) => {
            let mut items = vec![first];
            match zero_or_more(cursor, parser)? {
                ParseOutcome::Done(rest) => {
                    items.extend(rest);
                    done(items)
                }
                ParseOutcome::Incomplete => incomplete(),
            }
        }
        Ok(ParseOutcome::Incomplete) => {
            cursor.rewind(start);
            incomplete()
        }
        Err(e) => {
            cursor.rewind(start);
            Err(e)
        }
    }
}

/// Consumes `s` exactly, ASCII case-insensitively by default (IMAP
/// keywords are case-insensitive; pass `case_sensitive = true` for the
/// rare literal-text productions that are not, such as tag matching).
pub fn fixed_string(cursor: &mut Cursor<'_>, s: &str, case_sensitive: bool) -> ParseResult<()> {
    let start = cursor.checkpoint();
    if cursor.remaining_len() < s.len() {
        // Could still match once more bytes arrive, *if* the bytes we do
        // have are a prefix match; otherwise it is a hard failure now.
        let have = cursor.remaining();
        let prefix_matches = if case_sensitive {
            have == &s.as_bytes()[..have.len()]
        } else {
            have.eq_ignore_ascii_case(&s.as_bytes()[..have.len()])
        };
        return if prefix_matches {
            incomplete()
        } else {
            Err(Error::InvalidSyntax {
                position: start,
                production: "fixedString",
                hint: format!("expected {s:?}"),
            })
        };
    }
    let candidate = cursor.take(s.len()).expect("length already checked");
    let matches = if case_sensitive {
        candidate == s.as_bytes()
    } else {
        candidate.eq_ignore_ascii_case(s.as_bytes())
    };
    if matches {
        done(())
    } else {
        cursor.rewind(start);
        Err(Error::InvalidSyntax {
            position: start,
            production: "fixedString",
            hint: format!("expected {s:?}"),
        })
    }
}

/// Consumes exactly one space (`SP`, 0x20).
pub fn parse_space(cursor: &mut Cursor<'_>) -> ParseResult<()> {
    if cursor.is_empty() {
        return incomplete();
    }
    if cursor.consume_byte(b' ') {
        done(())
    } else {
        Err(Error::InvalidSyntax {
            position: cursor.position(),
            production: "SP",
            hint: "expected a space".to_string(),
        })
    }
}

/// Consumes `CRLF`, or a bare `LF` (IMAP line terminators accepted
/// leniently on input per the wire-format contract).
pub fn parse_newline(cursor: &mut Cursor<'_>) -> ParseResult<()> {
    if cursor.is_empty() {
        return incomplete();
    }
    if cursor.peek() == Some(b'\r') {
        if cursor.remaining_len() < 2 {
            return incomplete();
        }
        cursor.advance(1);
    }
    if cursor.consume_byte(b'\n') {
        done(())
    } else {
        Err(Error::InvalidSyntax {
            position: cursor.position(),
            production: "CRLF",
            hint: "expected line terminator".to_string(),
        })
    }
}

/// Consumes exactly `n` ASCII digits and returns them as text.
pub fn parse_digits<'a>(cursor: &mut Cursor<'a>, n: usize) -> ParseResult<&'a str> {
    if cursor.remaining_len() < n {
        return incomplete();
    }
    let start = cursor.checkpoint();
    let slice = cursor.take(n).expect("length already checked");
    if slice.iter().all(u8::is_ascii_digit) {
        done(std::str::from_utf8(slice).expect("ascii digits are valid utf8"))
    } else {
        cursor.rewind(start);
        Err(Error::InvalidSyntax {
            position: start,
            production: "digits",
            hint: format!("expected {n} ASCII digits"),
        })
    }
}

/// Parses `number` (`1*DIGIT`) as a `u32`. Does not reject a leading zero;
/// callers needing `nz-number` semantics should use [`parse_nz_number`].
pub fn parse_unsigned_integer(cursor: &mut Cursor<'_>) -> ParseResult<u32> {
    let start = cursor.checkpoint();
    let digits = cursor.take_while(|b| b.is_ascii_digit());
    if digits.is_empty() {
        if cursor.is_empty() {
            return incomplete();
        }
        return Err(Error::InvalidSyntax {
            position: start,
            production: "number",
            hint: "expected at least one digit".to_string(),
        });
    }
    // A run of digits butting up against the end of available input might
    // continue once more bytes arrive.
    if cursor.is_empty() {
        cursor.rewind(start);
        return incomplete();
    }
    let text = std::str::from_utf8(digits).expect("ascii digits are valid utf8");
    text.parse().map_or_else(
        |_| {
            Err(Error::InvalidSyntax {
                position: start,
                production: "number",
                hint: "integer overflow".to_string(),
            })
        },
        done,
    )
}

/// Parses `nz-number`: a `number` that is not `0` and has no leading zero.
pub fn parse_nz_number(cursor: &mut Cursor<'_>) -> ParseResult<u32> {
    let start = cursor.checkpoint();
    match parse_unsigned_integer(cursor)? {
        ParseOutcome::Done(0) => {
            cursor.rewind(start);
            Err(Error::InvalidSyntax {
                position: start,
                production: "nz-number",
                hint: "zero is not a valid nz-number".to_string(),
            })
        }
        ParseOutcome::Done(n) => {
            let text = n.to_string();
            let consumed = cursor.position() - start;
            if text.len() != consumed {
                cursor.rewind(start);
                return Err(Error::InvalidSyntax {
                    position: start,
                    production: "nz-number",
                    hint: "leading zero is not permitted".to_string(),
                });
            }
            done(n)
        }
        ParseOutcome::Incomplete => incomplete(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok_atom(cursor: &mut Cursor<'_>) -> ParseResult<&'static str> {
        fixed_string(cursor, "OK", false).map(|o| o.map(|()| "OK"))
    }

    fn no_atom(cursor: &mut Cursor<'_>) -> ParseResult<&'static str> {
        fixed_string(cursor, "NO", false).map(|o| o.map(|()| "NO"))
    }

    #[test]
    fn one_of_returns_first_match() {
        let mut cursor = Cursor::new(b"NO");
        let result = one_of(&mut cursor, &[ok_atom, no_atom] as &[fn(&mut Cursor<'_>) -> ParseResult<&'static str>]).unwrap();
        assert_eq!(result, ParseOutcome::Done("NO"));
        assert!(cursor.is_empty());
    }

    #[test]
    fn one_of_rewinds_on_total_failure() {
        let mut cursor = Cursor::new(b"BAD");
        assert!(one_of(&mut cursor, &[ok_atom, no_atom] as &[fn(&mut Cursor<'_>) -> ParseResult<&'static str>]).is_err());
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn optional_absorbs_failure() {
        let mut cursor = Cursor::new(b"xyz");
        let result = optional(&mut cursor, ok_atom).unwrap();
        assert_eq!(result, ParseOutcome::Done(None));
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn zero_or_more_collects_until_failure() {
        let mut cursor = Cursor::new(b"aaab");
        let result = zero_or_more(&mut cursor, |c| {
            if c.consume_byte(b'a') {
                done(b'a')
            } else {
                Err(Error::InvalidSyntax {
                    position: c.position(),
                    production: "a",
                    hint: "expected a".into(),
                })
            }
        })
        .unwrap();
        assert_eq!(result, ParseOutcome::Done(vec![b'a', b'a', b'a']));
        assert_eq!(cursor.remaining(), b"b");
    }

    #[test]
    fn one_or_more_fails_with_zero_matches() {
        let mut cursor = Cursor::new(b"bbb");
        let result = one_or_more(&mut cursor, |c| {
            if c.consume_byte(b'a') {
                done(b'a')
            } else {
                Err(Error::InvalidSyntax {
                    position: c.position(),
                    production: "a",
                    hint: "expected a".into(),
                })
            }
        });
        assert!(result.is_err());
    }

    #[test]
    fn fixed_string_case_insensitive_by_default() {
        let mut cursor = Cursor::new(b"capability");
        assert_eq!(fixed_string(&mut cursor, "CAPABILITY", false).unwrap(), ParseOutcome::Done(()));
    }

    #[test]
    fn fixed_string_incomplete_on_short_prefix_match() {
        let mut cursor = Cursor::new(b"CAP");
        assert_eq!(fixed_string(&mut cursor, "CAPABILITY", false).unwrap(), ParseOutcome::Incomplete);
    }

    #[test]
    fn parse_unsigned_integer_rejects_empty() {
        let mut cursor = Cursor::new(b"abc");
        assert!(parse_unsigned_integer(&mut cursor).is_err());
    }

    #[test]
    fn nz_number_rejects_leading_zero() {
        let mut cursor = Cursor::new(b"007 ");
        assert!(parse_nz_number(&mut cursor).is_err());
    }

    #[test]
    fn nz_number_rejects_bare_zero() {
        let mut cursor = Cursor::new(b"0 ");
        assert!(parse_nz_number(&mut cursor).is_err());
    }

    #[test]
    fn newline_accepts_bare_lf() {
        let mut cursor = Cursor::new(b"\nrest");
        assert_eq!(parse_newline(&mut cursor).unwrap(), ParseOutcome::Done(()));
        assert_eq!(cursor.remaining(), b"rest");
    }
}
