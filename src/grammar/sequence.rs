//! `sequence-set` and the structurally identical UID-set grammar.

use crate::buffer::Cursor;
use crate::error::Error;
use crate::outcome::{done, ParseOutcome, ParseResult};
use crate::types::{SeqNum, SequenceSet, Uid, UidSet};

use super::combinators::parse_nz_number;

/// Parses a `sequence-set`: `seq-range *("," seq-range)`.
pub fn sequence_set(cursor: &mut Cursor<'_>) -> ParseResult<SequenceSet> {
    let start = cursor.checkpoint();
    let mut items = Vec::new();
    loop {
        match sequence_range(cursor)? {
            ParseOutcome::Done(item) => items.push(item),
            ParseOutcome::Incomplete => {
                cursor.rewind(start);
                return crate::outcome::incomplete();
            }
        }
        if cursor.peek() == Some(b',') {
            if cursor.remaining_len() < 2 {
                cursor.rewind(start);
                return crate::outcome::incomplete();
            }
            cursor.advance(1);
            continue;
        }
        break;
    }
    done(if items.len() == 1 {
        items.into_iter().next().expect("checked len == 1")
    } else {
        SequenceSet::Set(items)
    })
}

fn sequence_range(cursor: &mut Cursor<'_>) -> ParseResult<SequenceSet> {
    let start = cursor.checkpoint();
    let lower = if cursor.peek() == Some(b'*') {
        cursor.advance(1);
        None
    } else {
        match parse_nz_number(cursor)? {
            ParseOutcome::Done(n) => {
                let Some(value) = SeqNum::new(n) else {
                    cursor.rewind(start);
                    return Err(Error::InvalidSyntax {
                        position: start,
                        production: "seq-number",
                        hint: "number must be non-zero".to_string(),
                    });
                };
                Some(value)
            }
            ParseOutcome::Incomplete => {
                cursor.rewind(start);
                return crate::outcome::incomplete();
            }
        }
    };
    if cursor.peek() != Some(b':') {
        return done(match lower {
            None => SequenceSet::All,
            Some(v) => SequenceSet::Single(v),
        });
    }
    if cursor.remaining_len() < 2 {
        cursor.rewind(start);
        return crate::outcome::incomplete();
    }
    cursor.advance(1);
    if cursor.peek() == Some(b'*') {
        cursor.advance(1);
        return done(match lower {
            None => SequenceSet::All,
            Some(v) => SequenceSet::RangeFrom(v),
        });
    }
    match parse_nz_number(cursor)? {
        ParseOutcome::Done(n) => {
            let Some(upper) = SeqNum::new(n) else {
                cursor.rewind(start);
                return Err(Error::InvalidSyntax {
                    position: start,
                    production: "seq-number",
                    hint: "number must be non-zero".to_string(),
                });
            };
            done(match lower {
                None => SequenceSet::RangeFrom(upper),
                Some(lower) => SequenceSet::Range(lower, upper),
            })
        }
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            crate::outcome::incomplete()
        }
    }
}

/// Parses the wire-identical grammar used by `uid-set`.
pub fn uid_set(cursor: &mut Cursor<'_>) -> ParseResult<UidSet> {
    let start = cursor.checkpoint();
    let mut items = Vec::new();
    loop {
        match uid_range(cursor)? {
            ParseOutcome::Done(item) => items.push(item),
            ParseOutcome::Incomplete => {
                cursor.rewind(start);
                return crate::outcome::incomplete();
            }
        }
        if cursor.peek() == Some(b',') {
            if cursor.remaining_len() < 2 {
                cursor.rewind(start);
                return crate::outcome::incomplete();
            }
            cursor.advance(1);
            continue;
        }
        break;
    }
    done(if items.len() == 1 {
        items.into_iter().next().expect("checked len == 1")
    } else {
        UidSet::Set(items)
    })
}

fn uid_range(cursor: &mut Cursor<'_>) -> ParseResult<UidSet> {
    let start = cursor.checkpoint();
    let lower = if cursor.peek() == Some(b'*') {
        cursor.advance(1);
        None
    } else {
        match parse_nz_number(cursor)? {
            ParseOutcome::Done(n) => {
                let Some(value) = Uid::new(n) else {
                    cursor.rewind(start);
                    return Err(Error::InvalidSyntax {
                        position: start,
                        production: "uniqueid",
                        hint: "number must be non-zero".to_string(),
                    });
                };
                Some(value)
            }
            ParseOutcome::Incomplete => {
                cursor.rewind(start);
                return crate::outcome::incomplete();
            }
        }
    };
    if cursor.peek() != Some(b':') {
        return done(match lower {
            None => UidSet::All,
            Some(v) => UidSet::Single(v),
        });
    }
    if cursor.remaining_len() < 2 {
        cursor.rewind(start);
        return crate::outcome::incomplete();
    }
    cursor.advance(1);
    if cursor.peek() == Some(b'*') {
        cursor.advance(1);
        return done(match lower {
            None => UidSet::All,
            Some(v) => UidSet::RangeFrom(v),
        });
    }
    match parse_nz_number(cursor)? {
        ParseOutcome::Done(n) => {
            let Some(upper) = Uid::new(n) else {
                cursor.rewind(start);
                return Err(Error::InvalidSyntax {
                    position: start,
                    production: "uniqueid",
                    hint: "number must be non-zero".to_string(),
                });
            };
            done(match lower {
                None => UidSet::RangeFrom(upper),
                Some(lower) => UidSet::Range(lower, upper),
            })
        }
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
    fn single_sequence_number() {
        let mut cursor = Cursor::new(b"42");
        let result = sequence_set(&mut cursor).unwrap().done().unwrap();
        assert_eq!(result, SequenceSet::single(SeqNum::new(42).unwrap()));
    }

    #[test]
    fn inclusive_range() {
        let mut cursor = Cursor::new(b"1:10");
        let result = sequence_set(&mut cursor).unwrap().done().unwrap();
        assert_eq!(result, SequenceSet::range(1, 10).unwrap());
    }

    #[test]
    fn open_ended_range() {
        let mut cursor = Cursor::new(b"5:*");
        let result = sequence_set(&mut cursor).unwrap().done().unwrap();
        assert_eq!(result, SequenceSet::RangeFrom(SeqNum::new(5).unwrap()));
    }

    #[test]
    fn comma_separated_union() {
        let mut cursor = Cursor::new(b"1,3:5,9");
        let result = sequence_set(&mut cursor).unwrap().done().unwrap();
        assert_eq!(result.to_string(), "1,3:5,9");
    }

    #[test]
    fn star_alone_is_all() {
        let mut cursor = Cursor::new(b"*");
        let result = sequence_set(&mut cursor).unwrap().done().unwrap();
        assert_eq!(result, SequenceSet::All);
    }

    #[test]
    fn uid_set_parses_same_grammar() {
        let mut cursor = Cursor::new(b"100:200");
        let result = uid_set(&mut cursor).unwrap().done().unwrap();
        assert_eq!(result.to_string(), "100:200");
    }

    #[test]
    fn trailing_comma_is_incomplete() {
        let mut cursor = Cursor::new(b"1,");
        assert_eq!(sequence_set(&mut cursor).unwrap(), ParseOutcome::Incomplete);
    }
}
