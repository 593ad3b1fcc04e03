//! `body` structure (BODY/BODYSTRUCTURE FETCH attribute values).
//!
//! The full body-structure grammar is a deeply nested, extension-laden
//! tree (basic/text/message bodies, multipart bodies, optional extension
//! data for each). This parser treats the balanced-parenthesis contents
//! as an opaque structural tree of fields rather than prescribing a fixed
//! object graph for every leaf shape; callers needing typed access to a
//! particular field walk [`BodyStructure::Leaf`]/[`BodyStructure::Multipart`]
//! themselves.

use crate::buffer::Cursor;
use crate::error::Error;
use crate::outcome::{done, ParseOutcome, ParseResult};
use crate::tracker::StackTracker;

use super::primitives::{astring_inline, nstring_inline};

/// One field of a body-structure list: either a nested parenthesized
/// sub-structure, or a leaf value carried verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyStructure {
    /// A `NIL` field.
    Nil,
    /// A quoted-string or atom field, decoded to text.
    Text(String),
    /// A `number` field.
    Number(u32),
    /// A parenthesized sub-list (nested structure or extension data).
    List(Vec<BodyStructure>),
}

/// Parses one body-structure value: a parenthesized list whose elements
/// are themselves body-structure values, recursively, bounded by `tracker`.
pub fn body_structure(cursor: &mut Cursor<'_>, tracker: &StackTracker) -> ParseResult<BodyStructure> {
    let _guard = tracker.enter()?;
    let start = cursor.checkpoint();
    if cursor.is_empty() {
        return crate::outcome::incomplete();
    }
    if cursor.peek() == Some(b'(') {
        cursor.advance(1);
        let mut items = Vec::new();
        loop {
            if cursor.peek() == Some(b')') {
                cursor.advance(1);
                break;
            }
            match body_structure(cursor, tracker)? {
                ParseOutcome::Done(item) => items.push(item),
                ParseOutcome::Incomplete => {
                    cursor.rewind(start);
                    return crate::outcome::incomplete();
                }
            }
            if cursor.peek() == Some(b' ') {
                cursor.advance(1);
            }
        }
        return done(BodyStructure::List(items));
    }
    if cursor.peek() == Some(b'"') {
        return match nstring_inline(cursor)? {
            ParseOutcome::Done(None) => done(BodyStructure::Nil),
            ParseOutcome::Done(Some(text)) => done(BodyStructure::Text(text)),
            ParseOutcome::Incomplete => {
                cursor.rewind(start);
                crate::outcome::incomplete()
            }
        };
    }
    // A bare atom: either `NIL`, a pure-digit `number` field, or free-form
    // text (encoding, subtype, body-fld-id, etc). All three share the same
    // atom lexical class, so the distinction is made after the fact.
    match astring_inline(cursor)? {
        ParseOutcome::Done(text) => {
            if text.eq_ignore_ascii_case("NIL") {
                done(BodyStructure::Nil)
            } else if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
                text.parse().map_or_else(
                    |_| done(BodyStructure::Text(text)),
                    |n| done(BodyStructure::Number(n)),
                )
            } else {
                done(BodyStructure::Text(text))
            }
        }
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            crate::outcome::incomplete()
        }
    }
}

impl BodyStructure {
    /// Borrows the element list if this value is a [`Self::List`].
    #[must_use]
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// `true` if this list's first element is the literal text `"MIXED"`,
    /// `"ALTERNATIVE"`, etc. — the convention multipart bodies use to mark
    /// themselves (a multipart body is a list of sub-body lists followed
    /// by a subtype string, rather than a basic-body's fixed field order).
    #[must_use]
    pub fn looks_like_multipart(&self) -> bool {
        matches!(self, Self::List(items) if items.first().is_some_and(|f| matches!(f, Self::List(_))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_text_body() {
        let mut cursor = Cursor::new(br#"("TEXT" "PLAIN" NIL NIL NIL "7BIT" 1152 23)"#);
        let tracker = StackTracker::new(64);
        let structure = body_structure(&mut cursor, &tracker).unwrap().done().unwrap();
        let fields = structure.as_list().unwrap();
        assert_eq!(fields[0], BodyStructure::Text("TEXT".into()));
        assert_eq!(fields[3], BodyStructure::Nil);
        assert_eq!(fields[6], BodyStructure::Number(1152));
    }

    #[test]
    fn nested_multipart_body() {
        let mut cursor = Cursor::new(br#"((("TEXT" "PLAIN" NIL NIL NIL "7BIT" 10 1)) "MIXED")"#);
        let tracker = StackTracker::new(64);
        let structure = body_structure(&mut cursor, &tracker).unwrap().done().unwrap();
        assert!(structure.looks_like_multipart());
    }

    #[test]
    fn respects_recursion_bound() {
        let mut cursor = Cursor::new(b"((((NIL))))");
        let tracker = StackTracker::new(2);
        assert!(body_structure(&mut cursor, &tracker).is_err());
    }
}
