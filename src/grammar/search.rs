//! `search-key`: the deep tagged union behind the SEARCH command's criteria.

use crate::buffer::Cursor;
use crate::error::Error;
use crate::outcome::{done, ParseOutcome, ParseResult};
use crate::tracker::StackTracker;

use super::combinators::{one_of, parse_space, parse_unsigned_integer};
use super::datetime::{date, Date};
use super::primitives::astring_inline;
use super::sequence::sequence_set;

use crate::types::SequenceSet;

/// One SEARCH criterion. `And` is implicit in the grammar (space-separated
/// keys at the top level); this tagged union models every named key plus
/// the explicit combinators (`OR`, `NOT`, a parenthesized list).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchKey {
    All,
    Answered,
    Bcc(String),
    Before(Date),
    Body(String),
    Cc(String),
    Deleted,
    Draft,
    Flagged,
    From(String),
    Header(String, String),
    Keyword(String),
    Larger(u32),
    New,
    Not(Box<SearchKey>),
    Old,
    On(Date),
    Or(Box<SearchKey>, Box<SearchKey>),
    Recent,
    Seen,
    SentBefore(Date),
    SentOn(Date),
    SentSince(Date),
    Since(Date),
    SequenceSet(SequenceSet),
    Smaller(u32),
    Subject(String),
    Text(String),
    To(String),
    Uid(SequenceSet),
    Unanswered,
    Undeleted,
    Undraft,
    Unflagged,
    Unkeyword(String),
    Unseen,
    Older(u32),
    Younger(u32),
    /// A parenthesized list of keys, ANDed together.
    And(Vec<SearchKey>),
    /// An unrecognized extension keyword, preserved with its raw value text.
    Filter(String),
}

impl SearchKey {
    /// `true` if this key (or one of its nested keys) is `KEYWORD`,
    /// `UNKEYWORD`, or any of the named flag keywords — used by the
    /// pipelining classifier to decide whether a SEARCH command reads
    /// flag state.
    #[must_use]
    pub fn references_flags(&self) -> bool {
        match self {
            Self::Answered
            | Self::Deleted
            | Self::Draft
            | Self::Flagged
            | Self::Keyword(_)
            | Self::Recent
            | Self::Seen
            | Self::Unanswered
            | Self::Undeleted
            | Self::Undraft
            | Self::Unflagged
            | Self::Unkeyword(_)
            | Self::Unseen
            | Self::New
            | Self::Old => true,
            Self::Not(inner) => inner.references_flags(),
            Self::Or(a, b) => a.references_flags() || b.references_flags(),
            Self::And(keys) => keys.iter().any(Self::references_flags),
            _ => false,
        }
    }

    /// `true` if this key (or one of its nested keys) references an
    /// explicit UID set (`UID <sequence-set>`).
    #[must_use]
    pub fn references_uids(&self) -> bool {
        match self {
            Self::Uid(_) => true,
            Self::Not(inner) => inner.references_uids(),
            Self::Or(a, b) => a.references_uids() || b.references_uids(),
            Self::And(keys) => keys.iter().any(Self::references_uids),
            _ => false,
        }
    }

    /// `true` if this key (or one of its nested keys) references an
    /// explicit sequence-number set (a bare `<sequence-set>` key).
    #[must_use]
    pub fn references_sequence_numbers(&self) -> bool {
        match self {
            Self::SequenceSet(_) => true,
            Self::Not(inner) => inner.references_sequence_numbers(),
            Self::Or(a, b) => a.references_sequence_numbers() || b.references_sequence_numbers(),
            Self::And(keys) => keys.iter().any(Self::references_sequence_numbers),
            _ => false,
        }
    }
}

/// Parses a space-separated sequence of search keys (implicit AND at the
/// top level), bounding nesting depth via `tracker`.
pub fn search_key(cursor: &mut Cursor<'_>, tracker: &StackTracker) -> ParseResult<SearchKey> {
    let _guard = tracker.enter()?;
    let alternatives: &[fn(&mut Cursor<'_>) -> ParseResult<SearchKey>] = &[
        parenthesized_and,
        or_key,
        not_key,
        astring_arg_key,
        date_arg_key,
        number_arg_key,
        header_key,
        bare_keyword,
        sequence_set_key,
    ];
    one_of(cursor, alternatives)
}

fn parenthesized_and(cursor: &mut Cursor<'_>) -> ParseResult<SearchKey> {
    let start = cursor.checkpoint();
    if cursor.is_empty() {
        return crate::outcome::incomplete();
    }
    if !cursor.consume_byte(b'(') {
        return Err(Error::InvalidSyntax { position: start, production: "search-key", hint: "expected '('".into() });
    }
    let tracker = StackTracker::new(32);
    let mut keys = Vec::new();
    loop {
        match search_key(cursor, &tracker)? {
            ParseOutcome::Done(k) => keys.push(k),
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
        return Err(Error::InvalidSyntax { position: start, production: "search-key", hint: "expected SP or ')'".into() });
    }
    done(SearchKey::And(keys))
}

fn or_key(cursor: &mut Cursor<'_>) -> ParseResult<SearchKey> {
    let start = cursor.checkpoint();
    match super::combinators::fixed_string(cursor, "OR", false)? {
        ParseOutcome::Done(()) => {}
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            return crate::outcome::incomplete();
        }
    }
    let tracker = StackTracker::new(32);
    require_space(cursor, start)?;
    let left = require_key(cursor, &tracker, start)?;
    require_space(cursor, start)?;
    let right = require_key(cursor, &tracker, start)?;
    done(SearchKey::Or(Box::new(left), Box::new(right)))
}

fn not_key(cursor: &mut Cursor<'_>) -> ParseResult<SearchKey> {
    let start = cursor.checkpoint();
    match super::combinators::fixed_string(cursor, "NOT", false)? {
        ParseOutcome::Done(()) => {}
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            return crate::outcome::incomplete();
        }
    }
    let tracker = StackTracker::new(32);
    require_space(cursor, start)?;
    let inner = require_key(cursor, &tracker, start)?;
    done(SearchKey::Not(Box::new(inner)))
}

fn require_space(cursor: &mut Cursor<'_>, start: usize) -> Result<(), Error> {
    match parse_space(cursor) {
        Ok(ParseOutcome::Done(())) => Ok(()),
        Ok(ParseOutcome::Incomplete) => {
            cursor.rewind(start);
            Err(Error::InvalidSyntax { position: start, production: "search-key", hint: "incomplete".into() })
        }
        Err(e) => {
            cursor.rewind(start);
            Err(e)
        }
    }
}

fn require_key(cursor: &mut Cursor<'_>, tracker: &StackTracker, start: usize) -> Result<SearchKey, Error> {
    match search_key(cursor, tracker) {
        Ok(ParseOutcome::Done(k)) => Ok(k),
        Ok(ParseOutcome::Incomplete) => {
            cursor.rewind(start);
            Err(Error::InvalidSyntax { position: start, production: "search-key", hint: "incomplete".into() })
        }
        Err(e) => {
            cursor.rewind(start);
            Err(e)
        }
    }
}

macro_rules! keyword_with_astring {
    ($name:ident, $kw:literal, $variant:ident) => {
        fn $name(cursor: &mut Cursor<'_>) -> ParseResult<SearchKey> {
            let start = cursor.checkpoint();
            match super::combinators::fixed_string(cursor, $kw, false)? {
                ParseOutcome::Done(()) => {}
                ParseOutcome::Incomplete => {
                    cursor.rewind(start);
                    return crate::outcome::incomplete();
                }
            }
            require_space(cursor, start)?;
            match astring_inline(cursor)? {
                ParseOutcome::Done(v) => done(SearchKey::$variant(v)),
                ParseOutcome::Incomplete => {
                    cursor.rewind(start);
                    crate::outcome::incomplete()
                }
            }
        }
    };
}

keyword_with_astring!(bcc_key, "BCC", Bcc);
keyword_with_astring!(body_key, "BODY", Body);
keyword_with_astring!(cc_key, "CC", Cc);
keyword_with_astring!(from_key, "FROM", From);
keyword_with_astring!(keyword_key, "KEYWORD", Keyword);
keyword_with_astring!(subject_key, "SUBJECT", Subject);
keyword_with_astring!(text_key, "TEXT", Text);
keyword_with_astring!(to_key, "TO", To);
keyword_with_astring!(unkeyword_key, "UNKEYWORD", Unkeyword);

fn astring_arg_key(cursor: &mut Cursor<'_>) -> ParseResult<SearchKey> {
    let alternatives: &[fn(&mut Cursor<'_>) -> ParseResult<SearchKey>] =
        &[bcc_key, body_key, cc_key, from_key, keyword_key, subject_key, text_key, to_key, unkeyword_key];
    one_of(cursor, alternatives)
}

macro_rules! keyword_with_date {
    ($name:ident, $kw:literal, $variant:ident) => {
        fn $name(cursor: &mut Cursor<'_>) -> ParseResult<SearchKey> {
            let start = cursor.checkpoint();
            match super::combinators::fixed_string(cursor, $kw, false)? {
                ParseOutcome::Done(()) => {}
                ParseOutcome::Incomplete => {
                    cursor.rewind(start);
                    return crate::outcome::incomplete();
                }
            }
            require_space(cursor, start)?;
            match date(cursor)? {
                ParseOutcome::Done(v) => done(SearchKey::$variant(v)),
                ParseOutcome::Incomplete => {
                    cursor.rewind(start);
                    crate::outcome::incomplete()
                }
            }
        }
    };
}

keyword_with_date!(before_key, "BEFORE", Before);
keyword_with_date!(on_key, "ON", On);
keyword_with_date!(sentbefore_key, "SENTBEFORE", SentBefore);
keyword_with_date!(senton_key, "SENTON", SentOn);
keyword_with_date!(sentsince_key, "SENTSINCE", SentSince);
keyword_with_date!(since_key, "SINCE", Since);

fn date_arg_key(cursor: &mut Cursor<'_>) -> ParseResult<SearchKey> {
    // Longer keywords first: SENTBEFORE/SENTON/SENTSINCE share the `SEN`
    // prefix with nothing else here, but BEFORE must be tried before a
    // hypothetical bare `B`-prefixed key is ever added, so the ordering
    // convention is kept uniform across all `keyword_with_*` groups.
    let alternatives: &[fn(&mut Cursor<'_>) -> ParseResult<SearchKey>] =
        &[sentbefore_key, sentsince_key, senton_key, before_key, since_key, on_key];
    one_of(cursor, alternatives)
}

macro_rules! keyword_with_number {
    ($name:ident, $kw:literal, $variant:ident) => {
        fn $name(cursor: &mut Cursor<'_>) -> ParseResult<SearchKey> {
            let start = cursor.checkpoint();
            match super::combinators::fixed_string(cursor, $kw, false)? {
                ParseOutcome::Done(()) => {}
                ParseOutcome::Incomplete => {
                    cursor.rewind(start);
                    return crate::outcome::incomplete();
                }
            }
            require_space(cursor, start)?;
            match parse_unsigned_integer(cursor)? {
                ParseOutcome::Done(v) => done(SearchKey::$variant(v)),
                ParseOutcome::Incomplete => {
                    cursor.rewind(start);
                    crate::outcome::incomplete()
                }
            }
        }
    };
}

keyword_with_number!(larger_key, "LARGER", Larger);
keyword_with_number!(smaller_key, "SMALLER", Smaller);
keyword_with_number!(older_key, "OLDER", Older);
keyword_with_number!(younger_key, "YOUNGER", Younger);

fn number_arg_key(cursor: &mut Cursor<'_>) -> ParseResult<SearchKey> {
    let alternatives: &[fn(&mut Cursor<'_>) -> ParseResult<SearchKey>] =
        &[larger_key, smaller_key, older_key, younger_key];
    one_of(cursor, alternatives)
}

fn header_key(cursor: &mut Cursor<'_>) -> ParseResult<SearchKey> {
    let start = cursor.checkpoint();
    match super::combinators::fixed_string(cursor, "HEADER", false)? {
        ParseOutcome::Done(()) => {}
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            return crate::outcome::incomplete();
        }
    }
    require_space(cursor, start)?;
    let field_name = match astring_inline(cursor)? {
        ParseOutcome::Done(v) => v,
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            return crate::outcome::incomplete();
        }
    };
    require_space(cursor, start)?;
    match astring_inline(cursor)? {
        ParseOutcome::Done(v) => done(SearchKey::Header(field_name, v)),
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            crate::outcome::incomplete()
        }
    }
}

fn bare_keyword(cursor: &mut Cursor<'_>) -> ParseResult<SearchKey> {
    let start = cursor.checkpoint();
    match super::primitives::atom(cursor)? {
        ParseOutcome::Done(text) => {
            let key = match text.to_ascii_uppercase().as_str() {
                "ALL" => SearchKey::All,
                "ANSWERED" => SearchKey::Answered,
                "DELETED" => SearchKey::Deleted,
                "DRAFT" => SearchKey::Draft,
                "FLAGGED" => SearchKey::Flagged,
                "NEW" => SearchKey::New,
                "OLD" => SearchKey::Old,
                "RECENT" => SearchKey::Recent,
                "SEEN" => SearchKey::Seen,
                "UNANSWERED" => SearchKey::Unanswered,
                "UNDELETED" => SearchKey::Undeleted,
                "UNDRAFT" => SearchKey::Undraft,
                "UNFLAGGED" => SearchKey::Unflagged,
                "UNSEEN" => SearchKey::Unseen,
                "UID" => {
                    require_space(cursor, start)?;
                    return match sequence_set(cursor)? {
                        ParseOutcome::Done(set) => done(SearchKey::Uid(set)),
                        ParseOutcome::Incomplete => {
                            cursor.rewind(start);
                            crate::outcome::incomplete()
                        }
                    };
                }
                _ => SearchKey::Filter(text.to_string()),
            };
            done(key)
        }
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            crate::outcome::incomplete()
        }
    }
}

fn sequence_set_key(cursor: &mut Cursor<'_>) -> ParseResult<SearchKey> {
    sequence_set(cursor).map(|o| o.map(SearchKey::SequenceSet))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> StackTracker {
        StackTracker::new(32)
    }

    #[test]
    fn simple_flag_keywords() {
        let mut cursor = Cursor::new(b"UNSEEN");
        assert_eq!(search_key(&mut cursor, &tracker()).unwrap().done().unwrap(), SearchKey::Unseen);
    }

    #[test]
    fn from_key_with_astring() {
        let mut cursor = Cursor::new(b"FROM alice@example.com");
        let key = search_key(&mut cursor, &tracker()).unwrap().done().unwrap();
        assert_eq!(key, SearchKey::From("alice@example.com".into()));
    }

    #[test]
    fn or_combinator() {
        let mut cursor = Cursor::new(b"OR SEEN ANSWERED");
        let key = search_key(&mut cursor, &tracker()).unwrap().done().unwrap();
        assert_eq!(key, SearchKey::Or(Box::new(SearchKey::Seen), Box::new(SearchKey::Answered)));
    }

    #[test]
    fn not_combinator() {
        let mut cursor = Cursor::new(b"NOT DELETED");
        let key = search_key(&mut cursor, &tracker()).unwrap().done().unwrap();
        assert_eq!(key, SearchKey::Not(Box::new(SearchKey::Deleted)));
    }

    #[test]
    fn parenthesized_and_list() {
        let mut cursor = Cursor::new(b"(SEEN ANSWERED)");
        let key = search_key(&mut cursor, &tracker()).unwrap().done().unwrap();
        assert_eq!(key, SearchKey::And(vec![SearchKey::Seen, SearchKey::Answered]));
    }

    #[test]
    fn sequence_set_falls_through() {
        let mut cursor = Cursor::new(b"1:5");
        let key = search_key(&mut cursor, &tracker()).unwrap().done().unwrap();
        assert_eq!(key, SearchKey::SequenceSet(SequenceSet::range(1, 5).unwrap()));
    }

    #[test]
    fn unknown_keyword_falls_through_to_filter() {
        let mut cursor = Cursor::new(b"X-CUSTOM");
        let key = search_key(&mut cursor, &tracker()).unwrap().done().unwrap();
        assert_eq!(key, SearchKey::Filter("X-CUSTOM".into()));
    }

    #[test]
    fn references_flags_sees_through_nesting() {
        let key = SearchKey::Or(Box::new(SearchKey::Seen), Box::new(SearchKey::From("a".into())));
        assert!(key.references_flags());
        assert!(!SearchKey::From("a".into()).references_flags());
    }

    #[test]
    fn references_uids_and_sequence_numbers_are_distinct() {
        let one = crate::types::SeqNum::new(1).expect("1 is non-zero");

        let uid_key = SearchKey::Uid(SequenceSet::single(one));
        assert!(uid_key.references_uids());
        assert!(!uid_key.references_sequence_numbers());

        let seq_key = SearchKey::SequenceSet(SequenceSet::single(one));
        assert!(seq_key.references_sequence_numbers());
        assert!(!seq_key.references_uids());
    }
}
