//! `section` specifications for `BODY[...]` and `BINARY[...]` FETCH items.

use std::fmt;

use crate::buffer::Cursor;
use crate::error::Error;
use crate::outcome::{done, ParseOutcome, ParseResult};

use super::combinators::{one_of, parse_space, parse_unsigned_integer};
use super::primitives::atom;

/// A MIME part path: `1`, `1.2`, `1.2.3`, ...
pub type PartPath = Vec<u32>;

/// A parsed `section-spec`, naming which part of a message `BODY[...]`
/// (or `BINARY[...]`) refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Section {
    /// The entire message (`BODY[]`).
    Full,
    /// A MIME sub-part's entire body, by path (`BODY[1.2]`).
    Part(PartPath),
    /// `HEADER`, optionally scoped to a sub-part.
    Header(PartPath),
    /// `HEADER.FIELDS (names...)`, optionally scoped to a sub-part.
    HeaderFields(PartPath, Vec<String>),
    /// `HEADER.FIELDS.NOT (names...)`, optionally scoped to a sub-part.
    HeaderFieldsNot(PartPath, Vec<String>),
    /// `TEXT`, optionally scoped to a sub-part.
    Text(PartPath),
    /// `MIME`, always scoped to a sub-part (top-level MIME is meaningless).
    Mime(PartPath),
}

fn write_path(f: &mut fmt::Formatter<'_>, path: &[u32]) -> fmt::Result {
    for (i, part) in path.iter().enumerate() {
        if i > 0 {
            write!(f, ".")?;
        }
        write!(f, "{part}")?;
    }
    Ok(())
}

fn write_path_prefix(f: &mut fmt::Formatter<'_>, path: &[u32]) -> fmt::Result {
    if !path.is_empty() {
        write_path(f, path)?;
        write!(f, ".")?;
    }
    Ok(())
}

fn write_names(f: &mut fmt::Formatter<'_>, names: &[String]) -> fmt::Result {
    write!(f, " (")?;
    for (i, name) in names.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{name}")?;
    }
    write!(f, ")")
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => Ok(()),
            Self::Part(path) => write_path(f, path),
            Self::Header(path) => {
                write_path_prefix(f, path)?;
                write!(f, "HEADER")
            }
            Self::HeaderFields(path, names) => {
                write_path_prefix(f, path)?;
                write!(f, "HEADER.FIELDS")?;
                write_names(f, names)
            }
            Self::HeaderFieldsNot(path, names) => {
                write_path_prefix(f, path)?;
                write!(f, "HEADER.FIELDS.NOT")?;
                write_names(f, names)
            }
            Self::Text(path) => {
                write_path_prefix(f, path)?;
                write!(f, "TEXT")
            }
            Self::Mime(path) => {
                write_path_prefix(f, path)?;
                write!(f, "MIME")
            }
        }
    }
}

/// Parses `"[" [section-spec] "]"`, the full bracketed form seen after
/// `BODY`/`BODY.PEEK`/`BINARY`.
pub fn section_spec(cursor: &mut Cursor<'_>) -> ParseResult<Section> {
    let start = cursor.checkpoint();
    if cursor.is_empty() {
        return crate::outcome::incomplete();
    }
    if !cursor.consume_byte(b'[') {
        return Err(Error::InvalidSyntax {
            position: start,
            production: "section",
            hint: "expected '['".to_string(),
        });
    }
    if cursor.peek() == Some(b']') {
        cursor.advance(1);
        return done(Section::Full);
    }
    let path = match part_path(cursor)? {
        ParseOutcome::Done(p) => p,
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            return crate::outcome::incomplete();
        }
    };
    let section = if cursor.peek() == Some(b']') {
        if path.is_empty() {
            Section::Full
        } else {
            Section::Part(path)
        }
    } else {
        match text_keyword(cursor, &path)? {
            ParseOutcome::Done(s) => s,
            ParseOutcome::Incomplete => {
                cursor.rewind(start);
                return crate::outcome::incomplete();
            }
        }
    };
    if !cursor.consume_byte(b']') {
        cursor.rewind(start);
        return Err(Error::InvalidSyntax {
            position: start,
            production: "section",
            hint: "expected ']'".to_string(),
        });
    }
    done(section)
}

/// Parses a leading `nz-number ("." nz-number)*` path, stopping (without
/// consuming) at a `.HEADER`/`.TEXT`/`.MIME` suffix or `]`.
fn part_path(cursor: &mut Cursor<'_>) -> ParseResult<PartPath> {
    let mut path = Vec::new();
    loop {
        let before = cursor.checkpoint();
        if !cursor.peek().is_some_and(|b| b.is_ascii_digit()) {
            break;
        }
        match parse_unsigned_integer(cursor)? {
            ParseOutcome::Done(n) => path.push(n),
            ParseOutcome::Incomplete => return crate::outcome::incomplete(),
        }
        if cursor.peek() == Some(b'.') && cursor.peek_at(1).is_some_and(|b| b.is_ascii_digit()) {
            cursor.advance(1);
            continue;
        }
        let _ = before;
        break;
    }
    done(path)
}

fn text_keyword(cursor: &mut Cursor<'_>, path: &[u32]) -> ParseResult<Section> {
    let start = cursor.checkpoint();
    if !path.is_empty() {
        if !cursor.consume_byte(b'.') {
            cursor.rewind(start);
            return Err(Error::InvalidSyntax {
                position: start,
                production: "section",
                hint: "expected '.' before part keyword".to_string(),
            });
        }
    }
    let alternatives: &[fn(&mut Cursor<'_>) -> ParseResult<Kind>] =
        &[header_fields_not, header_fields, header_keyword, text_keyword_atom, mime_keyword];
    one_of(cursor, alternatives).map(|o| o.map(|kind| apply_keyword(kind, path.to_vec())))
}

enum Kind {
    Header,
    HeaderFields(Vec<String>),
    HeaderFieldsNot(Vec<String>),
    Text,
    Mime,
}

fn apply_keyword(kind: Kind, path: PartPath) -> Section {
    match kind {
        Kind::Header => Section::Header(path),
        Kind::HeaderFields(names) => Section::HeaderFields(path, names),
        Kind::HeaderFieldsNot(names) => Section::HeaderFieldsNot(path, names),
        Kind::Text => Section::Text(path),
        Kind::Mime => Section::Mime(path),
    }
}

fn header_fields_not(cursor: &mut Cursor<'_>) -> ParseResult<Kind> {
    composite_keyword(cursor, "HEADER.FIELDS.NOT", true).map(|o| o.map(Kind::HeaderFieldsNot))
}

fn header_fields(cursor: &mut Cursor<'_>) -> ParseResult<Kind> {
    composite_keyword(cursor, "HEADER.FIELDS", true).map(|o| o.map(Kind::HeaderFields))
}

fn composite_keyword(cursor: &mut Cursor<'_>, keyword: &str, with_names: bool) -> ParseResult<Vec<String>> {
    let start = cursor.checkpoint();
    match super::combinators::fixed_string(cursor, keyword, false)? {
        ParseOutcome::Done(()) => {}
        ParseOutcome::Incomplete => {
            cursor.rewind(start);
            return crate::outcome::incomplete();
        }
    }
    if !with_names {
        return done(Vec::new());
    }
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
            production: "header-list",
            hint: "expected '('".to_string(),
        });
    }
    let mut names = Vec::new();
    loop {
        match atom(cursor)? {
            ParseOutcome::Done(name) => names.push(name.to_string()),
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
            production: "header-list",
            hint: "expected SP or ')'".to_string(),
        });
    }
    done(names)
}

fn header_keyword(cursor: &mut Cursor<'_>) -> ParseResult<Kind> {
    super::combinators::fixed_string(cursor, "HEADER", false).map(|o| o.map(|()| Kind::Header))
}

fn text_keyword_atom(cursor: &mut Cursor<'_>) -> ParseResult<Kind> {
    super::combinators::fixed_string(cursor, "TEXT", false).map(|o| o.map(|()| Kind::Text))
}

fn mime_keyword(cursor: &mut Cursor<'_>) -> ParseResult<Kind> {
    super::combinators::fixed_string(cursor, "MIME", false).map(|o| o.map(|()| Kind::Mime))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_section_is_full_message() {
        let mut cursor = Cursor::new(b"[]");
        assert_eq!(section_spec(&mut cursor).unwrap().done().unwrap(), Section::Full);
    }

    #[test]
    fn numbered_part() {
        let mut cursor = Cursor::new(b"[1.2]");
        assert_eq!(section_spec(&mut cursor).unwrap().done().unwrap(), Section::Part(vec![1, 2]));
    }

    #[test]
    fn header_fields_not_before_header_fields() {
        let mut cursor = Cursor::new(b"[5.2.HEADER.FIELDS.NOT (TO FROM)]");
        let section = section_spec(&mut cursor).unwrap().done().unwrap();
        assert_eq!(section, Section::HeaderFieldsNot(vec![5, 2], vec!["TO".into(), "FROM".into()]));
    }

    #[test]
    fn bare_text() {
        let mut cursor = Cursor::new(b"[TEXT]");
        assert_eq!(section_spec(&mut cursor).unwrap().done().unwrap(), Section::Text(vec![]));
    }

    #[test]
    fn part_scoped_mime() {
        let mut cursor = Cursor::new(b"[2.MIME]");
        assert_eq!(section_spec(&mut cursor).unwrap().done().unwrap(), Section::Mime(vec![2]));
    }

    #[test]
    fn display_round_trips_header_fields_not() {
        let section = Section::HeaderFieldsNot(vec![5, 2], vec!["TO".into(), "FROM".into()]);
        assert_eq!(section.to_string(), "5.2.HEADER.FIELDS.NOT (TO FROM)");
    }

    #[test]
    fn display_full_is_empty() {
        assert_eq!(Section::Full.to_string(), "");
    }
}
