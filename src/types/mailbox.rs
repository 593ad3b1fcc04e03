//! Mailbox names and LIST/STATUS response data.
//!
//! Mailbox names are case-preserving except for the reserved name `INBOX`,
//! which case-folds on the wire. Modified UTF-7 decoding of the name bytes
//! is an external collaborator's concern (see the crate-level docs); this
//! module treats mailbox names as opaque byte-strings that happen to be
//! valid UTF-8 astrings.

use std::fmt;

/// A mailbox name, case-folded to `INBOX` on construction if it matches
/// case-insensitively, and left byte-for-byte otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Mailbox(String);

impl Mailbox {
    /// Wraps a name, case-folding `INBOX` per RFC 3501 §5.1.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        if raw.eq_ignore_ascii_case("inbox") {
            Self("INBOX".to_string())
        } else {
            Self(raw)
        }
    }

    /// The mailbox name's textual form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` if this is the reserved INBOX mailbox.
    #[must_use]
    pub fn is_inbox(&self) -> bool {
        self.0 == "INBOX"
    }
}

impl fmt::Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Mailbox {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Flags describing a mailbox's role or state, as returned by LIST.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MailboxAttribute {
    /// `\Noselect`: the mailbox cannot be selected.
    NoSelect,
    /// `\Noinferiors`: the mailbox cannot have children.
    NoInferiors,
    /// `\Marked`: the mailbox has been marked "interesting" by the server.
    Marked,
    /// `\Unmarked`: the opposite of `\Marked`.
    Unmarked,
    /// `\HasChildren`
    HasChildren,
    /// `\HasNoChildren`
    HasNoChildren,
    /// A RFC 6154 SPECIAL-USE attribute (`\Archive`, `\Drafts`, `\Sent`, ...).
    SpecialUse(String),
    /// An unrecognized attribute.
    Extension(String),
}

impl MailboxAttribute {
    /// Parses an attribute token's text (with leading backslash).
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let Some(rest) = raw.strip_prefix('\\') else {
            return Self::Extension(raw.to_string());
        };
        match rest.to_ascii_uppercase().as_str() {
            "NOSELECT" => Self::NoSelect,
            "NOINFERIORS" => Self::NoInferiors,
            "MARKED" => Self::Marked,
            "UNMARKED" => Self::Unmarked,
            "HASCHILDREN" => Self::HasChildren,
            "HASNOCHILDREN" => Self::HasNoChildren,
            "ARCHIVE" | "DRAFTS" | "SENT" | "JUNK" | "TRASH" | "ALL" | "FLAGGED" | "IMPORTANT" => {
                Self::SpecialUse(rest.to_string())
            }
            _ => Self::Extension(rest.to_string()),
        }
    }
}

/// A single LIST/LSUB response entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListResponse {
    /// Mailbox attributes.
    pub attributes: Vec<MailboxAttribute>,
    /// Hierarchy delimiter, if the server reports one (`None` means flat).
    pub delimiter: Option<char>,
    /// The mailbox name.
    pub mailbox: Mailbox,
}

/// Parsed STATUS response data for one mailbox.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailboxStatus {
    /// Number of messages.
    pub exists: Option<u32>,
    /// Number of messages with `\Recent` set.
    pub recent: Option<u32>,
    /// Next UID the server expects to assign.
    pub uid_next: Option<u32>,
    /// The mailbox's UIDVALIDITY.
    pub uid_validity: Option<u32>,
    /// Number of messages without `\Seen` set.
    pub unseen: Option<u32>,
    /// Highest mod-sequence value (CONDSTORE).
    pub highest_mod_seq: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inbox_case_folds() {
        assert_eq!(Mailbox::new("inbox").as_str(), "INBOX");
        assert_eq!(Mailbox::new("InBoX").as_str(), "INBOX");
        assert!(Mailbox::new("inbox").is_inbox());
    }

    #[test]
    fn other_names_preserve_case() {
        assert_eq!(Mailbox::new("Sent Items").as_str(), "Sent Items");
    }

    #[test]
    fn parse_attributes() {
        assert_eq!(MailboxAttribute::parse("\\Noselect"), MailboxAttribute::NoSelect);
        assert_eq!(
            MailboxAttribute::parse("\\Archive"),
            MailboxAttribute::SpecialUse("ARCHIVE".into())
        );
    }
}
