//! Non-zero numeric identifiers used throughout the protocol.

use std::fmt;
use std::num::NonZeroU32;

/// A command tag: an ASTRING-CHAR sequence excluding `+`, used to correlate
/// a client command with its tagged completion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(String);

impl Tag {
    /// Wraps a string as a tag.
    ///
    /// The grammar parser is responsible for rejecting tags containing `+`
    /// or other excluded bytes before constructing one of these; this
    /// constructor does not re-validate.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The tag's textual form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Tag {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A per-session message ordinal, invalidated by EXPUNGE. Always `>= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeqNum(NonZeroU32);

impl SeqNum {
    /// Constructs a sequence number, rejecting zero.
    #[must_use]
    pub fn new(value: u32) -> Option<Self> {
        NonZeroU32::new(value).map(Self)
    }

    /// The underlying value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for SeqNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An immutable unique identifier for a message within a mailbox. Always `>= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Uid(NonZeroU32);

impl Uid {
    /// Constructs a UID, rejecting zero.
    #[must_use]
    pub fn new(value: u32) -> Option<Self> {
        NonZeroU32::new(value).map(Self)
    }

    /// The underlying value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A mailbox's UIDVALIDITY value; UIDs are only meaningful within a
/// particular validity epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UidValidity(pub u32);

impl fmt::Display for UidValidity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seq_num_rejects_zero() {
        assert!(SeqNum::new(0).is_none());
        assert_eq!(SeqNum::new(42).unwrap().get(), 42);
    }

    #[test]
    fn uid_rejects_zero() {
        assert!(Uid::new(0).is_none());
        assert_eq!(Uid::new(7).unwrap().get(), 7);
    }

    #[test]
    fn tag_display_round_trips() {
        let tag = Tag::new("a001");
        assert_eq!(tag.to_string(), "a001");
        assert_eq!(tag.as_str(), "a001");
    }
}
