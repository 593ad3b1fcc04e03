//! Sequence sets and UID sets: comma-separated ranges with `*` as "last".

use std::fmt;

use super::identifiers::{SeqNum, Uid};

/// A set of sequence numbers, as used by FETCH/STORE/COPY/MOVE/SEARCH.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceSet {
    /// A single sequence number.
    Single(SeqNum),
    /// An inclusive range `start:end`.
    Range(SeqNum, SeqNum),
    /// An open-ended range `start:*`, meaning "start through the highest
    /// sequence number in the mailbox".
    RangeFrom(SeqNum),
    /// The bare `*` sentinel: the highest sequence number.
    All,
    /// A comma-separated union of the above.
    Set(Vec<Self>),
}

impl SequenceSet {
    /// A single-element set.
    #[must_use]
    pub const fn single(n: SeqNum) -> Self {
        Self::Single(n)
    }

    /// An inclusive range; `None` if either bound, read as a raw `u32`,
    /// would be zero (sequence numbers are always `>= 1`).
    #[must_use]
    pub fn range(start: u32, end: u32) -> Option<Self> {
        Some(Self::Range(SeqNum::new(start)?, SeqNum::new(end)?))
    }
}

impl fmt::Display for SequenceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(n) => write!(f, "{n}"),
            Self::Range(a, b) => write!(f, "{a}:{b}"),
            Self::RangeFrom(a) => write!(f, "{a}:*"),
            Self::All => write!(f, "*"),
            Self::Set(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

/// A set of UIDs, as used by UID FETCH/STORE/COPY/MOVE/SEARCH.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UidSet {
    /// A single UID.
    Single(Uid),
    /// An inclusive range `start:end`.
    Range(Uid, Uid),
    /// An open-ended range `start:*`.
    RangeFrom(Uid),
    /// The bare `*` sentinel.
    All,
    /// A comma-separated union of the above.
    Set(Vec<Self>),
}

impl UidSet {
    /// A single-element set.
    #[must_use]
    pub const fn single(uid: Uid) -> Self {
        Self::Single(uid)
    }

    /// An inclusive range; `None` if either bound would be zero.
    #[must_use]
    pub fn range(start: u32, end: u32) -> Option<Self> {
        Some(Self::Range(Uid::new(start)?, Uid::new(end)?))
    }

    /// Converts to the structurally identical [`SequenceSet`] representation,
    /// used where the wire form of a UID set and a sequence set coincide
    /// (both are `seq-number (":" seq-number / "*")? ("," ...)*`).
    #[must_use]
    pub fn as_sequence_set(&self) -> SequenceSet {
        match self {
            Self::Single(uid) => SequenceSet::Single(SeqNum::new(uid.get()).unwrap_or_else(|| {
                // Uid is NonZeroU32-backed, so this is unreachable; kept
                // branchless rather than panicking in case that invariant
                // is ever relaxed.
                SeqNum::new(1).expect("1 is non-zero")
            })),
            Self::Range(a, b) => SequenceSet::Range(
                SeqNum::new(a.get()).expect("uid is non-zero"),
                SeqNum::new(b.get()).expect("uid is non-zero"),
            ),
            Self::RangeFrom(a) => SequenceSet::RangeFrom(SeqNum::new(a.get()).expect("uid is non-zero")),
            Self::All => SequenceSet::All,
            Self::Set(items) => SequenceSet::Set(items.iter().map(Self::as_sequence_set).collect()),
        }
    }
}

impl fmt::Display for UidSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(n) => write!(f, "{n}"),
            Self::Range(a, b) => write!(f, "{a}:{b}"),
            Self::RangeFrom(a) => write!(f, "{a}:*"),
            Self::All => write!(f, "*"),
            Self::Set(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod sequence_set_tests {
    use super::*;

    #[test]
    fn display_single() {
        assert_eq!(SequenceSet::single(SeqNum::new(5).unwrap()).to_string(), "5");
    }

    #[test]
    fn display_range() {
        assert_eq!(SequenceSet::range(1, 10).unwrap().to_string(), "1:10");
    }

    #[test]
    fn range_rejects_zero_bound() {
        assert!(SequenceSet::range(0, 10).is_none());
    }

    #[test]
    fn display_comma_joined_set() {
        let set = SequenceSet::Set(vec![
            SequenceSet::single(SeqNum::new(1).unwrap()),
            SequenceSet::RangeFrom(SeqNum::new(5).unwrap()),
        ]);
        assert_eq!(set.to_string(), "1,5:*");
    }
}

#[cfg(test)]
mod uid_set_tests {
    use super::*;

    #[test]
    fn display_all() {
        assert_eq!(UidSet::All.to_string(), "*");
    }

    #[test]
    fn as_sequence_set_preserves_shape() {
        let uid_set = UidSet::range(1, 5).unwrap();
        assert_eq!(uid_set.as_sequence_set().to_string(), "1:5");
    }
}
