//! Conservative message-set overlap for the pipelining algebra.

use crate::command::IdSpace;
use crate::types::SequenceSet;

/// The set of messages a [`super::Requirement`]/[`super::Behavior`] pair
/// names. Sequence numbers and UIDs are different addressing spaces (a
/// sequence number shifts on EXPUNGE; a UID never does) and neither can be
/// resolved against the other without mailbox state the scheduler
/// deliberately doesn't hold, so cross-space sets are treated as always
/// overlapping — the conservative, safe-but-less-parallel answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageSet {
    /// Every message, in either space — the "any" sentinel from the spec.
    Any,
    /// A concrete set addressed in one identifier space.
    Ids(IdSpace, SequenceSet),
}

impl MessageSet {
    /// `true` if `self` and `other` might name a common message. Errs
    /// towards `true` (overlap) whenever the sets can't be proven disjoint
    /// from their wire representation alone.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Any, _) | (_, Self::Any) => true,
            (Self::Ids(space_a, a), Self::Ids(space_b, b)) => {
                *space_a != *space_b || ranges_may_overlap(a, b)
            }
        }
    }
}

/// Every closed sub-range this set provably covers, or `None` if it
/// contains an unenumerable member (`*`, `n:*`) whose upper bound depends
/// on mailbox size the scheduler doesn't track.
fn concrete_ranges(set: &SequenceSet) -> Option<Vec<(u32, u32)>> {
    match set {
        SequenceSet::Single(n) => Some(vec![(n.get(), n.get())]),
        SequenceSet::Range(a, b) => Some(vec![(a.get().min(b.get()), a.get().max(b.get()))]),
        SequenceSet::RangeFrom(_) | SequenceSet::All => None,
        SequenceSet::Set(items) => {
            let mut ranges = Vec::with_capacity(items.len());
            for item in items {
                ranges.extend(concrete_ranges(item)?);
            }
            Some(ranges)
        }
    }
}

fn ranges_may_overlap(a: &SequenceSet, b: &SequenceSet) -> bool {
    match (concrete_ranges(a), concrete_ranges(b)) {
        (Some(ra), Some(rb)) => ra
            .iter()
            .any(|&(a0, a1)| rb.iter().any(|&(b0, b1)| a0 <= b1 && b0 <= a1)),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SeqNum;

    #[test]
    fn disjoint_concrete_ranges_do_not_intersect() {
        let a = MessageSet::Ids(IdSpace::SequenceNumber, SequenceSet::range(1, 5).unwrap());
        let b = MessageSet::Ids(IdSpace::SequenceNumber, SequenceSet::range(6, 10).unwrap());
        assert!(!a.intersects(&b));
    }

    #[test]
    fn touching_ranges_intersect() {
        let a = MessageSet::Ids(IdSpace::SequenceNumber, SequenceSet::range(1, 5).unwrap());
        let b = MessageSet::Ids(IdSpace::SequenceNumber, SequenceSet::range(5, 10).unwrap());
        assert!(a.intersects(&b));
    }

    #[test]
    fn unenumerable_range_is_conservatively_overlapping() {
        let a = MessageSet::Ids(IdSpace::SequenceNumber, SequenceSet::range(1, 5).unwrap());
        let b = MessageSet::Ids(IdSpace::SequenceNumber, SequenceSet::RangeFrom(SeqNum::new(100).unwrap()));
        assert!(a.intersects(&b));
    }

    #[test]
    fn cross_space_is_conservatively_overlapping() {
        let a = MessageSet::Ids(IdSpace::SequenceNumber, SequenceSet::single(SeqNum::new(1).unwrap()));
        let b = MessageSet::Ids(IdSpace::Uid, SequenceSet::single(SeqNum::new(1).unwrap()));
        assert!(a.intersects(&b));
    }
}
