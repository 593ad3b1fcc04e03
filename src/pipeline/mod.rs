//! Command pipelining for IMAP4rev1 connections.
//!
//! RFC 3501 §5.5 lets a client send several commands before reading any of
//! their responses, provided the commands' effects don't interfere. This
//! module carries the requirements/behaviors algebra that decides whether a
//! given command may dispatch while a set of other commands is still in
//! flight, plus a FIFO queue driving that algebra.
//!
//! Classification is attached per command rather than per connection: the
//! same [`Command`] value always classifies the same way, so the queue can
//! re-check eligibility purely from its own state plus a candidate's
//! [`Classification`] without consulting mailbox state.

mod classify;
mod queue;
mod set;

pub use classify::{classify, Classification};
pub use queue::PipelineQueue;
pub use set::MessageSet;

/// A precondition a command imposes on what else may be running before it
/// is safe to dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    /// No command that changes or depends on mailbox selection may be running.
    NoMailboxCommandsRunning,
    /// No in-flight command may still emit an untagged EXPUNGE.
    NoUntaggedExpungeResponse,
    /// No in-flight command may be UID-addressed.
    NoUIDBasedCommandRunning,
    /// No in-flight command may change flags on any message in this set.
    NoFlagChanges(MessageSet),
    /// No in-flight command may read flags on any message in this set.
    NoFlagReads(MessageSet),
}

/// An effect a running command has on what else may dispatch alongside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Behavior {
    /// SELECT/EXAMINE/CLOSE/UNSELECT: changes which mailbox is selected.
    ChangesMailboxSelection,
    /// Reads or writes state of the currently selected mailbox.
    DependsOnMailboxSelection,
    /// May cause an untagged EXPUNGE to be emitted.
    MayTriggerUntaggedExpunge,
    /// Addresses messages by UID rather than sequence number.
    IsUIDBased,
    /// Changes flags on the named messages.
    ChangesFlags(MessageSet),
    /// Reads flags on the named messages.
    ReadsFlags(MessageSet),
    /// Mutually exclusive with every other command, running or queued:
    /// STARTTLS, AUTHENTICATE, COMPRESS, IDLE.
    Barrier,
}

/// `true` if `requirement` is violated by `behavior` being in flight.
fn conflicts(requirement: &Requirement, behavior: &Behavior) -> bool {
    if matches!(behavior, Behavior::Barrier) {
        return true;
    }
    match requirement {
        Requirement::NoMailboxCommandsRunning => matches!(
            behavior,
            Behavior::ChangesMailboxSelection | Behavior::DependsOnMailboxSelection
        ),
        Requirement::NoUntaggedExpungeResponse => {
            matches!(behavior, Behavior::MayTriggerUntaggedExpunge)
        }
        Requirement::NoUIDBasedCommandRunning => matches!(behavior, Behavior::IsUIDBased),
        Requirement::NoFlagChanges(set) => {
            matches!(behavior, Behavior::ChangesFlags(other) if set.intersects(other))
        }
        Requirement::NoFlagReads(set) => {
            matches!(behavior, Behavior::ReadsFlags(other) if set.intersects(other))
        }
    }
}

/// Pure predicate: may a command declaring `requirements` dispatch while
/// `running` behaviors are in flight?
///
/// Invoked before dispatch and again whenever a running command completes
/// (releasing its behaviors). Does not mutate anything; [`PipelineQueue`]
/// is the stateful driver built on top of it.
#[must_use]
pub fn satisfies(requirements: &[Requirement], running: &[Behavior]) -> bool {
    requirements
        .iter()
        .all(|req| running.iter().all(|beh| !conflicts(req, beh)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::IdSpace;
    use crate::types::{SeqNum, SequenceSet};

    #[test]
    fn empty_requirements_are_always_satisfied() {
        assert!(satisfies(&[], &[Behavior::Barrier]));
    }

    #[test]
    fn barrier_blocks_every_requirement() {
        let reqs = [Requirement::NoMailboxCommandsRunning];
        assert!(!satisfies(&reqs, &[Behavior::Barrier]));
    }

    #[test]
    fn mailbox_selection_conflict() {
        let reqs = [Requirement::NoMailboxCommandsRunning];
        assert!(!satisfies(&reqs, &[Behavior::ChangesMailboxSelection]));
        assert!(satisfies(&reqs, &[Behavior::IsUIDBased]));
    }

    #[test]
    fn flag_change_conflict_depends_on_set_overlap() {
        let a = MessageSet::Ids(IdSpace::SequenceNumber, SequenceSet::range(1, 5).unwrap());
        let b = MessageSet::Ids(IdSpace::SequenceNumber, SequenceSet::range(10, 20).unwrap());
        let reqs = [Requirement::NoFlagChanges(a)];
        assert!(satisfies(&reqs, &[Behavior::ChangesFlags(b)]));

        let overlapping = MessageSet::Ids(IdSpace::SequenceNumber, SequenceSet::single(SeqNum::new(3).unwrap()));
        let reqs = [Requirement::NoFlagChanges(MessageSet::Ids(
            IdSpace::SequenceNumber,
            SequenceSet::range(1, 5).unwrap(),
        ))];
        assert!(!satisfies(&reqs, &[Behavior::ChangesFlags(overlapping)]));
    }

    #[test]
    fn any_sentinel_intersects_every_set() {
        let reqs = [Requirement::NoFlagReads(MessageSet::Any)];
        let running = [Behavior::ReadsFlags(MessageSet::Ids(
            IdSpace::Uid,
            SequenceSet::single(SeqNum::new(1).unwrap()),
        ))];
        assert!(!satisfies(&reqs, &running));
    }
}
