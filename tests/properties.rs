//! Proptest-backed invariants from the framer, string encoder, and
//! pipelining algebra: byte-preservation, encode/parse round-tripping, and
//! the `satisfies` monotonicity law.

use bytes::BytesMut;
use proptest::prelude::*;

use imap_wire::buffer::Cursor;
use imap_wire::encode::{classify_string, write_string, EncodeBuffer, StringForm};
use imap_wire::framer::{FrameEvent, Framer};
use imap_wire::grammar::primitives::astring_inline;
use imap_wire::outcome::ParseOutcome;
use imap_wire::command::IdSpace;
use imap_wire::pipeline::{satisfies, Behavior, MessageSet, Requirement};
use imap_wire::types::{SeqNum, SequenceSet};
use imap_wire::Limits;

/// Atom-safe bytes: printable ASCII minus the characters `ATOM_SPECIALS`
/// excludes, so a generated string always round-trips as `StringForm::Atom`.
fn atom_byte() -> impl Strategy<Value = u8> {
    (0x21u8..=0x7eu8).prop_filter("not an atom special", |&b| {
        !b"(){ %*\"\\]".contains(&b)
    })
}

fn atom_string() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(atom_byte(), 1..12)
}

/// 7-bit ASCII, no CR/LF: every byte `classify_string` accepts as `Quoted`
/// once it isn't already a bare atom.
fn quotable_string() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec((0x20u8..=0x7eu8), 0..12)
}

proptest! {
    /// A line the framer hands back as `FrameEvent::Line` must reproduce
    /// the caller's bytes exactly, CRLF included.
    #[test]
    fn framer_preserves_line_bytes(body in atom_string()) {
        let mut line = body.clone();
        line.extend_from_slice(b"\r\n");
        let mut framer = Framer::new(Limits::default());
        let mut input = BytesMut::from(line.as_slice());
        let event = framer.parse(&mut input).unwrap();
        prop_assert_eq!(event, Some(FrameEvent::Line(line)));
    }

    /// Every atom-safe string classifies as `Atom` and is written bare; the
    /// grammar's `astring_inline` reads it back unchanged.
    #[test]
    fn atom_strings_round_trip_bare(s in atom_string()) {
        prop_assert_eq!(classify_string(&s), StringForm::Atom);
        let mut buf = EncodeBuffer::new();
        let deferred = write_string(&mut buf, &s);
        prop_assert!(!deferred);
        let wire: Vec<u8> = buf.finish().into_iter().flat_map(|c| c.bytes).collect();
        prop_assert_eq!(&wire, &s);

        // `atom` can't tell a bare atom is finished without seeing the
        // non-atom-char (or end of a larger line) that follows it, so feed
        // it a trailing separator the way a real command line always has.
        let mut terminated = wire.clone();
        terminated.push(b' ');
        let mut cursor = Cursor::new(&terminated);
        let parsed = astring_inline(&mut cursor).unwrap();
        prop_assert_eq!(parsed, ParseOutcome::Done(String::from_utf8(s).unwrap()));
        prop_assert_eq!(cursor.position(), wire.len());
    }

    /// Any 7-bit, CR/LF-free string either classifies as `Atom` (handled
    /// above) or `Quoted`; in the latter case, writing then re-parsing via
    /// `astring_inline` recovers the exact original bytes.
    #[test]
    fn quoted_strings_round_trip(s in quotable_string()) {
        let form = classify_string(&s);
        prop_assume!(form == StringForm::Quoted);

        let mut buf = EncodeBuffer::new();
        let deferred = write_string(&mut buf, &s);
        prop_assert!(!deferred);
        let wire: Vec<u8> = buf.finish().into_iter().flat_map(|c| c.bytes).collect();

        let mut cursor = Cursor::new(&wire);
        let parsed = astring_inline(&mut cursor).unwrap();
        prop_assert_eq!(parsed, ParseOutcome::Done(String::from_utf8(s).unwrap()));
        prop_assert_eq!(cursor.position(), wire.len());
    }

    /// `satisfies(requirements, B) ∧ satisfies(requirements, B') ⟹
    /// satisfies(requirements, B ∪ B')`: unioning two independently-safe
    /// running sets can never turn a satisfied requirement set unsatisfied,
    /// since `conflicts` only ever adds restrictions per-behavior.
    #[test]
    fn satisfies_is_monotonic_under_union(
        req_lo in 1u32..50, req_hi in 1u32..50,
        running_lo in 1u32..50, running_hi in 1u32..50,
        pick_uid_behavior in any::<bool>(),
    ) {
        let (req_lo, req_hi) = (req_lo.min(req_hi), req_lo.max(req_hi) + 1);
        let (running_lo, running_hi) = (running_lo.min(running_hi), running_lo.max(running_hi) + 1);

        let requirement_set = MessageSet::Ids(IdSpace::SequenceNumber, SequenceSet::range(req_lo, req_hi).unwrap());
        let running_set = MessageSet::Ids(IdSpace::SequenceNumber, SequenceSet::range(running_lo, running_hi).unwrap());
        let requirements = vec![Requirement::NoFlagChanges(requirement_set)];

        let running_a = vec![Behavior::ChangesFlags(running_set)];
        let running_b = vec![if pick_uid_behavior { Behavior::IsUIDBased } else { Behavior::DependsOnMailboxSelection }];

        if satisfies(&requirements, &running_a) && satisfies(&requirements, &running_b) {
            let mut union = running_a;
            union.extend(running_b);
            prop_assert!(satisfies(&requirements, &union));
        }
    }

    /// No requirements are always satisfiable, regardless of what else is
    /// running, as long as nothing running is a `Barrier`.
    #[test]
    fn empty_requirements_are_satisfied_unless_a_barrier_is_running(n in 1u32..10) {
        let running: Vec<Behavior> = (0..n).map(|_| Behavior::DependsOnMailboxSelection).collect();
        prop_assert!(satisfies(&[], &running));
    }

    #[test]
    fn single_message_sequence_set_intersects_itself(n in 1u32..1000) {
        let seq = SeqNum::new(n).unwrap();
        let set = MessageSet::Ids(IdSpace::SequenceNumber, SequenceSet::single(seq));
        prop_assert!(set.intersects(&set));
    }
}
