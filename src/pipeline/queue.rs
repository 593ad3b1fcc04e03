//! FIFO head-of-line queue driving [`super::satisfies`] against a live
//! connection's in-flight commands.

use std::collections::VecDeque;

use tracing::trace;

use crate::command::CommandBody;
use crate::types::Tag;

use super::classify::{classify, Classification};
use super::satisfies;

/// One command waiting for, or already past, dispatch.
#[derive(Debug, Clone)]
struct Entry {
    tag: Tag,
    classification: Classification,
}

/// Holds a connection's not-yet-dispatched commands and its in-flight set,
/// re-evaluating [`super::satisfies`] against the head of the queue
/// whenever the in-flight set changes.
///
/// The queue never reorders: a command later in submission order is never
/// dispatched ahead of one still blocked earlier in the queue, even if the
/// later command would itself satisfy the predicate. This keeps server-side
/// response ordering (itself FIFO per RFC 3501 §5.5) matching client-side
/// dispatch order.
#[derive(Debug)]
pub struct PipelineQueue {
    max_depth: usize,
    waiting: VecDeque<Entry>,
    running: Vec<Entry>,
}

impl PipelineQueue {
    /// Creates an empty queue capped at `max_depth` total (waiting plus
    /// in-flight) entries.
    #[must_use]
    pub const fn new(max_depth: usize) -> Self {
        Self { max_depth, waiting: VecDeque::new(), running: Vec::new() }
    }

    /// Total entries, waiting and in-flight.
    #[must_use]
    pub fn len(&self) -> usize {
        self.waiting.len() + self.running.len()
    }

    /// `true` if nothing is queued or in flight.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Submits `body` under `tag`. Returns `false` without queuing it if
    /// the queue is already at `max_depth`.
    pub fn submit(&mut self, tag: Tag, body: &CommandBody) -> bool {
        if self.len() >= self.max_depth {
            return false;
        }
        self.waiting.push_back(Entry { tag, classification: classify(body) });
        true
    }

    /// Dispatches every queued command now eligible to run, in submission
    /// order, stopping at the first one that isn't (later entries, even if
    /// individually eligible, wait behind it). Returns the dispatched tags.
    pub fn dispatch_ready(&mut self) -> Vec<Tag> {
        let mut dispatched = Vec::new();
        let running_behaviors: Vec<_> =
            self.running.iter().flat_map(|e| e.classification.behaviors.iter().cloned()).collect();
        let mut behaviors = running_behaviors;

        while let Some(front) = self.waiting.front() {
            if !satisfies(&front.classification.requirements, &behaviors) {
                break;
            }
            let entry = self.waiting.pop_front().expect("front entry just matched");
            behaviors.extend(entry.classification.behaviors.clone());
            trace!(tag = %entry.tag, "dispatching pipelined command");
            dispatched.push(entry.tag.clone());
            self.running.push(entry);
        }

        dispatched
    }

    /// Marks `tag`'s command complete, releasing its behaviors so the next
    /// call to [`Self::dispatch_ready`] can consider what it was blocking.
    /// Returns `false` if `tag` wasn't in flight.
    pub fn complete(&mut self, tag: &Tag) -> bool {
        if let Some(pos) = self.running.iter().position(|e| &e.tag == tag) {
            self.running.remove(pos);
            true
        } else {
            false
        }
    }

    /// Tags currently in flight, in dispatch order.
    #[must_use]
    pub fn in_flight(&self) -> Vec<&Tag> {
        self.running.iter().map(|e| &e.tag).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Mailbox;

    #[test]
    fn independent_commands_all_dispatch_together() {
        let mut q = PipelineQueue::new(8);
        q.submit(Tag::new("a1"), &CommandBody::Noop);
        q.submit(Tag::new("a2"), &CommandBody::Capability);
        let dispatched = q.dispatch_ready();
        assert_eq!(dispatched, vec![Tag::new("a1"), Tag::new("a2")]);
    }

    #[test]
    fn select_blocks_a_second_select_until_it_completes() {
        let mut q = PipelineQueue::new(8);
        q.submit(Tag::new("a1"), &CommandBody::Select { mailbox: Mailbox::from("INBOX") });
        q.submit(Tag::new("a2"), &CommandBody::Select { mailbox: Mailbox::from("Archive") });

        let dispatched = q.dispatch_ready();
        assert_eq!(dispatched, vec![Tag::new("a1")]);
        assert!(q.dispatch_ready().is_empty());

        q.complete(&Tag::new("a1"));
        assert_eq!(q.dispatch_ready(), vec![Tag::new("a2")]);
    }

    #[test]
    fn uid_command_blocks_a_sequence_number_fetch() {
        let mut q = PipelineQueue::new(8);
        q.submit(
            Tag::new("a1"),
            &CommandBody::Fetch {
                id_space: crate::command::IdSpace::Uid,
                sequence: crate::types::SequenceSet::single(crate::types::SeqNum::new(1).unwrap()),
                request: crate::command::FetchRequest::Attributes(vec![]),
            },
        );
        q.submit(
            Tag::new("a2"),
            &CommandBody::Fetch {
                id_space: crate::command::IdSpace::SequenceNumber,
                sequence: crate::types::SequenceSet::single(crate::types::SeqNum::new(1).unwrap()),
                request: crate::command::FetchRequest::Attributes(vec![]),
            },
        );

        let dispatched = q.dispatch_ready();
        assert_eq!(dispatched, vec![Tag::new("a1")]);
        assert!(q.dispatch_ready().is_empty(), "a2 must wait for the UID-based command in flight");

        q.complete(&Tag::new("a1"));
        assert_eq!(q.dispatch_ready(), vec![Tag::new("a2")]);
    }

    #[test]
    fn head_of_line_blocking_holds_back_an_eligible_later_command() {
        let mut q = PipelineQueue::new(8);
        q.submit(Tag::new("a1"), &CommandBody::Select { mailbox: Mailbox::from("INBOX") });
        q.submit(Tag::new("a2"), &CommandBody::Select { mailbox: Mailbox::from("Archive") });
        q.submit(Tag::new("a3"), &CommandBody::Noop);

        let dispatched = q.dispatch_ready();
        assert_eq!(dispatched, vec![Tag::new("a1")]);
        assert!(
            q.dispatch_ready().is_empty(),
            "a3 must not jump ahead of the blocked a2, even though a3 alone would be eligible"
        );
    }

    #[test]
    fn submit_rejects_past_max_depth() {
        let mut q = PipelineQueue::new(1);
        assert!(q.submit(Tag::new("a1"), &CommandBody::Noop));
        assert!(!q.submit(Tag::new("a2"), &CommandBody::Noop));
    }
}
