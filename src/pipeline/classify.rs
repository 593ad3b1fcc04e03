//! Per-command classification into pipelining requirements and behaviors.

use crate::command::{CommandBody, FetchAttributeRequest, FetchRequest, IdSpace};
use crate::grammar::SearchKey;

use super::set::MessageSet;
use super::{Behavior, Requirement};

/// What a single command imposes on, and carries for, the pipelining
/// scheduler while it is in flight.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    /// Preconditions the command needs before it may dispatch.
    pub requirements: Vec<Requirement>,
    /// Effects the command has on other commands once it is running.
    pub behaviors: Vec<Behavior>,
}

fn message_set(id_space: IdSpace, sequence: &crate::types::SequenceSet) -> MessageSet {
    MessageSet::Ids(id_space, sequence.clone())
}

/// Extension commands this crate doesn't model as dedicated [`CommandBody`]
/// variants but still needs to classify correctly: case-insensitive match
/// against the uppercased keyword.
fn extension_classification(keyword: &str) -> Option<Classification> {
    match keyword {
        "COMPRESS" => Some(Classification { requirements: vec![], behaviors: vec![Behavior::Barrier] }),
        "UNSELECT" => Some(Classification {
            requirements: vec![Requirement::NoMailboxCommandsRunning],
            behaviors: vec![Behavior::ChangesMailboxSelection],
        }),
        _ => None,
    }
}

/// Classifies a command body into its pipelining requirements and behaviors.
///
/// This is a pure function of the command's shape; it never consults
/// mailbox state, so [`MessageSet`] overlap is necessarily conservative
/// (see its doc comment).
#[must_use]
pub fn classify(body: &CommandBody) -> Classification {
    match body {
        CommandBody::Capability | CommandBody::Noop => Classification::default(),

        CommandBody::Logout => Classification { requirements: vec![], behaviors: vec![Behavior::Barrier] },

        CommandBody::StartTls | CommandBody::Authenticate { .. } | CommandBody::Idle | CommandBody::IdleDone => {
            Classification { requirements: vec![], behaviors: vec![Behavior::Barrier] }
        }

        CommandBody::Select { .. } | CommandBody::Examine { .. } | CommandBody::Close => Classification {
            requirements: vec![Requirement::NoMailboxCommandsRunning],
            behaviors: vec![Behavior::ChangesMailboxSelection],
        },

        CommandBody::Expunge { id_space: IdSpace::SequenceNumber } => Classification {
            requirements: vec![Requirement::NoUntaggedExpungeResponse, Requirement::NoUIDBasedCommandRunning],
            behaviors: vec![Behavior::DependsOnMailboxSelection, Behavior::MayTriggerUntaggedExpunge],
        },
        CommandBody::Expunge { id_space: IdSpace::Uid } => Classification {
            requirements: vec![Requirement::NoUntaggedExpungeResponse, Requirement::NoUIDBasedCommandRunning],
            behaviors: vec![
                Behavior::IsUIDBased,
                Behavior::DependsOnMailboxSelection,
                Behavior::MayTriggerUntaggedExpunge,
            ],
        },

        CommandBody::Fetch { id_space, sequence, request } => {
            let mut c = fetch_or_store_base(*id_space);
            c.behaviors.push(Behavior::DependsOnMailboxSelection);
            if fetch_requests_flags(request) {
                c.behaviors.push(Behavior::ReadsFlags(message_set(*id_space, sequence)));
            }
            c
        }

        CommandBody::Store { id_space, sequence, request } => {
            let mut c = fetch_or_store_base(*id_space);
            c.behaviors.push(Behavior::DependsOnMailboxSelection);
            let set = message_set(*id_space, sequence);
            c.behaviors.push(Behavior::ChangesFlags(set.clone()));
            if !request.silent {
                c.behaviors.push(Behavior::ReadsFlags(set));
            }
            c
        }

        CommandBody::Copy { id_space, .. } => {
            let mut c = fetch_or_store_base(*id_space);
            c.behaviors.push(Behavior::DependsOnMailboxSelection);
            if matches!(id_space, IdSpace::Uid) {
                c.behaviors.push(Behavior::MayTriggerUntaggedExpunge);
            }
            c
        }

        CommandBody::Move { id_space, .. } => {
            let mut c = fetch_or_store_base(*id_space);
            c.behaviors.push(Behavior::DependsOnMailboxSelection);
            c.behaviors.push(Behavior::MayTriggerUntaggedExpunge);
            c
        }

        CommandBody::Search { id_space, criteria, .. } => classify_search(*id_space, criteria),

        CommandBody::Extension { keyword, .. } => {
            extension_classification(&keyword.to_ascii_uppercase()).unwrap_or_default()
        }

        CommandBody::Login { .. }
        | CommandBody::Create { .. }
        | CommandBody::Delete { .. }
        | CommandBody::Rename { .. }
        | CommandBody::Subscribe { .. }
        | CommandBody::Unsubscribe { .. }
        | CommandBody::List { .. }
        | CommandBody::Lsub { .. }
        | CommandBody::Status { .. }
        | CommandBody::Append { .. }
        | CommandBody::Check
        | CommandBody::Enable { .. } => Classification::default(),
    }
}

/// The base requirement set shared by FETCH/STORE/COPY/MOVE: sequence-number
/// addressed commands refuse to run alongside a UID-addressed command
/// (which might renumber or otherwise race with them), and conversely avoid
/// running while an untagged EXPUNGE could still land. UID-addressed
/// commands are immune to both, so they carry neither requirement.
fn fetch_or_store_base(id_space: IdSpace) -> Classification {
    match id_space {
        IdSpace::SequenceNumber => Classification {
            requirements: vec![Requirement::NoUntaggedExpungeResponse, Requirement::NoUIDBasedCommandRunning],
            behaviors: vec![],
        },
        IdSpace::Uid => Classification { requirements: vec![], behaviors: vec![Behavior::IsUIDBased] },
    }
}

fn fetch_requests_flags(request: &FetchRequest) -> bool {
    match request {
        FetchRequest::All | FetchRequest::Full | FetchRequest::Fast => true,
        FetchRequest::Attributes(attrs) => {
            attrs.iter().any(|a| matches!(a, FetchAttributeRequest::Flags))
        }
    }
}

fn classify_search(id_space: IdSpace, criteria: &SearchKey) -> Classification {
    let mut requirements = Vec::new();
    let mut behaviors = Vec::new();

    if criteria.references_flags() {
        behaviors.push(Behavior::ReadsFlags(MessageSet::Any));
    }
    if matches!(id_space, IdSpace::Uid) || criteria.references_uids() {
        behaviors.push(Behavior::IsUIDBased);
    }
    if criteria.references_sequence_numbers() {
        requirements.push(Requirement::NoUIDBasedCommandRunning);
        requirements.push(Requirement::NoUntaggedExpungeResponse);
    }

    Classification { requirements, behaviors }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::StoreAction;
    use crate::types::{Flags, Mailbox, SequenceSet};

    #[test]
    fn noop_and_capability_have_no_effect() {
        assert_eq!(classify(&CommandBody::Noop), Classification::default());
        assert_eq!(classify(&CommandBody::Capability), Classification::default());
    }

    #[test]
    fn logout_is_a_barrier() {
        assert_eq!(classify(&CommandBody::Logout).behaviors, vec![Behavior::Barrier]);
    }

    #[test]
    fn select_requires_no_mailbox_commands_running() {
        let c = classify(&CommandBody::Select { mailbox: Mailbox::from("INBOX") });
        assert_eq!(c.requirements, vec![Requirement::NoMailboxCommandsRunning]);
        assert_eq!(c.behaviors, vec![Behavior::ChangesMailboxSelection]);
    }

    #[test]
    fn sequence_fetch_requires_no_uid_command_and_no_expunge() {
        let c = classify(&CommandBody::Fetch {
            id_space: IdSpace::SequenceNumber,
            sequence: SequenceSet::range(1, 5).unwrap(),
            request: FetchRequest::Attributes(vec![FetchAttributeRequest::Flags]),
        });
        assert!(c.requirements.contains(&Requirement::NoUntaggedExpungeResponse));
        assert!(c.requirements.contains(&Requirement::NoUIDBasedCommandRunning));
        assert!(c.behaviors.iter().any(|b| matches!(b, Behavior::ReadsFlags(_))));
    }

    #[test]
    fn uid_move_triggers_untagged_expunge_and_is_uid_based() {
        let c = classify(&CommandBody::Move {
            id_space: IdSpace::Uid,
            sequence: SequenceSet::single(crate::types::SeqNum::new(1).unwrap()),
            mailbox: Mailbox::from("Archive"),
        });
        assert!(c.behaviors.contains(&Behavior::IsUIDBased));
        assert!(c.behaviors.contains(&Behavior::MayTriggerUntaggedExpunge));
        assert!(c.requirements.is_empty());
    }

    #[test]
    fn store_without_silent_reads_and_changes_flags() {
        let c = classify(&CommandBody::Store {
            id_space: IdSpace::SequenceNumber,
            sequence: SequenceSet::single(crate::types::SeqNum::new(3).unwrap()),
            request: crate::command::StoreRequest {
                action: StoreAction::Add(Flags::from_iter([crate::types::Flag::Seen])),
                silent: false,
                unchanged_since: None,
            },
        });
        assert!(c.behaviors.iter().any(|b| matches!(b, Behavior::ChangesFlags(_))));
        assert!(c.behaviors.iter().any(|b| matches!(b, Behavior::ReadsFlags(_))));
    }

    #[test]
    fn search_referencing_sequence_numbers_requires_isolation() {
        let c = classify_search(IdSpace::SequenceNumber, &SearchKey::SequenceSet(SequenceSet::range(1, 3).unwrap()));
        assert!(c.requirements.contains(&Requirement::NoUIDBasedCommandRunning));
        assert!(c.requirements.contains(&Requirement::NoUntaggedExpungeResponse));
    }

    #[test]
    fn search_referencing_flags_reads_any() {
        let c = classify_search(IdSpace::SequenceNumber, &SearchKey::Seen);
        assert_eq!(c.behaviors, vec![Behavior::ReadsFlags(MessageSet::Any)]);
    }

    #[test]
    fn unselect_extension_behaves_like_close() {
        let c = classify(&CommandBody::Extension { keyword: "UNSELECT".into(), arguments: vec![] });
        assert_eq!(c.requirements, vec![Requirement::NoMailboxCommandsRunning]);
    }
}
