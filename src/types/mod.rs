//! Core IMAP value types shared by the command and response grammars.

mod capability;
mod flags;
mod identifiers;
mod mailbox;
mod sequence;

pub use capability::{Capability, Status};
pub use flags::{Flag, Flags};
pub use identifiers::{SeqNum, Tag, Uid, UidValidity};
pub use mailbox::{ListResponse, Mailbox, MailboxAttribute, MailboxStatus};
pub use sequence::{SequenceSet, UidSet};
