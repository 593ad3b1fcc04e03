//! Recursive-descent grammar parser for IMAP4rev1 ABNF productions.
//!
//! Every production in this module operates on a [`Cursor`](crate::buffer::Cursor)
//! and a [`StackTracker`](crate::tracker::StackTracker), and returns a
//! [`ParseResult`](crate::outcome::ParseResult): a value, [`Incomplete`](crate::outcome::ParseOutcome::Incomplete),
//! or a fatal [`Error`](crate::error::Error). None of these productions touch
//! I/O or the framer directly — they are pure functions over bytes already
//! in hand, which is what lets the command and response state machines
//! retry them unchanged as more bytes arrive.

pub mod combinators;
pub mod primitives;

mod bodystructure;
mod datetime;
mod envelope;
mod search;
mod section;
mod sequence;
mod values;

pub use bodystructure::{body_structure, BodyStructure};
pub use datetime::{date, date_time, Date, DateTime, TimeZoneOffset};
pub use envelope::{address, envelope, Address, Envelope};
pub use search::{search_key, SearchKey};
pub use section::{section_spec, Section};
pub use sequence::{sequence_set, uid_set};
pub use values::{capability_data, flag_list, mailbox_name, status_att_list, StatusAttribute};
