//! Command values and their parsing/encoding/streaming.

pub mod encode;
pub mod parse;
pub mod stream;

use crate::grammar::{SearchKey, Section};
use crate::types::{Flags, Mailbox, SequenceSet, Tag};

/// A pair of `(tag, body)`, the unit the command parser produces and the
/// encoder consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    /// The client-chosen tag correlating this command with its completion.
    pub tag: Tag,
    /// What the command asks the server to do.
    pub body: CommandBody,
}

/// Which message-identifier space a command operates over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdSpace {
    /// Session-local sequence numbers.
    SequenceNumber,
    /// Stable UIDs (the command was prefixed with `UID`).
    Uid,
}

/// What a client FETCH command asks for: one of the two named macros, or
/// an explicit attribute list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchRequest {
    /// `ALL`: FLAGS INTERNALDATE RFC822.SIZE ENVELOPE.
    All,
    /// `FULL`: ALL plus BODY.
    Full,
    /// `FAST`: FLAGS INTERNALDATE RFC822.SIZE.
    Fast,
    /// An explicit, possibly-parenthesized attribute list.
    Attributes(Vec<FetchAttributeRequest>),
}

/// One requested FETCH attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchAttributeRequest {
    Flags,
    InternalDate,
    Rfc822Size,
    Envelope,
    BodyStructure,
    Uid,
    Rfc822,
    Rfc822Header,
    Rfc822Text,
    ModSeq,
    /// `BODY[section]<partial>` or `BODY.PEEK[section]<partial>`.
    Body { section: Section, peek: bool, partial: Option<(u32, u32)> },
    /// `BINARY[section]<partial>` or `BINARY.PEEK[section]<partial>`.
    Binary { section: Section, peek: bool, partial: Option<(u32, u32)> },
    /// `BINARY.SIZE[section]`.
    BinarySize { section: Section },
}

/// What a STORE command changes, independent of silent/`UNCHANGEDSINCE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreAction {
    Set(Flags),
    Add(Flags),
    Remove(Flags),
}

/// A full STORE command argument set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreRequest {
    pub action: StoreAction,
    pub silent: bool,
    pub unchanged_since: Option<u64>,
}

/// One message payload handed to an APPEND command; the byte payload
/// itself is streamed separately by [`stream::CommandParser`] rather than
/// living in this value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendMessage {
    pub flags: Flags,
    pub internal_date: Option<String>,
    pub literal_length: usize,
    /// Whether the literal was declared with the `literal8` (`~{N}`) form,
    /// i.e. the streamed payload may contain NUL.
    pub is_literal8: bool,
}

/// The full IMAP4rev1 command set this parser/encoder understands.
///
/// Rarely-used or deeply extension-shaped commands (`ID`, `NAMESPACE`,
/// `GETQUOTA`/`SETQUOTA`, `GETMETADATA`/`SETMETADATA`, URLAUTH-family
/// operations, and vendor `X-` commands) are carried as [`Self::Extension`]
/// with their raw argument text preserved verbatim rather than individually
/// typed, matching the spec's treatment of non-central leaf shapes as
/// opaque values the parser emits and the encoder reproduces byte-for-byte.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandBody {
    Capability,
    Noop,
    Logout,
    StartTls,
    Login { user: String, password: String },
    Authenticate { mechanism: String, initial_response: Option<Vec<u8>> },
    Select { mailbox: Mailbox },
    Examine { mailbox: Mailbox },
    Create { mailbox: Mailbox },
    Delete { mailbox: Mailbox },
    Rename { from: Mailbox, to: Mailbox },
    Subscribe { mailbox: Mailbox },
    Unsubscribe { mailbox: Mailbox },
    List { reference: Mailbox, pattern: String },
    Lsub { reference: Mailbox, pattern: String },
    Status { mailbox: Mailbox, items: Vec<crate::types::Status> },
    Append { mailbox: Mailbox, message: AppendMessage },
    Check,
    Close,
    Expunge { id_space: IdSpace },
    Search { id_space: IdSpace, criteria: SearchKey, charset: Option<String> },
    Fetch { id_space: IdSpace, sequence: SequenceSet, request: FetchRequest },
    Store { id_space: IdSpace, sequence: SequenceSet, request: StoreRequest },
    Copy { id_space: IdSpace, sequence: SequenceSet, mailbox: Mailbox },
    Move { id_space: IdSpace, sequence: SequenceSet, mailbox: Mailbox },
    Idle,
    IdleDone,
    Enable { capabilities: Vec<String> },
    /// Any command this parser does not individually model, with its
    /// uppercased keyword and the raw byte text of its remaining
    /// arguments (not including the trailing CRLF).
    Extension { keyword: String, arguments: Vec<u8> },
}

impl CommandBody {
    /// The command keyword this body is named by, used by both the
    /// encoder and the pipelining classifier.
    #[must_use]
    pub fn keyword(&self) -> &str {
        match self {
            Self::Capability => "CAPABILITY",
            Self::Noop => "NOOP",
            Self::Logout => "LOGOUT",
            Self::StartTls => "STARTTLS",
            Self::Login { .. } => "LOGIN",
            Self::Authenticate { .. } => "AUTHENTICATE",
            Self::Select { .. } => "SELECT",
            Self::Examine { .. } => "EXAMINE",
            Self::Create { .. } => "CREATE",
            Self::Delete { .. } => "DELETE",
            Self::Rename { .. } => "RENAME",
            Self::Subscribe { .. } => "SUBSCRIBE",
            Self::Unsubscribe { .. } => "UNSUBSCRIBE",
            Self::List { .. } => "LIST",
            Self::Lsub { .. } => "LSUB",
            Self::Status { .. } => "STATUS",
            Self::Append { .. } => "APPEND",
            Self::Check => "CHECK",
            Self::Close => "CLOSE",
            Self::Expunge { .. } => "EXPUNGE",
            Self::Search { .. } => "SEARCH",
            Self::Fetch { .. } => "FETCH",
            Self::Store { .. } => "STORE",
            Self::Copy { .. } => "COPY",
            Self::Move { .. } => "MOVE",
            Self::Idle => "IDLE",
            Self::IdleDone => "DONE",
            Self::Enable { .. } => "ENABLE",
            Self::Extension { keyword, .. } => keyword,
        }
    }

    /// `true` if this command is UID-based (prefixed with `UID`).
    #[must_use]
    pub const fn is_uid_based(&self) -> bool {
        matches!(
            self,
            Self::Expunge { id_space: IdSpace::Uid }
                | Self::Search { id_space: IdSpace::Uid, .. }
                | Self::Fetch { id_space: IdSpace::Uid, .. }
                | Self::Store { id_space: IdSpace::Uid, .. }
                | Self::Copy { id_space: IdSpace::Uid, .. }
                | Self::Move { id_space: IdSpace::Uid, .. }
        )
    }
}
