//! Server response value types.

use crate::grammar::{BodyStructure, Envelope, Section, StatusAttribute};
use crate::types::{Capability, Flags, ListResponse, Mailbox, SeqNum, Uid, UidSet, UidValidity};

/// A server status keyword, as it appears in a greeting or tagged
/// completion (`OK`/`NO`/`BAD`/`PREAUTH`/`BYE`), narrowed per context by
/// [`GreetingStatus`] and [`CompletionStatus`] below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UntaggedStatusKind {
    /// `OK`
    Ok,
    /// `NO`
    No,
    /// `BAD`
    Bad,
    /// `PREAUTH`
    PreAuth,
    /// `BYE`
    Bye,
}

/// The status a greeting may carry: a fresh connection is either ready for
/// login (`OK`), already authenticated by some external means (`PREAUTH`),
/// or being rejected outright (`BYE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GreetingStatus {
    /// `OK`
    Ok,
    /// `PREAUTH`
    PreAuth,
    /// `BYE`
    Bye,
}

/// The status a tagged completion may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionStatus {
    /// `OK`
    Ok,
    /// `NO`
    No,
    /// `BAD`
    Bad,
}

/// A parsed `resp-text-code` (RFC 3501 §7.1, plus RFC 4315/7162 extensions).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseCode {
    /// `ALERT`: the accompanying text must be presented to the user.
    Alert,
    /// `CAPABILITY`: an inline capability list, equivalent to an untagged
    /// CAPABILITY response but piggybacked on the greeting or a completion.
    Capability(Vec<Capability>),
    /// `PARSE`: the server failed to parse a MIME structure while fetching.
    Parse,
    /// `PERMANENTFLAGS`: flags the client may set permanently.
    PermanentFlags(Flags),
    /// `READ-ONLY`: the selected mailbox does not accept modifications.
    ReadOnly,
    /// `READ-WRITE`: the selected mailbox accepts modifications.
    ReadWrite,
    /// `TRYCREATE`: the target mailbox does not exist but could be created.
    TryCreate,
    /// `UIDNEXT`: the mailbox's next-to-be-assigned UID.
    UidNext(Uid),
    /// `UIDVALIDITY`: the mailbox's validity epoch.
    UidValidity(UidValidity),
    /// `UNSEEN`: sequence number of the first unseen message.
    Unseen(SeqNum),
    /// `APPENDUID` (RFC 4315): the UID assigned to a just-appended message.
    AppendUid {
        /// Destination mailbox's UIDVALIDITY.
        uid_validity: UidValidity,
        /// Assigned UID.
        uid: Uid,
    },
    /// `COPYUID` (RFC 4315): the UID mapping produced by a COPY/MOVE.
    CopyUid {
        /// Destination mailbox's UIDVALIDITY.
        uid_validity: UidValidity,
        /// Source UIDs, in the order copied.
        source: UidSet,
        /// Corresponding destination UIDs, same order.
        destination: UidSet,
    },
    /// `HIGHESTMODSEQ` (CONDSTORE).
    HighestModSeq(u64),
    /// `NOMODSEQ` (CONDSTORE): the mailbox does not support mod-sequences.
    NoModSeq,
    /// An unrecognized code, preserved with its optional trailing text.
    Other(String, Option<String>),
}

/// An untagged server greeting, the very first line on a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Greeting {
    /// The greeting's status.
    pub status: GreetingStatus,
    /// An optional bracketed response code.
    pub code: Option<ResponseCode>,
    /// Human-readable text.
    pub text: String,
}

/// A tagged completion: the server's final word on one client command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedCompletion {
    /// The client tag this completion answers.
    pub tag: crate::types::Tag,
    /// Whether the command succeeded, was refused, or was malformed.
    pub status: CompletionStatus,
    /// An optional bracketed response code.
    pub code: Option<ResponseCode>,
    /// Human-readable text.
    pub text: String,
}

/// A server continuation request (`+ ...`), inviting the client to send
/// more data (a literal's payload, or the next step of an AUTHENTICATE
/// challenge/response exchange).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContinuationRequest {
    /// Trailing text or base64 challenge data, if any.
    pub text: Option<String>,
}

/// How a streamed FETCH attribute's bytes are scoped: a whole RFC822
/// envelope form, or a MIME section addressed by [`Section`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamingAttributeKind {
    /// `RFC822`
    Rfc822,
    /// `RFC822.HEADER`
    Rfc822Header,
    /// `RFC822.TEXT`
    Rfc822Text,
    /// `BODY[section]`
    Body(Section),
    /// `BINARY[section]`
    Binary(Section),
}

/// One fully-available FETCH attribute value: either a small, inherently
/// bounded value, or a body-section value small enough that the framer
/// inlined its literal payload in full.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchAttribute {
    /// `FLAGS`
    Flags(Flags),
    /// `INTERNALDATE`
    InternalDate(String),
    /// `RFC822.SIZE`
    Rfc822Size(u32),
    /// `ENVELOPE`
    Envelope(Envelope),
    /// `BODY`/`BODYSTRUCTURE`
    BodyStructure(BodyStructure),
    /// `UID`
    Uid(Uid),
    /// `MODSEQ` (CONDSTORE)
    ModSeq(u64),
    /// `BINARY.SIZE[section]`
    BinarySize {
        /// Which part the size describes.
        section: Section,
        /// Decoded byte size.
        size: u32,
    },
    /// A body-section value ( `RFC822`/`RFC822.HEADER`/`RFC822.TEXT`/
    /// `BODY[section]`/`BINARY[section]` ) small enough to have arrived
    /// inlined in a single framer line rather than streamed.
    BodySection {
        /// Which section/form this is.
        kind: StreamingAttributeKind,
        /// `<origin>` partial-fetch offset, if the server reported one.
        origin: Option<u32>,
        /// The full payload.
        data: Vec<u8>,
    },
}

/// Non-FETCH untagged response data: the leaf shapes that always arrive
/// fully inlined in a single logical line (see [`super::parse::response_data`]).
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseData {
    /// An untagged `OK`/`NO`/`BAD`/`BYE`/`PREAUTH` status response, as
    /// opposed to the connection-opening [`Greeting`] or a [`TaggedCompletion`].
    Status {
        /// Which status keyword this is.
        kind: UntaggedStatusKind,
        /// An optional bracketed response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// `CAPABILITY`
    Capability(Vec<Capability>),
    /// `LIST`
    List(ListResponse),
    /// `LSUB`
    Lsub(ListResponse),
    /// `FLAGS`
    Flags(Flags),
    /// `EXISTS`
    Exists(u32),
    /// `RECENT`
    Recent(u32),
    /// `EXPUNGE`
    Expunge(SeqNum),
    /// `SEARCH`, carrying whichever identifier space the issuing command used.
    Search(Vec<u32>),
    /// `STATUS`
    MailboxStatus {
        /// The mailbox the attributes describe.
        mailbox: Mailbox,
        /// Reported attribute/value pairs.
        items: Vec<StatusAttribute>,
    },
    /// `ENABLED` (RFC 5161): capabilities the server actually turned on.
    Enabled(Vec<Capability>),
    /// A response this parser does not individually model, with its
    /// uppercased keyword and raw remaining text preserved verbatim.
    Extension {
        /// The untagged keyword (`NAMESPACE`, `ID`, `METADATA`, ...).
        keyword: String,
        /// Raw text following the keyword, not including the trailing CRLF.
        text: String,
    },
}

/// A complete untagged response value ready to serialize: either a leaf
/// [`ResponseData`], or a FETCH with its attribute list fully assembled
/// (the server already holds every attribute in memory when it writes a
/// response, unlike the incremental [`super::ResponseEvent`] stream a
/// client parses one piece at a time).
#[derive(Debug, Clone, PartialEq)]
pub enum UntaggedResponse {
    /// A non-FETCH untagged response.
    Data(ResponseData),
    /// `* <seq> FETCH (...)`.
    Fetch {
        /// Which message this FETCH response describes.
        seq: SeqNum,
        /// The attribute list, in wire order.
        attributes: Vec<FetchAttribute>,
    },
}

/// A complete response value, as written in a single pass by
/// [`super::encode::write_response`].
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// The connection-opening greeting.
    Greeting(Greeting),
    /// An untagged response.
    Untagged(UntaggedResponse),
    /// A tagged completion.
    Tagged(TaggedCompletion),
    /// A continuation request.
    Continuation(ContinuationRequest),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_code_other_preserves_keyword_and_text() {
        let code = ResponseCode::Other("CLOSED".into(), Some("mailbox unselected".into()));
        assert_eq!(code, ResponseCode::Other("CLOSED".into(), Some("mailbox unselected".into())));
    }

    #[test]
    fn fetch_attribute_body_section_round_trips_fields() {
        let attr = FetchAttribute::BodySection {
            kind: StreamingAttributeKind::Rfc822Text,
            origin: Some(0),
            data: b"hello".to_vec(),
        };
        match attr {
            FetchAttribute::BodySection { kind, origin, data } => {
                assert_eq!(kind, StreamingAttributeKind::Rfc822Text);
                assert_eq!(origin, Some(0));
                assert_eq!(data, b"hello");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
