//! Response values and their parsing/encoding/streaming.

pub mod encode;
pub mod parse;
pub mod stream;
mod types;

pub use types::{
    CompletionStatus, ContinuationRequest, FetchAttribute, Greeting, GreetingStatus,
    Response, ResponseCode, ResponseData, StreamingAttributeKind, TaggedCompletion,
    UntaggedResponse, UntaggedStatusKind,
};

/// Which point of the connection a particular [`ResponseEvent`] describes.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBegin {
    /// A non-FETCH untagged response, emitted whole: these always arrive
    /// fully inlined within one logical line, so there is nothing to
    /// stream.
    Data(ResponseData),
    /// The start of a FETCH response. Attribute events follow, terminated
    /// by [`ResponseEvent::AttributesFinish`].
    Fetch {
        /// Which message this FETCH response describes.
        seq: crate::types::SeqNum,
    },
}

/// One incremental unit of server output, as produced by
/// [`stream::ResponseParser::poll`].
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseEvent {
    /// The connection-opening greeting.
    Greeting(Greeting),
    /// The start of an untagged response.
    ResponseBegin(ResponseBegin),
    /// One fully-available FETCH attribute belonging to the most recent
    /// [`ResponseBegin::Fetch`].
    SimpleAttribute(FetchAttribute),
    /// A FETCH body-section/RFC822-form attribute too large to inline;
    /// its bytes follow as [`ResponseEvent::StreamingAttributeBytes`]
    /// events until [`ResponseEvent::StreamingAttributeEnd`].
    StreamingAttributeBegin {
        /// Which section/form is being streamed.
        kind: StreamingAttributeKind,
        /// `<origin>` partial-fetch offset, if the server reported one.
        origin: Option<u32>,
        /// Total declared byte size.
        size: usize,
        /// Whether the literal header was the `literal8` (`~{N}`) form,
        /// i.e. the bytes to follow may contain NUL.
        is_literal8: bool,
    },
    /// One chunk of a streaming attribute's payload.
    StreamingAttributeBytes(Vec<u8>),
    /// The streaming attribute begun by the most recent
    /// [`ResponseEvent::StreamingAttributeBegin`] is complete.
    StreamingAttributeEnd,
    /// The current FETCH response's attribute list is complete.
    AttributesFinish,
    /// The end of the current response: for a FETCH this is the closing
    /// parenthesis and terminating CRLF, otherwise it is folded directly
    /// into [`ResponseEvent::ResponseBegin`] by the caller.
    ResponseEnd,
    /// A tagged completion, finishing one client command.
    TaggedCompletion(TaggedCompletion),
    /// A continuation request, inviting the client to send more data.
    ContinuationRequest(ContinuationRequest),
}
