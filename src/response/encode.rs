//! Serializes a complete [`Response`] value to wire bytes.
//!
//! Mirrors [`crate::command::encode`]'s shape one constructor at a time,
//! reusing the same [`EncodeBuffer`]/[`write_string`] literal-selection
//! rule. Unlike the client-side command encoder, a server never awaits its
//! own continuation request, so [`write_response`] always drains every
//! chunk [`EncodeBuffer`] produces into one flat byte vector rather than
//! handing chunk boundaries back to the caller.

use crate::encode::{write_string, EncodeBuffer};
use crate::grammar::{Address, BodyStructure, Envelope};
use crate::types::{Capability, Flags, ListResponse, Mailbox, MailboxAttribute};

use super::{
    CompletionStatus, ContinuationRequest, FetchAttribute, Greeting, GreetingStatus, Response,
    ResponseCode, ResponseData, StreamingAttributeKind, TaggedCompletion, UntaggedResponse,
    UntaggedStatusKind,
};

/// Encodes `response` in full, returning its wire bytes.
#[must_use]
pub fn write_response(response: &Response) -> Vec<u8> {
    let mut buf = EncodeBuffer::new();
    match response {
        Response::Greeting(g) => write_greeting(&mut buf, g),
        Response::Untagged(u) => write_untagged(&mut buf, u),
        Response::Tagged(t) => write_tagged(&mut buf, t),
        Response::Continuation(c) => write_continuation(&mut buf, c),
    }
    buf.finish().into_iter().flat_map(|chunk| chunk.bytes).collect()
}

fn write_greeting(buf: &mut EncodeBuffer, g: &Greeting) {
    buf.push(b"* ");
    buf.push(match g.status {
        GreetingStatus::Ok => b"OK" as &[u8],
        GreetingStatus::PreAuth => b"PREAUTH",
        GreetingStatus::Bye => b"BYE",
    });
    write_resp_text(buf, &g.code, &g.text);
    buf.push(b"\r\n");
}

fn write_tagged(buf: &mut EncodeBuffer, t: &TaggedCompletion) {
    buf.push(t.tag.as_str().as_bytes());
    buf.push(b" ");
    buf.push(match t.status {
        CompletionStatus::Ok => b"OK" as &[u8],
        CompletionStatus::No => b"NO",
        CompletionStatus::Bad => b"BAD",
    });
    write_resp_text(buf, &t.code, &t.text);
    buf.push(b"\r\n");
}

fn write_continuation(buf: &mut EncodeBuffer, c: &ContinuationRequest) {
    buf.push(b"+");
    if let Some(text) = &c.text {
        buf.push(b" ");
        buf.push(text.as_bytes());
    }
    buf.push(b"\r\n");
}

/// Writes `[" " resp-text-code] " " text`, the shape shared by greetings,
/// tagged completions, and untagged status responses.
fn write_resp_text(buf: &mut EncodeBuffer, code: &Option<ResponseCode>, text: &str) {
    if let Some(code) = code {
        buf.push(b" [");
        write_response_code(buf, code);
        buf.push(b"]");
    }
    if !text.is_empty() || code.is_none() {
        buf.push(b" ");
        buf.push(text.as_bytes());
    }
}

fn write_response_code(buf: &mut EncodeBuffer, code: &ResponseCode) {
    match code {
        ResponseCode::Alert => buf.push(b"ALERT"),
        ResponseCode::Parse => buf.push(b"PARSE"),
        ResponseCode::ReadOnly => buf.push(b"READ-ONLY"),
        ResponseCode::ReadWrite => buf.push(b"READ-WRITE"),
        ResponseCode::TryCreate => buf.push(b"TRYCREATE"),
        ResponseCode::NoModSeq => buf.push(b"NOMODSEQ"),
        ResponseCode::Capability(caps) => {
            buf.push(b"CAPABILITY");
            for cap in caps {
                buf.push(b" ");
                buf.push(capability_token(cap).as_bytes());
            }
        }
        ResponseCode::PermanentFlags(flags) => {
            buf.push(b"PERMANENTFLAGS ");
            write_flag_list(buf, flags);
        }
        ResponseCode::UidNext(uid) => buf.push(format!("UIDNEXT {uid}").as_bytes()),
        ResponseCode::UidValidity(v) => buf.push(format!("UIDVALIDITY {v}").as_bytes()),
        ResponseCode::Unseen(seq) => buf.push(format!("UNSEEN {seq}").as_bytes()),
        ResponseCode::AppendUid { uid_validity, uid } => {
            buf.push(format!("APPENDUID {uid_validity} {uid}").as_bytes());
        }
        ResponseCode::CopyUid { uid_validity, source, destination } => {
            buf.push(format!("COPYUID {uid_validity} {source} {destination}").as_bytes());
        }
        ResponseCode::HighestModSeq(v) => buf.push(format!("HIGHESTMODSEQ {v}").as_bytes()),
        ResponseCode::Other(keyword, text) => {
            buf.push(keyword.as_bytes());
            if let Some(text) = text {
                buf.push(b" ");
                buf.push(text.as_bytes());
            }
        }
    }
}

fn capability_token(cap: &Capability) -> String {
    match cap {
        Capability::Imap4Rev1 => "IMAP4rev1".to_string(),
        Capability::Imap4Rev2 => "IMAP4rev2".to_string(),
        Capability::Idle => "IDLE".to_string(),
        Capability::Enable => "ENABLE".to_string(),
        Capability::Namespace => "NAMESPACE".to_string(),
        Capability::UidPlus => "UIDPLUS".to_string(),
        Capability::Move => "MOVE".to_string(),
        Capability::CondStore => "CONDSTORE".to_string(),
        Capability::QResync => "QRESYNC".to_string(),
        Capability::LiteralPlus => "LITERAL+".to_string(),
        Capability::LiteralMinus => "LITERAL-".to_string(),
        Capability::Binary => "BINARY".to_string(),
        Capability::ESearch => "ESEARCH".to_string(),
        Capability::SearchRes => "SEARCHRES".to_string(),
        Capability::SpecialUse => "SPECIAL-USE".to_string(),
        Capability::ListExtended => "LIST-EXTENDED".to_string(),
        Capability::ListStatus => "LIST-STATUS".to_string(),
        Capability::StartTls => "STARTTLS".to_string(),
        Capability::Auth(mechanism) => format!("AUTH={mechanism}"),
        Capability::Unknown(raw) => raw.clone(),
    }
}

fn mailbox_attribute_token(attr: &MailboxAttribute) -> String {
    match attr {
        MailboxAttribute::NoSelect => "\\Noselect".to_string(),
        MailboxAttribute::NoInferiors => "\\Noinferiors".to_string(),
        MailboxAttribute::Marked => "\\Marked".to_string(),
        MailboxAttribute::Unmarked => "\\Unmarked".to_string(),
        MailboxAttribute::HasChildren => "\\HasChildren".to_string(),
        MailboxAttribute::HasNoChildren => "\\HasNoChildren".to_string(),
        MailboxAttribute::SpecialUse(name) | MailboxAttribute::Extension(name) => {
            format!("\\{name}")
        }
    }
}

fn write_flag_list(buf: &mut EncodeBuffer, flags: &Flags) {
    buf.push(b"(");
    for (i, flag) in flags.iter().enumerate() {
        if i > 0 {
            buf.push(b" ");
        }
        buf.push(flag.to_string().as_bytes());
    }
    buf.push(b")");
}

fn write_mailbox(buf: &mut EncodeBuffer, mailbox: &Mailbox) {
    write_string(buf, mailbox.as_str().as_bytes());
}

fn write_nstring(buf: &mut EncodeBuffer, value: Option<&str>) {
    match value {
        Some(s) => {
            write_string(buf, s.as_bytes());
        }
        None => buf.push(b"NIL"),
    }
}

fn write_untagged(buf: &mut EncodeBuffer, response: &UntaggedResponse) {
    buf.push(b"* ");
    match response {
        UntaggedResponse::Data(data) => write_response_data(buf, data),
        UntaggedResponse::Fetch { seq, attributes } => {
            buf.push(format!("{seq} FETCH (").as_bytes());
            for (i, attr) in attributes.iter().enumerate() {
                if i > 0 {
                    buf.push(b" ");
                }
                write_fetch_attribute(buf, attr);
            }
            buf.push(b")");
        }
    }
    buf.push(b"\r\n");
}

fn write_response_data(buf: &mut EncodeBuffer, data: &ResponseData) {
    match data {
        ResponseData::Status { kind, code, text } => {
            buf.push(match kind {
                UntaggedStatusKind::Ok => b"OK" as &[u8],
                UntaggedStatusKind::No => b"NO",
                UntaggedStatusKind::Bad => b"BAD",
                UntaggedStatusKind::PreAuth => b"PREAUTH",
                UntaggedStatusKind::Bye => b"BYE",
            });
            write_resp_text(buf, code, text);
        }
        ResponseData::Capability(caps) => {
            buf.push(b"CAPABILITY");
            for cap in caps {
                buf.push(b" ");
                buf.push(capability_token(cap).as_bytes());
            }
        }
        ResponseData::Enabled(caps) => {
            buf.push(b"ENABLED");
            for cap in caps {
                buf.push(b" ");
                buf.push(capability_token(cap).as_bytes());
            }
        }
        ResponseData::List(list) => write_mailbox_list(buf, "LIST", list),
        ResponseData::Lsub(list) => write_mailbox_list(buf, "LSUB", list),
        ResponseData::Flags(flags) => {
            buf.push(b"FLAGS ");
            write_flag_list(buf, flags);
        }
        ResponseData::Exists(n) => buf.push(format!("{n} EXISTS").as_bytes()),
        ResponseData::Recent(n) => buf.push(format!("{n} RECENT").as_bytes()),
        ResponseData::Expunge(seq) => buf.push(format!("{seq} EXPUNGE").as_bytes()),
        ResponseData::Search(numbers) => {
            buf.push(b"SEARCH");
            for n in numbers {
                buf.push(format!(" {n}").as_bytes());
            }
        }
        ResponseData::MailboxStatus { mailbox, items } => {
            buf.push(b"STATUS ");
            write_mailbox(buf, mailbox);
            buf.push(b" (");
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    buf.push(b" ");
                }
                buf.push(format!("{} {}", item.name, item.value).as_bytes());
            }
            buf.push(b")");
        }
        ResponseData::Extension { keyword, text } => {
            buf.push(keyword.as_bytes());
            if !text.is_empty() {
                buf.push(b" ");
                buf.push(text.as_bytes());
            }
        }
    }
}

fn write_mailbox_list(buf: &mut EncodeBuffer, keyword: &str, list: &ListResponse) {
    buf.push(keyword.as_bytes());
    buf.push(b" (");
    for (i, attr) in list.attributes.iter().enumerate() {
        if i > 0 {
            buf.push(b" ");
        }
        buf.push(mailbox_attribute_token(attr).as_bytes());
    }
    buf.push(b") ");
    match list.delimiter {
        Some(c) => {
            let mut tmp = [0u8; 4];
            write_string(buf, c.encode_utf8(&mut tmp).as_bytes());
        }
        None => buf.push(b"NIL"),
    }
    buf.push(b" ");
    write_mailbox(buf, &list.mailbox);
}

fn write_fetch_attribute(buf: &mut EncodeBuffer, attr: &FetchAttribute) {
    match attr {
        FetchAttribute::Flags(flags) => {
            buf.push(b"FLAGS ");
            write_flag_list(buf, flags);
        }
        FetchAttribute::InternalDate(date) => {
            buf.push(b"INTERNALDATE ");
            write_string(buf, date.as_bytes());
        }
        FetchAttribute::Rfc822Size(n) => buf.push(format!("RFC822.SIZE {n}").as_bytes()),
        FetchAttribute::Envelope(env) => {
            buf.push(b"ENVELOPE ");
            write_envelope(buf, env);
        }
        FetchAttribute::BodyStructure(bs) => {
            buf.push(b"BODY ");
            write_body_structure_value(buf, bs);
        }
        FetchAttribute::Uid(uid) => buf.push(format!("UID {uid}").as_bytes()),
        FetchAttribute::ModSeq(v) => buf.push(format!("MODSEQ ({v})").as_bytes()),
        FetchAttribute::BinarySize { section, size } => {
            buf.push(format!("BINARY.SIZE[{section}] {size}").as_bytes());
        }
        FetchAttribute::BodySection { kind, origin, data } => {
            write_streaming_kind(buf, kind);
            if let Some(origin) = origin {
                buf.push(format!("<{origin}>").as_bytes());
            }
            buf.push(b" ");
            write_string(buf, data);
        }
    }
}

fn write_streaming_kind(buf: &mut EncodeBuffer, kind: &StreamingAttributeKind) {
    match kind {
        StreamingAttributeKind::Rfc822 => buf.push(b"RFC822"),
        StreamingAttributeKind::Rfc822Header => buf.push(b"RFC822.HEADER"),
        StreamingAttributeKind::Rfc822Text => buf.push(b"RFC822.TEXT"),
        StreamingAttributeKind::Body(section) => buf.push(format!("BODY[{section}]").as_bytes()),
        StreamingAttributeKind::Binary(section) => buf.push(format!("BINARY[{section}]").as_bytes()),
    }
}

fn write_envelope(buf: &mut EncodeBuffer, env: &Envelope) {
    buf.push(b"(");
    write_nstring(buf, env.date.as_deref());
    buf.push(b" ");
    write_nstring(buf, env.subject.as_deref());
    for addresses in [&env.from, &env.sender, &env.reply_to, &env.to, &env.cc, &env.bcc] {
        buf.push(b" ");
        write_address_list(buf, addresses);
    }
    buf.push(b" ");
    write_nstring(buf, env.in_reply_to.as_deref());
    buf.push(b" ");
    write_nstring(buf, env.message_id.as_deref());
    buf.push(b")");
}

fn write_address_list(buf: &mut EncodeBuffer, addresses: &[Address]) {
    if addresses.is_empty() {
        buf.push(b"NIL");
        return;
    }
    buf.push(b"(");
    for (i, addr) in addresses.iter().enumerate() {
        if i > 0 {
            buf.push(b" ");
        }
        write_address(buf, addr);
    }
    buf.push(b")");
}

fn write_address(buf: &mut EncodeBuffer, addr: &Address) {
    buf.push(b"(");
    write_nstring(buf, addr.name.as_deref());
    buf.push(b" ");
    write_nstring(buf, addr.adl.as_deref());
    buf.push(b" ");
    write_nstring(buf, addr.mailbox.as_deref());
    buf.push(b" ");
    write_nstring(buf, addr.host.as_deref());
    buf.push(b")");
}

fn write_body_structure_value(buf: &mut EncodeBuffer, bs: &BodyStructure) {
    match bs {
        BodyStructure::Nil => buf.push(b"NIL"),
        BodyStructure::Text(s) => {
            write_string(buf, s.as_bytes());
        }
        BodyStructure::Number(n) => buf.push(n.to_string().as_bytes()),
        BodyStructure::List(items) => {
            buf.push(b"(");
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    buf.push(b" ");
                }
                write_body_structure_value(buf, item);
            }
            buf.push(b")");
        }
    }
}
