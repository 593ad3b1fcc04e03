//! Serializes [`CommandBody`] values to wire bytes.
//!
//! Mirrors the grammar parser's shape one constructor at a time, using the
//! shared [`crate::encode::EncodeBuffer`] so an astring chosen to go out as
//! a literal correctly splits the output into continuation-aware chunks.

use crate::encode::{write_string, EncodeBuffer};
use crate::grammar::{SearchKey, Section};
use crate::types::{Flag, SequenceSet, Tag};

use super::{
    AppendMessage, Command, CommandBody, FetchAttributeRequest, FetchRequest, IdSpace, StoreAction,
    StoreRequest,
};

/// Encodes `command` into one or more [`crate::encode::Chunk`]s via `buf`.
pub fn write_command(buf: &mut EncodeBuffer, command: &Command) {
    write_tag(buf, &command.tag);
    buf.push(b" ");
    if command.body.is_uid_based() {
        buf.push(b"UID ");
    }
    buf.push(command.body.keyword().as_bytes());
    write_command_args(buf, &command.body);
    buf.push(b"\r\n");
}

fn write_tag(buf: &mut EncodeBuffer, tag: &Tag) {
    buf.push(tag.as_str().as_bytes());
}

fn write_mailbox(buf: &mut EncodeBuffer, mailbox: &crate::types::Mailbox) {
    write_string(buf, mailbox.as_str().as_bytes());
}

fn write_command_args(buf: &mut EncodeBuffer, body: &CommandBody) {
    match body {
        CommandBody::Capability
        | CommandBody::Noop
        | CommandBody::Logout
        | CommandBody::StartTls
        | CommandBody::Check
        | CommandBody::Close
        | CommandBody::Idle
        | CommandBody::IdleDone => {}
        CommandBody::Login { user, password } => {
            buf.push(b" ");
            write_string(buf, user.as_bytes());
            buf.push(b" ");
            write_string(buf, password.as_bytes());
        }
        CommandBody::Authenticate { mechanism, initial_response } => {
            buf.push(b" ");
            buf.push(mechanism.as_bytes());
            if let Some(resp) = initial_response {
                buf.push(b" ");
                write_string(buf, resp);
            }
        }
        CommandBody::Select { mailbox }
        | CommandBody::Examine { mailbox }
        | CommandBody::Create { mailbox }
        | CommandBody::Delete { mailbox }
        | CommandBody::Subscribe { mailbox }
        | CommandBody::Unsubscribe { mailbox } => {
            buf.push(b" ");
            write_mailbox(buf, mailbox);
        }
        CommandBody::Rename { from, to } => {
            buf.push(b" ");
            write_mailbox(buf, from);
            buf.push(b" ");
            write_mailbox(buf, to);
        }
        CommandBody::List { reference, pattern } | CommandBody::Lsub { reference, pattern } => {
            buf.push(b" ");
            write_mailbox(buf, reference);
            buf.push(b" ");
            write_string(buf, pattern.as_bytes());
        }
        CommandBody::Status { mailbox, items } => {
            buf.push(b" ");
            write_mailbox(buf, mailbox);
            buf.push(b" (");
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    buf.push(b" ");
                }
                buf.push(item.to_string().as_bytes());
            }
            buf.push(b")");
        }
        CommandBody::Append { mailbox, message } => {
            buf.push(b" ");
            write_mailbox(buf, mailbox);
            write_append_message(buf, message);
        }
        CommandBody::Expunge { .. } => {}
        CommandBody::Search { criteria, charset, .. } => {
            buf.push(b" ");
            if let Some(cs) = charset {
                buf.push(b"CHARSET ");
                buf.push(cs.as_bytes());
                buf.push(b" ");
            }
            write_search_key(buf, criteria);
        }
        CommandBody::Fetch { sequence, request, .. } => {
            buf.push(b" ");
            buf.push(sequence.to_string().as_bytes());
            buf.push(b" ");
            write_fetch_request(buf, request);
        }
        CommandBody::Store { sequence, request, .. } => {
            buf.push(b" ");
            buf.push(sequence.to_string().as_bytes());
            buf.push(b" ");
            write_store_request(buf, request);
        }
        CommandBody::Copy { sequence, mailbox, .. } | CommandBody::Move { sequence, mailbox, .. } => {
            buf.push(b" ");
            buf.push(sequence.to_string().as_bytes());
            buf.push(b" ");
            write_mailbox(buf, mailbox);
        }
        CommandBody::Enable { capabilities } => {
            for cap in capabilities {
                buf.push(b" ");
                buf.push(cap.as_bytes());
            }
        }
        CommandBody::Extension { arguments, .. } => {
            if !arguments.is_empty() {
                buf.push(b" ");
                buf.push(arguments);
            }
        }
    }
}

fn write_append_message(buf: &mut EncodeBuffer, message: &AppendMessage) {
    if !message.flags.is_empty() {
        buf.push(b" (");
        for (i, flag) in message.flags.iter().enumerate() {
            if i > 0 {
                buf.push(b" ");
            }
            buf.push(flag.to_string().as_bytes());
        }
        buf.push(b")");
    }
    if let Some(date) = &message.internal_date {
        buf.push(b" \"");
        buf.push(date.as_bytes());
        buf.push(b"\"");
    }
    if message.is_literal8 {
        buf.push(format!(" ~{{{}}}\r\n", message.literal_length).as_bytes());
    } else {
        buf.push(format!(" {{{}}}\r\n", message.literal_length).as_bytes());
    }
    buf.end_chunk_awaiting_continuation();
}

fn write_fetch_request(buf: &mut EncodeBuffer, request: &FetchRequest) {
    match request {
        FetchRequest::All => buf.push(b"ALL"),
        FetchRequest::Full => buf.push(b"FULL"),
        FetchRequest::Fast => buf.push(b"FAST"),
        FetchRequest::Attributes(attrs) => {
            if attrs.len() == 1 {
                write_fetch_attribute(buf, &attrs[0]);
            } else {
                buf.push(b"(");
                for (i, attr) in attrs.iter().enumerate() {
                    if i > 0 {
                        buf.push(b" ");
                    }
                    write_fetch_attribute(buf, attr);
                }
                buf.push(b")");
            }
        }
    }
}

fn write_fetch_attribute(buf: &mut EncodeBuffer, attr: &FetchAttributeRequest) {
    match attr {
        FetchAttributeRequest::Flags => buf.push(b"FLAGS"),
        FetchAttributeRequest::InternalDate => buf.push(b"INTERNALDATE"),
        FetchAttributeRequest::Rfc822Size => buf.push(b"RFC822.SIZE"),
        FetchAttributeRequest::Envelope => buf.push(b"ENVELOPE"),
        FetchAttributeRequest::BodyStructure => buf.push(b"BODYSTRUCTURE"),
        FetchAttributeRequest::Uid => buf.push(b"UID"),
        FetchAttributeRequest::Rfc822 => buf.push(b"RFC822"),
        FetchAttributeRequest::Rfc822Header => buf.push(b"RFC822.HEADER"),
        FetchAttributeRequest::Rfc822Text => buf.push(b"RFC822.TEXT"),
        FetchAttributeRequest::ModSeq => buf.push(b"MODSEQ"),
        FetchAttributeRequest::Body { section, peek, partial } => {
            buf.push(if *peek { b"BODY.PEEK[" } else { b"BODY[" });
            buf.push(section.to_string().as_bytes());
            buf.push(b"]");
            write_partial(buf, partial);
        }
        FetchAttributeRequest::Binary { section, peek, partial } => {
            buf.push(if *peek { b"BINARY.PEEK[" } else { b"BINARY[" });
            buf.push(section.to_string().as_bytes());
            buf.push(b"]");
            write_partial(buf, partial);
        }
        FetchAttributeRequest::BinarySize { section } => {
            buf.push(b"BINARY.SIZE[");
            buf.push(section.to_string().as_bytes());
            buf.push(b"]");
        }
    }
}

fn write_partial(buf: &mut EncodeBuffer, partial: &Option<(u32, u32)>) {
    if let Some((start, len)) = partial {
        buf.push(format!("<{start}.{len}>").as_bytes());
    }
}

fn write_store_request(buf: &mut EncodeBuffer, request: &StoreRequest) {
    let (prefix, flags) = match &request.action {
        StoreAction::Set(f) => ("FLAGS", f),
        StoreAction::Add(f) => ("+FLAGS", f),
        StoreAction::Remove(f) => ("-FLAGS", f),
    };
    if let Some(modseq) = request.unchanged_since {
        buf.push(format!("(UNCHANGEDSINCE {modseq}) ").as_bytes());
    }
    buf.push(prefix.as_bytes());
    if request.silent {
        buf.push(b".SILENT");
    }
    buf.push(b" (");
    for (i, flag) in flags.iter().enumerate() {
        if i > 0 {
            buf.push(b" ");
        }
        buf.push(flag.to_string().as_bytes());
    }
    buf.push(b")");
}

fn write_search_key(buf: &mut EncodeBuffer, key: &SearchKey) {
    match key {
        SearchKey::All => buf.push(b"ALL"),
        SearchKey::Answered => buf.push(b"ANSWERED"),
        SearchKey::Deleted => buf.push(b"DELETED"),
        SearchKey::Draft => buf.push(b"DRAFT"),
        SearchKey::Flagged => buf.push(b"FLAGGED"),
        SearchKey::New => buf.push(b"NEW"),
        SearchKey::Old => buf.push(b"OLD"),
        SearchKey::Recent => buf.push(b"RECENT"),
        SearchKey::Seen => buf.push(b"SEEN"),
        SearchKey::Unanswered => buf.push(b"UNANSWERED"),
        SearchKey::Undeleted => buf.push(b"UNDELETED"),
        SearchKey::Undraft => buf.push(b"UNDRAFT"),
        SearchKey::Unflagged => buf.push(b"UNFLAGGED"),
        SearchKey::Unseen => buf.push(b"UNSEEN"),
        SearchKey::Bcc(s) => write_keyword_astring(buf, "BCC", s),
        SearchKey::Body(s) => write_keyword_astring(buf, "BODY", s),
        SearchKey::Cc(s) => write_keyword_astring(buf, "CC", s),
        SearchKey::From(s) => write_keyword_astring(buf, "FROM", s),
        SearchKey::Keyword(s) => write_keyword_astring(buf, "KEYWORD", s),
        SearchKey::Subject(s) => write_keyword_astring(buf, "SUBJECT", s),
        SearchKey::Text(s) => write_keyword_astring(buf, "TEXT", s),
        SearchKey::To(s) => write_keyword_astring(buf, "TO", s),
        SearchKey::Unkeyword(s) => write_keyword_astring(buf, "UNKEYWORD", s),
        SearchKey::Filter(s) => buf.push(s.as_bytes()),
        SearchKey::Before(d) => write_keyword_date(buf, "BEFORE", d),
        SearchKey::On(d) => write_keyword_date(buf, "ON", d),
        SearchKey::SentBefore(d) => write_keyword_date(buf, "SENTBEFORE", d),
        SearchKey::SentOn(d) => write_keyword_date(buf, "SENTON", d),
        SearchKey::SentSince(d) => write_keyword_date(buf, "SENTSINCE", d),
        SearchKey::Since(d) => write_keyword_date(buf, "SINCE", d),
        SearchKey::Larger(n) => buf.push(format!("LARGER {n}").as_bytes()),
        SearchKey::Smaller(n) => buf.push(format!("SMALLER {n}").as_bytes()),
        SearchKey::Older(n) => buf.push(format!("OLDER {n}").as_bytes()),
        SearchKey::Younger(n) => buf.push(format!("YOUNGER {n}").as_bytes()),
        SearchKey::Header(name, value) => {
            buf.push(b"HEADER ");
            write_string(buf, name.as_bytes());
            buf.push(b" ");
            write_string(buf, value.as_bytes());
        }
        SearchKey::SequenceSet(set) => buf.push(set.to_string().as_bytes()),
        SearchKey::Uid(set) => {
            buf.push(b"UID ");
            buf.push(set.to_string().as_bytes());
        }
        SearchKey::Not(inner) => {
            buf.push(b"NOT ");
            write_search_key(buf, inner);
        }
        SearchKey::Or(a, b) => {
            buf.push(b"OR ");
            write_search_key(buf, a);
            buf.push(b" ");
            write_search_key(buf, b);
        }
        SearchKey::And(keys) => {
            buf.push(b"(");
            for (i, k) in keys.iter().enumerate() {
                if i > 0 {
                    buf.push(b" ");
                }
                write_search_key(buf, k);
            }
            buf.push(b")");
        }
    }
}

fn write_keyword_astring(buf: &mut EncodeBuffer, keyword: &str, value: &str) {
    buf.push(keyword.as_bytes());
    buf.push(b" ");
    write_string(buf, value.as_bytes());
}

fn write_keyword_date(buf: &mut EncodeBuffer, keyword: &str, date: &crate::grammar::Date) {
    buf.push(keyword.as_bytes());
    buf.push(b" ");
    buf.push(date.to_string().as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Flags, Mailbox};

    fn finish(buf: EncodeBuffer) -> Vec<u8> {
        buf.finish().into_iter().flat_map(|c| c.bytes).collect()
    }

    #[test]
    fn encodes_simple_noop() {
        let mut buf = EncodeBuffer::new();
        let cmd = Command { tag: Tag::new("a1"), body: CommandBody::Noop };
        write_command(&mut buf, &cmd);
        assert_eq!(finish(buf), b"a1 NOOP\r\n");
    }

    #[test]
    fn encodes_uid_prefixed_fetch() {
        let mut buf = EncodeBuffer::new();
        let cmd = Command {
            tag: Tag::new("a2"),
            body: CommandBody::Fetch {
                id_space: IdSpace::Uid,
                sequence: SequenceSet::range(1, 5).unwrap(),
                request: FetchRequest::Attributes(vec![FetchAttributeRequest::Flags]),
            },
        };
        write_command(&mut buf, &cmd);
        assert_eq!(finish(buf), b"a2 UID FETCH 1:5 FLAGS\r\n");
    }

    #[test]
    fn encodes_select_with_quote_containing_mailbox() {
        let mut buf = EncodeBuffer::new();
        let cmd = Command {
            tag: Tag::new("a3"),
            body: CommandBody::Select { mailbox: Mailbox::from("has \" quote") },
        };
        write_command(&mut buf, &cmd);
        assert_eq!(finish(buf), b"a3 SELECT \"has \\\" quote\"\r\n");
    }

    #[test]
    fn encodes_select_with_literal_mailbox() {
        let mut buf = EncodeBuffer::new();
        let cmd = Command {
            tag: Tag::new("a3"),
            body: CommandBody::Select { mailbox: Mailbox::from("has\r\nbreak") },
        };
        write_command(&mut buf, &cmd);
        let chunks = buf.finish();
        assert!(chunks.len() > 1, "CRLF-containing mailbox name must use a literal");
    }

    #[test]
    fn encodes_append_ends_chunk_awaiting_continuation() {
        let mut buf = EncodeBuffer::new();
        let cmd = Command {
            tag: Tag::new("a4"),
            body: CommandBody::Append {
                mailbox: Mailbox::from("INBOX"),
                message: AppendMessage {
                    flags: Flags::new(),
                    internal_date: None,
                    literal_length: 10,
                    is_literal8: false,
                },
            },
        };
        write_command(&mut buf, &cmd);
        let chunks = buf.finish();
        assert_eq!(chunks[0].bytes, b"a4 APPEND INBOX {10}\r\n");
        assert!(chunks[0].wait_for_continuation);
    }

    #[test]
    fn encodes_append_literal8_with_tilde_prefix() {
        let mut buf = EncodeBuffer::new();
        let cmd = Command {
            tag: Tag::new("a5"),
            body: CommandBody::Append {
                mailbox: Mailbox::from("INBOX"),
                message: AppendMessage {
                    flags: Flags::new(),
                    internal_date: None,
                    literal_length: 10,
                    is_literal8: true,
                },
            },
        };
        write_command(&mut buf, &cmd);
        let chunks = buf.finish();
        assert_eq!(chunks[0].bytes, b"a5 APPEND INBOX ~{10}\r\n");
    }
}
