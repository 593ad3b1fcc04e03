//! Shared wire-encoding primitives used by [`crate::command::encode`] and
//! [`crate::response::encode`].
//!
//! Both encoders serialize structured values into a sequence of chunks
//! rather than one flat byte vector, because a synchronizing literal
//! (`{N}\r\n`) requires the writer to stop and await a `+` continuation from
//! the peer before the literal's payload may follow. A non-chunked encoder
//! would have no place to express that pause.

/// One piece of encoded output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// The encoded bytes.
    pub bytes: Vec<u8>,
    /// `true` if this chunk ends immediately before a synchronizing
    /// literal's payload — the caller must await a `+` continuation
    /// request from the peer before sending the next chunk.
    pub wait_for_continuation: bool,
}

/// Accumulates encoded bytes, splitting into [`Chunk`]s at synchronizing
/// literal boundaries.
#[derive(Debug, Clone, Default)]
pub struct EncodeBuffer {
    chunks: Vec<Chunk>,
    current: Vec<u8>,
}

impl EncodeBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends raw bytes to the chunk currently being assembled.
    pub fn push(&mut self, bytes: &[u8]) {
        self.current.extend_from_slice(bytes);
    }

    /// Appends a single byte.
    pub fn push_byte(&mut self, b: u8) {
        self.current.push(b);
    }

    /// Closes the current chunk, marking it as awaiting a continuation
    /// request before the next chunk may be sent (used immediately after
    /// writing a synchronizing literal's `{N}\r\n` header).
    pub fn end_chunk_awaiting_continuation(&mut self) {
        let bytes = std::mem::take(&mut self.current);
        self.chunks.push(Chunk {
            bytes,
            wait_for_continuation: true,
        });
    }

    /// Closes the current chunk without expecting a continuation (used at
    /// the end of an entire encoded value, and between non-synchronizing
    /// literals).
    pub fn end_chunk(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let bytes = std::mem::take(&mut self.current);
        self.chunks.push(Chunk {
            bytes,
            wait_for_continuation: false,
        });
    }

    /// Finalizes any trailing partial chunk and returns the complete chunk
    /// sequence, in order.
    #[must_use]
    pub fn finish(mut self) -> Vec<Chunk> {
        self.end_chunk();
        self.chunks
    }
}

/// How a string should be serialized on the wire, per the literal-selection
/// rule: a bare atom if every byte is an `ATOM-CHAR`, quoted if every byte is
/// a `QUOTED-CHAR` (quotes and backslashes are escaped in place), `literal8`
/// (`~{N}`) if a NUL is present, otherwise a plain literal (`{N}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringForm {
    /// Safe to send bare, with no surrounding quotes.
    Atom,
    /// Safe to wrap in `"..."`, escaping `"` and `\` in place.
    Quoted,
    /// Must be sent as `{N}\r\n` followed by the raw bytes.
    Literal,
    /// Contains a NUL byte; must be sent as `~{N}\r\n` (RFC 3516 `literal8`).
    Literal8,
}

/// `atom-specials`: bytes that may not appear in a bare atom even though
/// they're otherwise 7-bit clean, printable characters.
const ATOM_SPECIALS: &[u8] = b"(){ %*\"\\]\r\n";

fn is_atom_char(b: u8) -> bool {
    b > 0x1f && b != 0x7f && b.is_ascii() && !ATOM_SPECIALS.contains(&b)
}

/// Classifies how `s` must be encoded. `QUOTED-CHAR` is any `TEXT-CHAR`
/// (7-bit, no CR/LF) — `"` and `\` are representable, just escaped.
#[must_use]
pub fn classify_string(s: &[u8]) -> StringForm {
    if s.contains(&0) {
        return StringForm::Literal8;
    }
    if !s.is_empty() && s.iter().all(|&b| is_atom_char(b)) {
        return StringForm::Atom;
    }
    let quotable = s.iter().all(|&b| b.is_ascii() && b != b'\r' && b != b'\n');
    if quotable {
        StringForm::Quoted
    } else {
        StringForm::Literal
    }
}

/// Writes `s` to `buf` choosing atom/quoted/literal/literal8 per
/// [`classify_string`]. For literal forms, ends the chunk awaiting a
/// continuation and returns `true`; the caller must append the raw payload
/// bytes to a fresh chunk once the continuation has been observed.
pub fn write_string(buf: &mut EncodeBuffer, s: &[u8]) -> bool {
    match classify_string(s) {
        StringForm::Atom => {
            buf.push(s);
            false
        }
        StringForm::Quoted => {
            buf.push_byte(b'"');
            for &b in s {
                if b == b'"' || b == b'\\' {
                    buf.push_byte(b'\\');
                }
                buf.push_byte(b);
            }
            buf.push_byte(b'"');
            false
        }
        StringForm::Literal => {
            buf.push(format!("{{{}}}\r\n", s.len()).as_bytes());
            buf.end_chunk_awaiting_continuation();
            buf.push(s);
            true
        }
        StringForm::Literal8 => {
            buf.push(format!("~{{{}}}\r\n", s.len()).as_bytes());
            buf.end_chunk_awaiting_continuation();
            buf.push(s);
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_plain_ascii_as_atom() {
        assert_eq!(classify_string(b"hello"), StringForm::Atom);
    }

    #[test]
    fn classifies_nul_as_literal8() {
        assert_eq!(classify_string(b"a\0b"), StringForm::Literal8);
    }

    #[test]
    fn classifies_space_containing_as_quoted() {
        assert_eq!(classify_string(b"has \" quote"), StringForm::Quoted);
    }

    #[test]
    fn classifies_crlf_containing_as_literal() {
        assert_eq!(classify_string(b"line1\r\nline2"), StringForm::Literal);
    }

    #[test]
    fn write_string_atom_is_sent_bare() {
        let mut buf = EncodeBuffer::new();
        let chunked = write_string(&mut buf, b"INBOX");
        assert!(!chunked);
        let chunks = buf.finish();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].bytes, b"INBOX");
    }

    #[test]
    fn write_string_quoted_escapes_in_place() {
        let mut buf = EncodeBuffer::new();
        let chunked = write_string(&mut buf, br#"say "hi""#);
        assert!(!chunked);
        let chunks = buf.finish();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].bytes, br#""say \"hi\"""#);
        assert!(!chunks[0].wait_for_continuation);
    }

    #[test]
    fn write_string_literal_splits_chunk_at_header() {
        let mut buf = EncodeBuffer::new();
        let chunked = write_string(&mut buf, b"line1\r\nline2");
        assert!(chunked);
        let chunks = buf.finish();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].bytes, b"{12}\r\n");
        assert!(chunks[0].wait_for_continuation);
        assert_eq!(chunks[1].bytes, b"line1\r\nline2");
        assert!(!chunks[1].wait_for_continuation);
    }
}
