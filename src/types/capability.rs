//! Server capabilities and status-response attributes.

use std::fmt;

/// A server capability, as advertised in the greeting or a CAPABILITY response.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Capability {
    /// `IMAP4rev1`
    Imap4Rev1,
    /// `IMAP4rev2`
    Imap4Rev2,
    /// `IDLE` (RFC 2177)
    Idle,
    /// `ENABLE` (RFC 5161)
    Enable,
    /// `NAMESPACE` (RFC 2342)
    Namespace,
    /// `UIDPLUS` (RFC 4315)
    UidPlus,
    /// `MOVE` (RFC 6851)
    Move,
    /// `CONDSTORE` (RFC 7162)
    CondStore,
    /// `QRESYNC` (RFC 7162)
    QResync,
    /// `LITERAL+` (RFC 7888)
    LiteralPlus,
    /// `LITERAL-` (RFC 7888)
    LiteralMinus,
    /// `BINARY` (RFC 3516)
    Binary,
    /// `ESEARCH` (RFC 4731)
    ESearch,
    /// `SEARCHRES` (RFC 5182)
    SearchRes,
    /// `SPECIAL-USE` (RFC 6154)
    SpecialUse,
    /// `LIST-EXTENDED` (RFC 5258)
    ListExtended,
    /// `LIST-STATUS` (RFC 5819)
    ListStatus,
    /// `STARTTLS`
    StartTls,
    /// `AUTH=<mechanism>`
    Auth(String),
    /// An unrecognized capability token, preserved verbatim.
    Unknown(String),
}

impl Capability {
    /// Parses a capability token's text.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if let Some(mechanism) = raw.strip_prefix("AUTH=").or_else(|| raw.strip_prefix("auth=")) {
            return Self::Auth(mechanism.to_string());
        }
        match raw.to_ascii_uppercase().as_str() {
            "IMAP4REV1" => Self::Imap4Rev1,
            "IMAP4REV2" => Self::Imap4Rev2,
            "IDLE" => Self::Idle,
            "ENABLE" => Self::Enable,
            "NAMESPACE" => Self::Namespace,
            "UIDPLUS" => Self::UidPlus,
            "MOVE" => Self::Move,
            "CONDSTORE" => Self::CondStore,
            "QRESYNC" => Self::QResync,
            "LITERAL+" => Self::LiteralPlus,
            "LITERAL-" => Self::LiteralMinus,
            "BINARY" => Self::Binary,
            "ESEARCH" => Self::ESearch,
            "SEARCHRES" => Self::SearchRes,
            "SPECIAL-USE" => Self::SpecialUse,
            "LIST-EXTENDED" => Self::ListExtended,
            "LIST-STATUS" => Self::ListStatus,
            "STARTTLS" => Self::StartTls,
            _ => Self::Unknown(raw.to_string()),
        }
    }
}

/// The STATUS-ATT-LIST attribute names (RFC 3501 §6.3.10, RFC 7162 extensions).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// `MESSAGES`
    Messages,
    /// `RECENT`
    Recent,
    /// `UIDNEXT`
    UidNext,
    /// `UIDVALIDITY`
    UidValidity,
    /// `UNSEEN`
    Unseen,
    /// `HIGHESTMODSEQ` (CONDSTORE)
    HighestModSeq,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Messages => "MESSAGES",
            Self::Recent => "RECENT",
            Self::UidNext => "UIDNEXT",
            Self::UidValidity => "UIDVALIDITY",
            Self::Unseen => "UNSEEN",
            Self::HighestModSeq => "HIGHESTMODSEQ",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_capability() {
        assert_eq!(Capability::parse("IMAP4rev1"), Capability::Imap4Rev1);
        assert_eq!(Capability::parse("idle"), Capability::Idle);
    }

    #[test]
    fn parse_auth_mechanism() {
        assert_eq!(Capability::parse("AUTH=PLAIN"), Capability::Auth("PLAIN".into()));
    }

    #[test]
    fn parse_unknown_falls_through() {
        assert_eq!(Capability::parse("X-FOO"), Capability::Unknown("X-FOO".into()));
    }

    #[test]
    fn status_display_matches_wire_keyword() {
        assert_eq!(Status::UidNext.to_string(), "UIDNEXT");
        assert_eq!(Status::HighestModSeq.to_string(), "HIGHESTMODSEQ");
    }
}
