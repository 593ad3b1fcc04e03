//! Crate-wide error type.

use thiserror::Error as ThisError;

/// Errors surfaced by the framer, grammar parser, and pipelining scheduler.
///
/// `Incomplete` is deliberately *not* a variant here: needing more bytes is
/// not an error, it is a normal suspension point (see [`crate::ParseOutcome`]).
/// Every variant in this enum is fatal for the line, response, or connection
/// it was raised against.
#[derive(Debug, ThisError, Clone, PartialEq, Eq)]
pub enum Error {
    /// The framer's accumulator exceeded its configured cap before a
    /// complete logical line (or literal-streaming transition) was found.
    #[error("line exceeded buffer_size_limit ({limit} bytes) at offset {offset}")]
    LineTooLong {
        /// The configured cap that was exceeded.
        limit: usize,
        /// Byte offset into the accumulator where the overflow was detected.
        offset: usize,
    },

    /// A grammar production rejected the input.
    #[error("invalid syntax at byte {position} while parsing {production}: {hint}")]
    InvalidSyntax {
        /// Byte offset, relative to the start of the value being parsed, of the failure.
        position: usize,
        /// Name of the production that rejected the input.
        production: &'static str,
        /// Human-readable detail.
        hint: String,
    },

    /// Recursive-descent depth exceeded the stack tracker's bound.
    #[error("recursion depth exceeded bound of {bound}")]
    StackOverflow {
        /// The configured bound.
        bound: usize,
    },

    /// An internal invariant was violated (e.g. leftover bytes after a
    /// non-streaming command, or a mode transition attempted from the
    /// wrong state).
    #[error("invariant violation: {detail} (fragment: {fragment:?})")]
    InvariantViolation {
        /// What invariant was broken.
        detail: String,
        /// The offending fragment, truncated if large, for diagnostics.
        fragment: Vec<u8>,
    },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn invariant(detail: impl Into<String>, fragment: &[u8]) -> Self {
        const MAX_FRAGMENT: usize = 64;
        let fragment = if fragment.len() > MAX_FRAGMENT {
            fragment[..MAX_FRAGMENT].to_vec()
        } else {
            fragment.to_vec()
        };
        Self::InvariantViolation {
            detail: detail.into(),
            fragment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_too_long_display() {
        let err = Error::LineTooLong {
            limit: 1024,
            offset: 2048,
        };
        assert!(err.to_string().contains("1024"));
    }

    #[test]
    fn invariant_truncates_long_fragments() {
        let fragment = vec![b'x'; 200];
        let err = Error::invariant("leftover bytes", &fragment);
        match err {
            Error::InvariantViolation { fragment, .. } => assert_eq!(fragment.len(), 64),
            _ => unreachable!("expected InvariantViolation"),
        }
    }
}
