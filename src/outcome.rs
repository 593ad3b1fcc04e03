//! The suspend/succeed/fail vocabulary shared by every grammar production.

use crate::error::Error;

/// The result of attempting a grammar production.
///
/// `Incomplete` is carried on the success side of the outer `Result`
/// precisely because it is not an error (see [`crate::error::Error`]'s
/// doc comment) — only [`Error`] variants are fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome<T> {
    /// The production matched fully; the cursor has been advanced past it.
    Done(T),
    /// Not enough bytes were available to decide; the cursor is left
    /// wherever the caller passed it in (productions must not partially
    /// consume on `Incomplete` — see [`crate::grammar::composite`]).
    Incomplete,
}

/// A production either completes, needs more bytes, or fails fatally.
pub type ParseResult<T> = Result<ParseOutcome<T>, Error>;

impl<T> ParseOutcome<T> {
    /// Maps the success value, leaving `Incomplete` untouched.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ParseOutcome<U> {
        match self {
            Self::Done(v) => ParseOutcome::Done(f(v)),
            Self::Incomplete => ParseOutcome::Incomplete,
        }
    }

    /// `true` if this outcome is `Done`.
    #[must_use]
    pub const fn is_done(&self) -> bool {
        matches!(self, Self::Done(_))
    }

    /// Extracts the done value, if any.
    #[must_use]
    pub fn done(self) -> Option<T> {
        match self {
            Self::Done(v) => Some(v),
            Self::Incomplete => None,
        }
    }
}

/// Shorthand for constructing a `Done` outcome wrapped in `Ok`.
pub(crate) fn done<T>(value: T) -> ParseResult<T> {
    Ok(ParseOutcome::Done(value))
}

/// Shorthand for constructing an `Incomplete` outcome wrapped in `Ok`.
pub(crate) fn incomplete<T>() -> ParseResult<T> {
    Ok(ParseOutcome::Incomplete)
}
