//! Shared mode-transition helper for the command and response stream parsers.
//!
//! Both [`crate::command::stream::CommandParser`] and
//! [`crate::response::stream::ResponseParser`] are tagged unions with one
//! variant per mode, mutated only at well-defined event boundaries. Centralizing
//! the "assert current mode, then move" step here keeps that coupling explicit
//! instead of letting each call site reach into the mode field directly.

use crate::error::Error;

/// Asserts that `current` matches `expected` (by discriminant, via the
/// supplied predicate) and replaces it with `next`, returning an
/// [`Error::InvariantViolation`] if the assertion fails.
///
/// `expected` is a closure rather than a value so callers can match on a
/// mode variant without requiring `PartialEq` on payloads that don't need it
/// (e.g. matching any `StreamingBytes(_)` regardless of remaining count).
pub(crate) fn move_state_machine<M>(
    current: &mut M,
    expected: impl FnOnce(&M) -> bool,
    next: M,
    detail: &'static str,
) -> Result<(), Error> {
    if !expected(current) {
        return Err(Error::invariant(
            format!("mode transition attempted from unexpected state: {detail}"),
            &[],
        ));
    }
    *current = next;
    Ok(())
}
