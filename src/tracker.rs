//! Recursion-depth tracking for the grammar parser.

use std::cell::Cell;

use crate::error::Error;

/// Bounds recursive-descent depth so a maliciously or accidentally deep
/// nested production (parenthesized lists, `composite` within `composite`)
/// cannot exhaust the call stack.
///
/// Depth is tracked via a `Cell` rather than `&mut self` so that a [`Guard`]
/// held by an outer recursive call and a new [`Self::enter`] made by an
/// inner one can coexist as ordinary shared borrows.
#[derive(Debug)]
pub struct StackTracker {
    depth: Cell<usize>,
    bound: usize,
}

impl StackTracker {
    /// Creates a tracker that allows at most `bound` nested [`Self::enter`] calls.
    #[must_use]
    pub const fn new(bound: usize) -> Self {
        Self {
            depth: Cell::new(0),
            bound,
        }
    }

    /// Current nesting depth.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth.get()
    }

    /// Enters one level of composite-production nesting.
    ///
    /// Returns [`Error::StackOverflow`] if the configured bound would be exceeded;
    /// on success, returns a [`Guard`] that decrements the depth when dropped.
    pub fn enter(&self) -> Result<Guard<'_>, Error> {
        if self.depth.get() >= self.bound {
            return Err(Error::StackOverflow { bound: self.bound });
        }
        self.depth.set(self.depth.get() + 1);
        Ok(Guard { tracker: self })
    }
}

/// RAII guard returned by [`StackTracker::enter`]; decrements depth on drop
/// regardless of whether the guarded production succeeded, failed, or
/// returned `Incomplete`.
pub struct Guard<'a> {
    tracker: &'a StackTracker,
}

impl Drop for Guard<'_> {
    fn drop(&mut self) {
        self.tracker.depth.set(self.tracker.depth.get().saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enter_exit_restores_depth() {
        let mut tracker = StackTracker::new(4);
        {
            let _g = tracker.enter().unwrap();
            assert_eq!(tracker.depth(), 1);
        }
        assert_eq!(tracker.depth(), 0);
    }

    #[test]
    fn exceeding_bound_is_stack_overflow() {
        let mut tracker = StackTracker::new(2);
        let _g1 = tracker.enter().unwrap();
        let _g2 = tracker.enter().unwrap();
        assert!(matches!(
            tracker.enter(),
            Err(Error::StackOverflow { bound: 2 })
        ));
    }

    #[test]
    fn nested_enters_unwind_in_order() {
        let mut tracker = StackTracker::new(8);
        let g1 = tracker.enter().unwrap();
        {
            let _g2 = tracker.enter().unwrap();
            assert_eq!(tracker.depth(), 2);
        }
        assert_eq!(tracker.depth(), 1);
        drop(g1);
        assert_eq!(tracker.depth(), 0);
    }
}
