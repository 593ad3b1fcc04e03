//! Tunable limits shared by the framer, grammar parser, and scheduler.

/// Default accumulator cap before the framer must yield a line or enter
/// literal-streaming mode (8 KiB, matching common server buffer sizing).
pub const DEFAULT_BUFFER_SIZE_LIMIT: usize = 8 * 1024;

/// Default cap on a single literal before it is forced into streaming mode
/// regardless of how much headroom `buffer_size_limit` has (10 MiB).
pub const DEFAULT_MAX_LITERAL_SIZE: usize = 10 * 1024 * 1024;

/// Default recursion-depth bound for the grammar parser's stack tracker.
pub const DEFAULT_MAX_RECURSION_DEPTH: usize = 64;

/// Default cap on commands a [`crate::pipeline::PipelineQueue`] will queue
/// ahead of the in-flight set before rejecting new submissions.
pub const DEFAULT_MAX_PIPELINE_DEPTH: usize = 32;

/// Tunable limits for a single connection's framer, parser, and scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// See [`DEFAULT_BUFFER_SIZE_LIMIT`].
    pub buffer_size_limit: usize,
    /// See [`DEFAULT_MAX_LITERAL_SIZE`].
    pub max_literal_size: usize,
    /// See [`DEFAULT_MAX_RECURSION_DEPTH`].
    pub max_recursion_depth: usize,
    /// See [`DEFAULT_MAX_PIPELINE_DEPTH`].
    pub max_pipeline_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            buffer_size_limit: DEFAULT_BUFFER_SIZE_LIMIT,
            max_literal_size: DEFAULT_MAX_LITERAL_SIZE,
            max_recursion_depth: DEFAULT_MAX_RECURSION_DEPTH,
            max_pipeline_depth: DEFAULT_MAX_PIPELINE_DEPTH,
        }
    }
}

impl Limits {
    /// Starts a builder seeded with the defaults above.
    #[must_use]
    pub fn builder() -> LimitsBuilder {
        LimitsBuilder::new()
    }
}

/// Builder for [`Limits`].
#[derive(Debug, Clone, Copy)]
pub struct LimitsBuilder {
    limits: Limits,
}

impl LimitsBuilder {
    /// Creates a builder seeded with [`Limits::default`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            limits: Limits::default(),
        }
    }

    /// Sets the framer accumulator cap.
    #[must_use]
    pub const fn buffer_size_limit(mut self, limit: usize) -> Self {
        self.limits.buffer_size_limit = limit;
        self
    }

    /// Sets the per-literal cap before streaming mode is forced.
    #[must_use]
    pub const fn max_literal_size(mut self, limit: usize) -> Self {
        self.limits.max_literal_size = limit;
        self
    }

    /// Sets the stack tracker's recursion bound.
    #[must_use]
    pub const fn max_recursion_depth(mut self, depth: usize) -> Self {
        self.limits.max_recursion_depth = depth;
        self
    }

    /// Sets the pipeline queue depth cap.
    #[must_use]
    pub const fn max_pipeline_depth(mut self, depth: usize) -> Self {
        self.limits.max_pipeline_depth = depth;
        self
    }

    /// Builds the final [`Limits`].
    #[must_use]
    pub const fn build(self) -> Limits {
        self.limits
    }
}

impl Default for LimitsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
