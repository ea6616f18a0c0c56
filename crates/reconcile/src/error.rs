//! Error types for reconciliation primitives.

/// Result type alias for reconcile operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the generic primitives themselves.
///
/// Callback errors are never wrapped: they are returned to the caller as-is.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A listing handed out the same next-page token twice.
    #[error("pagination cycle: page token {token} was returned more than once")]
    CursorCycle {
        /// The repeated token.
        token: String,
    },

    /// A rule document could not be parsed as JSON.
    #[error("invalid JSON in rule document: {0}")]
    InvalidJson(#[from] serde_json::Error),
}
