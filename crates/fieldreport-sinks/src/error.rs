use thiserror::Error;

/// Failure of one sink dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    /// The backend could not be reached (connect error, timeout).
    #[error("sink unreachable: {0}")]
    Unreachable(String),

    /// The backend answered but refused the request.
    #[error("sink rejected the request: {0}")]
    Rejected(String),
}
