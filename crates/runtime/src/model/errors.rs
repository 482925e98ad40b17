use thiserror::Error;

/// Errors from talking to the model provider.
///
/// Any of these aborts the current agent turn. They are never retried,
/// because a replayed request could replay side-effecting tool calls.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ModelError {
    /// The request never reached the provider, or the connection dropped.
    #[error("network: {0}")]
    Network(String),

    /// The provider answered with a non-success status.
    #[error("provider api: {0}")]
    Api(String),

    /// The provider response could not be parsed.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}
