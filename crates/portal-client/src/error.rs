use thiserror::Error;

/// Failures constructing a client. Failures of individual calls are
/// [`portal_core::ServiceFailure`] values instead.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid API base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}
