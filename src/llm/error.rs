use thiserror::Error;

/// Errors from an LLM provider.
///
/// The conversation driver treats the provider as an opaque RPC: none of
/// these are retried, they propagate to the caller.
#[derive(Debug, Error)]
pub enum LLMError {
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("api error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("model returned no choices")]
    EmptyResponse,
}
