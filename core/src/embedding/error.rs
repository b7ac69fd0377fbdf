use std::error::Error as StdError;

use thiserror::Error;

/// Failures of an embedding provider call.
///
/// Provider crates map their internal error types into these variants at
/// the [`Embedder`](super::Embedder) trait boundary.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// Network error during API communication (connection refused, timeout,
    /// DNS resolution failure).
    #[error("Network error: {0}")]
    Network(#[source] Box<dyn StdError + Send + Sync>),

    /// Authentication failed (invalid API key, insufficient permissions).
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Error reported by the API backend.
    #[error("API error: status={status:?}, message={message}")]
    Api {
        /// HTTP status code from the API response, if available.
        status: Option<u16>,
        message: String,
        #[source]
        source: Option<Box<dyn StdError + Send + Sync>>,
    },

    /// The request was deemed invalid before or by the provider.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The API indicated a rate limit was exceeded.
    #[error("Rate limit exceeded")]
    RateLimited,

    /// The requested embedding model is not available.
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// Error parsing a successful response from the API.
    #[error("Response parsing error: {0}")]
    Parsing(#[source] Box<dyn StdError + Send + Sync>),

    /// The number of input snippets exceeds the provider's batch limit.
    #[error("Input batch size too large (limit: {limit:?}, actual: {actual})")]
    BatchTooLarge {
        limit: Option<usize>,
        actual: usize,
    },

    /// Error in the configuration of the client or provider.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A provider-specific error that fits no other category.
    #[error("Provider-specific error: {0}")]
    Provider(#[source] Box<dyn StdError + Send + Sync>),
}
