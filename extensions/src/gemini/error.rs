use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use semascope_core::embedding::EmbeddingError;

/// Error structure returned by the Gemini API.
#[derive(Deserialize, Debug, Clone)]
pub struct GeminiErrorResponse {
    pub error: GeminiErrorDetail,
}

/// Details of a Gemini API error.
#[derive(Deserialize, Debug, Clone)]
pub struct GeminiErrorDetail {
    /// HTTP status code associated with the error (might differ from the
    /// response status).
    pub code: u16,
    /// Developer-facing error message.
    pub message: String,
    /// Status string (e.g. "INVALID_ARGUMENT", "UNAUTHENTICATED").
    pub status: String,
}

/// Internal error type consolidating all failures within the Gemini client.
/// Converted into the public [`EmbeddingError`] at the trait boundary.
#[derive(Error, Debug)]
pub enum GeminiError {
    /// Error during network communication.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Error serializing the request body to JSON.
    #[error("Failed to serialize request body: {0}")]
    RequestSerialization(#[source] serde_json::Error),

    /// Error parsing a *successful* response body from the API.
    #[error("Failed to parse successful response body ({context}): {source}")]
    ResponseParsing {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Non-success status received from the Gemini API.
    #[error("Gemini API error: status={status}, message='{body_text}'")]
    Api {
        status: StatusCode,
        /// Parsed error details from the response body, if available.
        detail: Option<GeminiErrorDetail>,
        /// Raw response body text.
        body_text: String,
    },

    /// Invalid configuration provided to the client.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The API returned an unexpected response shape (e.g. an embedding
    /// count that does not match the request).
    #[error("Unexpected response format or data: {0}")]
    UnexpectedResponse(String),

    /// The number of input snippets exceeds the batch size limit.
    #[error("Input batch size too large (limit: {limit:?}, actual: {actual})")]
    BatchTooLarge { limit: Option<usize>, actual: usize },
}

/// Converts a `reqwest::Response` known to carry a non-success status into
/// a [`GeminiError::Api`], parsing the structured Gemini error body when
/// possible and falling back to the raw text otherwise.
pub(crate) async fn map_response_error(response: reqwest::Response) -> GeminiError {
    let status = response.status();
    debug_assert!(!status.is_success(), "map_response_error called with success status");

    match response.text().await {
        Ok(body_text) => match serde_json::from_str::<GeminiErrorResponse>(&body_text) {
            Ok(parsed) => GeminiError::Api {
                status,
                detail: Some(parsed.error),
                body_text,
            },
            Err(parse_err) => {
                warn!(
                    status = %status,
                    error = %parse_err,
                    "Failed to parse Gemini error response JSON, returning raw body."
                );
                GeminiError::Api {
                    status,
                    detail: None,
                    body_text,
                }
            }
        },
        Err(e) => {
            warn!(status = %status, error = %e, "Failed to read Gemini error response body text.");
            GeminiError::Network(e)
        }
    }
}

impl From<GeminiError> for EmbeddingError {
    fn from(err: GeminiError) -> Self {
        match err {
            GeminiError::Network(source) => EmbeddingError::Network(Box::new(source)),
            GeminiError::RequestSerialization(source) => {
                EmbeddingError::Provider(Box::new(GeminiError::RequestSerialization(source)))
            }
            GeminiError::ResponseParsing { source, .. } => {
                EmbeddingError::Parsing(Box::new(source))
            }
            GeminiError::Api {
                status,
                detail,
                body_text,
            } => {
                let message = detail
                    .map(|d| format!("{} (Status: {}, Code: {})", d.message, d.status, d.code))
                    .unwrap_or_else(|| body_text.clone());

                match status {
                    StatusCode::BAD_REQUEST => EmbeddingError::InvalidRequest(message),
                    StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                        EmbeddingError::Authentication(message)
                    }
                    StatusCode::NOT_FOUND => EmbeddingError::ModelNotFound(message),
                    StatusCode::TOO_MANY_REQUESTS => EmbeddingError::RateLimited,
                    _ => EmbeddingError::Api {
                        status: Some(status.as_u16()),
                        message,
                        source: None,
                    },
                }
            }
            GeminiError::InvalidConfiguration(msg) => EmbeddingError::Configuration(msg),
            GeminiError::UnexpectedResponse(msg) => EmbeddingError::Provider(msg.into()),
            GeminiError::BatchTooLarge { limit, actual } => {
                EmbeddingError::BatchTooLarge { limit, actual }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_error(status: StatusCode) -> GeminiError {
        GeminiError::Api {
            status,
            detail: None,
            body_text: "boom".to_string(),
        }
    }

    #[test]
    fn unauthorized_maps_to_authentication() {
        assert!(matches!(
            EmbeddingError::from(api_error(StatusCode::UNAUTHORIZED)),
            EmbeddingError::Authentication(_)
        ));
    }

    #[test]
    fn not_found_maps_to_model_not_found() {
        assert!(matches!(
            EmbeddingError::from(api_error(StatusCode::NOT_FOUND)),
            EmbeddingError::ModelNotFound(_)
        ));
    }

    #[test]
    fn too_many_requests_maps_to_rate_limited() {
        assert!(matches!(
            EmbeddingError::from(api_error(StatusCode::TOO_MANY_REQUESTS)),
            EmbeddingError::RateLimited
        ));
    }

    #[test]
    fn server_error_maps_to_api_with_status() {
        match EmbeddingError::from(api_error(StatusCode::INTERNAL_SERVER_ERROR)) {
            EmbeddingError::Api { status, .. } => assert_eq!(status, Some(500)),
            other => panic!("expected Api variant, got {other:?}"),
        }
    }

    #[test]
    fn batch_limit_carries_details_across_the_boundary() {
        let err = GeminiError::BatchTooLarge {
            limit: Some(100),
            actual: 101,
        };
        assert!(matches!(
            EmbeddingError::from(err),
            EmbeddingError::BatchTooLarge {
                limit: Some(100),
                actual: 101
            }
        ));
    }

    #[test]
    fn detail_message_is_preferred_over_raw_body() {
        let err = GeminiError::Api {
            status: StatusCode::BAD_REQUEST,
            detail: Some(GeminiErrorDetail {
                code: 400,
                message: "batch too large".to_string(),
                status: "INVALID_ARGUMENT".to_string(),
            }),
            body_text: "{...raw...}".to_string(),
        };
        match EmbeddingError::from(err) {
            EmbeddingError::InvalidRequest(message) => {
                assert!(message.contains("batch too large"));
                assert!(message.contains("INVALID_ARGUMENT"));
            }
            other => panic!("expected InvalidRequest, got {other:?}"),
        }
    }
}
