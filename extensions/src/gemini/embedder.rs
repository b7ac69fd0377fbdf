use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument, trace, warn};
use url::Url;

use semascope_core::embedding::{Embedder, EmbeddingError};

use super::error::{map_response_error, GeminiError};
use super::shared::{GeminiConfig, SharedGeminiClient};

// Common limit for Gemini embedding models.
const BATCH_LIMIT: usize = 100;

/// [`Embedder`] implementation for Google Gemini models via the Generative
/// Language API.
///
/// Batched requests go to `:batchEmbedContents`, single-item requests to
/// `:embedContent`. Cloning shares the underlying HTTP client.
#[derive(Debug, Clone)]
pub struct GeminiEmbedder {
    shared_client: SharedGeminiClient,
    model_name: String,         // User-facing model name, e.g. "embedding-001"
    model_path_segment: String, // Path segment for API calls, e.g. "models/embedding-001"
    dimensions: Option<usize>,
}

impl GeminiEmbedder {
    /// Creates a new Gemini embedder with default settings.
    ///
    /// # Arguments
    /// * `api_key`: Your Google AI API key.
    /// * `model_name`: The name of the embedding model (e.g. "embedding-001").
    pub fn new(
        api_key: impl Into<String>,
        model_name: impl Into<String>,
    ) -> Result<Self, GeminiError> {
        let config = GeminiConfig::new(api_key)?;
        Self::from_config(config, model_name.into(), None)
    }

    /// Creates a new Gemini embedder from a pre-built configuration.
    #[instrument(name = "gemini_embedder_from_config", skip(config, client_override), fields(model_name = %model_name))]
    pub fn from_config(
        config: GeminiConfig,
        model_name: String,
        client_override: Option<Client>,
    ) -> Result<Self, GeminiError> {
        if model_name.is_empty() {
            return Err(GeminiError::InvalidConfiguration(
                "Model name cannot be empty".to_string(),
            ));
        }

        let shared_client = SharedGeminiClient::new(config, client_override)?;
        let model_path_segment = format!("models/{model_name}");

        let dimensions = match model_name.as_str() {
            "embedding-001" | "text-embedding-004" => Some(768),
            "gemini-embedding-001" => Some(3072),
            _ => {
                warn!(model = %model_name, "Unknown Gemini embedding model, dimensions not set.");
                None
            }
        };

        debug!(model = %model_name, dimensions = ?dimensions, "GeminiEmbedder created.");

        Ok(Self {
            shared_client,
            model_name,
            model_path_segment,
            dimensions,
        })
    }

    fn build_batch_embed_url(&self) -> Result<Url, GeminiError> {
        let path_segment = format!("{}:batchEmbedContents", self.model_path_segment);
        self.shared_client.build_url(&path_segment)
    }

    fn build_single_embed_url(&self) -> Result<Url, GeminiError> {
        let path_segment = format!("{}:embedContent", self.model_path_segment);
        self.shared_client.build_url(&path_segment)
    }

    /// Posts a JSON body and returns the raw body text of a successful
    /// response, mapping non-success statuses into [`GeminiError`].
    async fn post_json(&self, url: Url, request_json: String) -> Result<String, GeminiError> {
        let response = self
            .shared_client
            .http_client()
            .post(url)
            .header(
                "x-goog-api-key",
                self.shared_client.config().api_key.expose_secret(),
            )
            .header("Content-Type", "application/json")
            .body(request_json)
            .send()
            .await
            .map_err(GeminiError::Network)?;

        if !response.status().is_success() {
            let status = response.status();
            error!(%status, "Gemini embed API returned error status");
            return Err(map_response_error(response).await);
        }

        let status = response.status();
        debug!(%status, "Received successful response for embed request");
        response.text().await.map_err(GeminiError::Network)
    }
}

#[async_trait]
impl Embedder for GeminiEmbedder {
    #[instrument(skip(self, texts), fields(model = %self.model_name, num_texts = texts.len()))]
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f64>>, EmbeddingError> {
        async {
            if texts.is_empty() {
                debug!("Input texts slice is empty, returning empty embeddings.");
                return Ok(vec![]);
            }

            if texts.len() > BATCH_LIMIT {
                error!(requested = texts.len(), limit = BATCH_LIMIT, "Batch size exceeds limit");
                return Err(GeminiError::BatchTooLarge {
                    limit: Some(BATCH_LIMIT),
                    actual: texts.len(),
                });
            }

            let url = self.build_batch_embed_url()?;
            debug!(%url, "Sending batch embed request to Gemini");

            let requests: Vec<GeminiEmbedRequest> = texts
                .iter()
                .map(|text| GeminiEmbedRequest {
                    model: &self.model_path_segment,
                    content: GeminiContent {
                        parts: vec![GeminiPart { text }],
                    },
                })
                .collect();

            let request_json = serde_json::to_string(&GeminiBatchRequest { requests })
                .map_err(GeminiError::RequestSerialization)?;
            trace!(body = %request_json, "Constructed Gemini batch embed request body JSON");

            let raw_body = self.post_json(url, request_json).await?;

            let response_data: GeminiBatchResponse =
                serde_json::from_str(&raw_body).map_err(|e| {
                    error!(parse_error = %e, raw_body = %raw_body, "Failed to parse Gemini embed response JSON");
                    GeminiError::ResponseParsing {
                        context: "Parsing batch embed response".to_string(),
                        source: e,
                    }
                })?;

            if response_data.embeddings.len() != texts.len() {
                let msg = format!(
                    "API returned {} embeddings, but expected {}",
                    response_data.embeddings.len(),
                    texts.len()
                );
                error!(message = %msg, "Mismatch between input text count and received embeddings count");
                return Err(GeminiError::UnexpectedResponse(msg));
            }

            debug!(
                "Successfully parsed Gemini embed response, received {} embeddings.",
                response_data.embeddings.len()
            );
            Ok(response_data
                .embeddings
                .into_iter()
                .map(|e| e.values)
                .collect())
        }
        .await
        .map_err(EmbeddingError::from)
    }

    #[instrument(skip(self, text), fields(model = %self.model_name, text_len = text.len()))]
    async fn embed_one(&self, text: &str) -> Result<Vec<f64>, EmbeddingError> {
        async {
            let url = self.build_single_embed_url()?;
            debug!(%url, "Sending single embed request to Gemini");

            let request = GeminiEmbedRequest {
                model: &self.model_path_segment,
                content: GeminiContent {
                    parts: vec![GeminiPart { text }],
                },
            };
            let request_json =
                serde_json::to_string(&request).map_err(GeminiError::RequestSerialization)?;

            let raw_body = self.post_json(url, request_json).await?;

            let response_data: GeminiSingleResponse =
                serde_json::from_str(&raw_body).map_err(|e| {
                    error!(parse_error = %e, raw_body = %raw_body, "Failed to parse Gemini embed response JSON");
                    GeminiError::ResponseParsing {
                        context: "Parsing single embed response".to_string(),
                        source: e,
                    }
                })?;

            Ok::<_, GeminiError>(response_data.embedding.values)
        }
        .await
        .map_err(EmbeddingError::from)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }

    fn max_batch_size_hint(&self) -> Option<usize> {
        Some(BATCH_LIMIT)
    }
}

// --- Gemini API Request Structures ---

#[derive(Serialize, Debug)]
struct GeminiBatchRequest<'a> {
    requests: Vec<GeminiEmbedRequest<'a>>,
}

#[derive(Serialize, Debug)]
struct GeminiEmbedRequest<'a> {
    model: &'a str, // Full model path, e.g. "models/embedding-001"
    content: GeminiContent<'a>,
}

#[derive(Serialize, Debug)]
struct GeminiContent<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize, Debug)]
struct GeminiPart<'a> {
    text: &'a str,
}

// --- Gemini API Response Structures ---

#[derive(Deserialize, Debug)]
struct GeminiBatchResponse {
    embeddings: Vec<GeminiEmbeddingValue>,
}

#[derive(Deserialize, Debug)]
struct GeminiSingleResponse {
    embedding: GeminiEmbeddingValue,
}

#[derive(Deserialize, Debug)]
struct GeminiEmbeddingValue {
    values: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_api_key_is_rejected() {
        assert!(matches!(
            GeminiEmbedder::new("", "embedding-001"),
            Err(GeminiError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn empty_model_name_is_rejected() {
        assert!(matches!(
            GeminiEmbedder::new("some-key", ""),
            Err(GeminiError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn known_models_expose_dimensions() {
        let embedder = GeminiEmbedder::new("some-key", "embedding-001").unwrap();
        assert_eq!(embedder.dimensions(), Some(768));
        assert_eq!(embedder.model_name(), "embedding-001");
        assert_eq!(embedder.max_batch_size_hint(), Some(BATCH_LIMIT));
    }

    #[tokio::test]
    async fn oversized_batch_is_rejected_before_sending() {
        let embedder = GeminiEmbedder::new("some-key", "embedding-001").unwrap();
        let texts: Vec<&str> = (0..BATCH_LIMIT + 1).map(|_| "text").collect();
        let result = embedder.embed_batch(&texts).await;
        assert!(matches!(
            result,
            Err(EmbeddingError::BatchTooLarge {
                limit: Some(BATCH_LIMIT),
                actual
            }) if actual == BATCH_LIMIT + 1
        ));
    }
}
