use std::time::Duration;

use reqwest::Client;
use secrecy::SecretString;
use tracing::{debug, trace};
use url::Url;

use super::error::GeminiError;

const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Configuration for the Gemini embedding client.
#[derive(Clone, Debug)]
pub struct GeminiConfig {
    /// Google AI API key, kept out of debug output.
    pub(crate) api_key: SecretString,
    /// Base URL for the Generative Language API.
    pub(crate) base_url: Url,
    /// Per-request timeout applied to the HTTP client.
    pub(crate) timeout: Duration,
}

impl GeminiConfig {
    /// Creates a configuration with the default endpoint and a 60 second
    /// request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`GeminiError::InvalidConfiguration`] if the API key is
    /// empty.
    pub fn new(api_key: impl Into<String>) -> Result<Self, GeminiError> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(GeminiError::InvalidConfiguration(
                "API key cannot be empty".to_string(),
            ));
        }

        let base_url = Url::parse(DEFAULT_GEMINI_BASE_URL).map_err(|e| {
            GeminiError::InvalidConfiguration(format!(
                "Internal error: Failed to parse default base URL: {e}"
            ))
        })?;

        Ok(Self {
            api_key: api_key.into(),
            base_url,
            timeout: Duration::from_secs(60),
        })
    }

    /// Overrides the API base URL (e.g. for a proxy or a test server).
    pub fn base_url(mut self, url: &str) -> Result<Self, GeminiError> {
        self.base_url = Url::parse(url)
            .map_err(|e| GeminiError::InvalidConfiguration(format!("Invalid base URL '{url}': {e}")))?;
        Ok(self)
    }

    /// Overrides the per-request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// HTTP client plus configuration shared by Gemini API calls.
#[derive(Clone, Debug)]
pub(crate) struct SharedGeminiClient {
    config: GeminiConfig,
    http_client: Client,
}

impl SharedGeminiClient {
    /// Builds a default reqwest client (with the configured timeout) if one
    /// is not provided.
    pub(crate) fn new(config: GeminiConfig, client_override: Option<Client>) -> Result<Self, GeminiError> {
        let client = match client_override {
            Some(client) => {
                debug!("Using provided HTTP client.");
                client
            }
            None => Client::builder()
                .timeout(config.timeout)
                .build()
                .map_err(|e| {
                    GeminiError::InvalidConfiguration(format!(
                        "Failed to build default HTTP client: {e}"
                    ))
                })?,
        };

        debug!(base_url = %config.base_url, "Shared Gemini client initialized.");
        Ok(Self {
            config,
            http_client: client,
        })
    }

    pub(crate) fn http_client(&self) -> &Client {
        &self.http_client
    }

    pub(crate) fn config(&self) -> &GeminiConfig {
        &self.config
    }

    /// Builds a `v1beta` URL for a model action such as
    /// `models/embedding-001:batchEmbedContents`. Authentication is added
    /// per request via the `x-goog-api-key` header, never the URL.
    pub(crate) fn build_url(&self, relative_path: &str) -> Result<Url, GeminiError> {
        let base_path = format!("v1beta/{relative_path}");
        let mut url = self.config.base_url.clone();

        url.path_segments_mut()
            .map_err(|_| {
                GeminiError::InvalidConfiguration(
                    "Base URL cannot be a 'cannot-be-a-base' URL.".to_string(),
                )
            })?
            .extend(base_path.split('/'));

        trace!(built_url = %url, "Built Gemini API URL (without auth)");
        Ok(url)
    }
}
