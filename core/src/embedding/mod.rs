mod batcher;
mod error;

pub use batcher::{BatchReport, BatcherConfig, BatcherError, EmbeddingBatcher, RetriesExhausted};
pub use error::EmbeddingError;

use async_trait::async_trait;

/// Trait for asynchronous text embedding generation.
///
/// An implementor represents a specific configured embedding model (e.g. a
/// connection to a hosted embedding API). The pipeline is polymorphic over
/// any provider exposing both a batched and a single-item call, which also
/// lets the test suite substitute a scripted double.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generates embeddings for a batch of text snippets.
    ///
    /// On success the returned vectors correspond one-to-one, in order, to
    /// the input snippets. Callers must not assume the provider upholds
    /// that count — the batcher checks it and degrades to per-item calls
    /// on a mismatch.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f64>>, EmbeddingError>;

    /// Generates the embedding for a single text snippet.
    async fn embed_one(&self, text: &str) -> Result<Vec<f64>, EmbeddingError>;

    /// Identifier of the configured embedding model.
    fn model_name(&self) -> &str;

    /// Number of dimensions in the produced vectors, if fixed and known.
    fn dimensions(&self) -> Option<usize>;

    /// Hint for the maximum number of snippets accepted per batched call.
    /// `None` if no simple limit applies.
    fn max_batch_size_hint(&self) -> Option<usize> {
        None
    }
}
