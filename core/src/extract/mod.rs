pub mod clean;

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

/// Failures while extracting sentences from a document.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to read document {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Trait for turning a document file into an ordered list of cleaned text
/// snippets, ready for embedding.
///
/// Implementations own the format-specific reading and markup stripping;
/// the cleaning and sentence-splitting transforms live in [`clean`] so
/// every extractor produces uniformly normalized output. An empty result
/// is not an error here — the caller decides whether an empty document is
/// acceptable.
#[async_trait]
pub trait SentenceExtractor: Send + Sync {
    async fn extract(&self, path: &Path) -> Result<Vec<String>, ExtractError>;
}
