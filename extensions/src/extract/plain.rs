use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, instrument};

use semascope_core::extract::{clean, ExtractError, SentenceExtractor};

/// Sentence extractor for plain-text documents.
///
/// Reads the file as lossy UTF-8, so files with stray non-UTF-8 bytes
/// still yield their readable content instead of failing.
pub struct PlainTextExtractor;

#[async_trait]
impl SentenceExtractor for PlainTextExtractor {
    #[instrument(skip(self), fields(path = %path.display()))]
    async fn extract(&self, path: &Path) -> Result<Vec<String>, ExtractError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| ExtractError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let text = String::from_utf8_lossy(&bytes);
        let sentences = clean::split_sentences(&text);
        debug!(sentences = sentences.len(), "Extracted plain text sentences");
        Ok(sentences)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn extracts_cleaned_sentences() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        tokio::fs::write(&path, "Hello, World. This is FINE!  Right?")
            .await
            .unwrap();

        let sentences = PlainTextExtractor.extract(&path).await.unwrap();
        assert_eq!(sentences, vec!["hello world", "this is fine", "right"]);
    }

    #[tokio::test]
    async fn invalid_utf8_is_read_lossily() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.bin");
        tokio::fs::write(&path, b"valid start. \xff\xfe then more text.")
            .await
            .unwrap();

        let sentences = PlainTextExtractor.extract(&path).await.unwrap();
        assert_eq!(sentences[0], "valid start");
        assert!(sentences[1].contains("then more text"));
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = PlainTextExtractor.extract(&dir.path().join("absent.txt")).await;
        assert!(matches!(result, Err(ExtractError::Io { .. })));
    }
}
