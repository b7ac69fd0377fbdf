use std::path::Path;

use async_trait::async_trait;
use pulldown_cmark::{Event, Options, Parser, TagEnd};
use tracing::{debug, instrument};

use semascope_core::extract::{clean, ExtractError, SentenceExtractor};

/// Sentence extractor for Markdown documents.
///
/// Walks the pulldown-cmark event stream and keeps only rendered text
/// content — markup, link targets and HTML pass-through are discarded
/// before the cleaning transforms run.
pub struct MarkdownExtractor;

impl MarkdownExtractor {
    fn strip_markup(source: &str) -> String {
        let mut text = String::with_capacity(source.len());
        for event in Parser::new_ext(source, Options::empty()) {
            match event {
                Event::Text(content) | Event::Code(content) => text.push_str(&content),
                Event::SoftBreak | Event::HardBreak => text.push(' '),
                // Block boundaries separate sentences even without
                // terminal punctuation in the source.
                Event::End(TagEnd::Paragraph)
                | Event::End(TagEnd::Heading(_))
                | Event::End(TagEnd::Item)
                | Event::End(TagEnd::CodeBlock) => text.push_str(". "),
                _ => {}
            }
        }
        text
    }
}

#[async_trait]
impl SentenceExtractor for MarkdownExtractor {
    #[instrument(skip(self), fields(path = %path.display()))]
    async fn extract(&self, path: &Path) -> Result<Vec<String>, ExtractError> {
        let source = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ExtractError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;
        let text = Self::strip_markup(&source);
        let sentences = clean::split_sentences(&text);
        debug!(sentences = sentences.len(), "Extracted markdown sentences");
        Ok(sentences)
    }
}
