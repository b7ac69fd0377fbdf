mod markdown;
mod plain;

pub use markdown::MarkdownExtractor;
pub use plain::PlainTextExtractor;

use std::path::Path;

use semascope_core::extract::SentenceExtractor;

/// Picks an extractor for a document by file extension. Anything that is
/// not recognized falls back to the plain-text extractor, which reads
/// lossily and so also covers arbitrary byte content.
pub fn extractor_for(path: &Path) -> Box<dyn SentenceExtractor> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("md") | Some("markdown") => Box::new(MarkdownExtractor),
        _ => Box::new(PlainTextExtractor),
    }
}
