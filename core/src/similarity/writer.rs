use std::io;
use std::path::Path;

use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, instrument};

use super::SimilarityReport;

/// Header line of the persisted similarity file.
pub const SIMILARITY_HEADER: &str = "Index1,Index2,Word1,Word2,X_Position,Cosine_Similarity";

/// Writes a similarity report to `path`, replacing any existing file.
///
/// Layout: the header line, one CSV row per [`SimilarityRow`](super::SimilarityRow)
/// in report order, and a terminal `Document_Similarity --> <value>` line.
#[instrument(skip(report), fields(path = %path.as_ref().display(), rows = report.rows.len()))]
pub async fn write_report(path: impl AsRef<Path>, report: &SimilarityReport) -> io::Result<()> {
    let file = tokio::fs::File::create(path.as_ref()).await?;
    let mut writer = BufWriter::new(file);

    writer.write_all(SIMILARITY_HEADER.as_bytes()).await?;
    writer.write_all(b"\n").await?;

    for row in &report.rows {
        let line = format!(
            "{},{},{},{},{},{}\n",
            row.index_a, row.index_b, row.text_a, row.text_b, row.x_position, row.similarity
        );
        writer.write_all(line.as_bytes()).await?;
    }

    let footer = format!("Document_Similarity --> {}\n", report.document_similarity);
    writer.write_all(footer.as_bytes()).await?;
    writer.flush().await?;

    debug!("Wrote similarity report");
    Ok(())
}
