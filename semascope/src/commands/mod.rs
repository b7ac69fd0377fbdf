use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use console::style;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use semascope_core::config::PipelineConfig;
use semascope_core::embedding::{BatcherConfig, EmbeddingBatcher};
use semascope_core::similarity::{write_report, PlotData, SimilarityEngine, SimilarityReport};
use semascope_core::vector::VectorStore;
use semascope_extensions::extract::extractor_for;
use semascope_extensions::gemini::{GeminiConfig, GeminiEmbedder};

use crate::cli::Cli;

/// Runs the whole pipeline: extraction, embedding, similarity, persisted
/// report and plot data.
#[instrument(skip_all, fields(doc_a = %cli.document_a.display(), doc_b = %cli.document_b.display()))]
pub async fn run_compare(cli: &Cli, config: &PipelineConfig, cancel: &CancellationToken) -> Result<()> {
    tokio::fs::create_dir_all(&cli.out_dir)
        .await
        .with_context(|| format!("Failed to create output directory {}", cli.out_dir.display()))?;

    // Extraction runs concurrently; each document is independent.
    let (sentences_a, sentences_b) = tokio::try_join!(
        extract_snippets(&cli.document_a),
        extract_snippets(&cli.document_b),
    )?;
    info!(
        sentences_a = sentences_a.len(),
        sentences_b = sentences_b.len(),
        "Extraction complete"
    );

    let gemini_config = GeminiConfig::new(cli.api_key.clone())
        .map(|c| c.timeout(config.request_timeout))
        .context("Invalid Gemini configuration")?;
    let embedder = Arc::new(
        GeminiEmbedder::from_config(gemini_config, cli.model.clone(), None)
            .context("Failed to create Gemini embedder")?,
    );
    let batcher = EmbeddingBatcher::new(embedder, BatcherConfig::from(config));

    let vectors_a = vector_path(&cli.out_dir, &cli.document_a, "a");
    let vectors_b = vector_path(&cli.out_dir, &cli.document_b, "b");

    let report_a = batcher
        .run(&sentences_a, &vectors_a, cancel)
        .await
        .with_context(|| format!("Embedding failed for {}", cli.document_a.display()))?;
    let report_b = batcher
        .run(&sentences_b, &vectors_b, cancel)
        .await
        .with_context(|| format!("Embedding failed for {}", cli.document_b.display()))?;
    info!(
        written_a = report_a.written,
        failed_a = report_a.failed,
        written_b = report_b.written,
        failed_b = report_b.failed,
        "Embedding complete"
    );

    let store_a = VectorStore::load(&vectors_a)
        .await
        .with_context(|| format!("Failed to load vector store from {}", vectors_a.display()))?;
    let store_b = VectorStore::load(&vectors_b)
        .await
        .with_context(|| format!("Failed to load vector store from {}", vectors_b.display()))?;

    let dim_a = store_a
        .validate_uniform_dimension()
        .context("First document's vectors are inconsistent")?;
    let dim_b = store_b
        .validate_uniform_dimension()
        .context("Second document's vectors are inconsistent")?;
    if dim_a != dim_b {
        bail!("Documents were embedded with different dimensionalities ({dim_a} vs {dim_b})");
    }

    let engine = SimilarityEngine::new(config.plot_width);
    let report = engine.pairwise(&store_a, &store_b, cancel)?;

    let similarity_path = cli.out_dir.join("similarity.csv");
    write_report(&similarity_path, &report)
        .await
        .with_context(|| format!("Failed to write {}", similarity_path.display()))?;

    let plot_path = cli.out_dir.join("plot_data.json");
    let plot = PlotData::from_report(&report);
    let plot_json = serde_json::to_string_pretty(&plot).context("Failed to serialize plot data")?;
    tokio::fs::write(&plot_path, plot_json)
        .await
        .with_context(|| format!("Failed to write {}", plot_path.display()))?;

    print_summary(cli, &report, &similarity_path, &plot_path);
    Ok(())
}

/// Extracts and index-prefixes the snippets of one document. The `i: text`
/// prefix becomes the record index when the vector file is parsed back.
async fn extract_snippets(path: &Path) -> Result<Vec<String>> {
    let extractor = extractor_for(path);
    let sentences = extractor
        .extract(path)
        .await
        .with_context(|| format!("Failed to extract sentences from {}", path.display()))?;
    if sentences.is_empty() {
        bail!("No sentences could be extracted from {}", path.display());
    }
    Ok(sentences
        .into_iter()
        .enumerate()
        .map(|(i, sentence)| format!("{i}: {sentence}"))
        .collect())
}

// The side tag keeps the two output files distinct even when both
// documents share a file stem.
fn vector_path(out_dir: &Path, document: &Path, side: &str) -> PathBuf {
    let stem = document
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document");
    out_dir.join(format!("{stem}_{side}_vectors.csv"))
}

fn print_summary(cli: &Cli, report: &SimilarityReport, similarity_path: &Path, plot_path: &Path) {
    println!(
        "{} {} vs {}",
        style("Compared").green().bold(),
        cli.document_a.display(),
        cli.document_b.display()
    );
    println!("  pairwise rows:       {}", report.rows.len());
    println!(
        "  document similarity: {}",
        style(report.document_similarity).cyan().bold()
    );
    println!("  similarity matrix:   {}", similarity_path.display());
    println!("  plot data:           {}", plot_path.display());
}
