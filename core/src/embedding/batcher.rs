use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::config::PipelineConfig;
use crate::vector::format_record;

use super::{Embedder, EmbeddingError};

/// Tunables for one [`EmbeddingBatcher`] run, usually derived from the
/// process-wide [`PipelineConfig`].
#[derive(Debug, Clone)]
pub struct BatcherConfig {
    /// Snippets per batched request.
    pub batch_size: usize,
    /// Written records between durable flushes; `0` disables intermediate
    /// flushing.
    pub save_interval: usize,
    /// Attempts per snippet in the per-item fallback path.
    pub max_attempts: u32,
    /// Base unit of the linear backoff: attempt `n` waits `n * backoff_unit`
    /// before the next try.
    pub backoff_unit: Duration,
}

impl Default for BatcherConfig {
    fn default() -> Self {
        BatcherConfig {
            batch_size: crate::config::DEFAULT_BATCH_SIZE,
            save_interval: crate::config::DEFAULT_SAVE_INTERVAL,
            max_attempts: crate::config::DEFAULT_MAX_ATTEMPTS,
            backoff_unit: Duration::from_secs(1),
        }
    }
}

impl From<&PipelineConfig> for BatcherConfig {
    fn from(config: &PipelineConfig) -> Self {
        BatcherConfig {
            batch_size: config.batch_size,
            save_interval: config.save_interval,
            max_attempts: config.max_attempts,
            backoff_unit: config.backoff_unit,
        }
    }
}

/// Outcome counters for one batcher run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Records written to the output file.
    pub written: usize,
    /// Snippets dropped after exhausting per-item retries.
    pub failed: usize,
    /// Batched requests attempted.
    pub batches: usize,
    /// Batches that degraded to per-item processing.
    pub fallback_batches: usize,
}

/// Fatal failures of a batcher run.
///
/// Per-snippet embedding failures are not fatal — they are logged, counted
/// in [`BatchReport::failed`], and the run continues.
#[derive(Debug, Error)]
pub enum BatcherError {
    /// A pre-existing output file could not be deleted.
    #[error("failed to clear previous output at {path}: {source}")]
    Preflight {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Writing or flushing the output file failed.
    #[error("failed writing embedding output: {0}")]
    Io(#[from] io::Error),

    /// The run was cancelled between batches; output written so far has
    /// been flushed.
    #[error("embedding run cancelled")]
    Cancelled,
}

/// Terminal result of the bounded retry state machine: every attempt for
/// one snippet failed.
#[derive(Debug, Error)]
#[error("embedding failed after {attempts} attempts: {last}")]
pub struct RetriesExhausted {
    pub attempts: u32,
    #[source]
    pub last: EmbeddingError,
}

/// Drives an [`Embedder`] over a snippet list in fixed-size batches,
/// streaming results to a persisted vector file.
///
/// Batches run strictly one after another — the remote service is the
/// bottleneck and its rate limits make overlapping batches unsafe. A batch
/// that fails, or returns the wrong number of vectors, degrades to
/// per-item calls with bounded linear-backoff retries; a snippet that
/// exhausts its retries is dropped and the run continues. Output is
/// buffered and flushed every `save_interval` written records, bounding
/// data loss on abrupt termination.
pub struct EmbeddingBatcher {
    embedder: Arc<dyn Embedder>,
    config: BatcherConfig,
}

impl EmbeddingBatcher {
    pub fn new(embedder: Arc<dyn Embedder>, config: BatcherConfig) -> Self {
        EmbeddingBatcher { embedder, config }
    }

    /// Embeds `snippets` and writes one output line per success to
    /// `output`, in batch order.
    ///
    /// Any pre-existing file at `output` is deleted first — a run always
    /// starts from empty output and is never resumed or appended to.
    /// Cancellation is observed between batches; written output is flushed
    /// before returning [`BatcherError::Cancelled`].
    #[instrument(skip_all, fields(snippets = snippets.len(), output = %output.as_ref().display(), model = self.embedder.model_name()))]
    pub async fn run(
        &self,
        snippets: &[String],
        output: impl AsRef<Path>,
        cancel: &CancellationToken,
    ) -> Result<BatchReport, BatcherError> {
        let output = output.as_ref();

        match tokio::fs::remove_file(output).await {
            Ok(()) => debug!("Deleted previous output file"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(BatcherError::Preflight {
                    path: output.to_path_buf(),
                    source: e,
                });
            }
        }

        if let Some(limit) = self.embedder.max_batch_size_hint() {
            if self.config.batch_size > limit {
                warn!(
                    batch_size = self.config.batch_size,
                    limit, "Configured batch size exceeds the provider's hint"
                );
            }
        }

        let file = File::create(output).await?;
        let mut writer = BufWriter::new(file);
        let mut report = BatchReport::default();

        for batch in snippets.chunks(self.config.batch_size.max(1)) {
            if cancel.is_cancelled() {
                writer.flush().await?;
                warn!(written = report.written, "Embedding run cancelled between batches");
                return Err(BatcherError::Cancelled);
            }

            report.batches += 1;
            let texts: Vec<&str> = batch.iter().map(String::as_str).collect();

            match self.embedder.embed_batch(&texts).await {
                Ok(vectors) if vectors.len() == batch.len() => {
                    for (text, vector) in batch.iter().zip(&vectors) {
                        self.write_record(&mut writer, text, vector, &mut report).await?;
                    }
                }
                Ok(vectors) => {
                    warn!(
                        expected = batch.len(),
                        received = vectors.len(),
                        "Batch returned mismatched embedding count, retrying items individually"
                    );
                    report.fallback_batches += 1;
                    self.fallback(&mut writer, batch, &mut report).await?;
                }
                Err(e) => {
                    warn!(error = %e, "Batch embedding failed, retrying items individually");
                    report.fallback_batches += 1;
                    self.fallback(&mut writer, batch, &mut report).await?;
                }
            }
        }

        writer.flush().await?;
        info!(
            written = report.written,
            failed = report.failed,
            batches = report.batches,
            "Embedding run complete"
        );
        Ok(report)
    }

    /// Per-item recovery for a batch whose bulk request failed or returned
    /// an inconsistent count. Original order within the batch is preserved;
    /// a snippet that exhausts its retries is dropped, not fatal.
    async fn fallback(
        &self,
        writer: &mut BufWriter<File>,
        batch: &[String],
        report: &mut BatchReport,
    ) -> Result<(), BatcherError> {
        for text in batch {
            match self.generate_with_retry(text).await {
                Ok(vector) => self.write_record(writer, text, &vector, report).await?,
                Err(e) => {
                    error!(error = %e, "Dropping snippet after exhausting retries");
                    report.failed += 1;
                }
            }
        }
        Ok(())
    }

    /// Bounded retry state machine for one snippet: attempt `n` failing
    /// waits `n * backoff_unit` before the next try, until `max_attempts`
    /// is reached.
    pub async fn generate_with_retry(&self, text: &str) -> Result<Vec<f64>, RetriesExhausted> {
        let mut attempt: u32 = 1;
        loop {
            match self.embedder.embed_one(text).await {
                Ok(vector) => return Ok(vector),
                Err(e) => {
                    if attempt >= self.config.max_attempts.max(1) {
                        return Err(RetriesExhausted {
                            attempts: attempt,
                            last: e,
                        });
                    }
                    warn!(attempt, error = %e, "Single-item embedding failed, backing off");
                    tokio::time::sleep(self.config.backoff_unit * attempt).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn write_record(
        &self,
        writer: &mut BufWriter<File>,
        text: &str,
        vector: &[f64],
        report: &mut BatchReport,
    ) -> Result<(), BatcherError> {
        let line = format_record(text, vector);
        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        report.written += 1;

        if self.config.save_interval > 0 && report.written % self.config.save_interval == 0 {
            writer.flush().await?;
            info!(written = report.written, "Checkpoint: flushed embedding output");
        }
        Ok(())
    }
}
