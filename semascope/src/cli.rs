use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use semascope_core::config::{
    PipelineConfig, DEFAULT_BATCH_SIZE, DEFAULT_MAX_ATTEMPTS, DEFAULT_PLOT_WIDTH,
    DEFAULT_SAVE_INTERVAL,
};

/// Semascope: map the semantic similarity between two documents.
///
/// Extracts sentences from both documents, embeds them through the Gemini
/// API, computes every pairwise cosine similarity and writes the similarity
/// matrix plus plot data for an external renderer.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// First document to compare.
    pub document_a: PathBuf,

    /// Second document to compare.
    pub document_b: PathBuf,

    /// Directory for vector, similarity and plot output files.
    #[arg(long, short, default_value = "semascope-out")]
    pub out_dir: PathBuf,

    /// Embedding model name.
    #[arg(long, default_value = "embedding-001")]
    pub model: String,

    /// Google AI API key.
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Snippets sent per batched embedding request.
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Written records between durable flushes of embedding output.
    #[arg(long, default_value_t = DEFAULT_SAVE_INTERVAL)]
    pub save_interval: usize,

    /// Attempts per snippet when a batch degrades to per-item embedding.
    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: u32,

    /// Per-request timeout for the embedding API, in seconds.
    #[arg(long, default_value_t = 60)]
    pub request_timeout: u64,

    /// Horizontal width of the similarity plot, in chart units.
    #[arg(long, default_value_t = DEFAULT_PLOT_WIDTH)]
    pub plot_width: f64,

    /// Increase verbosity (use multiple times for more).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Builds the process-wide pipeline configuration from the parsed
    /// arguments.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            batch_size: self.batch_size,
            save_interval: self.save_interval,
            max_attempts: self.max_attempts,
            request_timeout: Duration::from_secs(self.request_timeout),
            plot_width: self.plot_width,
            ..PipelineConfig::default()
        }
    }
}
