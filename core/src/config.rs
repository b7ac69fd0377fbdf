use std::time::Duration;

/// Default number of snippets sent per batched embedding request.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Default number of written records between durable flushes of the
/// embedding output file.
pub const DEFAULT_SAVE_INTERVAL: usize = 10;

/// Default number of attempts per snippet when a batch has degraded to
/// per-item embedding.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default horizontal width of the similarity plot, in chart units.
pub const DEFAULT_PLOT_WIDTH: f64 = 536.0;

/// Pipeline-wide configuration, built once at process start and passed into
/// each component's constructor.
///
/// Components never read ambient global state; everything tunable lives
/// here. CLI flags and environment variables populate this struct in the
/// binary crate.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Snippets per batched embedding request.
    pub batch_size: usize,
    /// Written records between checkpoint flushes; `0` disables
    /// intermediate flushing.
    pub save_interval: usize,
    /// Attempts per snippet in the per-item fallback path.
    pub max_attempts: u32,
    /// Base unit of the linear retry backoff (attempt `n` waits
    /// `n * backoff_unit`).
    pub backoff_unit: Duration,
    /// Per-request timeout applied to the embedding HTTP client.
    pub request_timeout: Duration,
    /// Horizontal width of the similarity plot, in chart units.
    pub plot_width: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            batch_size: DEFAULT_BATCH_SIZE,
            save_interval: DEFAULT_SAVE_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_unit: Duration::from_secs(1),
            request_timeout: Duration::from_secs(60),
            plot_width: DEFAULT_PLOT_WIDTH,
        }
    }
}
