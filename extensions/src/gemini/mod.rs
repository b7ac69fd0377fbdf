mod embedder;
mod error;
mod shared;

pub use embedder::GeminiEmbedder;
pub use error::{GeminiError, GeminiErrorDetail, GeminiErrorResponse};
pub use shared::GeminiConfig;
