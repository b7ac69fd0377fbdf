use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures while building or validating a [`VectorStore`](super::VectorStore).
///
/// All of these indicate malformed upstream data rather than transient
/// conditions; callers abort the similarity stage on any of them.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The vector file path was empty or the file could not be read.
    #[error("vector file path is empty or unreadable: {path}")]
    Path {
        path: PathBuf,
        #[source]
        source: Option<io::Error>,
    },

    /// No record survived parsing; a store with zero records is invalid.
    #[error("no vector records survived parsing")]
    EmptyStore,

    /// Two records in the same store carry vectors of different lengths.
    #[error("vector dimension mismatch at index '{index}': expected {expected}, found {actual}")]
    DimensionMismatch {
        index: String,
        expected: usize,
        actual: usize,
    },
}
