mod plot;
mod writer;

pub use plot::PlotData;
pub use writer::{write_report, SIMILARITY_HEADER};

use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::vector::VectorStore;

/// One pairwise comparison between a record of store A and a record of
/// store B.
///
/// `x_position` is the deterministic horizontal plot coordinate assigned to
/// the A record; `similarity` is rounded half-away-from-zero to 10 decimal
/// places, ready for serialization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityRow {
    pub index_a: String,
    pub index_b: String,
    pub text_a: String,
    pub text_b: String,
    pub x_position: u32,
    pub similarity: f64,
}

/// The full cross product of pairwise similarities plus the aggregate
/// document-level score.
#[derive(Debug, Clone, Serialize)]
pub struct SimilarityReport {
    pub rows: Vec<SimilarityRow>,
    pub document_similarity: f64,
}

#[derive(Debug, Error)]
pub enum SimilarityError {
    #[error("similarity computation cancelled")]
    Cancelled,
}

/// Computes the pairwise similarity matrix between two vector stores.
pub struct SimilarityEngine {
    plot_width: f64,
}

impl SimilarityEngine {
    pub fn new(plot_width: f64) -> Self {
        SimilarityEngine { plot_width }
    }

    /// Crosses every record of `store_a` with every record of `store_b`.
    ///
    /// A-records are processed in lexicographic index order, each yielding
    /// one row per B-record in the store's iteration order. Rows are
    /// computed in parallel across rayon's worker pool; each A-record's row
    /// group is independent, and the merge preserves the documented
    /// ordering. Callers are expected to have validated both stores'
    /// dimensionality beforehand.
    ///
    /// Cancellation is observed between per-record tasks; in-flight work is
    /// abandoned and [`SimilarityError::Cancelled`] returned.
    #[instrument(skip_all, fields(count_a = store_a.len(), count_b = store_b.len()))]
    pub fn pairwise(
        &self,
        store_a: &VectorStore,
        store_b: &VectorStore,
        cancel: &CancellationToken,
    ) -> Result<SimilarityReport, SimilarityError> {
        let records_a: Vec<_> = store_a.iter().collect();
        let count_a = records_a.len();

        let groups = records_a
            .par_iter()
            .enumerate()
            .map(|(position, record_a)| {
                if cancel.is_cancelled() {
                    return Err(SimilarityError::Cancelled);
                }
                let x_position = self.x_position(position, count_a);
                let rows = store_b
                    .iter()
                    .map(|record_b| SimilarityRow {
                        index_a: record_a.index.clone(),
                        index_b: record_b.index.clone(),
                        text_a: record_a.text.clone(),
                        text_b: record_b.text.clone(),
                        x_position,
                        similarity: round_ten_places(cosine_similarity(
                            &record_a.vector,
                            &record_b.vector,
                        )),
                    })
                    .collect::<Vec<_>>();
                Ok(rows)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let rows: Vec<SimilarityRow> = groups.into_iter().flatten().collect();
        let document_similarity = if rows.is_empty() {
            0.0
        } else {
            rows.iter().map(|row| row.similarity).sum::<f64>() / rows.len() as f64
        };

        debug!(rows = rows.len(), document_similarity, "Computed similarity matrix");
        Ok(SimilarityReport {
            rows,
            document_similarity,
        })
    }

    /// Spreads `count` A-records evenly across the plot width. A single
    /// record sits at the midpoint.
    fn x_position(&self, position: usize, count: usize) -> u32 {
        if count > 1 {
            (position as f64 * self.plot_width / (count as f64 - 1.0)).round() as u32
        } else {
            (self.plot_width / 2.0).round() as u32
        }
    }
}

/// Cosine of the angle between two vectors: `dot(a,b) / (‖a‖·‖b‖)`.
///
/// Returns `0.0` exactly — never NaN — when either magnitude is zero. For
/// non-degenerate inputs the result lies in `[-1, 1]`.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Half-away-from-zero rounding to 10 decimal places (`f64::round`'s tie
/// behavior), applied to every similarity before serialization.
fn round_ten_places(value: f64) -> f64 {
    (value * 1e10).round() / 1e10
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::{VectorRecord, VectorStore};

    fn record(index: &str, text: &str, vector: Vec<f64>) -> VectorRecord {
        VectorRecord {
            index: index.to_string(),
            text: text.to_string(),
            vector,
        }
    }

    fn store(records: Vec<VectorRecord>) -> VectorStore {
        VectorStore::from_records(records).unwrap()
    }

    #[test]
    fn cosine_similarity_known_value() {
        let value = cosine_similarity(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]);
        assert!((value - 0.9746318462).abs() < 1e-4);
    }

    #[test]
    fn cosine_similarity_is_symmetric_and_bounded() {
        let a = [0.3, -0.7, 1.2, 0.05];
        let b = [-1.1, 0.4, 0.9, 2.0];
        let ab = cosine_similarity(&a, &b);
        let ba = cosine_similarity(&b, &a);
        assert_eq!(ab, ba);
        assert!((-1.0..=1.0).contains(&ab));
    }

    #[test]
    fn cosine_similarity_zero_vector_is_exactly_zero() {
        let value = cosine_similarity(&[0.0, 0.0, 0.0], &[4.0, 5.0, 6.0]);
        assert_eq!(value, 0.0);
        assert!(!value.is_nan());
    }

    #[test]
    fn identical_vectors_have_unit_similarity() {
        let value = cosine_similarity(&[0.5, 0.5], &[0.5, 0.5]);
        assert!((value - 1.0).abs() < 1e-12);
    }

    #[test]
    fn rounding_keeps_ten_decimal_places() {
        assert_eq!(round_ten_places(0.97463184624), 0.9746318462);
        assert_eq!(round_ten_places(0.97463184626), 0.9746318463);
        assert_eq!(round_ten_places(-0.97463184626), -0.9746318463);
    }

    #[test]
    fn pairwise_produces_full_cross_product() {
        let a = store(vec![
            record("0", "alpha", vec![1.0, 0.0]),
            record("1", "beta", vec![0.0, 1.0]),
            record("2", "gamma", vec![1.0, 1.0]),
        ]);
        let b = store(vec![
            record("0", "delta", vec![1.0, 0.0]),
            record("1", "epsilon", vec![0.5, 0.5]),
        ]);
        let report = SimilarityEngine::new(536.0)
            .pairwise(&a, &b, &CancellationToken::new())
            .unwrap();
        assert_eq!(report.rows.len(), 6);
    }

    #[test]
    fn document_similarity_is_mean_of_rows() {
        let a = store(vec![
            record("0", "alpha", vec![1.0, 2.0, 3.0]),
            record("1", "beta", vec![3.0, 2.0, 1.0]),
        ]);
        let b = store(vec![
            record("0", "gamma", vec![4.0, 5.0, 6.0]),
            record("1", "delta", vec![-1.0, 0.0, 1.0]),
        ]);
        let report = SimilarityEngine::new(536.0)
            .pairwise(&a, &b, &CancellationToken::new())
            .unwrap();
        let mean = report.rows.iter().map(|r| r.similarity).sum::<f64>() / report.rows.len() as f64;
        assert!((report.document_similarity - mean).abs() < 1e-12);
    }

    #[test]
    fn rows_are_grouped_by_sorted_a_index() {
        let a = store(vec![
            record("b", "second", vec![1.0, 0.0]),
            record("a", "first", vec![0.0, 1.0]),
        ]);
        let b = store(vec![record("0", "only", vec![1.0, 1.0])]);
        let report = SimilarityEngine::new(536.0)
            .pairwise(&a, &b, &CancellationToken::new())
            .unwrap();
        let order: Vec<&str> = report.rows.iter().map(|r| r.index_a.as_str()).collect();
        assert_eq!(order, vec!["a", "b"]);
    }

    #[test]
    fn x_positions_span_the_plot_width() {
        let a = store(vec![
            record("0", "first", vec![1.0, 0.0]),
            record("1", "second", vec![0.0, 1.0]),
            record("2", "third", vec![1.0, 1.0]),
        ]);
        let b = store(vec![record("0", "only", vec![1.0, 0.0])]);
        let report = SimilarityEngine::new(536.0)
            .pairwise(&a, &b, &CancellationToken::new())
            .unwrap();
        let positions: Vec<u32> = report.rows.iter().map(|r| r.x_position).collect();
        assert_eq!(positions, vec![0, 268, 536]);
    }

    #[test]
    fn single_record_sits_at_plot_midpoint() {
        let a = store(vec![record("0", "only", vec![1.0, 0.0])]);
        let b = store(vec![record("0", "other", vec![0.0, 1.0])]);
        let report = SimilarityEngine::new(536.0)
            .pairwise(&a, &b, &CancellationToken::new())
            .unwrap();
        assert_eq!(report.rows[0].x_position, 268);
    }

    #[test]
    fn cancelled_token_aborts_computation() {
        let a = store(vec![record("0", "alpha", vec![1.0, 0.0])]);
        let b = store(vec![record("0", "beta", vec![0.0, 1.0])]);
        let token = CancellationToken::new();
        token.cancel();
        let result = SimilarityEngine::new(536.0).pairwise(&a, &b, &token);
        assert!(matches!(result, Err(SimilarityError::Cancelled)));
    }
}
