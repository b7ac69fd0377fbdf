use serde::Serialize;

use super::SimilarityReport;

/// Flattened chart inputs handed to an external renderer.
///
/// The four sequences are parallel: entry `i` describes one pairwise point
/// (horizontal position, similarity value, A-side label, combined pair
/// label). Serialized to JSON beside the similarity file so any plotting
/// frontend can consume it.
#[derive(Debug, Clone, Serialize)]
pub struct PlotData {
    pub x_positions: Vec<u32>,
    pub y_values: Vec<f64>,
    pub labels: Vec<String>,
    pub pair_labels: Vec<String>,
    pub document_similarity: f64,
}

impl PlotData {
    pub fn from_report(report: &SimilarityReport) -> Self {
        let mut x_positions = Vec::with_capacity(report.rows.len());
        let mut y_values = Vec::with_capacity(report.rows.len());
        let mut labels = Vec::with_capacity(report.rows.len());
        let mut pair_labels = Vec::with_capacity(report.rows.len());

        for row in &report.rows {
            x_positions.push(row.x_position);
            y_values.push(row.similarity);
            labels.push(row.text_a.clone());
            pair_labels.push(format!("{} / {}", row.text_a, row.text_b));
        }

        PlotData {
            x_positions,
            y_values,
            labels,
            pair_labels,
            document_similarity: report.document_similarity,
        }
    }
}
