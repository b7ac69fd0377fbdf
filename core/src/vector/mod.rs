mod error;
mod parser;

pub use error::StoreError;
pub use parser::parse_line;

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, instrument};

/// One parsed `(index, text, vector)` record from a persisted vector file.
///
/// Vectors held by a [`VectorStore`] are L2-normalized at rest; a record
/// obtained through [`parse_line`] directly is still raw.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorRecord {
    pub index: String,
    pub text: String,
    pub vector: Vec<f64>,
}

/// Index-keyed vector records for one document.
///
/// Built once from a persisted file (or from in-memory records) and never
/// mutated afterwards. Keys are unique; a later record with a colliding
/// index overwrites the earlier one. Iteration order is the lexicographic
/// order of the indices.
#[derive(Debug, Clone)]
pub struct VectorStore {
    records: BTreeMap<String, VectorRecord>,
}

impl VectorStore {
    /// Reads and parses a persisted vector file.
    ///
    /// Unparsable lines are dropped (the parser logs them); every accepted
    /// vector is normalized to unit length before insertion.
    ///
    /// # Errors
    ///
    /// * [`StoreError::Path`] if the path is empty or the file cannot be
    ///   read.
    /// * [`StoreError::EmptyStore`] if no record survives parsing.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(StoreError::Path {
                path: path.to_path_buf(),
                source: None,
            });
        }

        let contents = tokio::fs::read_to_string(path).await.map_err(|e| StoreError::Path {
            path: path.to_path_buf(),
            source: Some(e),
        })?;

        let records = contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(parse_line);

        let store = Self::from_records(records)?;
        debug!(records = store.len(), "Loaded vector store");
        Ok(store)
    }

    /// Builds a store from in-memory records, applying the same invariants
    /// as [`VectorStore::load`]: vectors are normalized and duplicate
    /// indices resolve last-write-wins.
    ///
    /// # Errors
    ///
    /// [`StoreError::EmptyStore`] if the iterator yields no records.
    pub fn from_records(records: impl IntoIterator<Item = VectorRecord>) -> Result<Self, StoreError> {
        let mut map = BTreeMap::new();
        for mut record in records {
            record.vector = normalize(record.vector);
            map.insert(record.index.clone(), record);
        }
        if map.is_empty() {
            return Err(StoreError::EmptyStore);
        }
        Ok(VectorStore { records: map })
    }

    /// Checks that every record shares one vector dimensionality and
    /// returns it.
    ///
    /// Must be called before similarity computation; construction does not
    /// validate.
    pub fn validate_uniform_dimension(&self) -> Result<usize, StoreError> {
        let mut expected = None;
        for record in self.records.values() {
            match expected {
                None => expected = Some(record.vector.len()),
                Some(dim) if dim != record.vector.len() => {
                    return Err(StoreError::DimensionMismatch {
                        index: record.index.clone(),
                        expected: dim,
                        actual: record.vector.len(),
                    });
                }
                Some(_) => {}
            }
        }
        // from_records rejects empty stores, so expected is always set
        expected.ok_or(StoreError::EmptyStore)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: &str) -> Option<&VectorRecord> {
        self.records.get(index)
    }

    /// Records in lexicographic index order.
    pub fn iter(&self) -> impl Iterator<Item = &VectorRecord> {
        self.records.values()
    }
}

/// Scales a vector to unit length. The zero vector is returned unchanged
/// rather than dividing by zero.
pub fn normalize(vector: Vec<f64>) -> Vec<f64> {
    let magnitude = vector.iter().map(|v| v * v).sum::<f64>().sqrt();
    if magnitude == 0.0 {
        return vector;
    }
    vector.into_iter().map(|v| v / magnitude).collect()
}

/// Formats one persisted vector-file line: the quoted text followed by the
/// quoted comma-joined components.
///
/// `f64`'s `Display` output is locale-invariant, so the produced line reads
/// back identically on any host.
pub fn format_record(text: &str, vector: &[f64]) -> String {
    let joined = vector
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",");
    format!("\"{text}\",\"{joined}\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_produces_unit_length() {
        let normalized = normalize(vec![3.0, 4.0]);
        assert_eq!(normalized, vec![0.6, 0.8]);
        let magnitude = normalized.iter().map(|v| v * v).sum::<f64>().sqrt();
        assert!((magnitude - 1.0).abs() < 1e-12);
    }

    #[test]
    fn normalize_leaves_zero_vector_unchanged() {
        assert_eq!(normalize(vec![0.0, 0.0, 0.0]), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn normalize_is_idempotent() {
        let once = normalize(vec![1.0, 2.0, 3.0]);
        let twice = normalize(once.clone());
        for (a, b) in once.iter().zip(&twice) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn from_records_rejects_empty_input() {
        assert!(matches!(
            VectorStore::from_records(std::iter::empty()),
            Err(StoreError::EmptyStore)
        ));
    }

    #[test]
    fn from_records_keeps_last_duplicate() {
        let store = VectorStore::from_records([
            VectorRecord {
                index: "1".into(),
                text: "first".into(),
                vector: vec![1.0, 0.0],
            },
            VectorRecord {
                index: "1".into(),
                text: "second".into(),
                vector: vec![0.0, 1.0],
            },
        ])
        .unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("1").unwrap().text, "second");
    }

    #[test]
    fn validate_uniform_dimension_flags_mismatch() {
        let store = VectorStore::from_records([
            VectorRecord {
                index: "a".into(),
                text: "one".into(),
                vector: vec![1.0, 0.0],
            },
            VectorRecord {
                index: "b".into(),
                text: "two".into(),
                vector: vec![1.0, 0.0, 0.0],
            },
        ])
        .unwrap();
        match store.validate_uniform_dimension() {
            Err(StoreError::DimensionMismatch { expected, actual, .. }) => {
                assert_eq!(expected, 2);
                assert_eq!(actual, 3);
            }
            other => panic!("expected dimension mismatch, got {other:?}"),
        }
    }

    #[test]
    fn validate_uniform_dimension_returns_common_dimension() {
        let store = VectorStore::from_records([VectorRecord {
            index: "a".into(),
            text: "one".into(),
            vector: vec![1.0, 2.0, 2.0],
        }])
        .unwrap();
        assert_eq!(store.validate_uniform_dimension().unwrap(), 3);
    }

    #[test]
    fn format_record_round_trips_through_parser() {
        let line = format_record("4: hello, world", &[0.1, 0.2, 0.3]);
        let record = parse_line(&line).unwrap();
        assert_eq!(record.index, "4");
        assert_eq!(record.text, "hello, world");
        assert_eq!(record.vector, vec![0.1, 0.2, 0.3]);
    }
}
