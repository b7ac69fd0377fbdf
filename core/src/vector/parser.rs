use tracing::warn;

use super::VectorRecord;

/// Index assigned to lines whose text field carries no `index:` prefix.
const UNKNOWN_INDEX: &str = "unknown";

/// Recovers one [`VectorRecord`] from a persisted vector-file line.
///
/// The line format is nominally `"<index>: <text>","v1","v2",...`, but the
/// quoted text field may itself contain unescaped commas, so a naive comma
/// split can fragment it. This parser splits naively anyway and then
/// re-joins: every field after the first that does not parse as a number is
/// treated as a continuation of the text, re-attached with a comma. The
/// first numeric field ends the text; from there on every field is a vector
/// component, and a component that fails to parse is dropped with a warning.
///
/// Returns `None` for lines that cannot yield a usable record (fewer than
/// two fields, empty text, or zero recovered components). Absence means
/// "skip this line" — malformed input never raises.
pub fn parse_line(line: &str) -> Option<VectorRecord> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() < 2 {
        return None;
    }

    let head = fields[0].trim().trim_matches('"');
    let (index, mut text) = match head.split_once(':') {
        Some((index, rest)) => (index.trim().to_string(), rest.trim_start().to_string()),
        None => (UNKNOWN_INDEX.to_string(), head.to_string()),
    };

    // Re-attach text fragments produced by the naive split. The original
    // comma is restored; the fragment keeps its interior spacing.
    let mut cursor = 1;
    while cursor < fields.len() && parse_component(fields[cursor]).is_none() {
        text.push(',');
        text.push_str(fields[cursor].trim_matches('"'));
        cursor += 1;
    }

    let mut vector = Vec::with_capacity(fields.len() - cursor);
    for field in &fields[cursor..] {
        match parse_component(field) {
            Some(value) => vector.push(value),
            None => warn!(field = %field, "Dropping unparsable vector component"),
        }
    }

    if text.trim().is_empty() || vector.is_empty() {
        return None;
    }

    Some(VectorRecord { index, text, vector })
}

/// Parses one comma-split field as a vector component. `f64::from_str` is
/// locale-invariant, so `0.1` reads identically on any host.
fn parse_component(field: &str) -> Option<f64> {
    field.trim().trim_matches('"').parse::<f64>().ok()
}
