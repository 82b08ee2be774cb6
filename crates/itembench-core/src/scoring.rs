//! Benchmark score extraction and normalization.
//!
//! The grading tool has shipped several output layouts. An item's
//! evaluation is located by trying [`EXTRACTORS`] in order; the first one
//! that finds something wins.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Minimum normalized score (0-100) for an item to pass.
pub const PASS_THRESHOLD: f64 = 85.0;

/// Locates one item's evaluation inside a grading-tool output document.
pub type Extractor = fn(&Value, &str) -> Option<Value>;

/// Extractors in priority order.
pub const EXTRACTORS: [Extractor; 4] = [
    by_id_in_evaluations,
    first_result,
    overall_field,
    whole_document,
];

/// `{"evaluations": {"<id>": {...}}}`
pub fn by_id_in_evaluations(doc: &Value, id: &str) -> Option<Value> {
    doc.get("evaluations")?.as_object()?.get(id).cloned()
}

/// `{"results": [{...}, ...]}`
pub fn first_result(doc: &Value, _id: &str) -> Option<Value> {
    doc.get("results")?
        .as_array()?
        .first()
        .filter(|v| v.is_object())
        .cloned()
}

/// `{"overall": {...}}`
pub fn overall_field(doc: &Value, _id: &str) -> Option<Value> {
    doc.get("overall")
        .filter(|v| v.as_object().is_some_and(|m| !m.is_empty()))
        .cloned()
}

/// Last resort: the document itself.
pub fn whole_document(doc: &Value, _id: &str) -> Option<Value> {
    Some(doc.clone())
}

/// Run the extractor chain for item `id`.
pub fn extract_evaluation(doc: &Value, id: &str) -> Option<Value> {
    EXTRACTORS.iter().find_map(|extract| extract(doc, id))
}

/// Outcome of scoring one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreOutcome {
    /// The grading tool's raw evaluation; `None` when scoring was unavailable.
    #[serde(rename = "inceptbench")]
    pub raw_evaluation: Option<Value>,
    pub score_100: Option<f64>,
    pub passed: bool,
}

impl ScoreOutcome {
    /// Normalize a raw evaluation against [`PASS_THRESHOLD`].
    pub fn from_evaluation(evaluation: Value) -> Self {
        Self::with_threshold(evaluation, PASS_THRESHOLD)
    }

    pub fn with_threshold(evaluation: Value, threshold: f64) -> Self {
        let score_100 = normalize_score(&evaluation);
        Self {
            passed: score_100.is_some_and(|s| s >= threshold),
            score_100,
            raw_evaluation: Some(evaluation),
        }
    }

    /// Scoring did not run or produced nothing usable. Never a pass.
    pub fn unavailable() -> Self {
        Self {
            raw_evaluation: None,
            score_100: None,
            passed: false,
        }
    }

    pub fn is_available(&self) -> bool {
        self.raw_evaluation.is_some()
    }
}

/// `overall.score_100` if present, else `overall.score` scaled to 0-100 and
/// rounded to two decimals, else `None`.
pub fn normalize_score(evaluation: &Value) -> Option<f64> {
    let overall = evaluation.get("overall")?;
    if let Some(score) = overall.get("score_100").and_then(Value::as_f64) {
        return Some(score);
    }
    overall
        .get("score")
        .and_then(Value::as_f64)
        .map(|score| round_to(score * 100.0, 2))
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
