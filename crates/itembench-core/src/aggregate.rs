//! Evaluation summary.
//!
//! The summary is always recomputed from the full row list; nothing is
//! accumulated incrementally.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::evaluate::EvalRow;
use crate::scoring::round_to;

/// Contents of `eval_summary.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalSummary {
    pub total: usize,
    pub structure_valid: usize,
    pub structure_invalid: usize,
    /// `None` when scoring did not run.
    pub inceptbench_passed: Option<usize>,
    pub inceptbench_run: bool,
    /// Percentage of rows that passed, one decimal. Only when scoring ran
    /// and there was at least one row.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pass_rate_pct: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

/// Summarize `rows`, stamped with the current time.
pub fn aggregate(rows: &[EvalRow], scoring_run: bool) -> EvalSummary {
    aggregate_at(rows, scoring_run, Utc::now())
}

/// Summarize `rows` with an explicit timestamp.
pub fn aggregate_at(rows: &[EvalRow], scoring_run: bool, timestamp: DateTime<Utc>) -> EvalSummary {
    let total = rows.len();
    let structure_valid = rows.iter().filter(|r| r.structure_valid).count();
    let passed = scoring_run.then(|| rows.iter().filter(|r| r.passed()).count());

    let pass_rate_pct = match passed {
        Some(p) if total > 0 => Some(round_to(p as f64 / total as f64 * 100.0, 1)),
        _ => None,
    };

    EvalSummary {
        total,
        structure_valid,
        structure_invalid: total - structure_valid,
        inceptbench_passed: passed,
        inceptbench_run: scoring_run,
        pass_rate_pct,
        timestamp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::ScoreOutcome;
    use serde_json::json;

    fn row(valid: bool, score: Option<f64>) -> EvalRow {
        EvalRow {
            id: "x".into(),
            substandard_id: String::new(),
            kind: "mcq".into(),
            structure_valid: valid,
            structure_errors: if valid { vec![] } else { vec!["missing id".into()] },
            score: score.map(|s| ScoreOutcome::from_evaluation(json!({"overall": {"score_100": s}}))),
        }
    }

    #[test]
    fn counts_and_pass_rate() {
        let rows = vec![row(true, Some(90.0)), row(true, Some(80.0))];
        let summary = aggregate(&rows, true);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.structure_valid, 2);
        assert_eq!(summary.structure_invalid, 0);
        assert_eq!(summary.inceptbench_passed, Some(1));
        assert_eq!(summary.pass_rate_pct, Some(50.0));
    }

    #[test]
    fn pass_rate_rounds_to_one_decimal() {
        let rows = vec![row(true, Some(99.0)), row(false, Some(10.0)), row(true, None)];
        let summary = aggregate(&rows, true);
        assert_eq!(summary.pass_rate_pct, Some(33.3));
        assert_eq!(summary.structure_invalid, 1);
    }

    #[test]
    fn no_scoring_means_no_pass_counts() {
        let rows = vec![row(true, None), row(false, None)];
        let summary = aggregate(&rows, false);
        assert_eq!(summary.inceptbench_passed, None);
        assert!(!summary.inceptbench_run);
        assert_eq!(summary.pass_rate_pct, None);

        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["inceptbench_passed"], serde_json::Value::Null);
        assert!(value.get("pass_rate_pct").is_none());
    }

    #[test]
    fn empty_rows_have_no_pass_rate() {
        let summary = aggregate(&[], true);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.inceptbench_passed, Some(0));
        assert_eq!(summary.pass_rate_pct, None);
    }

    #[test]
    fn aggregate_is_pure() {
        let rows = vec![row(true, Some(88.0)), row(false, None), row(true, Some(70.0))];
        let at = Utc::now();
        let first = aggregate_at(&rows, true, at);
        assert_eq!(first, aggregate_at(&rows, true, at));
        assert_eq!(first.structure_valid + first.structure_invalid, first.total);
    }
}
