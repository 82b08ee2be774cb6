//! Per-item evaluation: structural validation plus optional benchmark scoring.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::model::GeneratedItem;
use crate::scoring::ScoreOutcome;
use crate::traits::ItemScorer;
use crate::validator::validate;

/// One row of `eval_results.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalRow {
    pub id: String,
    pub substandard_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub structure_valid: bool,
    pub structure_errors: Vec<String>,
    /// Present only when scoring ran for this batch.
    #[serde(flatten)]
    pub score: Option<ScoreOutcome>,
}

impl EvalRow {
    pub fn passed(&self) -> bool {
        self.score.as_ref().is_some_and(|s| s.passed)
    }

    pub fn score_100(&self) -> Option<f64> {
        self.score.as_ref().and_then(|s| s.score_100)
    }
}

/// Progress reporting for an evaluation run.
pub trait EvalProgress: Send + Sync {
    fn on_item_complete(&self, index: usize, total: usize, row: &EvalRow);
}

/// No-op evaluation progress reporter.
pub struct NoopEvalProgress;

impl EvalProgress for NoopEvalProgress {
    fn on_item_complete(&self, _: usize, _: usize, _: &EvalRow) {}
}

/// Runs the validator, and the scorer when one is configured, over a batch.
pub struct Evaluator {
    scorer: Option<Arc<dyn ItemScorer>>,
}

impl Evaluator {
    /// Structure checks only.
    pub fn structure_only() -> Self {
        Self { scorer: None }
    }

    pub fn with_scorer(scorer: Arc<dyn ItemScorer>) -> Self {
        Self {
            scorer: Some(scorer),
        }
    }

    pub fn scoring_enabled(&self) -> bool {
        self.scorer.is_some()
    }

    /// Evaluate one item. A structurally invalid item is still scored.
    pub async fn evaluate_item(&self, item: &GeneratedItem) -> EvalRow {
        let outcome = validate(item);

        let score = match &self.scorer {
            Some(scorer) => Some(
                scorer
                    .score(item)
                    .await
                    .unwrap_or_else(ScoreOutcome::unavailable),
            ),
            None => None,
        };

        EvalRow {
            id: item.display_id(),
            substandard_id: item.request.substandard_id().unwrap_or_default().to_string(),
            kind: item.request.kind_str().unwrap_or_default().to_string(),
            structure_valid: outcome.valid,
            structure_errors: outcome.errors,
            score,
        }
    }

    /// Evaluate items sequentially, in batch order.
    pub async fn evaluate(
        &self,
        items: &[GeneratedItem],
        progress: &dyn EvalProgress,
    ) -> Vec<EvalRow> {
        let total = items.len();
        let mut rows = Vec::with_capacity(total);
        for (index, item) in items.iter().enumerate() {
            let row = self.evaluate_item(item).await;
            tracing::debug!(id = %row.id, valid = row.structure_valid, "evaluated item");
            progress.on_item_complete(index, total, &row);
            rows.push(row);
        }
        rows
    }
}
