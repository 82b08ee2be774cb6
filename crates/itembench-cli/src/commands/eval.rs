//! The `itembench eval` command.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use comfy_table::{Cell, Table};

use itembench_core::aggregate::{aggregate, EvalSummary};
use itembench_core::evaluate::{EvalProgress, EvalRow, Evaluator};
use itembench_core::report::{
    load_generated_items, normalize_output_dir, write_eval_outputs, BATCH_RESULTS_FILE,
};
use itembench_providers::config::{load_config_from, ScorerSettings};
use itembench_runner::InceptBenchScorer;

use crate::EvalArgs;

/// Console progress reporter.
struct ConsoleReporter;

impl EvalProgress for ConsoleReporter {
    fn on_item_complete(&self, index: usize, total: usize, row: &EvalRow) {
        let mut status = if row.structure_valid { "OK" } else { "INVALID" }.to_string();
        if let Some(score) = row.score_100() {
            status.push_str(&format!(" {score}%"));
        }
        eprintln!("  [{}/{}] {} {status}", index + 1, total, row.id);
    }
}

fn build_scorer(settings: &ScorerSettings) -> InceptBenchScorer {
    InceptBenchScorer::new(&settings.program, settings.args.clone())
        .with_timeout(Duration::from_millis(settings.timeout_ms))
        .with_pass_threshold(settings.pass_threshold)
}

pub async fn execute(args: EvalArgs) -> Result<()> {
    let config = load_config_from(args.config.as_deref())?;

    let input = args
        .input
        .unwrap_or_else(|| config.output_dir.join(BATCH_RESULTS_FILE));
    let output_dir = normalize_output_dir(args.output_dir.as_ref().unwrap_or(&config.output_dir));

    anyhow::ensure!(
        input.exists(),
        "{} not found. Run: itembench batch",
        input.display()
    );

    let items = load_generated_items(&input)?;
    if items.is_empty() {
        eprintln!("No generated_content to evaluate.");
        return Ok(());
    }

    let evaluator = if args.no_inceptbench {
        Evaluator::structure_only()
    } else {
        Evaluator::with_scorer(Arc::new(build_scorer(&config.scorer)))
    };

    eprintln!("Evaluating {} items from {}", items.len(), input.display());
    let rows = evaluator.evaluate(&items, &ConsoleReporter).await;
    let summary = aggregate(&rows, evaluator.scoring_enabled());

    let paths = write_eval_outputs(&output_dir, &rows, &summary)?;

    print_rows(&rows, evaluator.scoring_enabled());
    eprintln!("\nResults: {}", paths.results.display());
    eprintln!("Summary: {}", paths.summary.display());
    print_summary(&summary, config.scorer.pass_threshold);

    Ok(())
}

fn print_rows(rows: &[EvalRow], scoring: bool) {
    let mut table = Table::new();
    let mut header = vec!["ID", "Substandard", "Type", "Structure"];
    if scoring {
        header.extend(["Score", "Passed"]);
    }
    table.set_header(header);

    for row in rows {
        let structure = if row.structure_valid {
            "valid".to_string()
        } else {
            row.structure_errors.join("; ")
        };
        let mut cells = vec![
            Cell::new(&row.id),
            Cell::new(&row.substandard_id),
            Cell::new(&row.kind),
            Cell::new(structure),
        ];
        if scoring {
            cells.push(Cell::new(
                row.score_100()
                    .map(|s| format!("{s}"))
                    .unwrap_or_else(|| "-".into()),
            ));
            cells.push(Cell::new(if row.passed() { "yes" } else { "no" }));
        }
        table.add_row(cells);
    }

    eprintln!("\n{table}");
}

fn print_summary(summary: &EvalSummary, threshold: f64) {
    eprintln!(
        "  Structure: {}/{} valid",
        summary.structure_valid, summary.total
    );
    if let Some(passed) = summary.inceptbench_passed {
        let rate = summary
            .pass_rate_pct
            .map(|r| format!("{r:.1}"))
            .unwrap_or_else(|| "-".into());
        eprintln!(
            "  InceptBench pass (≥{threshold}%): {passed}/{} ({rate}%)",
            summary.total
        );
    }
}
