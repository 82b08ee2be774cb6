//! InceptBench grading-tool scorer.
//!
//! Each item is scored in its own [`ScoringWorkspace`]: the payload is
//! written to `in.json`, the tool is run as
//! `<program> <args..> evaluate <in.json> -o <out.json>`, and the output is
//! read back. Any failure along the way yields `None`.

use std::process::Stdio;
use std::time::{Duration, Instant};

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio::process::Command;

use itembench_core::error::truncate_chars;
use itembench_core::model::{GeneratedItem, ResolvedRequest};
use itembench_core::scoring::{extract_evaluation, ScoreOutcome, PASS_THRESHOLD};
use itembench_core::traits::ItemScorer;

use crate::workspace::ScoringWorkspace;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Tool input: a single-item batch.
#[derive(Debug, Serialize)]
pub struct ScoringPayload<'a> {
    pub generated_content: [PayloadItem<'a>; 1],
}

#[derive(Debug, Serialize)]
pub struct PayloadItem<'a> {
    /// The item's id exactly as generated.
    pub id: &'a Value,
    /// The item content, JSON-encoded.
    pub content: String,
    pub request: ResolvedRequest,
}

impl<'a> ScoringPayload<'a> {
    pub fn for_item(item: &'a GeneratedItem) -> Result<Self> {
        Ok(Self {
            generated_content: [PayloadItem {
                id: &item.id,
                content: serde_json::to_string(&item.content)?,
                request: item.request.resolve(),
            }],
        })
    }
}

/// Runs the external grading tool as a subprocess, one item at a time.
pub struct InceptBenchScorer {
    program: String,
    args: Vec<String>,
    timeout: Duration,
    pass_threshold: f64,
}

impl InceptBenchScorer {
    /// `args` go between the program and the `evaluate` subcommand, e.g.
    /// `python3 -m inceptbench`.
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            timeout: DEFAULT_TIMEOUT,
            pass_threshold: PASS_THRESHOLD,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_pass_threshold(mut self, threshold: f64) -> Self {
        self.pass_threshold = threshold;
        self
    }

    /// Run the tool on one item and return its raw evaluation.
    pub async fn evaluate(&self, item: &GeneratedItem) -> Option<Value> {
        let id = item.display_id();
        let workspace = match ScoringWorkspace::new() {
            Ok(ws) => ws,
            Err(e) => {
                tracing::warn!("scoring skipped for {id}: {e:#}");
                return None;
            }
        };

        let input = match ScoringPayload::for_item(item).and_then(|p| workspace.write_input(&p)) {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!("scoring skipped for {id}: {e:#}");
                return None;
            }
        };
        let output = workspace.output_path();

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg("evaluate")
            .arg(&input)
            .arg("-o")
            .arg(&output)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let start = Instant::now();
        let result = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Err(_) => {
                tracing::warn!(
                    "grading tool timed out after {}s for {}",
                    self.timeout.as_secs_f64(),
                    id
                );
                return None;
            }
            Ok(Err(e)) => {
                tracing::warn!("failed to run grading tool '{}': {e}", self.program);
                return None;
            }
            Ok(Ok(result)) => result,
        };

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            tracing::warn!(
                status = %result.status,
                "grading tool failed for {}: {}",
                id,
                truncate_chars(stderr.trim(), 200)
            );
            return None;
        }
        tracing::debug!(
            id = %id,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "grading tool finished"
        );

        let doc = workspace.read_output()?;
        extract_evaluation(&doc, &id)
    }
}

#[async_trait]
impl ItemScorer for InceptBenchScorer {
    fn name(&self) -> &str {
        "inceptbench"
    }

    async fn score(&self, item: &GeneratedItem) -> Option<ScoreOutcome> {
        let evaluation = self.evaluate(item).await?;
        Some(ScoreOutcome::with_threshold(evaluation, self.pass_threshold))
    }
}
