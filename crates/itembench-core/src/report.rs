//! Persisted file formats: batch results, eval rows, and eval summary.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::aggregate::EvalSummary;
use crate::evaluate::EvalRow;
use crate::model::{lenient_list, BatchResult, GeneratedItem};

pub const BATCH_RESULTS_FILE: &str = "batch_results.json";
pub const EVAL_RESULTS_FILE: &str = "eval_results.json";
pub const EVAL_SUMMARY_FILE: &str = "eval_summary.json";

/// Write `value` as pretty-printed JSON, creating parent directories.
pub fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize JSON")?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Read a JSON file into `T`.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
}

impl BatchResult {
    pub fn save_json(&self, path: &Path) -> Result<()> {
        save_json(self, path)
    }

    pub fn load_json(path: &Path) -> Result<Self> {
        load_json(path)
    }
}

/// The part of a batch result file the evaluator reads.
#[derive(Debug, Default, Deserialize)]
struct GeneratedContentFile {
    #[serde(default, deserialize_with = "lenient_list")]
    generated_content: Vec<GeneratedItem>,
}

/// Load the generated items of a batch result file, ignoring its errors
/// and metadata.
pub fn load_generated_items(path: &Path) -> Result<Vec<GeneratedItem>> {
    let file: GeneratedContentFile = load_json(path)?;
    Ok(file.generated_content)
}

/// Contents of `eval_results.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalResults {
    pub items: Vec<EvalRow>,
}

/// Where [`write_eval_outputs`] put its files.
#[derive(Debug, Clone)]
pub struct EvalOutputPaths {
    pub results: PathBuf,
    pub summary: PathBuf,
}

/// Write `eval_results.json` and `eval_summary.json` into `dir`.
pub fn write_eval_outputs(
    dir: &Path,
    rows: &[EvalRow],
    summary: &EvalSummary,
) -> Result<EvalOutputPaths> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;

    let paths = EvalOutputPaths {
        results: dir.join(EVAL_RESULTS_FILE),
        summary: dir.join(EVAL_SUMMARY_FILE),
    };
    save_json(
        &EvalResults {
            items: rows.to_vec(),
        },
        &paths.results,
    )?;
    save_json(summary, &paths.summary)?;
    Ok(paths)
}

/// An output location given with a file extension means its directory.
pub fn normalize_output_dir(path: &Path) -> PathBuf {
    if path.extension().is_some() {
        path.parent().map(Path::to_path_buf).unwrap_or_default()
    } else {
        path.to_path_buf()
    }
}
