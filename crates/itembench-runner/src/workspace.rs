//! Scoped scratch directory for one grading-tool invocation.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use tempfile::TempDir;

const INPUT_FILE: &str = "in.json";
const OUTPUT_FILE: &str = "out.json";

/// A uniquely named temporary directory holding the tool's input and output.
///
/// On drop, the directory and everything in it is removed, whichever way
/// the scoring call ended.
pub struct ScoringWorkspace {
    dir: TempDir,
}

impl ScoringWorkspace {
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("incept_")
            .tempdir()
            .context("failed to create scoring workspace")?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn input_path(&self) -> PathBuf {
        self.dir.path().join(INPUT_FILE)
    }

    pub fn output_path(&self) -> PathBuf {
        self.dir.path().join(OUTPUT_FILE)
    }

    /// Write the tool input as pretty-printed JSON.
    pub fn write_input<T: Serialize>(&self, payload: &T) -> Result<PathBuf> {
        let path = self.input_path();
        let json = serde_json::to_string_pretty(payload).context("failed to serialize payload")?;
        std::fs::write(&path, json)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Read the tool output. `None` if it is missing or not valid JSON.
    pub fn read_output(&self) -> Option<Value> {
        let path = self.output_path();
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("grading tool wrote no output at {}: {e}", path.display());
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(doc) => Some(doc),
            Err(e) => {
                tracing::warn!("grading tool output is not valid JSON: {e}");
                None
            }
        }
    }
}
