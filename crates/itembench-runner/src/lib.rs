//! itembench-runner — Sandboxed grading-tool execution.
//!
//! Scores generated items by running the external grading tool as an
//! isolated subprocess inside a scoped temporary workspace.

pub mod inceptbench;
pub mod workspace;

pub use inceptbench::{InceptBenchScorer, ScoringPayload};
pub use workspace::ScoringWorkspace;
