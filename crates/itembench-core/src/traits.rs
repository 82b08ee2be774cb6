//! Core trait definitions for generation collaborators and item scorers.
//!
//! These async traits are implemented by the `itembench-providers` and
//! `itembench-runner` crates respectively.

use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::GenerationError;
use crate::model::{GeneratedContent, GeneratedItem, GenerationRequest};
use crate::scoring::ScoreOutcome;

// ---------------------------------------------------------------------------
// Generation collaborator
// ---------------------------------------------------------------------------

/// Where a generator sends its requests. Recorded in batch metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratorTarget {
    /// HTTP service base URL.
    Endpoint(String),
    /// Skills directory used by an in-process generator.
    SkillsRoot(PathBuf),
}

impl fmt::Display for GeneratorTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneratorTarget::Endpoint(url) => write!(f, "{url}"),
            GeneratorTarget::SkillsRoot(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A backend that turns one generation request into content items.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Short transport name (e.g. "http").
    fn name(&self) -> &str;

    /// Where requests go, for batch metadata.
    fn target(&self) -> GeneratorTarget;

    /// Generate content for one request.
    ///
    /// An `Ok` with an empty list is treated as a failure by the dispatcher.
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<GeneratedContent>, GenerationError>;
}

// ---------------------------------------------------------------------------
// Item scorer
// ---------------------------------------------------------------------------

/// Scores a generated item with an external quality grader.
#[async_trait]
pub trait ItemScorer: Send + Sync {
    /// Human-readable scorer name (e.g. "inceptbench").
    fn name(&self) -> &str;

    /// Score one item. `None` means scoring was unavailable, not failed.
    async fn score(&self, item: &GeneratedItem) -> Option<ScoreOutcome>;
}
