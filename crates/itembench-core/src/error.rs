//! Error taxonomy for the load and generation stages.
//!
//! Load errors are fatal and abort a run before dispatch begins. Generation
//! errors are per-request: the dispatcher records them and keeps going.

use std::path::PathBuf;

use thiserror::Error;

/// Maximum number of characters of an error message kept in a batch result.
pub const ERROR_MESSAGE_LIMIT: usize = 200;

/// Errors raised while loading a prompt source.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The prompt file does not exist.
    #[error("input file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The prompt file exists but could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A line (JSONL) or the whole document (JSON) is not valid JSON.
    #[error("{}{}: {source}", .path.display(), .line.map(|l| format!(":{l}")).unwrap_or_default())]
    Parse {
        path: PathBuf,
        /// 1-based line number for line-delimited sources.
        line: Option<usize>,
        #[source]
        source: serde_json::Error,
    },

    /// Valid JSON, but not a shape we know how to read requests from.
    #[error("unsupported JSON shape: {0}")]
    SchemaMismatch(String),
}

/// Per-request failures from a generation collaborator.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The service answered with a non-success status.
    #[error("HTTP {status}")]
    HttpStatus { status: u16, body: String },

    /// The call succeeded but returned no generated content.
    #[error("No content in response")]
    EmptyContent,

    /// The call exceeded its per-request ceiling.
    #[error("Request timeout")]
    Timeout(u64),

    /// The request never got a response.
    #[error("{0}")]
    Network(String),

    /// The response body could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The in-process generator reported a failure.
    #[error("{0}")]
    Sdk(String),
}

impl GenerationError {
    /// `true` for transport-level errors (console `ERROR`), `false` for
    /// well-formed but unsuccessful answers (console `FAIL`).
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            GenerationError::Timeout(_)
                | GenerationError::Network(_)
                | GenerationError::Decode(_)
                | GenerationError::Sdk(_)
        )
    }

    /// The message stored in a batch result's `errors` entry.
    ///
    /// For a bad status this is the response body (or `HTTP <status>` when
    /// the body is empty), truncated to [`ERROR_MESSAGE_LIMIT`] characters.
    pub fn record_message(&self) -> String {
        let message = match self {
            GenerationError::HttpStatus { status, body } if body.is_empty() => {
                format!("HTTP {status}")
            }
            GenerationError::HttpStatus { body, .. } => body.clone(),
            other => other.to_string(),
        };
        truncate_chars(&message, ERROR_MESSAGE_LIMIT)
    }

    /// Short cause printed after `FAIL:` / `ERROR:` on the console.
    pub fn console_cause(&self) -> String {
        match self {
            GenerationError::HttpStatus { status, .. } => format!("HTTP {status}"),
            GenerationError::EmptyContent => "no content".into(),
            GenerationError::Timeout(_) => "timeout".into(),
            other => other.to_string(),
        }
    }
}

/// Truncate to at most `max` characters without splitting a code point.
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
