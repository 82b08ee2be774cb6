//! itembench-core — Dispatch, validation, and scoring pipeline.
//!
//! This crate defines the data model, collaborator traits, prompt loader,
//! batch dispatcher, structural validator, score normalization, and
//! summary aggregation that the rest of itembench builds on.

pub mod aggregate;
pub mod dispatch;
pub mod error;
pub mod evaluate;
pub mod loader;
pub mod model;
pub mod report;
pub mod scoring;
pub mod traits;
pub mod validator;

pub use error::{GenerationError, LoadError};
