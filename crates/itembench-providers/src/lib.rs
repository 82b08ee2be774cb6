//! itembench-providers — Content-generation transports.
//!
//! Implements the `ContentGenerator` trait for a remote HTTP generation
//! service and for in-process generation functions, plus the TOML
//! configuration layer that selects between them.

pub mod config;
pub mod http;
pub mod mock;
pub mod sdk;

pub use config::{create_generator, load_config, load_config_from, ItembenchConfig};
pub use http::HttpGenerator;
pub use mock::{MockGenerator, MockOutcome};
pub use sdk::{InProcessGenerator, SdkResponse};
