//! Configuration and generator factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use itembench_core::dispatch::{DispatcherConfig, DEFAULT_ENDPOINT, DEFAULT_TIMEOUT_MS};
use itembench_core::scoring::PASS_THRESHOLD;
use itembench_core::traits::ContentGenerator;

use crate::http::HttpGenerator;

/// Environment variable that overrides the generation endpoint.
pub const ENDPOINT_ENV: &str = "ITEMBENCH_ENDPOINT";

/// Name of the project-local config file.
pub const CONFIG_FILE: &str = "itembench.toml";

/// Generation collaborator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorSettings {
    /// Base URL of the HTTP generation service.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Skills directory for in-process generation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills_root: Option<PathBuf>,
    /// Per-request ceiling in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Grading-tool settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScorerSettings {
    #[serde(default = "default_program")]
    pub program: String,
    /// Arguments placed before the `evaluate` subcommand.
    #[serde(default = "default_args")]
    pub args: Vec<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Minimum 0-100 score counted as a pass.
    #[serde(default = "default_pass_threshold")]
    pub pass_threshold: f64,
}

/// Top-level itembench configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItembenchConfig {
    #[serde(default)]
    pub generator: GeneratorSettings,
    #[serde(default)]
    pub scorer: ScorerSettings,
    /// Where `batch` and `eval` write their files.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}
fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}
fn default_program() -> String {
    "python3".to_string()
}
fn default_args() -> Vec<String> {
    vec!["-m".to_string(), "inceptbench".to_string()]
}
fn default_pass_threshold() -> f64 {
    PASS_THRESHOLD
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            skills_root: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for ScorerSettings {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: default_args(),
            timeout_ms: default_timeout_ms(),
            pass_threshold: default_pass_threshold(),
        }
    }
}

impl Default for ItembenchConfig {
    fn default() -> Self {
        Self {
            generator: GeneratorSettings::default(),
            scorer: ScorerSettings::default(),
            output_dir: default_output_dir(),
        }
    }
}

impl GeneratorSettings {
    pub fn to_dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig {
            endpoint: self.endpoint.clone(),
            skills_root: self.skills_root.clone(),
            timeout_ms: self.timeout_ms,
            ..Default::default()
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
/// Unset variables resolve to the empty string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let value = std::env::var(&result[start + 2..start + end]).unwrap_or_default();
        result.replace_range(start..start + end + 1, &value);
    }
    result
}

fn resolve_path(path: &Path) -> PathBuf {
    PathBuf::from(resolve_env_vars(&path.to_string_lossy()))
}

impl ItembenchConfig {
    /// Resolve `${VAR}` references in string and path settings.
    fn resolve_env(mut self) -> Self {
        self.generator.endpoint = resolve_env_vars(&self.generator.endpoint);
        self.generator.skills_root = self.generator.skills_root.as_deref().map(resolve_path);
        self.scorer.program = resolve_env_vars(&self.scorer.program);
        self.scorer.args = self.scorer.args.iter().map(|a| resolve_env_vars(a)).collect();
        self.output_dir = resolve_path(&self.output_dir);
        self
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `itembench.toml` in the current directory
/// 2. `~/.config/itembench/config.toml`
///
/// `ITEMBENCH_ENDPOINT` overrides the configured endpoint.
pub fn load_config() -> Result<ItembenchConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<ItembenchConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from(CONFIG_FILE);
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|dir| dir.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => ItembenchConfig::default(),
    };

    Ok(apply_env_overrides(config))
}

/// Parse a config document and resolve its `${VAR}` references.
pub fn parse_config(content: &str) -> Result<ItembenchConfig> {
    let config: ItembenchConfig = toml::from_str(content)?;
    Ok(config.resolve_env())
}

fn apply_env_overrides(mut config: ItembenchConfig) -> ItembenchConfig {
    if let Ok(endpoint) = std::env::var(ENDPOINT_ENV) {
        if !endpoint.is_empty() {
            config.generator.endpoint = endpoint;
        }
    }
    config
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("itembench"))
}

/// Create the generator a dispatch configuration selects.
///
/// Only the HTTP transport can be built from configuration alone; an
/// in-process generator needs its generation function and is constructed
/// with [`crate::sdk::InProcessGenerator::new`].
pub fn create_generator(config: &DispatcherConfig) -> Result<Arc<dyn ContentGenerator>> {
    if let Some(root) = &config.skills_root {
        anyhow::bail!(
            "skills root {} selects in-process generation, which has no built-in generation \
             function; embed itembench and pass an InProcessGenerator instead",
            root.display()
        );
    }
    let generator = HttpGenerator::with_timeout(&config.endpoint, config.timeout())?;
    Ok(Arc::new(generator))
}

/// Sample config written by `itembench init`.
pub const SAMPLE_CONFIG: &str = r#"# itembench configuration

output_dir = "output"

[generator]
endpoint = "https://inceptagentic-skill-mcq-lanzf3jtla-uc.a.run.app"
# skills_root = "${ITEMBENCH_SKILLS_ROOT}"
timeout_ms = 120000

[scorer]
program = "python3"
args = ["-m", "inceptbench"]
timeout_ms = 120000
pass_threshold = 85.0
"#;
