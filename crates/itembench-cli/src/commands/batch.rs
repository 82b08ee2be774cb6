//! The `itembench batch` command.

use std::time::Duration;

use anyhow::{Context, Result};

use itembench_core::dispatch::{DispatchProgress, Dispatcher, SamplePolicy};
use itembench_core::error::GenerationError;
use itembench_core::loader::load_prompts;
use itembench_core::model::{BatchResult, GeneratedItem, GenerationRequest};
use itembench_core::report::BATCH_RESULTS_FILE;
use itembench_providers::config::load_config_from;
use itembench_providers::create_generator;

use crate::BatchArgs;

/// Console progress reporter.
struct ConsoleReporter;

impl DispatchProgress for ConsoleReporter {
    fn on_request_start(&self, index: usize, total: usize, request: &GenerationRequest) {
        eprintln!(
            "[{}/{}] {} ({})",
            index + 1,
            total,
            request.substandard_id().unwrap_or("?"),
            request.kind_str().unwrap_or("?")
        );
    }

    fn on_request_ok(&self, _index: usize, _item: &GeneratedItem) {
        eprintln!("  OK");
    }

    fn on_request_failed(&self, _index: usize, _request: &GenerationRequest, error: &GenerationError) {
        let label = if error.is_error() { "ERROR" } else { "FAIL" };
        eprintln!("  {label}: {}", error.console_cause());
    }

    fn on_batch_complete(&self, result: &BatchResult, elapsed: Duration) {
        tracing::info!(
            success = result.metadata.success,
            failed = result.metadata.failed,
            elapsed_s = elapsed.as_secs_f64(),
            "batch complete"
        );
    }
}

pub async fn execute(args: BatchArgs) -> Result<()> {
    let config = load_config_from(args.config.as_deref())?;

    anyhow::ensure!(
        args.input.exists(),
        "input file not found: {}",
        args.input.display()
    );
    let requests = load_prompts(&args.input)?;

    let mut settings = config.generator.clone();
    if let Some(endpoint) = args.endpoint {
        settings.endpoint = endpoint;
    }
    if let Some(timeout_ms) = args.timeout_ms {
        anyhow::ensure!(timeout_ms > 0, "timeout must be positive");
        settings.timeout_ms = timeout_ms;
    }
    let dispatcher_config = settings.to_dispatcher_config();
    let generator = create_generator(&dispatcher_config)?;

    let policy = SamplePolicy::from_flags(args.limit, args.random, args.seed);
    eprintln!(
        "Loaded {} prompts from {}{}",
        requests.len(),
        args.input.display(),
        policy.describe()
    );
    eprintln!("Endpoint: {}", generator.target());
    eprintln!();

    let dispatcher = Dispatcher::new(generator, dispatcher_config);
    let input_file = args.input.display().to_string();
    let result = dispatcher
        .dispatch(requests, &policy, &input_file, &ConsoleReporter)
        .await;

    let out_path = args
        .output
        .unwrap_or_else(|| config.output_dir.join(BATCH_RESULTS_FILE));
    result
        .save_json(&out_path)
        .context("failed to save batch result")?;

    eprintln!("\nSaved to {}", out_path.display());
    eprintln!(
        "  Success: {}/{}",
        result.metadata.success, result.metadata.total
    );
    eprintln!("  Next: itembench eval -i {}", out_path.display());

    Ok(())
}
