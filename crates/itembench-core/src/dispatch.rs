//! Batch dispatcher.
//!
//! Drives a sampled list of generation requests through a
//! [`ContentGenerator`], one request at a time, so console progress and the
//! resulting batch stay index-aligned. A failing request is recorded and the
//! batch moves on; nothing after sampling can abort a run.

use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::GenerationError;
use crate::model::{BatchMetadata, BatchResult, FailedRequest, GeneratedItem, GenerationRequest};
use crate::traits::{ContentGenerator, GeneratorTarget};

/// Default per-request ceiling.
pub const DEFAULT_TIMEOUT_MS: u64 = 120_000;

/// Default reference generation service.
pub const DEFAULT_ENDPOINT: &str = "https://inceptagentic-skill-mcq-lanzf3jtla-uc.a.run.app";

/// Explicit configuration for a dispatch run.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Base URL of the HTTP generation service.
    pub endpoint: String,
    /// Skills directory; when set, the in-process generator is used.
    pub skills_root: Option<PathBuf>,
    /// Per-request ceiling in milliseconds.
    pub timeout_ms: u64,
    /// Label written to `metadata.source`.
    pub source: String,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            skills_root: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            source: "itembench batch".to_string(),
        }
    }
}

impl DispatcherConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Which requests of the loaded list a batch processes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SamplePolicy {
    /// Every request.
    All,
    /// The first `n` requests.
    First(usize),
    /// `n` distinct requests drawn uniformly, capped at the list length.
    Random { n: usize, seed: Option<u64> },
}

impl SamplePolicy {
    /// Build a policy from CLI-style flags. Random wins when both are given;
    /// zero counts as not given.
    pub fn from_flags(first: Option<usize>, random: Option<usize>, seed: Option<u64>) -> Self {
        match (first.filter(|n| *n > 0), random.filter(|n| *n > 0)) {
            (_, Some(n)) => SamplePolicy::Random { n, seed },
            (Some(n), None) => SamplePolicy::First(n),
            (None, None) => SamplePolicy::All,
        }
    }

    /// Apply the policy. Sampled requests keep their source order.
    pub fn apply(&self, requests: Vec<GenerationRequest>) -> Vec<GenerationRequest> {
        match *self {
            SamplePolicy::All => requests,
            SamplePolicy::First(n) => requests.into_iter().take(n).collect(),
            SamplePolicy::Random { n, seed } => {
                let len = requests.len();
                let mut rng = match seed {
                    Some(seed) => StdRng::seed_from_u64(seed),
                    None => StdRng::from_entropy(),
                };
                let mut keep = vec![false; len];
                for idx in rand::seq::index::sample(&mut rng, len, n.min(len)) {
                    keep[idx] = true;
                }
                requests
                    .into_iter()
                    .zip(keep)
                    .filter_map(|(request, kept)| kept.then_some(request))
                    .collect()
            }
        }
    }

    /// Suffix for the "Loaded N prompts" banner, e.g. ` (random 20)`.
    pub fn describe(&self) -> String {
        match self {
            SamplePolicy::All => String::new(),
            SamplePolicy::First(n) => format!(" (first {n})"),
            SamplePolicy::Random { n, .. } => format!(" (random {n})"),
        }
    }
}

/// Progress reporting for a dispatch run.
pub trait DispatchProgress: Send + Sync {
    fn on_request_start(&self, index: usize, total: usize, request: &GenerationRequest);
    fn on_request_ok(&self, index: usize, item: &GeneratedItem);
    fn on_request_failed(&self, index: usize, request: &GenerationRequest, error: &GenerationError);
    fn on_batch_complete(&self, result: &BatchResult, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopProgress;

impl DispatchProgress for NoopProgress {
    fn on_request_start(&self, _: usize, _: usize, _: &GenerationRequest) {}
    fn on_request_ok(&self, _: usize, _: &GeneratedItem) {}
    fn on_request_failed(&self, _: usize, _: &GenerationRequest, _: &GenerationError) {}
    fn on_batch_complete(&self, _: &BatchResult, _: Duration) {}
}

/// Sequential batch dispatcher.
pub struct Dispatcher {
    generator: Arc<dyn ContentGenerator>,
    config: DispatcherConfig,
}

impl Dispatcher {
    pub fn new(generator: Arc<dyn ContentGenerator>, config: DispatcherConfig) -> Self {
        Self { generator, config }
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Sample `requests` and generate one item per request.
    pub async fn dispatch(
        &self,
        requests: Vec<GenerationRequest>,
        policy: &SamplePolicy,
        input_file: &str,
        progress: &dyn DispatchProgress,
    ) -> BatchResult {
        let start = Instant::now();
        let requests = policy.apply(requests);
        let total = requests.len();

        tracing::info!(
            total,
            generator = self.generator.name(),
            target = %self.generator.target(),
            "dispatching batch"
        );

        let mut generated = Vec::with_capacity(total);
        let mut errors = Vec::new();

        for (index, request) in requests.into_iter().enumerate() {
            progress.on_request_start(index, total, &request);

            match self.generate_one(&request).await {
                Ok(item) => {
                    progress.on_request_ok(index, &item);
                    generated.push(item);
                }
                Err(e) => {
                    tracing::warn!(
                        index,
                        substandard_id = request.substandard_id().unwrap_or("?"),
                        "generation failed: {e}"
                    );
                    progress.on_request_failed(index, &request, &e);
                    errors.push(FailedRequest {
                        request,
                        error: e.record_message(),
                    });
                }
            }
        }

        let (endpoint, skills_root) = match self.generator.target() {
            GeneratorTarget::Endpoint(url) => (Some(url), None),
            GeneratorTarget::SkillsRoot(path) => (None, Some(path.display().to_string())),
        };

        let result = BatchResult {
            metadata: BatchMetadata {
                source: self.config.source.clone(),
                endpoint,
                skills_root,
                input_file: input_file.to_string(),
                total,
                success: generated.len(),
                failed: errors.len(),
                timestamp: chrono::Utc::now(),
            },
            generated_content: generated,
            errors,
        };

        progress.on_batch_complete(&result, start.elapsed());
        result
    }

    /// One request under the per-request ceiling. Only the first returned
    /// content entry is kept.
    async fn generate_one(
        &self,
        request: &GenerationRequest,
    ) -> Result<GeneratedItem, GenerationError> {
        let call = AssertUnwindSafe(self.generator.generate(request)).catch_unwind();
        let contents = match tokio::time::timeout(self.config.timeout(), call).await {
            Err(_) => return Err(GenerationError::Timeout(self.config.timeout_ms)),
            Ok(Err(panic)) => return Err(GenerationError::Sdk(panic_message(&*panic))),
            Ok(Ok(result)) => result?,
        };

        let first = contents
            .into_iter()
            .next()
            .ok_or(GenerationError::EmptyContent)?;
        Ok(GeneratedItem::from_generated(request.clone(), first))
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    format!("generator panicked: {detail}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GeneratedContent, ItemContent, Skills};
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;

    fn request(id: &str) -> GenerationRequest {
        GenerationRequest {
            kind: Some("mcq".into()),
            skills: Some(Skills {
                substandard_id: Some(id.into()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    /// Behaves according to the substandard id: "slow" sleeps, "empty"
    /// returns nothing, "bad" answers HTTP 500, "boom" panics, "two"
    /// returns two entries.
    struct ScriptedGenerator {
        seen: Mutex<Vec<String>>,
    }

    impl ScriptedGenerator {
        fn new() -> Self {
            Self {
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ContentGenerator for ScriptedGenerator {
        fn name(&self) -> &str {
            "scripted"
        }

        fn target(&self) -> GeneratorTarget {
            GeneratorTarget::Endpoint("http://scripted".into())
        }

        async fn generate(
            &self,
            request: &GenerationRequest,
        ) -> Result<Vec<GeneratedContent>, GenerationError> {
            let id = request.substandard_id().unwrap_or_default().to_string();
            self.seen.lock().unwrap().push(id.clone());
            let entry = |suffix: &str| GeneratedContent {
                id: format!("{id}-{suffix}").into(),
                content: ItemContent::default(),
            };
            match id.as_str() {
                "slow" => {
                    tokio::time::sleep(Duration::from_secs(600)).await;
                    Ok(vec![entry("late")])
                }
                "empty" => Ok(vec![]),
                "bad" => Err(GenerationError::HttpStatus {
                    status: 500,
                    body: "internal error".into(),
                }),
                "boom" => panic!("generator exploded"),
                "two" => Ok(vec![entry("a"), entry("b")]),
                _ => Ok(vec![entry("item")]),
            }
        }
    }

    fn dispatcher(generator: Arc<ScriptedGenerator>, timeout_ms: u64) -> Dispatcher {
        Dispatcher::new(
            generator,
            DispatcherConfig {
                timeout_ms,
                ..Default::default()
            },
        )
    }

    #[test]
    fn random_takes_precedence_over_first() {
        assert_eq!(
            SamplePolicy::from_flags(Some(5), Some(10), None),
            SamplePolicy::Random { n: 10, seed: None }
        );
        assert_eq!(
            SamplePolicy::from_flags(Some(5), None, None),
            SamplePolicy::First(5)
        );
        assert_eq!(SamplePolicy::from_flags(Some(0), Some(0), None), SamplePolicy::All);
    }

    #[test]
    fn first_n_is_a_prefix() {
        let requests: Vec<_> = (0..5).map(|i| request(&i.to_string())).collect();
        let sampled = SamplePolicy::First(3).apply(requests.clone());
        assert_eq!(sampled, requests[..3].to_vec());
        assert_eq!(SamplePolicy::First(10).apply(requests.clone()).len(), 5);
    }

    #[test]
    fn random_n_samples_distinct_requests() {
        let requests: Vec<_> = (0..100).map(|i| request(&format!("s{i}"))).collect();
        let sampled = SamplePolicy::Random { n: 10, seed: None }.apply(requests.clone());
        assert_eq!(sampled.len(), 10);

        let ids: HashSet<_> = sampled.iter().map(|r| r.substandard_id()).collect();
        assert_eq!(ids.len(), 10, "no duplicates");
        assert!(sampled.iter().all(|r| requests.contains(r)));
    }

    #[test]
    fn random_n_is_capped_and_seedable() {
        let requests: Vec<_> = (0..4).map(|i| request(&i.to_string())).collect();
        let policy = SamplePolicy::Random { n: 50, seed: Some(7) };
        assert_eq!(policy.apply(requests.clone()).len(), 4);

        let policy = SamplePolicy::Random { n: 2, seed: Some(7) };
        assert_eq!(policy.apply(requests.clone()), policy.apply(requests));
    }

    #[tokio::test]
    async fn failures_are_isolated_and_counted() {
        let generator = Arc::new(ScriptedGenerator::new());
        let dispatcher = dispatcher(Arc::clone(&generator), 1_000);
        let requests = vec![
            request("ok1"),
            request("bad"),
            request("empty"),
            request("boom"),
            request("ok2"),
        ];

        let result = dispatcher
            .dispatch(requests, &SamplePolicy::All, "in.jsonl", &NoopProgress)
            .await;

        assert_eq!(result.metadata.total, 5);
        assert_eq!(result.metadata.success, 2);
        assert_eq!(result.metadata.failed, 3);
        assert_eq!(
            result.generated_content.len() + result.errors.len(),
            result.metadata.total
        );
        assert_eq!(result.generated_content[0].id, "ok1-item");
        assert_eq!(result.generated_content[1].id, "ok2-item");
        assert_eq!(result.errors[0].error, "internal error");
        assert_eq!(result.errors[1].error, "No content in response");
        assert!(result.errors[2].error.contains("generator exploded"));
        assert_eq!(result.metadata.input_file, "in.jsonl");
        assert_eq!(result.metadata.endpoint.as_deref(), Some("http://scripted"));

        let seen = generator.seen.lock().unwrap().clone();
        assert_eq!(seen, vec!["ok1", "bad", "empty", "boom", "ok2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_is_recorded_not_retried() {
        let generator = Arc::new(ScriptedGenerator::new());
        let dispatcher = dispatcher(Arc::clone(&generator), 120_000);

        let result = dispatcher
            .dispatch(
                vec![request("slow"), request("ok")],
                &SamplePolicy::All,
                "",
                &NoopProgress,
            )
            .await;

        assert_eq!(result.metadata.failed, 1);
        assert_eq!(result.errors[0].error, "Request timeout");
        assert_eq!(result.metadata.success, 1);
        assert_eq!(generator.seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn only_first_content_entry_is_kept() {
        let generator = Arc::new(ScriptedGenerator::new());
        let result = dispatcher(generator, 1_000)
            .dispatch(vec![request("two")], &SamplePolicy::All, "", &NoopProgress)
            .await;
        assert_eq!(result.generated_content.len(), 1);
        assert_eq!(result.generated_content[0].id, "two-a");
        assert_eq!(result.generated_content[0].request, request("two"));
    }

    #[tokio::test]
    async fn random_sample_dispatches_exactly_n() {
        let generator = Arc::new(ScriptedGenerator::new());
        let requests: Vec<_> = (0..100).map(|i| request(&format!("s{i}"))).collect();
        let result = dispatcher(Arc::clone(&generator), 1_000)
            .dispatch(
                requests,
                &SamplePolicy::Random { n: 10, seed: None },
                "",
                &NoopProgress,
            )
            .await;

        assert_eq!(result.metadata.total, 10);
        let seen: HashSet<_> = generator.seen.lock().unwrap().iter().cloned().collect();
        assert_eq!(seen.len(), 10);
    }
}
