//! HTTP generation service transport.
//!
//! `POST {endpoint}/generate` with the request as the JSON body. Only a
//! `200` answer counts; its body is `{"generated_content": [{id, content}]}`.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;

use itembench_core::dispatch::DEFAULT_TIMEOUT_MS;
use itembench_core::error::GenerationError;
use itembench_core::model::{lenient_list, GeneratedContent, GenerationRequest};
use itembench_core::traits::{ContentGenerator, GeneratorTarget};

/// Client for a remote generation service.
pub struct HttpGenerator {
    endpoint: String,
    client: reqwest::Client,
    timeout_ms: u64,
}

impl HttpGenerator {
    pub fn new(endpoint: &str) -> Result<Self> {
        Self::with_timeout(endpoint, Duration::from_millis(DEFAULT_TIMEOUT_MS))
    }

    pub fn with_timeout(endpoint: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            client,
            timeout_ms: timeout.as_millis() as u64,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default, deserialize_with = "lenient_list")]
    generated_content: Vec<GeneratedContent>,
}

#[async_trait]
impl ContentGenerator for HttpGenerator {
    fn name(&self) -> &str {
        "http"
    }

    fn target(&self) -> GeneratorTarget {
        GeneratorTarget::Endpoint(self.endpoint.clone())
    }

    #[instrument(skip(self, request), fields(substandard_id = request.substandard_id().unwrap_or("?")))]
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<GeneratedContent>, GenerationError> {
        let start = Instant::now();

        let response = self
            .client
            .post(format!("{}/generate", self.endpoint))
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::Timeout(self.timeout_ms)
                } else {
                    GenerationError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        tracing::debug!(status, elapsed_ms = start.elapsed().as_millis() as u64, "generate responded");

        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::HttpStatus { status, body });
        }

        let body: GenerateResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                GenerationError::Timeout(self.timeout_ms)
            } else {
                GenerationError::Decode(e.to_string())
            }
        })?;

        Ok(body.generated_content)
    }
}
