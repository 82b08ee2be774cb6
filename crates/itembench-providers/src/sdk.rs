//! In-process generation transport.
//!
//! Wraps an async generation function that runs inside this process
//! against a skills directory, instead of calling a remote service.

use std::future::Future;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};

use itembench_core::error::GenerationError;
use itembench_core::model::{lenient_list, GeneratedContent, GenerationRequest};
use itembench_core::traits::{ContentGenerator, GeneratorTarget};

/// What an in-process generation function reports back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SdkResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_content: Option<SdkContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SdkContent {
    #[serde(default, deserialize_with = "lenient_list")]
    pub generated_content: Vec<GeneratedContent>,
}

impl SdkResponse {
    pub fn ok(items: Vec<GeneratedContent>) -> Self {
        Self {
            success: true,
            generated_content: Some(SdkContent {
                generated_content: items,
            }),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            generated_content: None,
            error: Some(error.into()),
        }
    }
}

type GenerateFn =
    Box<dyn Fn(GenerationRequest, bool) -> BoxFuture<'static, SdkResponse> + Send + Sync>;

/// Generator backed by an in-process function.
///
/// The function receives an owned copy of the request and the verbose flag.
pub struct InProcessGenerator {
    skills_root: PathBuf,
    verbose: bool,
    generate: GenerateFn,
}

impl InProcessGenerator {
    pub fn new<F, Fut>(skills_root: impl Into<PathBuf>, generate: F) -> Self
    where
        F: Fn(GenerationRequest, bool) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = SdkResponse> + Send + 'static,
    {
        Self {
            skills_root: skills_root.into(),
            verbose: false,
            generate: Box::new(move |request, verbose| generate(request, verbose).boxed()),
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn skills_root(&self) -> &Path {
        &self.skills_root
    }
}

#[async_trait]
impl ContentGenerator for InProcessGenerator {
    fn name(&self) -> &str {
        "in-process"
    }

    fn target(&self) -> GeneratorTarget {
        GeneratorTarget::SkillsRoot(self.skills_root.clone())
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<GeneratedContent>, GenerationError> {
        let response = (self.generate)(request.clone(), self.verbose).await;
        if !response.success {
            return Err(GenerationError::Sdk(
                response
                    .error
                    .unwrap_or_else(|| "generation failed".to_string()),
            ));
        }
        Ok(response
            .generated_content
            .map(|c| c.generated_content)
            .unwrap_or_default())
    }
}
