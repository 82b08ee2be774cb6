//! Mock generator for testing dispatch without a generation service.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use itembench_core::error::GenerationError;
use itembench_core::model::{GeneratedContent, GenerationRequest, ItemContent, ItemType};
use itembench_core::traits::{ContentGenerator, GeneratorTarget};

/// What the mock does for a given substandard.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// Return one item with this content.
    Item(ItemContent),
    /// Answer with a non-success status and body.
    Status(u16, String),
    /// Succeed with no items.
    Empty,
    /// Wait, then return this content.
    Delayed(Duration, ItemContent),
}

/// A generator with outcomes scripted by substandard id.
///
/// Unscripted requests get a structurally valid item of the requested type.
/// Item ids are fresh UUIDs.
pub struct MockGenerator {
    outcomes: HashMap<String, MockOutcome>,
    call_count: AtomicU32,
    last_request: Mutex<Option<GenerationRequest>>,
}

impl MockGenerator {
    pub fn new(outcomes: HashMap<String, MockOutcome>) -> Self {
        Self {
            outcomes,
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// A mock that answers every request with a valid item.
    pub fn always_valid() -> Self {
        Self::new(HashMap::new())
    }

    pub fn with_outcome(mut self, substandard_id: &str, outcome: MockOutcome) -> Self {
        self.outcomes.insert(substandard_id.to_string(), outcome);
        self
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    pub fn last_request(&self) -> Option<GenerationRequest> {
        self.last_request
            .lock()
            .ok()
            .and_then(|last| last.clone())
    }
}

/// A structurally valid item for `kind`.
pub fn valid_content(kind: &ItemType) -> ItemContent {
    let mut content = ItemContent {
        question: Some("Which sentence best states the central idea of the passage?".into()),
        answer_explanation: Some("The passage develops this idea in every paragraph.".into()),
        image_url: Some(json!([])),
        ..Default::default()
    };
    if kind.is_choice() {
        content.answer_options = Some(json!(["A", "B", "C", "D"]));
        content.answer = Some(json!("B"));
    } else {
        content.answer = Some(json!("theme"));
    }
    content
}

fn single(content: ItemContent) -> Vec<GeneratedContent> {
    vec![GeneratedContent {
        id: uuid::Uuid::new_v4().to_string().into(),
        content,
    }]
}

#[async_trait]
impl ContentGenerator for MockGenerator {
    fn name(&self) -> &str {
        "mock"
    }

    fn target(&self) -> GeneratorTarget {
        GeneratorTarget::Endpoint("mock://generator".into())
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<GeneratedContent>, GenerationError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(request.clone());
        }

        let outcome = request
            .substandard_id()
            .and_then(|id| self.outcomes.get(id))
            .cloned();

        match outcome {
            None => Ok(single(valid_content(&request.item_type()))),
            Some(MockOutcome::Item(content)) => Ok(single(content)),
            Some(MockOutcome::Status(status, body)) => {
                Err(GenerationError::HttpStatus { status, body })
            }
            Some(MockOutcome::Empty) => Ok(vec![]),
            Some(MockOutcome::Delayed(delay, content)) => {
                tokio::time::sleep(delay).await;
                Ok(single(content))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itembench_core::model::{GeneratedItem, Skills};
    use itembench_core::validator::validate;

    fn request(kind: &str, id: &str) -> GenerationRequest {
        GenerationRequest {
            kind: Some(kind.into()),
            skills: Some(Skills {
                substandard_id: Some(id.into()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn default_items_are_valid() {
        let mock = MockGenerator::always_valid();
        for kind in ["mcq", "msq", "fill-in"] {
            let req = request(kind, "RL.5.1");
            let generated = mock.generate(&req).await.unwrap().remove(0);
            let item = GeneratedItem::from_generated(req, generated);
            assert!(validate(&item).valid, "{kind}: {:?}", validate(&item).errors);
        }
        assert_eq!(mock.call_count(), 3);
        assert_eq!(
            mock.last_request().unwrap().kind_str(),
            Some("fill-in")
        );
    }

    #[tokio::test]
    async fn scripted_outcomes() {
        let mock = MockGenerator::always_valid()
            .with_outcome("bad", MockOutcome::Status(503, "unavailable".into()))
            .with_outcome("empty", MockOutcome::Empty);

        let err = mock.generate(&request("mcq", "bad")).await.unwrap_err();
        assert_eq!(err.record_message(), "unavailable");
        assert!(mock
            .generate(&request("mcq", "empty"))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn ids_are_unique() {
        let mock = MockGenerator::always_valid();
        let a = mock.generate(&request("mcq", "x")).await.unwrap();
        let b = mock.generate(&request("mcq", "x")).await.unwrap();
        assert_ne!(a[0].id, b[0].id);
    }
}
