//! Structural validation of generated items.
//!
//! Checks content shape only, never educational quality. Every rule is
//! evaluated; failures accumulate in rule order.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{GeneratedItem, ItemType};

/// Number of answer options a choice question must carry.
pub const CHOICE_OPTION_COUNT: usize = 4;

/// Result of validating one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationOutcome {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

/// Validate one generated item against the content-shape rules.
pub fn validate(item: &GeneratedItem) -> ValidationOutcome {
    let mut errors = Vec::new();
    let content = &item.content;

    if item.id_str().is_none() {
        errors.push("missing id".to_string());
    }
    if !has_text(content.question.as_ref()) {
        errors.push("missing content.question".to_string());
    }
    if content
        .image_url
        .as_ref()
        .is_some_and(|v| !is_null_or_empty_list(v))
    {
        errors.push("image_url must be []".to_string());
    }

    let option_count = content.answer_options.as_ref().map_or(0, len_of);
    match item.request.item_type() {
        kind if kind.is_choice() => {
            if option_count != CHOICE_OPTION_COUNT {
                errors.push(format!(
                    "answer_options must have {CHOICE_OPTION_COUNT} items, got {option_count}"
                ));
            }
            if !is_truthy(content.answer.as_ref()) {
                errors.push("missing answer".to_string());
            }
        }
        ItemType::FillIn => {
            if is_truthy(content.answer_options.as_ref()) {
                errors.push("fill-in must not have answer_options".to_string());
            }
            if !is_truthy(content.answer.as_ref())
                && !is_truthy(content.acceptable_alternatives.as_ref())
            {
                errors.push("fill-in must have answer or acceptable_alternatives".to_string());
            }
        }
        _ => {}
    }

    if !has_text(content.answer_explanation.as_ref()) {
        errors.push("missing answer_explanation".to_string());
    }

    ValidationOutcome::from_errors(errors)
}

/// A non-empty string.
fn has_text(value: Option<&Value>) -> bool {
    value
        .and_then(Value::as_str)
        .is_some_and(|s| !s.is_empty())
}

/// Element count of a list, key count of a map, character count of a
/// string. Scalars have no length and count as zero.
fn len_of(value: &Value) -> usize {
    match value {
        Value::Array(list) => list.len(),
        Value::Object(map) => map.len(),
        Value::String(s) => s.chars().count(),
        _ => 0,
    }
}

fn is_null_or_empty_list(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(list) => list.is_empty(),
        _ => false,
    }
}

/// Present and non-empty: null, `false`, `0`, `""`, `[]` and `{}` all count as missing.
fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(list)) => !list.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
    }
}
