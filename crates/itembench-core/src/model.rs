//! Core data model types for itembench.
//!
//! Requests and generated items keep unknown fields in flattened `extra`
//! maps so that a request is forwarded to the generator exactly as loaded
//! and a batch result file round-trips without losing data.
//!
//! Fields whose shape the validator checks (`id`, `question`,
//! `answer_options`, ...) are kept as raw JSON. A malformed item must reach
//! [`crate::validator::validate`] instead of failing the whole response or
//! file it arrived in.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// The kind of content item a request asks for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemType {
    /// Multiple choice, single answer.
    Mcq,
    /// Multiple choice, multiple answers.
    Msq,
    /// Free-text fill-in.
    FillIn,
    /// Any other type string; carried through without structural rules.
    Other(String),
}

impl ItemType {
    /// Whether the item is a choice question (exactly four options expected).
    pub fn is_choice(&self) -> bool {
        matches!(self, ItemType::Mcq | ItemType::Msq)
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemType::Mcq => write!(f, "mcq"),
            ItemType::Msq => write!(f, "msq"),
            ItemType::FillIn => write!(f, "fill-in"),
            ItemType::Other(s) => write!(f, "{s}"),
        }
    }
}

impl FromStr for ItemType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "mcq" => ItemType::Mcq,
            "msq" => ItemType::Msq,
            "fill-in" => ItemType::FillIn,
            other => ItemType::Other(other.to_string()),
        })
    }
}

/// Target skill of a generation request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Skills {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub substandard_id: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Specification of one content item to produce.
///
/// Identity is positional (its index in the loaded list) until a generated
/// item assigns it a content id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Raw `type` field; see [`GenerationRequest::item_type`] for the
    /// resolved value.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<Value>,
    /// Grade level. Sources use both numbers and strings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<Skills>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GenerationRequest {
    /// Resolved item type. An absent `type` is treated as `mcq`.
    // TODO: reject requests without `type` once upstream prompt sets always carry it.
    pub fn item_type(&self) -> ItemType {
        match &self.kind {
            None => ItemType::Mcq,
            Some(Value::String(s)) => s.parse().unwrap_or(ItemType::Mcq),
            Some(other) => ItemType::Other(other.to_string()),
        }
    }

    /// The `type` field when it is a string.
    pub fn kind_str(&self) -> Option<&str> {
        self.kind.as_ref().and_then(Value::as_str)
    }

    pub fn substandard_id(&self) -> Option<&str> {
        self.skills
            .as_ref()
            .and_then(|s| s.substandard_id.as_ref())
            .and_then(Value::as_str)
    }
}

/// Defaults applied when forwarding a request to the grading tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDefaults {
    pub grade: &'static str,
    pub subject: &'static str,
    pub kind: &'static str,
    pub difficulty: &'static str,
}

/// The one place request defaults are declared.
pub const REQUEST_DEFAULTS: RequestDefaults = RequestDefaults {
    grade: "3",
    subject: "ela",
    kind: "mcq",
    difficulty: "easy",
};

/// Request fields with every default resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedRequest {
    pub grade: Value,
    pub subject: Value,
    #[serde(rename = "type")]
    pub kind: Value,
    pub difficulty: Value,
    pub skills: Skills,
}

impl GenerationRequest {
    /// Resolve optional fields against [`REQUEST_DEFAULTS`].
    pub fn resolve(&self) -> ResolvedRequest {
        ResolvedRequest {
            grade: self
                .grade
                .clone()
                .unwrap_or_else(|| REQUEST_DEFAULTS.grade.into()),
            subject: self
                .subject
                .clone()
                .unwrap_or_else(|| REQUEST_DEFAULTS.subject.into()),
            kind: self
                .kind
                .clone()
                .unwrap_or_else(|| REQUEST_DEFAULTS.kind.into()),
            difficulty: self
                .difficulty
                .clone()
                .unwrap_or_else(|| REQUEST_DEFAULTS.difficulty.into()),
            skills: self.skills.clone().unwrap_or_default(),
        }
    }
}

/// Content body of a generated item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<Value>,
    /// Expected to be a list; any other shape is reported by the validator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_options: Option<Value>,
    /// A string for mcq/fill-in, sometimes a list for msq.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acceptable_alternatives: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_explanation: Option<Value>,
    /// Must be absent, null, or `[]` at this stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One content entry as returned by a generator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedContent {
    #[serde(default)]
    pub id: Value,
    #[serde(default, deserialize_with = "or_default")]
    pub content: ItemContent,
}

/// A produced content item plus the request that produced it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedItem {
    /// Content id as the generator sent it; normally a non-empty string.
    #[serde(default)]
    pub id: Value,
    #[serde(default, deserialize_with = "or_default")]
    pub request: GenerationRequest,
    #[serde(default, deserialize_with = "or_default")]
    pub content: ItemContent,
}

impl GeneratedItem {
    pub fn from_generated(request: GenerationRequest, generated: GeneratedContent) -> Self {
        Self {
            id: generated.id,
            request,
            content: generated.content,
        }
    }

    /// The id when it is a non-empty string.
    pub fn id_str(&self) -> Option<&str> {
        self.id.as_str().filter(|s| !s.is_empty())
    }

    /// The id as shown in reports and logs: string ids verbatim, `null` as
    /// the empty string, anything else as JSON text.
    pub fn display_id(&self) -> String {
        match &self.id {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Deserialize `T`, falling back to `T::default()` when the value is null or
/// not shaped like `T`.
pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Deserialize a list, replacing entries not shaped like `T` with
/// `T::default()`. One bad entry must not cost the rest of the list.
pub fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let values = Vec::<Value>::deserialize(deserializer)?;
    Ok(values
        .into_iter()
        .map(|value| serde_json::from_value(value).unwrap_or_default())
        .collect())
}

/// A request the generator could not satisfy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedRequest {
    pub request: GenerationRequest,
    pub error: String,
}

/// Bookkeeping for one dispatch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchMetadata {
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills_root: Option<String>,
    #[serde(default)]
    pub input_file: String,
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub timestamp: DateTime<Utc>,
}

/// Everything one dispatch run produced. Written once as `batch_results.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    #[serde(deserialize_with = "lenient_list")]
    pub generated_content: Vec<GeneratedItem>,
    pub errors: Vec<FailedRequest>,
    pub metadata: BatchMetadata,
}
