//! Prompt source loader.
//!
//! Reads generation requests from a line-delimited (`.jsonl`) file or from a
//! JSON document in one of the accepted shapes.

use std::path::Path;

use serde_json::Value;

use crate::error::LoadError;
use crate::model::GenerationRequest;

/// Keys under which a JSON document may carry its request list.
const LIST_KEYS: [&str; 3] = ["prompts", "requests", "items"];

/// Load generation requests from `path`.
///
/// The file extension selects the format: `.jsonl` is one JSON object per
/// non-blank line, anything else is parsed as a single JSON document.
pub fn load_prompts(path: &Path) -> Result<Vec<GenerationRequest>, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }

    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let is_jsonl = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("jsonl"));

    let requests = if is_jsonl {
        parse_jsonl(&text, path)?
    } else {
        parse_document_str(&text, path)?
    };

    tracing::debug!(count = requests.len(), path = %path.display(), "loaded prompts");
    Ok(requests)
}

/// Parse line-delimited JSON. The first malformed line aborts the load.
pub fn parse_jsonl(text: &str, source_path: &Path) -> Result<Vec<GenerationRequest>, LoadError> {
    let mut values = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(line).map_err(|source| LoadError::Parse {
            path: source_path.to_path_buf(),
            line: Some(idx + 1),
            source,
        })?;
        values.push(value);
    }
    to_requests(values)
}

/// Parse a JSON document in any of the accepted shapes.
pub fn parse_document_str(
    text: &str,
    source_path: &Path,
) -> Result<Vec<GenerationRequest>, LoadError> {
    let doc: Value = serde_json::from_str(text.trim()).map_err(|source| LoadError::Parse {
        path: source_path.to_path_buf(),
        line: None,
        source,
    })?;
    to_requests(extract_request_values(doc)?)
}

/// Pull the list of request objects out of a parsed document.
fn extract_request_values(doc: Value) -> Result<Vec<Value>, LoadError> {
    let mut map = match doc {
        Value::Array(list) => return Ok(list),
        Value::Object(map) => map,
        other => {
            return Err(LoadError::SchemaMismatch(format!(
                "top-level {} (need a list or an object with a 'prompts'/'requests'/'items' list)",
                json_kind(&other)
            )))
        }
    };

    for key in LIST_KEYS {
        if let Some(Value::Array(list)) = map.remove(key) {
            return Ok(list.into_iter().map(unwrap_request).collect());
        }
    }

    // A previous batch result handed back as input: reuse its requests.
    if let Some(generated) = map.remove("generated_content") {
        let Value::Array(list) = generated else {
            return Err(LoadError::SchemaMismatch(
                "'generated_content' is not a list".into(),
            ));
        };
        return Ok(list
            .into_iter()
            .filter_map(|mut entry| entry.get_mut("request").map(Value::take))
            .filter(is_present)
            .collect());
    }

    let keys: Vec<&str> = map.keys().map(String::as_str).collect();
    Err(LoadError::SchemaMismatch(format!(
        "object with keys {keys:?} (need a list or an object with a 'prompts'/'requests'/'items' list)"
    )))
}

/// Use an element's nested `request` field when it has one.
fn unwrap_request(entry: Value) -> Value {
    match entry {
        Value::Object(mut map) if map.contains_key("request") => {
            map.remove("request").unwrap_or(Value::Null)
        }
        other => other,
    }
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        _ => true,
    }
}

fn to_requests(values: Vec<Value>) -> Result<Vec<GenerationRequest>, LoadError> {
    values
        .into_iter()
        .enumerate()
        .map(|(idx, value)| {
            serde_json::from_value(value).map_err(|e| {
                LoadError::SchemaMismatch(format!("request #{} is not a request object: {e}", idx + 1))
            })
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn doc(text: &str) -> Result<Vec<GenerationRequest>, LoadError> {
        parse_document_str(text, &PathBuf::from("prompts.json"))
    }

    #[test]
    fn jsonl_skips_blank_lines() {
        let text = r#"{"type": "mcq", "skills": {"substandard_id": "A"}}

{"type": "fill-in", "skills": {"substandard_id": "B"}}
"#;
        let requests = parse_jsonl(text, &PathBuf::from("p.jsonl")).unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].substandard_id(), Some("B"));
    }

    #[test]
    fn jsonl_malformed_line_reports_line_number() {
        let text = "{\"type\": \"mcq\"}\n{not json}\n{\"type\": \"msq\"}\n";
        let err = parse_jsonl(text, &PathBuf::from("p.jsonl")).unwrap_err();
        assert!(matches!(err, LoadError::Parse { line: Some(2), .. }));
    }

    #[test]
    fn document_top_level_list() {
        let requests = doc(r#"[{"type": "mcq"}, {"type": "msq"}]"#).unwrap();
        assert_eq!(requests.len(), 2);
    }

    #[test]
    fn document_prompts_key_unwraps_nested_request() {
        let requests = doc(
            r#"{"prompts": [
                {"request": {"type": "fill-in", "grade": "5"}, "note": "x"},
                {"type": "mcq"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].kind_str(), Some("fill-in"));
        assert!(requests[0].extra.is_empty());
        assert_eq!(requests[1].kind_str(), Some("mcq"));
    }

    #[test]
    fn document_requests_and_items_keys() {
        assert_eq!(doc(r#"{"requests": [{"type": "mcq"}]}"#).unwrap().len(), 1);
        assert_eq!(doc(r#"{"items": [{}, {}]}"#).unwrap().len(), 2);
    }

    #[test]
    fn document_batch_result_reuses_requests() {
        let requests = doc(
            r#"{"generated_content": [
                {"id": "a", "request": {"type": "mcq"}, "content": {}},
                {"id": "b", "content": {}},
                {"id": "c", "request": {"type": "msq"}, "content": {}}
            ], "metadata": {}}"#,
        )
        .unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].kind_str(), Some("msq"));
    }

    #[test]
    fn document_unsupported_shape() {
        let err = doc(r#"{"questions": []}"#).unwrap_err();
        assert!(matches!(err, LoadError::SchemaMismatch(_)));
        assert!(err.to_string().contains("questions"));

        let err = doc("42").unwrap_err();
        assert!(err.to_string().contains("number"));
    }

    #[test]
    fn document_malformed_json() {
        let err = doc("{\"prompts\": [").unwrap_err();
        assert!(matches!(err, LoadError::Parse { line: None, .. }));
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = load_prompts(&PathBuf::from("/nonexistent/prompts.jsonl")).unwrap_err();
        assert!(matches!(err, LoadError::NotFound(_)));
    }

    #[test]
    fn load_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let jsonl = dir.path().join("p.jsonl");
        std::fs::write(&jsonl, "{\"type\": \"mcq\"}\n{\"type\": \"msq\"}\n").unwrap();
        assert_eq!(load_prompts(&jsonl).unwrap().len(), 2);

        let json = dir.path().join("p.json");
        std::fs::write(&json, "[{\"type\": \"mcq\"}]").unwrap();
        assert_eq!(load_prompts(&json).unwrap().len(), 1);
    }
}
