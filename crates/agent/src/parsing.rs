//! Generator output normalization.
//!
//! Raw completions arrive wrapped in code fences, prefixed with labels,
//! padded with prose, or carrying bare `<placeholder>` values that are not
//! valid JSON. The functions here turn that text into at most one candidate
//! JSON object, and [`parse_tool_call`] turns the candidate into a
//! [`ToolCall`].

use regex_lite::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)```json\s*|\s*```").unwrap());

static TOOL_CALL_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*TOOL\s+CALL\s*:?:?\s*").unwrap());

static BARE_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"("[^"]+"\s*:\s*)(<[^<>"]+>)"#).unwrap());

/// A tool call requested by the generator.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    /// Tool name exactly as emitted, before alias resolution.
    pub tool: String,
    pub args: Map<String, Value>,
    /// A top-level `text` field, used only by the final-answer pseudo-tool.
    pub text: Option<String>,
}

/// Why a JSON candidate could not be read as a tool call.
#[derive(Debug, thiserror::Error)]
pub enum CallParseError {
    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON object")]
    NotAnObject,

    #[error("missing string field 'tool'")]
    MissingTool,

    #[error("'args' must be an object")]
    ArgsNotObject,
}

/// Remove markdown code fences and a leading `TOOL CALL:` label.
pub fn strip_noise(text: &str) -> String {
    let unfenced = CODE_FENCE.replace_all(text, "");
    TOOL_CALL_LABEL
        .replace(unfenced.trim(), "")
        .trim()
        .to_string()
}

/// Quote bare angle-bracket tokens used as JSON values:
/// `{"text":<last_result>}` becomes `{"text":"<last_result>"}`.
pub fn quote_bare_placeholders(raw: &str) -> String {
    BARE_PLACEHOLDER
        .replace_all(raw, r#"${1}"${2}""#)
        .into_owned()
}

/// The first balanced `{...}` block in `text`, by brace-depth counting.
///
/// Braces inside JSON strings are counted like any other; generator output
/// that puts unbalanced braces inside a string value is not recovered.
pub fn extract_first_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    for (offset, ch) in text[start..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse an extracted JSON block as `{"tool": "...", "args": {...}}`.
///
/// A missing `args` is an empty mapping.
pub fn parse_tool_call(block: &str) -> Result<ToolCall, CallParseError> {
    let value: Value = serde_json::from_str(block)?;
    let Value::Object(mut data) = value else {
        return Err(CallParseError::NotAnObject);
    };

    let tool = match data.remove("tool") {
        Some(Value::String(name)) => name,
        _ => return Err(CallParseError::MissingTool),
    };

    let args = match data.remove("args") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(args)) => args,
        Some(_) => return Err(CallParseError::ArgsNotObject),
    };

    let text = data.get("text").and_then(value_text);

    Ok(ToolCall { tool, args, text })
}

/// Render a scalar JSON value as plain text; empty strings and non-scalars
/// give `None`.
pub(crate) fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
