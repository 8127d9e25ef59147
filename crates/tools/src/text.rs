//! Text tools: `to_uppercase` and `greeting`.

use async_trait::async_trait;
use agentlab_core::error::ToolError;
use agentlab_core::tool::{Tool, ToolOutput};

/// Read a text argument; numbers are accepted and rendered as text.
fn text_arg(arguments: &serde_json::Value, key: &str) -> Result<String, ToolError> {
    match arguments.get(key) {
        Some(serde_json::Value::String(s)) => Ok(s.clone()),
        Some(serde_json::Value::Number(n)) => Ok(n.to_string()),
        Some(other) => Err(ToolError::InvalidArguments(format!(
            "'{key}' must be a string, got {other}"
        ))),
        None => Err(ToolError::InvalidArguments(format!("missing '{key}'"))),
    }
}

pub struct ToUppercaseTool;

#[async_trait]
impl Tool for ToUppercaseTool {
    fn name(&self) -> &str {
        "to_uppercase"
    }

    fn description(&self) -> &str {
        "Convert text to upper case."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "text": { "type": "string", "description": "Text to transform" }
            },
            "required": ["text"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutput, ToolError> {
        Ok(ToolOutput::Text(text_arg(&arguments, "text")?.to_uppercase()))
    }
}

pub struct GreetingTool;

#[async_trait]
impl Tool for GreetingTool {
    fn name(&self) -> &str {
        "greeting"
    }

    fn description(&self) -> &str {
        "Greet a person by name."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "name": { "type": "string", "description": "Who to greet" }
            },
            "required": ["name"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let name = text_arg(&arguments, "name")?;
        Ok(ToolOutput::Text(format!("Hello {name}")))
    }
}
