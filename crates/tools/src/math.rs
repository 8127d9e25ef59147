//! Arithmetic tools: `add_numbers`, `multiply`, `divide`.
//!
//! Operands may arrive as JSON numbers or as numeric strings (a filled
//! `<last_result>` placeholder is always a string).

use async_trait::async_trait;
use agentlab_core::error::ToolError;
use agentlab_core::tool::{Tool, ToolOutput};

fn binary_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "a": { "type": "number", "description": "Left operand" },
            "b": { "type": "number", "description": "Right operand" }
        },
        "required": ["a", "b"]
    })
}

/// Read a numeric argument, accepting numbers and numeric strings.
fn number_arg(arguments: &serde_json::Value, key: &str) -> Result<f64, ToolError> {
    match arguments.get(key) {
        Some(serde_json::Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| ToolError::InvalidArguments(format!("'{key}' is not a finite number"))),
        Some(serde_json::Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| ToolError::InvalidArguments(format!("'{key}' is not a number: {s:?}"))),
        Some(other) => Err(ToolError::InvalidArguments(format!(
            "'{key}' must be a number, got {other}"
        ))),
        None => Err(ToolError::InvalidArguments(format!("missing '{key}'"))),
    }
}

fn operands(arguments: &serde_json::Value) -> Result<(f64, f64), ToolError> {
    Ok((number_arg(arguments, "a")?, number_arg(arguments, "b")?))
}

pub struct AddNumbersTool;

#[async_trait]
impl Tool for AddNumbersTool {
    fn name(&self) -> &str {
        "add_numbers"
    }

    fn description(&self) -> &str {
        "Add two numbers."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        binary_schema()
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let (a, b) = operands(&arguments)?;
        Ok(ToolOutput::Number(a + b))
    }
}

pub struct MultiplyTool;

#[async_trait]
impl Tool for MultiplyTool {
    fn name(&self) -> &str {
        "multiply"
    }

    fn description(&self) -> &str {
        "Multiply two numbers."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        binary_schema()
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let (a, b) = operands(&arguments)?;
        Ok(ToolOutput::Number(a * b))
    }
}

pub struct DivideTool;

#[async_trait]
impl Tool for DivideTool {
    fn name(&self) -> &str {
        "divide"
    }

    fn description(&self) -> &str {
        "Divide a by b."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        binary_schema()
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let (a, b) = operands(&arguments)?;
        if b == 0.0 {
            return Err(ToolError::ExecutionFailed {
                tool_name: self.name().into(),
                reason: "divide by zero".into(),
            });
        }
        Ok(ToolOutput::Number(a / b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentlab_core::tool::ToolRegistry;

    #[tokio::test]
    async fn add_numbers() {
        let out = AddNumbersTool
            .execute(serde_json::json!({"a": 2, "b": 3}))
            .await
            .unwrap();
        assert_eq!(out, ToolOutput::Number(5.0));
    }

    #[tokio::test]
    async fn numeric_strings_accepted() {
        let out = MultiplyTool
            .execute(serde_json::json!({"a": "5", "b": " 4 "}))
            .await
            .unwrap();
        assert_eq!(out, ToolOutput::Number(20.0));
    }

    #[tokio::test]
    async fn divide_formats_decimals() {
        let out = DivideTool
            .execute(serde_json::json!({"a": 10, "b": 4}))
            .await
            .unwrap();
        assert_eq!(out.to_string(), "2.5");
    }

    #[tokio::test]
    async fn divide_by_zero_is_tool_error() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(DivideTool));
        let args = serde_json::json!({"a": 1, "b": 0});
        let out = registry.execute("divide", args.as_object().unwrap()).await;
        assert_eq!(out.to_string(), "[tool_error] divide by zero");
    }

    #[tokio::test]
    async fn missing_operand() {
        let result = AddNumbersTool.execute(serde_json::json!({"a": 1})).await;
        assert!(matches!(result, Err(ToolError::InvalidArguments(_))));
    }

    #[tokio::test]
    async fn non_numeric_string_rejected() {
        let result = AddNumbersTool
            .execute(serde_json::json!({"a": "two", "b": 2}))
            .await;
        assert!(result.is_err());
    }
}
