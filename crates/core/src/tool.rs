//! Tool trait: the abstraction over controller capabilities.
//!
//! Tools are what the generator asks the controller to run: arithmetic,
//! string transforms, greetings. Results are a tagged [`ToolOutput`] so the
//! controller's heuristics can ask "is this a number?" without guessing.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;
use crate::error::ToolError;

/// Prefix carried by every error observation fed back to the generator.
pub const TOOL_ERROR_MARKER: &str = "[tool_error]";

/// A tool definition rendered into the controller's instruction header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    /// Render a call signature such as `divide(a: number, b: number)`.
    ///
    /// Parameters are listed in the schema's `required` order, followed by
    /// any optional properties in key order.
    pub fn signature(&self) -> String {
        let props = self.parameters.get("properties").and_then(|p| p.as_object());
        let mut names: Vec<String> = self
            .parameters
            .get("required")
            .and_then(|r| r.as_array())
            .map(|r| r.iter().filter_map(|v| v.as_str().map(String::from)).collect())
            .unwrap_or_default();
        if let Some(props) = props {
            for key in props.keys() {
                if !names.contains(key) {
                    names.push(key.clone());
                }
            }
        }

        let params: Vec<String> = names
            .iter()
            .map(|n| {
                let ty = props
                    .and_then(|p| p.get(n))
                    .and_then(|p| p.get("type"))
                    .and_then(|t| t.as_str())
                    .unwrap_or("any");
                format!("{n}: {ty}")
            })
            .collect();
        format!("{}({})", self.name, params.join(", "))
    }
}

/// The result of a tool execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ToolOutput {
    Number(f64),
    Text(String),
    /// Error message without the marker; `Display` adds it.
    Error(String),
}

impl ToolOutput {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(message.into())
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Self::Number(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// The text of a non-empty `Text` result.
    pub fn non_empty_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) if !s.is_empty() => Some(s),
            _ => None,
        }
    }
}

impl std::fmt::Display for ToolOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // Whole numbers print without a trailing `.0`.
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
            Self::Error(e) => write!(f, "{TOOL_ERROR_MARKER} {e}"),
        }
    }
}

/// The core Tool trait.
///
/// Each tool (add_numbers, divide, greeting, ...) implements this trait and
/// is registered in the [`ToolRegistry`] the controller executes against.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "add_numbers").
    fn name(&self) -> &str;

    /// A description of what this tool does.
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given arguments object.
    async fn execute(&self, arguments: serde_json::Value) -> std::result::Result<ToolOutput, ToolError>;

    /// Convert this tool into a ToolDefinition for the instruction header.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// A registry of available tools.
///
/// The controller uses this to:
/// 1. Render tool signatures into the instruction header
/// 2. Resolve and execute tools by canonical name
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Get all tool definitions, sorted by name.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self.tools.values().map(|t| t.to_definition()).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// Execute a tool by canonical name.
    ///
    /// Never fails: unknown tools and tool errors come back as
    /// [`ToolOutput::Error`] so the loop can feed them to the generator.
    pub async fn execute(&self, name: &str, arguments: &serde_json::Map<String, serde_json::Value>) -> ToolOutput {
        let Some(tool) = self.tools.get(name) else {
            return ToolOutput::error(format!(
                "Unknown tool '{}'. Available: {}",
                name,
                self.names().join(", ")
            ));
        };

        match tool.execute(serde_json::Value::Object(arguments.clone())).await {
            Ok(output) => output,
            Err(e) => {
                warn!(tool = name, error = %e, "Tool execution failed");
                match e {
                    ToolError::InvalidArguments(reason) => {
                        ToolOutput::error(format!("Bad args for '{name}': {reason}"))
                    }
                    ToolError::ExecutionFailed { reason, .. } => ToolOutput::error(reason),
                }
            }
        }
    }

    /// List all registered tool names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
