//! Built-in tool implementations for agentlab.
//!
//! Arithmetic (`add_numbers`, `multiply`, `divide`) and text
//! (`to_uppercase`, `greeting`) capabilities the controller can invoke.

pub mod math;
pub mod text;

use agentlab_core::tool::ToolRegistry;

/// Create a registry with every built-in tool.
pub fn default_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(math::AddNumbersTool));
    registry.register(Box::new(math::MultiplyTool));
    registry.register(Box::new(math::DivideTool));
    registry.register(Box::new(text::ToUppercaseTool));
    registry.register(Box::new(text::GreetingTool));
    registry
}
