//! # agentlab Core
//!
//! Domain types, traits, and error definitions for the agentlab reasoning
//! controller. This crate has **no framework dependencies**: it defines the
//! domain model that every other crate implements against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator of the controller is a trait here:
//! - [`Generator`]: the opaque prompt → text engine
//! - [`Tool`]: a capability the controller can invoke by name
//! - [`HistoryStore`]: the per-session conversation log
//!
//! Implementations live in their respective crates, so the controller can be
//! driven by scripted fakes in tests and by real backends in the binary.

pub mod error;
pub mod memory;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use memory::HistoryStore;
pub use message::{Role, SessionId, Turn};
pub use provider::Generator;
pub use tool::{Tool, ToolDefinition, ToolOutput, ToolRegistry, TOOL_ERROR_MARKER};
