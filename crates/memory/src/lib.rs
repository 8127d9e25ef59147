//! Conversation history store implementations for agentlab.

pub mod in_memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use in_memory::InMemoryHistory;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteHistory;
