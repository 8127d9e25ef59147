//! History store trait: the per-session conversation log.
//!
//! The controller reads a bounded recent window before each request and
//! appends exactly one user turn and one assistant turn after it. Stores
//! must keep insertion order per session and must make a session's own
//! appends visible to its next `recent` call.

use async_trait::async_trait;
use crate::error::MemoryError;
use crate::message::{Role, SessionId, Turn};

/// The core HistoryStore trait.
///
/// Implementations: SQLite (persistent), in-memory (testing / ephemeral).
/// Appends from different sessions may arrive concurrently.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// The backend name (e.g., "sqlite", "in_memory").
    fn name(&self) -> &str;

    /// Append one turn to a session.
    async fn append(&self, session: &SessionId, role: Role, content: &str) -> std::result::Result<(), MemoryError>;

    /// The most recent `limit` turns of a session, oldest first.
    async fn recent(&self, session: &SessionId, limit: usize) -> std::result::Result<Vec<Turn>, MemoryError>;

    /// Delete every turn of a session. Returns how many were removed.
    async fn clear(&self, session: &SessionId) -> std::result::Result<usize, MemoryError>;

    /// Persist a completed request: the user's text, then the final answer.
    async fn persist_exchange(
        &self,
        session: &SessionId,
        user_text: &str,
        answer: &str,
    ) -> std::result::Result<(), MemoryError> {
        self.append(session, Role::User, user_text).await?;
        self.append(session, Role::Assistant, answer).await
    }
}
