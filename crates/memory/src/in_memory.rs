//! In-memory history: useful for testing and ephemeral sessions.

use async_trait::async_trait;
use agentlab_core::error::MemoryError;
use agentlab_core::memory::HistoryStore;
use agentlab_core::message::{Role, SessionId, Turn};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Session-keyed turn lists behind a single lock.
///
/// Appends take the write lock, so concurrent sessions never interleave
/// inside one list.
#[derive(Clone)]
pub struct InMemoryHistory {
    sessions: Arc<RwLock<HashMap<String, Vec<Turn>>>>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Seed a session with turns.
    #[cfg(any(test, feature = "test-util"))]
    pub async fn with_turns(session: &SessionId, turns: Vec<Turn>) -> Self {
        let history = Self::new();
        history
            .sessions
            .write()
            .await
            .insert(session.to_string(), turns);
        history
    }

    /// Total turns stored for a session.
    #[cfg(any(test, feature = "test-util"))]
    pub async fn len(&self, session: &SessionId) -> usize {
        self.sessions
            .read()
            .await
            .get(session.as_str())
            .map_or(0, Vec::len)
    }
}

impl Default for InMemoryHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistory {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn append(&self, session: &SessionId, role: Role, content: &str) -> Result<(), MemoryError> {
        self.sessions
            .write()
            .await
            .entry(session.to_string())
            .or_default()
            .push(Turn {
                role,
                content: content.to_string(),
            });
        Ok(())
    }

    async fn recent(&self, session: &SessionId, limit: usize) -> Result<Vec<Turn>, MemoryError> {
        let sessions = self.sessions.read().await;
        let Some(turns) = sessions.get(session.as_str()) else {
            return Ok(vec![]);
        };
        let start = turns.len().saturating_sub(limit);
        Ok(turns[start..].to_vec())
    }

    async fn clear(&self, session: &SessionId) -> Result<usize, MemoryError> {
        Ok(self
            .sessions
            .write()
            .await
            .remove(session.as_str())
            .map_or(0, |t| t.len()))
    }
}
