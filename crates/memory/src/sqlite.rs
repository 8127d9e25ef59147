//! SQLite history store.
//!
//! A single `turns` table keyed by an autoincrement id, so insertion order
//! per session is the id order. `recent` reads newest-first with a limit and
//! reverses the page back to chronological order.

use async_trait::async_trait;
use agentlab_core::error::MemoryError;
use agentlab_core::memory::HistoryStore;
use agentlab_core::message::{Role, SessionId, Turn};
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info, warn};

/// A persistent SQLite history store.
pub struct SqliteHistory {
    pool: SqlitePool,
}

impl SqliteHistory {
    /// Open (or create) a history database.
    ///
    /// Accepts a file path or a `sqlite:` URL. Pass `"sqlite::memory:"` for an
    /// ephemeral database.
    pub async fn new(path: &str) -> Result<Self, MemoryError> {
        let in_memory = path.contains(":memory:");
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| MemoryError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        // Every pooled connection to `:memory:` would otherwise be its own database.
        let max_connections = if in_memory { 1 } else { 4 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| MemoryError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite history store initialized at {path}");
        Ok(store)
    }

    /// Open a database file, creating its parent directory first.
    pub async fn open_file(path: &std::path::Path) -> Result<Self, MemoryError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| MemoryError::Storage(format!("Cannot create {}: {e}", parent.display())))?;
        }
        Self::new(&path.to_string_lossy()).await
    }

    /// Create from an existing pool (useful for testing).
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, MemoryError> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), MemoryError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS turns (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id  TEXT NOT NULL,
                role        TEXT NOT NULL CHECK(role IN ('user', 'assistant')),
                content     TEXT NOT NULL,
                created_at  TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::MigrationFailed(format!("turns table: {e}")))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_turns_session ON turns(session_id, id DESC)")
            .execute(&self.pool)
            .await
            .map_err(|e| MemoryError::MigrationFailed(format!("session index: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    fn row_to_turn(row: &sqlx::sqlite::SqliteRow) -> Result<Turn, MemoryError> {
        let role: String = row
            .try_get("role")
            .map_err(|e| MemoryError::QueryFailed(format!("role column: {e}")))?;
        let content: String = row
            .try_get("content")
            .map_err(|e| MemoryError::QueryFailed(format!("content column: {e}")))?;
        let role = Role::parse(&role)
            .ok_or_else(|| MemoryError::QueryFailed(format!("unknown role '{role}'")))?;
        Ok(Turn { role, content })
    }
}

#[async_trait]
impl HistoryStore for SqliteHistory {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn append(&self, session: &SessionId, role: Role, content: &str) -> Result<(), MemoryError> {
        sqlx::query("INSERT INTO turns (session_id, role, content, created_at) VALUES (?1, ?2, ?3, ?4)")
            .bind(session.as_str())
            .bind(role.as_str())
            .bind(content)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| MemoryError::Storage(format!("INSERT failed: {e}")))?;

        debug!(session = %session, role = role.as_str(), "Appended turn");
        Ok(())
    }

    /// Both turns land in one transaction, so a failed answer write never
    /// leaves an orphaned user turn.
    async fn persist_exchange(&self, session: &SessionId, user_text: &str, answer: &str) -> Result<(), MemoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| MemoryError::Storage(format!("BEGIN failed: {e}")))?;
        let now = Utc::now().to_rfc3339();

        for (role, content) in [(Role::User, user_text), (Role::Assistant, answer)] {
            sqlx::query("INSERT INTO turns (session_id, role, content, created_at) VALUES (?1, ?2, ?3, ?4)")
                .bind(session.as_str())
                .bind(role.as_str())
                .bind(content)
                .bind(&now)
                .execute(&mut *tx)
                .await
                .map_err(|e| MemoryError::Storage(format!("INSERT failed: {e}")))?;
        }

        tx.commit()
            .await
            .map_err(|e| MemoryError::Storage(format!("COMMIT failed: {e}")))?;
        debug!(session = %session, "Persisted exchange");
        Ok(())
    }

    async fn recent(&self, session: &SessionId, limit: usize) -> Result<Vec<Turn>, MemoryError> {
        let rows = sqlx::query(
            "SELECT role, content FROM turns WHERE session_id = ?1 ORDER BY id DESC LIMIT ?2",
        )
        .bind(session.as_str())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| MemoryError::QueryFailed(format!("recent turns: {e}")))?;

        let mut turns = Vec::with_capacity(rows.len());
        for row in rows.iter().rev() {
            match Self::row_to_turn(row) {
                Ok(turn) => turns.push(turn),
                Err(e) => warn!("Skipping unreadable turn: {e}"),
            }
        }
        Ok(turns)
    }

    async fn clear(&self, session: &SessionId) -> Result<usize, MemoryError> {
        let result = sqlx::query("DELETE FROM turns WHERE session_id = ?1")
            .bind(session.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| MemoryError::Storage(format!("DELETE failed: {e}")))?;

        Ok(result.rows_affected() as usize)
    }
}
