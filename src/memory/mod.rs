//! Conversation memory
//!
//! Append-only per-session ledger of (user_message, bot_response, timestamp)
//! turns on SQLite. Turn order within a session is append (rowid) order, not
//! a race on the timestamp clock; the WAL writer serializes same-session
//! appends while reads observe a consistent prefix.

use crate::error::{RaglineError, Result};
use chrono::{DateTime, Utc};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Database connection pool
pub type DbPool = Pool<SqliteConnectionManager>;

/// One recorded conversation turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// What the user sent
    pub user_message: String,
    /// What the assistant answered
    pub bot_response: String,
    /// When the turn was recorded
    pub timestamp: DateTime<Utc>,
}

/// SQLite-backed conversation ledger
pub struct ConversationMemory {
    pool: DbPool,
}

impl ConversationMemory {
    /// Open (or create) the ledger at `db_path`
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| RaglineError::Io {
                    source: e,
                    context: format!("Failed to create database directory: {}", parent.display()),
                })?;
            }
        }

        let manager = SqliteConnectionManager::file(db_path);
        let pool = Pool::builder()
            .max_size(16)
            .build(manager)
            .map_err(|e| RaglineError::Config(format!("Failed to create connection pool: {}", e)))?;

        {
            let conn = pool.get().map_err(|e| {
                RaglineError::Config(format!("Failed to get connection: {}", e))
            })?;

            // WAL mode: readers never block the single writer
            conn.execute_batch(
                "
                PRAGMA journal_mode = WAL;
                PRAGMA synchronous = NORMAL;
                PRAGMA busy_timeout = 5000;
                ",
            )?;
        }

        let memory = Self { pool };
        memory.migrate()?;

        Ok(memory)
    }

    fn get_conn(&self) -> Result<r2d2::PooledConnection<SqliteConnectionManager>> {
        self.pool
            .get()
            .map_err(|e| RaglineError::Config(format!("Failed to get connection: {}", e)))
    }

    /// Run database migrations
    fn migrate(&self) -> Result<()> {
        let conn = self.get_conn()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            )",
            [],
        )?;

        let current_version: i32 = conn
            .query_row(
                "SELECT COALESCE(MAX(version), 0) FROM _migrations",
                [],
                |row| row.get(0),
            )
            .unwrap_or(0);

        for (version, migration) in MIGRATIONS.iter().enumerate() {
            let version = version as i32 + 1;

            if version > current_version {
                tracing::info!("Applying migration {}", version);
                conn.execute_batch(migration)?;
                conn.execute(
                    "INSERT INTO _migrations (version, applied_at) VALUES (?1, datetime('now'))",
                    params![version],
                )?;
            }
        }

        Ok(())
    }

    /// Record one turn for a session
    ///
    /// Assigns the current time; never overwrites. A session exists as soon
    /// as its first turn is appended.
    pub fn append(&self, session_id: &str, user_message: &str, bot_response: &str) -> Result<()> {
        let conn = self.get_conn()?;
        let timestamp = Utc::now().timestamp();

        conn.execute(
            "INSERT INTO chat_history (session_id, user_message, bot_response, timestamp)
             VALUES (?1, ?2, ?3, ?4)",
            params![session_id, user_message, bot_response, timestamp],
        )?;

        Ok(())
    }

    /// Read a session's turns in insertion order
    ///
    /// An unknown session id yields an empty list, not an error.
    pub fn history(&self, session_id: &str) -> Result<Vec<Turn>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            "SELECT user_message, bot_response, timestamp
             FROM chat_history WHERE session_id = ?1 ORDER BY id ASC",
        )?;

        let rows = stmt.query_map(params![session_id], |row| {
            let ts: i64 = row.get(2)?;
            Ok(Turn {
                user_message: row.get(0)?,
                bot_response: row.get(1)?,
                timestamp: DateTime::from_timestamp(ts, 0).unwrap_or_else(Utc::now),
            })
        })?;

        let mut turns = Vec::new();
        for row in rows {
            turns.push(row?);
        }

        Ok(turns)
    }

    /// Ledger statistics for status display
    pub fn stats(&self) -> Result<MemoryStats> {
        let conn = self.get_conn()?;

        let session_count: i64 = conn.query_row(
            "SELECT COUNT(DISTINCT session_id) FROM chat_history",
            [],
            |row| row.get(0),
        )?;

        let turn_count: i64 =
            conn.query_row("SELECT COUNT(*) FROM chat_history", [], |row| row.get(0))?;

        Ok(MemoryStats {
            session_count: session_count as usize,
            turn_count: turn_count as usize,
        })
    }
}

/// Ledger statistics
#[derive(Debug)]
pub struct MemoryStats {
    pub session_count: usize,
    pub turn_count: usize,
}

/// Database migrations (each string is one migration)
const MIGRATIONS: &[&str] = &[
    // Migration 1: chat history ledger
    r#"
    CREATE TABLE chat_history (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        session_id TEXT NOT NULL,
        user_message TEXT NOT NULL,
        bot_response TEXT NOT NULL,
        timestamp INTEGER NOT NULL
    );

    CREATE INDEX idx_chat_history_session ON chat_history(session_id);
    "#,
];
