//! SQLite chat log.
//!
//! Every message a session shows or receives is appended to `chat_logs`,
//! filed under the task's `bot_name`. Each terminated session gets one row in
//! `session_results`; writing it again replaces the row.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::errors::StoreError;
use crate::inference::types::Role;
use crate::session::{FinalResult, Session};

// ─── Records ────────────────────────────────────────────────────────────────

/// A message about to be logged.
#[derive(Debug, Clone)]
pub struct NewLogEntry<'a> {
    pub bot_name: &'a str,
    pub session_id: &'a str,
    pub role: Role,
    pub content: &'a str,
    pub created_at: DateTime<Utc>,
}

/// A logged message.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub id: i64,
    pub bot_name: String,
    pub session_id: String,
    pub role: Role,
    pub content: String,
    /// RFC 3339.
    pub created_at: String,
}

/// How a session ended and what it produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRecord {
    pub session_id: String,
    pub bot_name: String,
    /// `completed`, `shortlist_confirmed` or `time`.
    pub reason: String,
    /// `None` when the time budget ran out first.
    pub result: Option<FinalResult>,
    pub turns: u32,
    pub finished_at: String,
}

impl ResultRecord {
    /// Build the record for a terminated session; `None` while it is live.
    pub fn from_session(session: &Session, finished_at: DateTime<Utc>) -> Option<Self> {
        let reason = session.termination_reason()?;
        Some(Self {
            session_id: session.id.clone(),
            bot_name: session.bot_name.clone(),
            reason: reason.as_str().to_string(),
            result: session.result.clone(),
            turns: session.turns,
            finished_at: finished_at.to_rfc3339(),
        })
    }
}

// ─── Database ───────────────────────────────────────────────────────────────

/// SQLite handle for the chat log.
pub struct ChatLogStore {
    conn: Connection,
}

impl ChatLogStore {
    /// Open (or create) the log database at the given path.
    ///
    /// Pass `":memory:"` for an in-memory database (tests).
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        let store = Self { conn };
        store.create_tables()?;
        Ok(store)
    }

    fn create_tables(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS chat_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                bot_name TEXT NOT NULL,
                session_id TEXT NOT NULL,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_chat_logs_session
                ON chat_logs(session_id, id);

            CREATE TABLE IF NOT EXISTS session_results (
                session_id TEXT PRIMARY KEY,
                bot_name TEXT NOT NULL,
                reason TEXT NOT NULL,
                result TEXT,
                turns INTEGER NOT NULL DEFAULT 0,
                finished_at TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    // ─── Chat Log ───────────────────────────────────────────────────────

    /// Append one message. Returns its row id.
    pub fn append(&self, entry: &NewLogEntry<'_>) -> Result<i64, StoreError> {
        self.conn.execute(
            "INSERT INTO chat_logs (bot_name, session_id, role, content, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.bot_name,
                entry.session_id,
                entry.role.as_str(),
                entry.content,
                entry.created_at.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// All messages of a session, in insertion order.
    pub fn entries_for_session(&self, session_id: &str) -> Result<Vec<LogEntry>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, bot_name, session_id, role, content, created_at
             FROM chat_logs WHERE session_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![session_id], |row| {
            Ok(LogEntry {
                id: row.get(0)?,
                bot_name: row.get(1)?,
                session_id: row.get(2)?,
                role: str_to_role(&row.get::<_, String>(3)?),
                content: row.get(4)?,
                created_at: row.get(5)?,
            })
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    /// Number of messages logged under a task name.
    pub fn count_for_bot(&self, bot_name: &str) -> Result<u64, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM chat_logs WHERE bot_name = ?1",
            params![bot_name],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    // ─── Results ────────────────────────────────────────────────────────

    /// Store a session's outcome, replacing any earlier row for it.
    pub fn record_result(&self, record: &ResultRecord) -> Result<(), StoreError> {
        let result_json = record
            .result
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        self.conn.execute(
            "INSERT OR REPLACE INTO session_results
                (session_id, bot_name, reason, result, turns, finished_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.session_id,
                record.bot_name,
                record.reason,
                result_json,
                record.turns,
                record.finished_at,
            ],
        )?;
        Ok(())
    }

    /// The stored outcome of a session, if any.
    pub fn result_for(&self, session_id: &str) -> Result<Option<ResultRecord>, StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT session_id, bot_name, reason, result, turns, finished_at
                 FROM session_results WHERE session_id = ?1",
                params![session_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<String>>(3)?,
                        row.get::<_, u32>(4)?,
                        row.get::<_, String>(5)?,
                    ))
                },
            )
            .optional()?;

        let Some((session_id, bot_name, reason, result_json, turns, finished_at)) = row else {
            return Ok(None);
        };
        let result = result_json
            .as_deref()
            .map(serde_json::from_str::<FinalResult>)
            .transpose()?;

        Ok(Some(ResultRecord {
            session_id,
            bot_name,
            reason,
            result,
            turns,
            finished_at,
        }))
    }
}

/// Parse a stored role. Unknown values read back as `user`.
fn str_to_role(s: &str) -> Role {
    match s {
        "system" => Role::System,
        "assistant" => Role::Assistant,
        _ => Role::User,
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
