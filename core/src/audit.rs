//! SQLite-backed audit surface: session registry plus the admin log.
//!
//! RULE: Only audit.rs talks to the database. The controller calls these
//! methods — script execution never issues SQL directly.
//!
//! Session state itself is never persisted here; the store holds only the
//! operator-visible audit mirror, and a session's rows are deleted when
//! the controller clears that session. The default database is in-memory,
//! so nothing survives the process unless the operator opts into a file.

use crate::types::SessionId;
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Connection};
use serde::Serialize;

use crate::error::SimResult;

/// One operator-visible audit record mirroring a flagged emission.
#[derive(Debug, Clone, Serialize)]
pub struct AdminLogEntry {
    pub id: Option<i64>,
    pub session_id: SessionId,
    pub at: DateTime<Utc>,
    pub event: String,
    pub data: serde_json::Value,
}

pub struct AuditStore {
    conn: Connection,
}

impl AuditStore {
    /// Open (or create) the audit database at `path`.
    pub fn open(path: &str) -> SimResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (the default; also used in tests).
    pub fn in_memory() -> SimResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> SimResult<()> {
        self.conn
            .execute_batch(include_str!("../../migrations/001_foundation.sql"))?;
        Ok(())
    }

    /// Run raw SQL. Used by migration tooling and failure-injection tests.
    pub fn raw_batch(&self, sql: &str) -> SimResult<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    // ── Session registry ───────────────────────────────────────

    pub fn insert_session(
        &self,
        session_id: &str,
        persona_id: &str,
        tier: &str,
        scenario: &str,
        seed: u64,
        started_at: DateTime<Utc>,
    ) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO session (session_id, persona_id, tier, scenario, seed, started_at, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'running')",
            params![
                session_id,
                persona_id,
                tier,
                scenario,
                seed as i64,
                started_at.timestamp_millis(),
            ],
        )?;
        Ok(())
    }

    pub fn update_session_status(&self, session_id: &str, status: &str) -> SimResult<()> {
        self.conn.execute(
            "UPDATE session SET status = ?2 WHERE session_id = ?1",
            params![session_id, status],
        )?;
        Ok(())
    }

    pub fn session_status(&self, session_id: &str) -> SimResult<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT status FROM session WHERE session_id = ?1")?;
        let status = stmt
            .query_row(params![session_id], |row| row.get::<_, String>(0))
            .ok();
        Ok(status)
    }

    // ── Admin log ──────────────────────────────────────────────

    pub fn append_admin(&self, entry: &AdminLogEntry) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO admin_log (session_id, at_ms, event, data)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                entry.session_id,
                entry.at.timestamp_millis(),
                entry.event,
                serde_json::to_string(&entry.data)?,
            ],
        )?;
        Ok(())
    }

    pub fn admin_for_session(&self, session_id: &str) -> SimResult<Vec<AdminLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, session_id, at_ms, event, data
             FROM admin_log WHERE session_id = ?1
             ORDER BY id ASC",
        )?;
        let entries = stmt
            .query_map(params![session_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut out = Vec::with_capacity(entries.len());
        for (id, session_id, at_ms, event, data) in entries {
            out.push(AdminLogEntry {
                id: Some(id),
                session_id,
                at: Utc
                    .timestamp_millis_opt(at_ms)
                    .single()
                    .unwrap_or(chrono::DateTime::<Utc>::MIN_UTC),
                event,
                data: serde_json::from_str(&data)?,
            });
        }
        Ok(out)
    }

    pub fn admin_count(&self, session_id: &str) -> SimResult<i64> {
        let mut stmt = self
            .conn
            .prepare("SELECT COUNT(*) FROM admin_log WHERE session_id = ?1")?;
        let count = stmt.query_row(params![session_id], |row| row.get(0))?;
        Ok(count)
    }

    /// Remove every trace of a session: registry row plus admin entries.
    /// Called on reset and when a new run replaces a finished one.
    pub fn clear_session(&self, session_id: &str) -> SimResult<()> {
        self.conn
            .execute("DELETE FROM admin_log WHERE session_id = ?1", params![session_id])?;
        self.conn
            .execute("DELETE FROM session WHERE session_id = ?1", params![session_id])?;
        Ok(())
    }
}
