//! The durable on-device event queue.
//!
//! An append-only SQLite table of serialized envelopes. Ids are assigned by
//! `AUTOINCREMENT`, so they are strictly increasing and never reused — the
//! watermark acknowledgement depends on both properties.
//!
//! All methods here are synchronous; async callers run them on the blocking
//! thread pool so neither the host's call path nor the scheduler task ever
//! sits on disk I/O.

use beacon_db::DbPool;
use rusqlite::params;

use crate::error::PipelineError;

/// One persisted event awaiting upload.
#[derive(Debug, Clone)]
pub struct QueuedEvent {
    /// Queue-assigned id, strictly increasing in append order.
    pub id: i64,
    /// The serialized envelope. Opaque to the queue.
    pub json: String,
}

/// Handle to the durable event queue. Cheap to clone; clones share the
/// underlying connection pool.
#[derive(Clone)]
pub struct EventQueue {
    pool: DbPool,
}

impl EventQueue {
    /// Wraps an initialized (migrated) connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Durably stores one serialized envelope and returns its assigned id.
    ///
    /// The insert and id assignment are a single statement, so concurrent
    /// appends cannot observe or produce out-of-order ids.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Pool` or `PipelineError::Storage` when the
    /// store is unavailable; the caller decides whether to drop the event.
    pub fn append(&self, json: &str) -> Result<i64, PipelineError> {
        let conn = self.pool.get()?;
        let id = conn.query_row(
            "INSERT INTO events (json) VALUES (?1) RETURNING id",
            params![json],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// Returns up to `limit` oldest unacknowledged events, ascending by id.
    ///
    /// Events are read, not removed; only [`EventQueue::acknowledge`]
    /// deletes.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Pool` or `PipelineError::Storage` on store
    /// failure.
    pub fn read_batch(&self, limit: i64) -> Result<Vec<QueuedEvent>, PipelineError> {
        let conn = self.pool.get()?;
        let mut stmt =
            conn.prepare("SELECT id, json FROM events ORDER BY id ASC LIMIT ?1")?;
        let rows = stmt.query_map(params![limit], |row| {
            Ok(QueuedEvent {
                id: row.get(0)?,
                json: row.get(1)?,
            })
        })?;

        let mut batch = Vec::new();
        for row in rows {
            batch.push(row?);
        }
        Ok(batch)
    }

    /// Atomically deletes every event with `id <= up_to_id` and returns the
    /// number removed.
    ///
    /// A single DELETE statement, so appends racing in on other connections
    /// (which always receive higher ids) are never touched.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Pool` or `PipelineError::Storage` on store
    /// failure; nothing is deleted in that case.
    pub fn acknowledge(&self, up_to_id: i64) -> Result<usize, PipelineError> {
        let conn = self.pool.get()?;
        let deleted = conn.execute("DELETE FROM events WHERE id <= ?1", params![up_to_id])?;
        Ok(deleted)
    }

    /// Returns the number of unacknowledged events.
    pub fn pending(&self) -> Result<i64, PipelineError> {
        let conn = self.pool.get()?;
        let count = conn.query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))?;
        Ok(count)
    }
}
