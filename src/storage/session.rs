//! Session bookkeeping table.
//!
//! One row per run identity, holding the last resolved playlist and the
//! outcome of the last synchronization. No track data is ever stored here.

use super::record::{Column, Record, SqlType, Table};
use super::sqlite::build_create_table;
use super::store::RecordStore;
use crate::{Result, current_timestamp};
use rusqlite::types::Value;
use std::path::Path;

/// The `sessions` table.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionTable;

impl SessionTable {
    const COLUMNS: &'static [Column] = &[
        Column::conflict_key("id", SqlType::Text),
        Column::new("playlist_id", SqlType::Text),
        Column::new("track_count", SqlType::Integer),
        Column::new("synced_at", SqlType::Integer),
    ];
}

impl Table for SessionTable {
    fn name(&self) -> &'static str {
        "sessions"
    }

    fn columns(&self) -> &'static [Column] {
        Self::COLUMNS
    }

    fn create_table_sql(&self) -> Result<String> {
        Ok(format!(
            "{};\nCREATE INDEX IF NOT EXISTS idx_sessions_synced_at ON sessions(synced_at DESC);",
            build_create_table(self.name(), self.columns())
        ))
    }
}

/// A stored session row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRow {
    /// Run identity.
    pub id: String,
    /// Last resolved playlist, if any.
    pub playlist_id: Option<String>,
    /// Tracks written by the last synchronization.
    pub track_count: i64,
    /// Unix timestamp of the last synchronization.
    pub synced_at: i64,
}

impl SessionRow {
    fn from_values(values: Vec<Value>) -> Option<Self> {
        let mut values = values.into_iter();
        let id = match values.next()? {
            Value::Text(id) => id,
            _ => return None,
        };
        let playlist_id = match values.next()? {
            Value::Text(playlist_id) => Some(playlist_id),
            _ => None,
        };
        let track_count = match values.next()? {
            Value::Integer(n) => n,
            _ => 0,
        };
        let synced_at = match values.next()? {
            Value::Integer(ts) => ts,
            _ => 0,
        };
        Some(Self {
            id,
            playlist_id,
            track_count,
            synced_at,
        })
    }
}

/// Persistent run identity and last-sync bookkeeping.
#[derive(Debug)]
pub struct SessionStore {
    store: RecordStore<SessionTable>,
}

impl SessionStore {
    /// Opens the store in `data_dir` and creates the table if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory is unusable or the schema cannot be created.
    pub fn open(data_dir: impl AsRef<Path>, session_id: Option<String>) -> Result<Self> {
        let store = RecordStore::open(data_dir, SessionTable, session_id)?;
        store.create_table()?;
        Ok(Self { store })
    }

    /// Creates an in-memory store (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be created.
    pub fn in_memory() -> Result<Self> {
        let store = RecordStore::in_memory(SessionTable, None)?;
        store.create_table()?;
        Ok(Self { store })
    }

    /// Current run identity.
    #[must_use]
    pub fn id(&self) -> &str {
        self.store.id()
    }

    /// Switches to an existing session. Returns `false` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    pub fn resume(&mut self, session_id: &str) -> Result<bool> {
        self.store.set_id(session_id)
    }

    /// Resumes the most recently synchronized session, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    pub fn resume_latest(&mut self) -> Result<Option<SessionRow>> {
        let Some(latest) = self.latest()? else {
            return Ok(None);
        };
        self.resume(&latest.id)?;
        Ok(Some(latest))
    }

    /// Returns the most recently synchronized session.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn latest(&self) -> Result<Option<SessionRow>> {
        let rows = self.store.query(
            "SELECT id, playlist_id, track_count, synced_at FROM sessions \
             ORDER BY synced_at DESC, rowid DESC LIMIT 1",
            &[],
        )?;
        Ok(rows.into_iter().next().and_then(SessionRow::from_values))
    }

    /// Returns the row of the current session.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn current(&self) -> Result<Option<SessionRow>> {
        let rows = self.store.query(
            "SELECT id, playlist_id, track_count, synced_at FROM sessions WHERE id = ?1",
            &[Value::Text(self.id().to_string())],
        )?;
        Ok(rows.into_iter().next().and_then(SessionRow::from_values))
    }

    /// Upserts the current session with the outcome of a synchronization.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn record_sync(&self, playlist_id: &str, track_count: usize) -> Result<i64> {
        let record = Record::new()
            .with("id", self.id().to_string())
            .with("playlist_id", playlist_id.to_string())
            .with("track_count", i64::try_from(track_count).unwrap_or(i64::MAX))
            .with(
                "synced_at",
                i64::try_from(current_timestamp()).unwrap_or(i64::MAX),
            );
        self.store.insert(&record, Some("id"))
    }

    /// Drops and recreates the table.
    ///
    /// # Errors
    ///
    /// Returns an error if the reset fails.
    pub fn reset(&self) -> Result<()> {
        self.store.reset_table()
    }

    /// Closes the underlying connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be closed.
    pub fn close(self) -> Result<()> {
        self.store.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_record_sync_upserts_single_row() {
        let store = SessionStore::in_memory().unwrap();
        store.record_sync("playlist-one", 200).unwrap();
        store.record_sync("playlist-two", 150).unwrap();

        let current = store.current().unwrap().unwrap();
        assert_eq!(current.id, store.id());
        assert_eq!(current.playlist_id.as_deref(), Some("playlist-two"));
        assert_eq!(current.track_count, 150);
        assert!(current.synced_at > 0);
    }

    #[test]
    fn test_latest_is_none_when_empty() {
        let store = SessionStore::in_memory().unwrap();
        assert!(store.latest().unwrap().is_none());
        assert!(store.current().unwrap().is_none());
    }

    #[test]
    fn test_resume_latest_across_restarts() {
        let dir = TempDir::new().unwrap();
        let first_id = {
            let store = SessionStore::open(dir.path(), None).unwrap();
            store.record_sync("playlist", 200).unwrap();
            let id = store.id().to_string();
            store.close().unwrap();
            id
        };

        let mut store = SessionStore::open(dir.path(), None).unwrap();
        assert_ne!(store.id(), first_id);

        let latest = store.resume_latest().unwrap().unwrap();
        assert_eq!(latest.id, first_id);
        assert_eq!(store.id(), first_id);
    }

    #[test]
    fn test_resume_unknown_session_keeps_identity() {
        let mut store = SessionStore::in_memory().unwrap();
        let id = store.id().to_string();
        assert!(!store.resume("nope").unwrap());
        assert_eq!(store.id(), id);
    }

    #[test]
    fn test_reset_clears_rows() {
        let store = SessionStore::in_memory().unwrap();
        store.record_sync("playlist", 1).unwrap();
        store.reset().unwrap();
        assert!(store.latest().unwrap().is_none());
    }

    #[test]
    fn test_schema_uses_column_descriptors() {
        let sql = SessionTable.create_table_sql().unwrap();
        assert!(sql.starts_with(
            "CREATE TABLE IF NOT EXISTS sessions (id TEXT PRIMARY KEY, playlist_id TEXT, \
             track_count INTEGER, synced_at INTEGER)"
        ));
    }
}
