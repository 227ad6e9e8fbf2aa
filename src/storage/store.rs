//! Generic parameterized record store over one `SQLite` table.

use super::record::{Record, Table, resolve_columns};
use super::sqlite::{
    acquire_lock, build_batch_insert, build_drop_table, build_exists_by_id, build_insert,
    configure_connection, record_operation_metrics, status_label,
};
use crate::{Error, Result};
use rusqlite::types::Value;
use rusqlite::{Connection, ErrorCode, OptionalExtension, params_from_iter};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Instant;
use tracing::instrument;

/// Database file created inside the data directory.
pub const DEFAULT_DB_FILE: &str = "randomness.db";

/// Record store bound to a single table.
///
/// Owns one long-lived connection. Every statement auto-commits except
/// [`RecordStore::insert_many`] and [`RecordStore::reset_table`], which run
/// in a single transaction each.
///
/// The store also carries a run identity (`id`): a fresh v4 UUID unless one
/// is supplied, re-pointable at an existing row with [`RecordStore::set_id`].
pub struct RecordStore<T: Table> {
    /// Protected by Mutex because `rusqlite::Connection` is not `Sync`.
    conn: Mutex<Connection>,
    table: T,
    row_id: String,
    /// None for in-memory stores.
    db_path: Option<PathBuf>,
}

impl<T: Table> RecordStore<T> {
    /// Opens (or creates) `data_dir/randomness.db`.
    ///
    /// The table is not created; call [`RecordStore::create_table`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if `data_dir` is not an existing,
    /// writable directory, or [`Error::OperationFailed`] if the database
    /// cannot be opened.
    pub fn open(data_dir: impl AsRef<Path>, table: T, row_id: Option<String>) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        ensure_writable_dir(data_dir)?;

        let db_path = data_dir.join(DEFAULT_DB_FILE);
        tracing::debug!("Opening connection to {}", db_path.display());
        let conn = Connection::open(&db_path).map_err(|e| Error::OperationFailed {
            operation: "open_sqlite".to_string(),
            cause: e.to_string(),
        })?;

        Self::from_connection(conn, table, row_id, Some(db_path))
    }

    /// Creates an in-memory store (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be opened or configured.
    pub fn in_memory(table: T, row_id: Option<String>) -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| Error::OperationFailed {
            operation: "open_sqlite_in_memory".to_string(),
            cause: e.to_string(),
        })?;

        Self::from_connection(conn, table, row_id, None)
    }

    fn from_connection(
        conn: Connection,
        table: T,
        row_id: Option<String>,
        db_path: Option<PathBuf>,
    ) -> Result<Self> {
        configure_connection(&conn)?;

        let row_id = row_id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        Ok(Self {
            conn: Mutex::new(conn),
            table,
            row_id,
            db_path,
        })
    }

    /// The table descriptor.
    pub const fn table(&self) -> &T {
        &self.table
    }

    /// Returns the database path (None for in-memory).
    #[must_use]
    pub const fn db_path(&self) -> Option<&PathBuf> {
        self.db_path.as_ref()
    }

    /// Inserts one record and returns the affected row's `rowid`.
    ///
    /// With `upsert` naming a conflict column, an existing row with the same
    /// key is updated from every column in the record instead.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] for an empty record, an undeclared column,
    ///   or a conflict column that is not a declared conflict key present in
    ///   the record
    /// - [`Error::Constraint`] if a plain insert violates a constraint
    #[instrument(skip(self, record), fields(table = self.table.name(), columns = record.len()))]
    pub fn insert(&self, record: &Record, upsert: Option<&str>) -> Result<i64> {
        if record.is_empty() {
            return Err(Error::InvalidArgument("cannot insert an empty record".to_string()));
        }

        let columns = resolve_columns(&self.table, record.columns())?;
        let conflict = upsert
            .map(|name| self.conflict_column(name, &columns))
            .transpose()?;
        let sql = build_insert(self.table.name(), &columns, conflict);

        let start = Instant::now();
        tracing::debug!("Executing {sql}");
        let result = {
            let conn = acquire_lock(&self.conn);
            conn.query_row(&sql, params_from_iter(record.values()), |row| row.get(0))
                .map_err(|e| map_sqlite_error("insert", e))
        };
        record_operation_metrics(self.table.name(), "insert", start, status_label(&result));
        result
    }

    /// Inserts many homogeneous rows in one transaction.
    ///
    /// Either every row persists or none does.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] for an undeclared column or a row whose
    ///   length differs from `columns`
    /// - [`Error::BatchWrite`] naming the first failing row; the transaction
    ///   is rolled back
    #[instrument(skip(self, rows, columns), fields(table = self.table.name(), rows = rows.len()))]
    pub fn insert_many(&self, rows: &[Vec<Value>], columns: &[&str]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let columns = resolve_columns(&self.table, columns.iter().copied())?;
        if let Some((index, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(Error::InvalidArgument(format!(
                "row {index} has {} values, expected {}",
                row.len(),
                columns.len()
            )));
        }

        let sql = build_batch_insert(self.table.name(), &columns);
        let start = Instant::now();
        tracing::debug!("Executing {sql}");
        let result = self.run_batch(&sql, rows);
        record_operation_metrics(
            self.table.name(),
            "insert_many",
            start,
            status_label(&result),
        );
        result
    }

    fn run_batch(&self, sql: &str, rows: &[Vec<Value>]) -> Result<()> {
        let mut conn = acquire_lock(&self.conn);
        let tx = conn
            .transaction()
            .map_err(|e| map_sqlite_error("begin_batch", e))?;
        {
            let mut stmt = tx
                .prepare(sql)
                .map_err(|e| map_sqlite_error("prepare_batch", e))?;
            for (row, values) in rows.iter().enumerate() {
                // Dropping `tx` on the error path rolls the batch back.
                stmt.execute(params_from_iter(values.iter()))
                    .map_err(|e| Error::BatchWrite {
                        row,
                        cause: e.to_string(),
                    })?;
            }
        }
        tx.commit().map_err(|e| Error::BatchWrite {
            row: rows.len(),
            cause: e.to_string(),
        })
    }

    /// Executes a statement with positional parameters and returns the number
    /// of changed rows.
    ///
    /// Statements that return rows, such as `PRAGMA journal_mode`, fail here;
    /// run them through [`RecordStore::query`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Constraint`] or [`Error::OperationFailed`].
    pub fn execute(&self, sql: &str, params: &[Value]) -> Result<usize> {
        tracing::debug!("Executing {sql}");
        let conn = acquire_lock(&self.conn);
        conn.execute(sql, params_from_iter(params.iter()))
            .map_err(|e| map_sqlite_error("execute", e))
    }

    /// Runs a query with positional parameters and returns all rows.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] if the query fails.
    pub fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Vec<Value>>> {
        tracing::debug!("Executing {sql}");
        let conn = acquire_lock(&self.conn);
        let mut stmt = conn.prepare(sql).map_err(|e| map_sqlite_error("query", e))?;
        let column_count = stmt.column_count();

        stmt.query_map(params_from_iter(params.iter()), |row| {
            (0..column_count)
                .map(|i| row.get::<_, Value>(i))
                .collect::<rusqlite::Result<Vec<_>>>()
        })
        .map_err(|e| map_sqlite_error("query", e))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| map_sqlite_error("query", e))
    }

    /// The current run identity.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.row_id
    }

    /// Points the store at an existing row.
    ///
    /// Returns `false` and keeps the previous identity if no row has that id.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    pub fn set_id(&mut self, candidate: &str) -> Result<bool> {
        let sql = build_exists_by_id(self.table.name());
        let found = {
            let conn = acquire_lock(&self.conn);
            conn.query_row(&sql, [candidate], |_| Ok(()))
                .optional()
                .map_err(|e| map_sqlite_error("set_id", e))?
                .is_some()
        };

        if found {
            candidate.clone_into(&mut self.row_id);
        }
        Ok(found)
    }

    /// Creates the table if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotImplemented`] if the table type supplies no schema.
    pub fn create_table(&self) -> Result<()> {
        let ddl = self.table.create_table_sql()?;
        tracing::debug!("Creating table {}", self.table.name());
        let conn = acquire_lock(&self.conn);
        conn.execute_batch(&ddl)
            .map_err(|e| map_sqlite_error("create_table", e))
    }

    /// Drops and recreates the table in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotImplemented`] (leaving the table untouched) if the
    /// table type supplies no schema.
    pub fn reset_table(&self) -> Result<()> {
        let ddl = self.table.create_table_sql()?;
        tracing::debug!("Resetting table {}", self.table.name());

        let mut conn = acquire_lock(&self.conn);
        let tx = conn
            .transaction()
            .map_err(|e| map_sqlite_error("reset_table", e))?;
        tx.execute_batch(&build_drop_table(self.table.name()))
            .map_err(|e| map_sqlite_error("reset_table", e))?;
        tx.execute_batch(&ddl)
            .map_err(|e| map_sqlite_error("reset_table", e))?;
        tx.commit().map_err(|e| map_sqlite_error("reset_table", e))
    }

    /// Closes the connection.
    ///
    /// # Errors
    ///
    /// Returns an error if `SQLite` refuses to close (e.g. unfinalized statements).
    pub fn close(self) -> Result<()> {
        tracing::debug!("Closing connection to {DEFAULT_DB_FILE}");
        let conn = self
            .conn
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        conn.close().map_err(|(_, e)| Error::OperationFailed {
            operation: "close_sqlite".to_string(),
            cause: e.to_string(),
        })
    }

    fn conflict_column(&self, name: &str, columns: &[&'static str]) -> Result<&'static str> {
        let column = self
            .table
            .column(name)
            .filter(|c| c.conflict_key)
            .ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "'{name}' is not a conflict key of table '{}'",
                    self.table.name()
                ))
            })?;

        if !columns.contains(&column.name) {
            return Err(Error::InvalidArgument(format!(
                "upsert record is missing conflict column '{name}'"
            )));
        }
        Ok(column.name)
    }
}

impl<T: Table + std::fmt::Debug> std::fmt::Debug for RecordStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore")
            .field("table", &self.table)
            .field("row_id", &self.row_id)
            .field("db_path", &self.db_path)
            .finish_non_exhaustive()
    }
}

/// Maps constraint violations to [`Error::Constraint`], everything else to
/// [`Error::OperationFailed`].
fn map_sqlite_error(operation: &str, e: rusqlite::Error) -> Error {
    if e.sqlite_error_code() == Some(ErrorCode::ConstraintViolation) {
        Error::Constraint(e.to_string())
    } else {
        Error::OperationFailed {
            operation: operation.to_string(),
            cause: e.to_string(),
        }
    }
}

/// Checks that `dir` is a directory the current process can create files in.
///
/// Permission bits do not account for ownership, so the check writes and
/// removes a marker file.
fn ensure_writable_dir(dir: &Path) -> Result<()> {
    let not_writable = |cause: String| {
        Error::Configuration(format!(
            "settings path '{}' is not writable or doesn't exist: {cause}",
            dir.display()
        ))
    };

    if !dir.is_dir() {
        return Err(not_writable("not a directory".to_string()));
    }

    let marker = dir.join(format!(".write-check-{}", uuid::Uuid::new_v4()));
    std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&marker)
        .map_err(|e| not_writable(e.to_string()))?;
    std::fs::remove_file(&marker).map_err(|e| not_writable(e.to_string()))
}
