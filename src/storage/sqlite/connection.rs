//! Connection handling for the `SQLite` record store.

use crate::Result;
use rusqlite::Connection;
use std::sync::{Mutex, MutexGuard};

/// Busy timeout applied to every connection, in milliseconds.
pub const BUSY_TIMEOUT_MS: u32 = 5_000;

/// Helper to acquire mutex lock with poison recovery.
///
/// If the mutex is poisoned (a previous holder panicked) the inner value is
/// recovered and a warning is logged.
pub fn acquire_lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("SQLite mutex was poisoned, recovering");
            metrics::counter!("sqlite_mutex_poison_recovery_total").increment(1);
            poisoned.into_inner()
        },
    }
}

/// Configures a freshly opened connection.
///
/// # Configuration Applied
///
/// - **`foreign_keys = ON`**: enforced on every connection, `SQLite` defaults to off
/// - **WAL mode** and **NORMAL synchronous** for file databases
/// - **`busy_timeout`**: waits for locks instead of failing immediately
///
/// # Errors
///
/// Returns [`crate::Error::OperationFailed`] if foreign keys cannot be enabled.
pub fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON")
        .map_err(|e| crate::Error::OperationFailed {
            operation: "enable_foreign_keys".to_string(),
            cause: e.to_string(),
        })?;

    // journal_mode returns a row, so pragma_update is used and the result ignored;
    // in-memory databases stay in "memory" mode.
    let _ = conn.pragma_update(None, "journal_mode", "WAL");
    let _ = conn.pragma_update(None, "synchronous", "NORMAL");
    let _ = conn.pragma_update(None, "busy_timeout", BUSY_TIMEOUT_MS);

    Ok(())
}
