//! `SQLite` infrastructure for the record store.
//!
//! - [`connection`]: lock acquisition and per-connection pragmas
//! - [`sql`]: parameterized statement builders
//! - [`metrics`]: operation counters

mod connection;
mod metrics;
mod sql;

pub use connection::{BUSY_TIMEOUT_MS, acquire_lock, configure_connection};
pub use metrics::{record_operation_metrics, status_label};
pub use sql::{
    build_batch_insert, build_create_table, build_drop_table, build_exists_by_id, build_insert,
    excluded_assignments, placeholders,
};
