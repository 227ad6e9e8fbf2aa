//! Local bookkeeping storage.
//!
//! - [`RecordStore`]: generic insert/upsert/batch/query layer over one table
//! - [`Table`] and [`Column`]: static schema descriptors every statement is built from
//! - [`SessionStore`]: the concrete `sessions` table used by the binary

// Dropping the connection guard slightly earlier buys nothing here.
#![allow(clippy::significant_drop_tightening)]

mod record;
mod session;
pub mod sqlite;
mod store;

pub use record::{Column, Record, SqlType, Table, resolve_columns};
pub use session::{SessionRow, SessionStore, SessionTable};
pub use store::{DEFAULT_DB_FILE, RecordStore};
