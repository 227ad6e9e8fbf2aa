//! # Randomness
//!
//! Keeps a private playlist filled with a random sample of a user's liked tracks.
//!
//! Every run re-fetches the whole liked-tracks library, clears the managed
//! playlist and writes back a fresh random selection. Local state is limited to
//! a small `SQLite` bookkeeping table recording the run identity and the last
//! resolved playlist.
//!
//! ## Layers
//!
//! - [`storage`]: generic parameterized record store over a single `SQLite` table
//! - [`remote`]: HTTP transport seam, API client and the paginated fetcher
//! - [`sync`]: batch chunking, random sampling and the playlist orchestrator
//!
//! ## Example
//!
//! ```rust,ignore
//! use randomness::config::SyncConfig;
//! use randomness::remote::{ApiClient, ReqwestTransport};
//! use randomness::sync::PlaylistSync;
//!
//! let config = SyncConfig::load(None)?;
//! let transport = ReqwestTransport::new(&config)?;
//! let mut sync = PlaylistSync::new(ApiClient::new(transport, &config.base_url), &config);
//! let report = sync.sync(&mut rand::rng())?;
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

pub mod config;
pub mod observability;
pub mod remote;
pub mod storage;
pub mod sync;

pub use config::{SyncConfig, TokenSource};
pub use remote::{ApiClient, HttpTransport, PaginatedFetcher, ReqwestTransport};
pub use storage::{Column, Record, RecordStore, SessionStore, SqlType, Table};
pub use sync::{BatchChunker, PlaylistId, PlaylistSync, SyncReport, TrackUri, chunk, sample};

/// Error type for randomness operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `Configuration` | Missing token, unwritable data directory, unreadable config file |
/// | `Http` | The remote service answered with a non-2xx status |
/// | `InvalidArgument` | Empty track lists, malformed playlist ids, unknown columns |
/// | `Constraint` | A plain insert violated a uniqueness or foreign-key constraint |
/// | `BatchWrite` | A row of `insert_many` failed; the whole batch was rolled back |
/// | `InsufficientData` | The requested sample is larger than the library |
/// | `NotImplemented` | A table type does not supply its `CREATE TABLE` statement |
/// | `OperationFailed` | Network failures, undecodable bodies, other `SQLite` errors |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Required external configuration is missing or invalid.
    ///
    /// Fatal and never retried.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The remote service answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Http {
        /// Response status code.
        status: u16,
        /// Response body, as returned.
        body: String,
    },

    /// A caller-supplied argument violates a precondition.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A local persistence constraint was violated.
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// A multi-row insert failed and was rolled back.
    #[error("batch write failed at row {row}: {cause}")]
    BatchWrite {
        /// Zero-based index of the failing row.
        row: usize,
        /// The underlying cause.
        cause: String,
    },

    /// A random sample was requested from a population that is too small.
    #[error("cannot sample {requested} items from {available}")]
    InsufficientData {
        /// Requested sample size.
        requested: usize,
        /// Population size.
        available: usize,
    },

    /// A table type did not supply its schema.
    #[error("not implemented: {0}")]
    NotImplemented(String),

    /// An operation failed.
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

/// Result type alias for randomness operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Returns the current Unix timestamp in seconds.
///
/// Falls back to 0 if the system clock is before the Unix epoch.
#[must_use]
pub fn current_timestamp() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
