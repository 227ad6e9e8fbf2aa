//! Remote music service access.
//!
//! - [`HttpTransport`]: the network seam ([`ReqwestTransport`] in production)
//! - [`ApiClient`]: URL building and non-2xx to [`crate::Error::Http`] mapping
//! - [`PaginatedFetcher`]: `items`/`next` cursor loops
//! - [`models`]: request and response bodies

mod client;
pub mod models;
mod pagination;
mod transport;

pub use client::{ApiClient, MY_PLAYLISTS_PATH};
pub use pagination::{PageStats, PaginatedFetcher, Termination};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Method, ReqwestTransport};
