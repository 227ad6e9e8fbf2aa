//! Playlist synchronization: batching, sampling and the orchestrator.

mod chunk;
mod orchestrator;
mod playlist;
mod sample;

pub use chunk::{BatchChunker, chunk};
pub use orchestrator::PlaylistSync;
pub use playlist::{PLAYLIST_ID_LEN, PlaylistId, SyncReport, TrackUri};
pub use sample::sample;
