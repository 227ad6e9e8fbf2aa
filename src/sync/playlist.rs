//! Playlist and track identifiers.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of a remote playlist id.
pub const PLAYLIST_ID_LEN: usize = 22;

/// Opaque track URI, passed through to the remote API unparsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackUri(String);

impl TrackUri {
    /// Wraps a URI.
    #[must_use]
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    /// The URI text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TrackUri {
    fn from(uri: String) -> Self {
        Self(uri)
    }
}

impl From<&str> for TrackUri {
    fn from(uri: &str) -> Self {
        Self(uri.to_string())
    }
}

/// Remote id of the managed playlist.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlaylistId(String);

impl PlaylistId {
    /// Checks the shape of a candidate id: exactly 22 ASCII alphanumerics.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for any other input.
    pub fn parse(candidate: &str) -> Result<Self> {
        if candidate.len() != PLAYLIST_ID_LEN {
            return Err(Error::InvalidArgument(format!(
                "playlist id must be {PLAYLIST_ID_LEN} characters, got {}",
                candidate.len()
            )));
        }
        if !candidate.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(Error::InvalidArgument(format!(
                "playlist id '{candidate}' contains non-alphanumeric characters"
            )));
        }
        Ok(Self(candidate.to_string()))
    }

    /// Wraps an id returned by the remote service without validation.
    pub(crate) fn from_remote(id: String) -> Self {
        Self(id)
    }

    /// The id text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlaylistId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of one synchronization run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// The synchronized playlist.
    pub playlist_id: PlaylistId,
    /// Tracks in the liked library.
    pub library_size: usize,
    /// Tracks removed from the playlist.
    pub removed: usize,
    /// Tracks written to the playlist.
    pub added: usize,
    /// `DELETE` requests issued.
    pub delete_requests: usize,
    /// `POST` requests issued for track writes.
    pub save_requests: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("37i9dQZF1DXcBWIGoYBM5M" ; "alphanumeric")]
    #[test_case("0000000000000000000000" ; "digits")]
    fn test_playlist_id_accepts(candidate: &str) {
        assert_eq!(PlaylistId::parse(candidate).unwrap().as_str(), candidate);
    }

    #[test_case("" ; "empty")]
    #[test_case("short" ; "too short")]
    #[test_case("37i9dQZF1DXcBWIGoYBM5MX" ; "too long")]
    #[test_case("37i9dQZF1DXcBWIGoYBM5/" ; "bad character")]
    fn test_playlist_id_rejects(candidate: &str) {
        assert!(matches!(
            PlaylistId::parse(candidate),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_track_uri_is_transparent() {
        let uri = TrackUri::from("spotify:track:abc");
        assert_eq!(serde_json::to_string(&uri).unwrap(), "\"spotify:track:abc\"");
        assert_eq!(uri.to_string(), "spotify:track:abc");
    }
}
