//! Wire types for the remote API.

use crate::sync::TrackUri;
use serde::{Deserialize, Serialize};

/// One page of a remote collection.
///
/// A missing or empty `next` ends pagination.
#[derive(Debug, Deserialize)]
pub struct Page<I> {
    /// Items on this page.
    #[serde(default = "Vec::new")]
    pub items: Vec<I>,
    /// Cursor for the next page.
    #[serde(default)]
    pub next: Option<String>,
}

/// Entry of the user's playlist listing.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistSummary {
    /// Remote id.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
}

/// Entry of a track listing (library or playlist).
///
/// `track` is null for tracks no longer available.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackItem {
    /// The referenced track.
    #[serde(default)]
    pub track: Option<TrackRef>,
}

/// A track reference carrying only its URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackRef {
    /// Track URI.
    pub uri: TrackUri,
}

/// Body of the playlist creation call.
#[derive(Debug, Serialize)]
pub struct CreatePlaylistRequest<'a> {
    /// Display name.
    pub name: &'a str,
    /// Visibility.
    pub public: bool,
    /// Description.
    pub description: &'a str,
}

/// Response of the playlist creation call.
#[derive(Debug, Deserialize)]
pub struct CreatedPlaylist {
    /// New playlist id.
    pub id: String,
}

/// Body of the add-tracks call.
#[derive(Debug, Serialize)]
pub struct AddTracksRequest<'a> {
    /// URIs to append.
    pub uris: &'a [TrackUri],
}

/// Body of the remove-tracks call.
#[derive(Debug, Serialize)]
pub struct RemoveTracksRequest {
    /// Tracks to remove.
    pub tracks: Vec<TrackRef>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_page_without_next_or_items() {
        let page: Page<PlaylistSummary> = serde_json::from_value(json!({})).unwrap();
        assert!(page.items.is_empty());
        assert!(page.next.is_none());
    }

    #[test]
    fn test_track_item_with_null_track() {
        let page: Page<TrackItem> = serde_json::from_value(json!({
            "items": [{"track": null}, {"track": {"uri": "spotify:track:1"}}],
            "next": null
        }))
        .unwrap();

        assert!(page.items[0].track.is_none());
        assert_eq!(
            page.items[1].track.as_ref().map(|t| t.uri.as_str()),
            Some("spotify:track:1")
        );
    }

    #[test]
    fn test_request_bodies() {
        let uris = vec![TrackUri::new("a"), TrackUri::new("b")];
        assert_eq!(
            serde_json::to_value(AddTracksRequest { uris: &uris }).unwrap(),
            json!({"uris": ["a", "b"]})
        );

        let remove = RemoveTracksRequest {
            tracks: uris.iter().cloned().map(|uri| TrackRef { uri }).collect(),
        };
        assert_eq!(
            serde_json::to_value(remove).unwrap(),
            json!({"tracks": [{"uri": "a"}, {"uri": "b"}]})
        );

        let create = CreatePlaylistRequest {
            name: "n",
            public: false,
            description: "d",
        };
        assert_eq!(
            serde_json::to_value(create).unwrap(),
            json!({"name": "n", "public": false, "description": "d"})
        );
    }
}
