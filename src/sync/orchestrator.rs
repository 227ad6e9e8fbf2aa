//! Playlist synchronization.
//!
//! Resolves the managed playlist by name (creating it when missing), fetches
//! the liked-tracks library, clears the playlist and refills it with a random
//! sample. Writes are chunked to the remote batch limit.

use super::chunk::BatchChunker;
use super::playlist::{PlaylistId, SyncReport, TrackUri};
use super::sample::sample;
use crate::config::{DEFAULT_BATCH_SIZE, SyncConfig};
use crate::remote::models::{
    AddTracksRequest, CreatePlaylistRequest, CreatedPlaylist, PlaylistSummary,
    RemoveTracksRequest, TrackItem, TrackRef,
};
use crate::remote::{ApiClient, HttpTransport, MY_PLAYLISTS_PATH, PaginatedFetcher};
use crate::{Error, Result};
use std::time::Instant;
use tracing::instrument;

/// Page size used when listing playlists and library tracks.
const LIST_PAGE_LIMIT: usize = 50;

/// Page size used when listing playlist contents.
const PLAYLIST_TRACKS_PAGE_LIMIT: usize = 100;

/// Keeps one named playlist filled with a random selection of liked tracks.
#[derive(Debug)]
pub struct PlaylistSync<T> {
    client: ApiClient<T>,
    chunker: BatchChunker,
    playlist_name: String,
    playlist_description: String,
    sample_size: usize,
    playlist: Option<PlaylistId>,
}

impl<T: HttpTransport> PlaylistSync<T> {
    /// Creates an orchestrator with no resolved playlist.
    ///
    /// The batch size is clamped to `1..=100`, the remote limit.
    #[must_use]
    pub fn new(client: ApiClient<T>, config: &SyncConfig) -> Self {
        Self {
            client,
            chunker: BatchChunker::new(config.batch_size.clamp(1, DEFAULT_BATCH_SIZE)),
            playlist_name: config.playlist_name.clone(),
            playlist_description: config.playlist_description.clone(),
            sample_size: config.sample_size(),
            playlist: None,
        }
    }

    /// The resolved playlist, if any.
    #[must_use]
    pub const fn playlist_id(&self) -> Option<&PlaylistId> {
        self.playlist.as_ref()
    }

    /// The API client.
    pub const fn client(&self) -> &ApiClient<T> {
        &self.client
    }

    /// Number of tracks drawn per run.
    #[must_use]
    pub const fn sample_size(&self) -> usize {
        self.sample_size
    }

    /// Searches the user's playlists for the managed playlist by name.
    ///
    /// Clears any previously resolved playlist first. The first match in
    /// paging order wins and paging stops there.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] if a listing page is rejected.
    #[instrument(skip(self), fields(name = %self.playlist_name))]
    pub fn get_playlist(&mut self) -> Result<Option<PlaylistId>> {
        self.playlist = None;

        let url = self
            .client
            .url(&format!("{MY_PLAYLISTS_PATH}?limit={LIST_PAGE_LIMIT}"));
        let name = self.playlist_name.as_str();
        let found = PaginatedFetcher::new(&self.client).find(&url, |summary: PlaylistSummary| {
            (summary.name == name).then_some(summary.id)
        })?;

        match found {
            Some(id) => {
                tracing::info!(playlist_id = %id, "Found playlist");
                let id = PlaylistId::from_remote(id);
                self.playlist = Some(id.clone());
                Ok(Some(id))
            },
            None => {
                tracing::info!("Playlist not found");
                Ok(None)
            },
        }
    }

    /// Creates the managed playlist unless one is already resolved.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] if creation is rejected, or
    /// [`Error::OperationFailed`] if the service answers with a status other
    /// than 200 or 201 or an undecodable body.
    #[instrument(skip(self), fields(name = %self.playlist_name))]
    pub fn create_playlist(&mut self) -> Result<PlaylistId> {
        if let Some(id) = &self.playlist {
            return Ok(id.clone());
        }

        let body = CreatePlaylistRequest {
            name: &self.playlist_name,
            public: false,
            description: &self.playlist_description,
        };
        let response = self
            .client
            .post_json(&self.client.url(MY_PLAYLISTS_PATH), &body)?;

        if !matches!(response.status, 200 | 201) {
            return Err(Error::OperationFailed {
                operation: "create_playlist".to_string(),
                cause: format!("unexpected status {}", response.status),
            });
        }

        let created: CreatedPlaylist = response.json()?;
        tracing::info!(playlist_id = %created.id, "Created playlist");
        let id = PlaylistId::from_remote(created.id);
        self.playlist = Some(id.clone());
        Ok(id)
    }

    /// Finds the managed playlist, creating it if missing.
    ///
    /// # Errors
    ///
    /// See [`PlaylistSync::get_playlist`] and [`PlaylistSync::create_playlist`].
    pub fn resolve_playlist(&mut self) -> Result<PlaylistId> {
        match self.get_playlist()? {
            Some(id) => Ok(id),
            None => self.create_playlist(),
        }
    }

    /// Whether a playlist with this id is visible to the user.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on a non-2xx answer.
    #[instrument(skip(self))]
    pub fn playlist_exists(&self, id: &str) -> Result<bool> {
        let response = self.client.get(&self.client.url(&format!("/v1/playlists/{id}")))?;
        Ok(response.status == 200)
    }

    /// Adopts an existing playlist by id.
    ///
    /// The id shape is checked before any request is made.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the id is malformed or no such
    /// playlist exists, or [`Error::Http`] if the lookup is rejected.
    #[instrument(skip(self))]
    pub fn set_playlist_id(&mut self, candidate: &str) -> Result<PlaylistId> {
        let id = PlaylistId::parse(candidate)?;
        if !self.playlist_exists(id.as_str())? {
            return Err(Error::InvalidArgument(format!(
                "playlist '{id}' does not exist"
            )));
        }
        self.playlist = Some(id.clone());
        Ok(id)
    }

    /// Fetches every liked track, skipping unavailable ones.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] if a page is rejected.
    #[instrument(skip(self))]
    pub fn fetch_library_tracks(&self) -> Result<Vec<TrackUri>> {
        let url = self
            .client
            .url(&format!("/v1/me/tracks?limit={LIST_PAGE_LIMIT}"));
        let tracks = self.collect_tracks(&url)?;
        tracing::info!(count = tracks.len(), "Fetched library tracks");
        Ok(tracks)
    }

    /// Fetches the current contents of the resolved playlist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if no playlist is resolved, or
    /// [`Error::Http`] if a page is rejected.
    #[instrument(skip(self))]
    pub fn fetch_playlist_tracks(&self) -> Result<Vec<TrackUri>> {
        let id = self.require_playlist()?;
        let url = self.client.url(&format!(
            "/v1/playlists/{id}/tracks?fields=next,items(track.uri)&limit={PLAYLIST_TRACKS_PAGE_LIMIT}"
        ));
        let tracks = self.collect_tracks(&url)?;
        tracing::info!(playlist_id = %id, count = tracks.len(), "Fetched playlist tracks");
        Ok(tracks)
    }

    /// Removes tracks from the resolved playlist, one request per batch.
    ///
    /// Batches sent before a failing one stay applied. Returns the number of
    /// requests issued.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for an empty list or an unresolved
    /// playlist, or [`Error::Http`] from the first rejected batch.
    #[instrument(skip(self, uris), fields(count = uris.len()))]
    pub fn delete_tracks_from_playlist(&self, uris: &[TrackUri]) -> Result<usize> {
        if uris.is_empty() {
            return Err(Error::InvalidArgument(
                "no tracks given for deletion".to_string(),
            ));
        }
        let url = self.tracks_url()?;
        self.send_batches("delete_tracks", uris, |batch| {
            let body = RemoveTracksRequest {
                tracks: batch.iter().cloned().map(|uri| TrackRef { uri }).collect(),
            };
            self.client.delete_json(&url, &body).map(|_| ())
        })
    }

    /// Appends tracks to the resolved playlist, one request per batch.
    ///
    /// Batches sent before a failing one stay applied. Returns the number of
    /// requests issued.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for an empty list or an unresolved
    /// playlist, or [`Error::Http`] from the first rejected batch.
    #[instrument(skip(self, uris), fields(count = uris.len()))]
    pub fn save_tracks_to_playlist(&self, uris: &[TrackUri]) -> Result<usize> {
        if uris.is_empty() {
            return Err(Error::InvalidArgument(
                "no tracks given for saving".to_string(),
            ));
        }
        let url = self.tracks_url()?;
        self.send_batches("save_tracks", uris, |batch| {
            self.client
                .post_json(&url, &AddTracksRequest { uris: batch })
                .map(|_| ())
        })
    }

    /// Draws the configured number of distinct tracks from `library`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for an empty library or a zero
    /// sample size, or [`Error::InsufficientData`] when the library is
    /// smaller than the sample size.
    pub fn random_tracks<R>(&self, library: &[TrackUri], rng: &mut R) -> Result<Vec<TrackUri>>
    where
        R: rand::Rng + ?Sized,
    {
        if self.sample_size == 0 {
            return Err(Error::InvalidArgument(
                "playlist size must be greater than zero".to_string(),
            ));
        }
        if library.is_empty() {
            return Err(Error::InvalidArgument("library is empty".to_string()));
        }
        sample(library, self.sample_size, rng)
    }

    /// Runs a full synchronization.
    ///
    /// The sample is drawn before the playlist is touched, so a library that
    /// is too small leaves the playlist as it was.
    ///
    /// # Errors
    ///
    /// Propagates the first failure of any step.
    #[instrument(skip(self, rng))]
    pub fn sync<R>(&mut self, rng: &mut R) -> Result<SyncReport>
    where
        R: rand::Rng + ?Sized,
    {
        let start = Instant::now();
        let playlist_id = match &self.playlist {
            Some(id) => id.clone(),
            None => self.resolve_playlist()?,
        };

        let library = self.fetch_library_tracks()?;
        let selection = self.random_tracks(&library, rng)?;

        let existing = self.fetch_playlist_tracks()?;
        let delete_requests = if existing.is_empty() {
            tracing::debug!("Playlist already empty");
            0
        } else {
            self.delete_tracks_from_playlist(&existing)?
        };

        let save_requests = self.save_tracks_to_playlist(&selection)?;

        metrics::histogram!("playlist_sync_duration_ms")
            .record(start.elapsed().as_secs_f64() * 1000.0);
        metrics::counter!("playlist_tracks_written_total").increment(selection.len() as u64);

        let report = SyncReport {
            playlist_id,
            library_size: library.len(),
            removed: existing.len(),
            added: selection.len(),
            delete_requests,
            save_requests,
        };
        tracing::info!(
            playlist_id = %report.playlist_id,
            library = report.library_size,
            removed = report.removed,
            added = report.added,
            "Playlist synchronized"
        );
        Ok(report)
    }

    fn require_playlist(&self) -> Result<&PlaylistId> {
        self.playlist
            .as_ref()
            .ok_or_else(|| Error::InvalidArgument("no playlist resolved".to_string()))
    }

    fn tracks_url(&self) -> Result<String> {
        let id = self.require_playlist()?;
        Ok(self.client.url(&format!("/v1/playlists/{id}/tracks")))
    }

    fn collect_tracks(&self, url: &str) -> Result<Vec<TrackUri>> {
        PaginatedFetcher::new(&self.client).collect(url, |item: TrackItem| {
            item.track.map(|track| track.uri)
        })
    }

    fn send_batches<F>(&self, operation: &str, uris: &[TrackUri], mut send: F) -> Result<usize>
    where
        F: FnMut(&[TrackUri]) -> Result<()>,
    {
        let batches = self.chunker.chunk(uris, 0);
        let total = batches.len();
        for (index, batch) in batches.into_iter().enumerate() {
            if let Err(e) = send(batch) {
                tracing::error!(
                    operation,
                    batch = index,
                    batches = total,
                    error = %e,
                    "Batch rejected, earlier batches stay applied"
                );
                return Err(e);
            }
            tracing::debug!(operation, batch = index, size = batch.len(), "Batch sent");
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{ApiRequest, ApiResponse, Method};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Script {
        responses: Mutex<VecDeque<ApiResponse>>,
        requests: Mutex<Vec<ApiRequest>>,
    }

    impl Script {
        fn with(responses: Vec<(u16, serde_json::Value)>) -> Self {
            Self {
                responses: Mutex::new(
                    responses
                        .into_iter()
                        .map(|(s, b)| ApiResponse::new(s, b.to_string()))
                        .collect(),
                ),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<ApiRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl HttpTransport for Script {
        fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
            self.requests.lock().unwrap().push(request.clone());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| Error::OperationFailed {
                    operation: "script".to_string(),
                    cause: "no response left".to_string(),
                })
        }
    }

    const ID: &str = "0123456789abcdefABCDEF";

    fn orchestrator(script: Script, playlist_size: usize) -> PlaylistSync<Script> {
        let config = SyncConfig::new()
            .with_base_url("http://api")
            .with_playlist_size(playlist_size);
        PlaylistSync::new(ApiClient::new(script, "http://api"), &config)
    }

    fn uris(n: usize) -> Vec<TrackUri> {
        (0..n).map(|i| TrackUri::new(format!("spotify:track:{i}"))).collect()
    }

    #[test]
    fn test_unresolved_operations_fail() {
        let sync = orchestrator(Script::default(), 1);
        assert!(matches!(sync.fetch_playlist_tracks(), Err(Error::InvalidArgument(_))));
        assert!(matches!(
            sync.save_tracks_to_playlist(&uris(1)),
            Err(Error::InvalidArgument(_))
        ));
        assert!(sync.client().transport().requests().is_empty());
    }

    #[test]
    fn test_empty_lists_rejected() {
        let sync = orchestrator(Script::default(), 1);
        assert!(matches!(
            sync.delete_tracks_from_playlist(&[]),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            sync.save_tracks_to_playlist(&[]),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_create_playlist_resolves() {
        let mut sync = orchestrator(Script::with(vec![(201, json!({"id": ID}))]), 1);
        let id = sync.create_playlist().unwrap();
        assert_eq!(id.as_str(), ID);
        assert_eq!(sync.playlist_id(), Some(&id));

        let requests = sync.client().transport().requests();
        assert_eq!(requests[0].method, Method::Post);
        assert_eq!(requests[0].url, "http://api/v1/me/playlists");
        assert_eq!(requests[0].body.as_ref().unwrap()["public"], json!(false));

        // Already resolved: no second request.
        sync.create_playlist().unwrap();
        assert_eq!(sync.client().transport().requests().len(), 1);
    }

    #[test]
    fn test_create_playlist_unexpected_status() {
        let mut sync = orchestrator(Script::with(vec![(202, json!({}))]), 1);
        assert!(matches!(
            sync.create_playlist(),
            Err(Error::OperationFailed { .. })
        ));
        assert!(sync.playlist_id().is_none());
    }

    #[test]
    fn test_playlist_exists_by_status() {
        let sync = orchestrator(
            Script::with(vec![(200, json!({})), (204, json!(null)), (404, json!({}))]),
            1,
        );
        assert!(sync.playlist_exists(ID).unwrap());
        assert!(!sync.playlist_exists(ID).unwrap());
        assert!(matches!(
            sync.playlist_exists(ID),
            Err(Error::Http { status: 404, .. })
        ));
    }

    #[test]
    fn test_set_playlist_id_requires_existence() {
        let mut sync = orchestrator(Script::with(vec![(204, json!(null)), (200, json!({}))]), 1);
        assert!(matches!(
            sync.set_playlist_id(ID),
            Err(Error::InvalidArgument(_))
        ));
        assert!(sync.playlist_id().is_none());

        sync.set_playlist_id(ID).unwrap();
        assert_eq!(sync.playlist_id().map(PlaylistId::as_str), Some(ID));
    }

    #[test]
    fn test_get_playlist_clears_previous_state() {
        let mut sync = orchestrator(
            Script::with(vec![
                (200, json!({})),
                (200, json!({"items": [{"id": "x", "name": "other"}], "next": null})),
            ]),
            1,
        );
        sync.set_playlist_id(ID).unwrap();
        assert!(sync.get_playlist().unwrap().is_none());
        assert!(sync.playlist_id().is_none());
    }

    #[test]
    fn test_random_tracks_empty_library() {
        let sync = orchestrator(Script::default(), 1);
        assert!(matches!(
            sync.random_tracks(&[], &mut StdRng::seed_from_u64(0)),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_random_tracks_draws_twice_playlist_size() {
        let sync = orchestrator(Script::default(), 5);
        let picked = sync
            .random_tracks(&uris(30), &mut StdRng::seed_from_u64(9))
            .unwrap();
        assert_eq!(picked.len(), 10);
    }

    #[test]
    fn test_oversized_batch_size_is_clamped() {
        let mut config = SyncConfig::new().with_base_url("http://api");
        config.batch_size = 250;
        let mut sync = PlaylistSync::new(
            ApiClient::new(
                Script::with(vec![(200, json!({})), (201, json!({})), (201, json!({})), (201, json!({}))]),
                "http://api",
            ),
            &config,
        );
        sync.set_playlist_id(ID).unwrap();

        assert_eq!(sync.save_tracks_to_playlist(&uris(250)).unwrap(), 3);
        let sizes: Vec<usize> = sync
            .client()
            .transport()
            .requests()
            .iter()
            .filter(|r| r.method == Method::Post)
            .map(|r| r.body.as_ref().unwrap()["uris"].as_array().unwrap().len())
            .collect();
        assert_eq!(sizes, vec![100, 100, 50]);
    }

    #[test]
    fn test_zero_playlist_size_leaves_playlist_untouched() {
        let mut sync = orchestrator(
            Script::with(vec![
                (200, json!({})),
                (200, json!({"items": [{"track": {"uri": "spotify:track:1"}}], "next": null})),
            ]),
            0,
        );
        sync.set_playlist_id(ID).unwrap();

        let err = sync.sync(&mut StdRng::seed_from_u64(0)).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        let methods: Vec<Method> = sync
            .client()
            .transport()
            .requests()
            .iter()
            .map(|r| r.method)
            .collect();
        assert_eq!(methods, vec![Method::Get, Method::Get]);
    }

    #[test]
    fn test_save_failure_stops_at_failing_batch() {
        let mut sync = orchestrator(
            Script::with(vec![
                (200, json!({})),
                (201, json!({"snapshot_id": "a"})),
                (500, json!({"error": "boom"})),
            ]),
            1,
        );
        sync.set_playlist_id(ID).unwrap();

        let err = sync.save_tracks_to_playlist(&uris(250)).unwrap_err();
        assert!(matches!(err, Error::Http { status: 500, .. }));
        // exists check + two batches; the third batch is never sent
        assert_eq!(sync.client().transport().requests().len(), 3);
    }
}
