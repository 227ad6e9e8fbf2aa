//! Configuration management.
//!
//! Configuration is resolved once at startup, in increasing precedence:
//! built-in defaults, a TOML file, then environment variables (a `.env`
//! file in the working directory is loaded first).

use crate::{Error, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable holding the OAuth bearer token.
pub const TOKEN_ENV_VAR: &str = "SPOTIFY_OAUTH_TOKEN";

/// Environment variable pointing at an explicit config file.
pub const CONFIG_PATH_ENV_VAR: &str = "RANDOMNESS_CONFIG_PATH";

/// Default remote API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.spotify.com";

/// Display name identifying the managed playlist.
pub const DEFAULT_PLAYLIST_NAME: &str = "A Random randomness";

/// Description set on the managed playlist when it is created.
pub const DEFAULT_PLAYLIST_DESCRIPTION: &str = "This play list was created by a bot";

/// Default playlist size. Twice this many tracks are sampled per run.
pub const DEFAULT_PLAYLIST_SIZE: usize = 100;

/// Service limit for tracks per add/remove request.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Default HTTP request timeout in milliseconds.
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 30_000;

/// Where the bearer token comes from.
#[derive(Debug, Clone)]
pub enum TokenSource {
    /// Read from the named environment variable when the transport is built.
    Environment(String),
    /// Supplied directly (config file or tests).
    Inline(SecretString),
}

impl TokenSource {
    /// Resolves the token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the variable is unset or the token is empty.
    pub fn resolve(&self) -> Result<SecretString> {
        use secrecy::ExposeSecret;

        let token = match self {
            Self::Environment(var) => std::env::var(var)
                .map(SecretString::from)
                .map_err(|_| Error::Configuration(format!("environment variable '{var}' is undefined")))?,
            Self::Inline(token) => token.clone(),
        };

        if token.expose_secret().trim().is_empty() {
            return Err(Error::Configuration("bearer token is empty".to_string()));
        }
        Ok(token)
    }
}

impl Default for TokenSource {
    fn default() -> Self {
        Self::Environment(TOKEN_ENV_VAR.to_string())
    }
}

/// Main configuration for a synchronization run.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Bearer token source.
    pub token: TokenSource,
    /// Remote API base URL, without trailing slash.
    pub base_url: String,
    /// Sentinel name of the managed playlist.
    pub playlist_name: String,
    /// Description used when creating the playlist.
    pub playlist_description: String,
    /// Playlist size; each run samples twice this many tracks.
    pub playlist_size: usize,
    /// Maximum tracks per add/remove request.
    pub batch_size: usize,
    /// Directory holding the bookkeeping database.
    pub data_dir: PathBuf,
    /// HTTP request timeout in milliseconds (0 to disable).
    pub http_timeout_ms: u64,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// Inline bearer token. Prefer the environment variable.
    pub token: Option<String>,
    /// Environment variable to read the token from.
    pub token_env: Option<String>,
    /// Remote API base URL.
    pub base_url: Option<String>,
    /// Data directory.
    pub data_dir: Option<String>,
    /// HTTP timeout.
    pub http_timeout_ms: Option<u64>,
    /// Playlist section.
    pub playlist: Option<ConfigFilePlaylist>,
}

/// Playlist section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFilePlaylist {
    /// Sentinel name.
    pub name: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// Playlist size.
    pub size: Option<usize>,
    /// Batch size.
    pub batch_size: Option<usize>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            token: TokenSource::default(),
            base_url: DEFAULT_BASE_URL.to_string(),
            playlist_name: DEFAULT_PLAYLIST_NAME.to_string(),
            playlist_description: DEFAULT_PLAYLIST_DESCRIPTION.to_string(),
            playlist_size: DEFAULT_PLAYLIST_SIZE,
            batch_size: DEFAULT_BATCH_SIZE,
            data_dir: default_data_dir(),
            http_timeout_ms: DEFAULT_HTTP_TIMEOUT_MS,
        }
    }
}

impl SyncConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an inline token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = TokenSource::Inline(SecretString::from(token.into()));
        self
    }

    /// Sets the API base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the playlist size.
    #[must_use]
    pub const fn with_playlist_size(mut self, size: usize) -> Self {
        self.playlist_size = size;
        self
    }

    /// Sets the data directory.
    #[must_use]
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    /// Number of tracks sampled on every run.
    #[must_use]
    pub const fn sample_size(&self) -> usize {
        self.playlist_size * 2
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("cannot read '{}': {e}", path.display()))
        })?;

        Self::parse_toml(&contents)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid config file.
    pub fn parse_toml(contents: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(contents)
            .map_err(|e| Error::Configuration(format!("invalid config file: {e}")))?;

        Ok(Self::from_config_file(file))
    }

    /// Loads the full configuration: file (explicit, env-pointed or default
    /// location), then `.env` and environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly named file cannot be loaded, an
    /// override is malformed, or the result fails validation.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        // A missing .env file is normal.
        let _ = dotenvy::dotenv();

        let config = if let Some(path) = path {
            Self::load_from_file(path)?
        } else if let Some(path) = std::env::var(CONFIG_PATH_ENV_VAR)
            .ok()
            .filter(|p| !p.trim().is_empty())
        {
            Self::load_from_file(Path::new(&path))?
        } else {
            Self::load_default()
        };

        let config = config.with_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from the platform config directory, or defaults.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(dirs) = directories::ProjectDirs::from("", "", "randomness") else {
            return Self::default();
        };

        let path = dirs.config_dir().join("config.toml");
        if path.exists() {
            match Self::load_from_file(&path) {
                Ok(config) => return config,
                Err(e) => tracing::warn!("Ignoring config file {}: {e}", path.display()),
            }
        }

        Self::default()
    }

    /// Applies environment variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric override does not parse.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(v) = std::env::var("RANDOMNESS_BASE_URL") {
            self = self.with_base_url(v);
        }
        if let Ok(v) = std::env::var("RANDOMNESS_DATA_DIR") {
            self.data_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("RANDOMNESS_PLAYLIST_SIZE") {
            self.playlist_size = v.parse().map_err(|_| {
                Error::Configuration(format!("RANDOMNESS_PLAYLIST_SIZE is not a number: '{v}'"))
            })?;
        }
        Ok(self)
    }

    /// Checks the configured sizes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for a zero playlist size or a batch
    /// size outside `1..=100`.
    pub fn validate(&self) -> Result<()> {
        if self.playlist_size == 0 {
            return Err(Error::Configuration(
                "playlist size must be greater than zero".to_string(),
            ));
        }
        if self.batch_size == 0 || self.batch_size > DEFAULT_BATCH_SIZE {
            return Err(Error::Configuration(format!(
                "batch size must be between 1 and {DEFAULT_BATCH_SIZE}, got {}",
                self.batch_size
            )));
        }
        Ok(())
    }

    /// Converts a `ConfigFile` to `SyncConfig`.
    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(var) = file.token_env {
            config.token = TokenSource::Environment(var);
        }
        if let Some(token) = file.token {
            config.token = TokenSource::Inline(SecretString::from(token));
        }
        if let Some(base_url) = file.base_url {
            config = config.with_base_url(base_url);
        }
        if let Some(data_dir) = file.data_dir {
            config.data_dir = PathBuf::from(data_dir);
        }
        if let Some(timeout) = file.http_timeout_ms {
            config.http_timeout_ms = timeout;
        }
        if let Some(playlist) = file.playlist {
            if let Some(name) = playlist.name {
                config.playlist_name = name;
            }
            if let Some(description) = playlist.description {
                config.playlist_description = description;
            }
            if let Some(size) = playlist.size {
                config.playlist_size = size;
            }
            if let Some(batch_size) = playlist.batch_size {
                config.batch_size = batch_size;
            }
        }

        config
    }
}

/// Platform data directory, falling back to `.randomness`.
fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "randomness")
        .map_or_else(|| PathBuf::from(".randomness"), |dirs| dirs.data_dir().to_path_buf())
}
