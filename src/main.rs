//! Binary entry point for randomness.
//!
//! Refills a private playlist with a random selection of liked tracks.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;
use randomness::config::{CONFIG_PATH_ENV_VAR, SyncConfig};
use randomness::observability;
use randomness::remote::{ApiClient, ReqwestTransport};
use randomness::storage::SessionStore;
use randomness::sync::PlaylistSync;
use randomness::{Error, Result};
use std::path::PathBuf;
use std::process::ExitCode;

/// Randomness - keeps a playlist filled with random liked tracks.
#[derive(Parser)]
#[command(name = "randomness")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path.
    #[arg(short, long, global = true, env = CONFIG_PATH_ENV_VAR)]
    config: Option<PathBuf>,

    /// Without a subcommand, looks up the playlist and counts liked tracks.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Replace the playlist contents with a fresh random selection.
    Sync {
        /// Seed for a reproducible selection.
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Drop and recreate the local session table.
    ResetDb,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = observability::init_from_env(cli.verbose) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    let config = match SyncConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    match run_command(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
fn run_command(command: Option<Commands>, config: &SyncConfig) -> Result<()> {
    std::fs::create_dir_all(&config.data_dir).map_err(|e| {
        Error::Configuration(format!(
            "cannot create data directory '{}': {e}",
            config.data_dir.display()
        ))
    })?;
    let mut sessions = SessionStore::open(&config.data_dir, None)?;

    match command {
        None => cmd_library(config, &mut sessions)?,
        Some(Commands::Sync { seed }) => cmd_sync(config, &mut sessions, seed)?,
        Some(Commands::ResetDb) => cmd_reset_db(&sessions)?,
    }

    sessions.close()
}

/// Looks up the playlist and reports the library size.
fn cmd_library(config: &SyncConfig, sessions: &mut SessionStore) -> Result<()> {
    let sync = connect(config, sessions, false)?;
    let library = sync.fetch_library_tracks()?;

    match sync.playlist_id() {
        Some(id) => println!("Playlist: {id}"),
        None => println!("Playlist: not created yet"),
    }
    println!("Liked tracks: {}", library.len());
    println!("Tracks per sync: {}", sync.sample_size());
    Ok(())
}

/// Runs a full synchronization and records it.
fn cmd_sync(config: &SyncConfig, sessions: &mut SessionStore, seed: Option<u64>) -> Result<()> {
    let mut sync = connect(config, sessions, true)?;

    let report = match seed {
        Some(seed) => sync.sync(&mut StdRng::seed_from_u64(seed))?,
        None => sync.sync(&mut rand::rng())?,
    };
    sessions.record_sync(report.playlist_id.as_str(), report.added)?;

    println!("Playlist: {}", report.playlist_id);
    println!("Liked tracks: {}", report.library_size);
    println!("Removed: {} ({} requests)", report.removed, report.delete_requests);
    println!("Added: {} ({} requests)", report.added, report.save_requests);
    Ok(())
}

/// Recreates the session table.
fn cmd_reset_db(sessions: &SessionStore) -> Result<()> {
    sessions.reset()?;
    println!("Session table reset");
    Ok(())
}

/// Builds the orchestrator, checks the token and finds the playlist,
/// reusing the last recorded playlist id when it is still valid.
///
/// A missing playlist is created only when `create` is set.
fn connect(
    config: &SyncConfig,
    sessions: &mut SessionStore,
    create: bool,
) -> Result<PlaylistSync<ReqwestTransport>> {
    let client = ApiClient::new(ReqwestTransport::new(config)?, config.base_url.as_str());
    client.verify_token()?;

    let mut sync = PlaylistSync::new(client, config);
    let previous = sessions.resume_latest()?.and_then(|row| row.playlist_id);

    match previous {
        Some(id) => {
            if let Err(e) = sync.set_playlist_id(&id) {
                tracing::warn!(playlist_id = %id, error = %e, "Recorded playlist unusable, looking up by name");
                find_playlist(&mut sync, create)?;
            }
        },
        None => find_playlist(&mut sync, create)?,
    }

    Ok(sync)
}

/// Looks the playlist up by name, creating it if `create` is set.
fn find_playlist(sync: &mut PlaylistSync<ReqwestTransport>, create: bool) -> Result<()> {
    if create {
        sync.resolve_playlist()?;
    } else {
        sync.get_playlist()?;
    }
    Ok(())
}
