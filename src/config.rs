//! Configuration types for submirror

use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf};
use utoipa::ToSchema;

/// Media download behavior configuration (directories, concurrency, content gating)
///
/// Groups settings related to how post media is fetched and stored.
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DownloadConfig {
    /// Root directory for downloaded media, one sub-folder per post id
    /// (default: "./media-downloads")
    #[serde(default = "default_media_dir")]
    pub media_dir: PathBuf,

    /// Maximum media downloads running at once (default: 2)
    ///
    /// Bounds the number of posts in the started state globally across a batch.
    #[serde(default = "default_media_downloads_at_once")]
    pub media_downloads_at_once: usize,

    /// Whether video downloads are enabled (default: false)
    ///
    /// When disabled, posts classified as video resolve to an explicit skip.
    #[serde(default)]
    pub video_downloads_enabled: bool,

    /// Per-request timeout in seconds for media fetches (default: 300)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Minimum interval between progress updates for one post, in milliseconds
    /// (default: 500)
    ///
    /// Progress is recomputed per received chunk but pushed to the tracker at most
    /// this often, plus one final update when the stream ends.
    #[serde(default = "default_progress_interval_ms")]
    pub progress_interval_ms: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            media_dir: default_media_dir(),
            media_downloads_at_once: default_media_downloads_at_once(),
            video_downloads_enabled: false,
            request_timeout_secs: default_request_timeout_secs(),
            progress_interval_ms: default_progress_interval_ms(),
        }
    }
}

/// Persistence configuration
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PersistenceConfig {
    /// SQLite database path (default: "./submirror.db")
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

/// REST API server configuration
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:8080)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

/// Main configuration for [`MediaDownloader`](crate::MediaDownloader)
///
/// Every field has a sensible default; `Config::default()` yields a working
/// local setup.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Media download behavior
    #[serde(default)]
    pub download: DownloadConfig,

    /// Persistence settings
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// REST API server settings
    #[serde(default)]
    pub api: ApiConfig,
}

fn default_media_dir() -> PathBuf {
    PathBuf::from("./media-downloads")
}

fn default_media_downloads_at_once() -> usize {
    2
}

fn default_request_timeout_secs() -> u64 {
    300
}

fn default_progress_interval_ms() -> u64 {
    500
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./submirror.db")
}

fn default_bind_address() -> SocketAddr {
    "127.0.0.1:8080"
        .parse()
        .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 8080)))
}

fn default_true() -> bool {
    true
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}
