//! Error types for submirror
//!
//! This module provides error handling for the library, including:
//! - Domain-specific error types (Download, Database, Config)
//! - A distinction between hard transfer failures and offline-attributable ones,
//!   so expected offline operation does not flood the error log

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for submirror operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for submirror
///
/// This is the primary error type used throughout the library. Each variant includes
/// contextual information to help diagnose issues.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "media_dir")
        key: Option<String>,
    },

    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLx database error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Media download error
    #[error("download error: {0}")]
    Download(#[from] DownloadError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Post not found
    #[error("post not found: {0}")]
    NotFound(String),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// HTTP status code this error maps to when surfaced through the REST API
    pub fn status_code(&self) -> u16 {
        match self {
            Error::NotFound(_) => 404,
            Error::Database(DatabaseError::NotFound(_)) => 404,
            Error::Config { .. } => 422,
            _ => 500,
        }
    }

    /// Stable machine-readable error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Database(DatabaseError::NotFound(_)) | Error::NotFound(_) => "not_found",
            Error::Database(_) | Error::Sqlx(_) => "database_error",
            Error::Download(_) => "download_error",
            Error::Io(_) => "io_error",
            Error::Network(_) => "network_error",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::Other(_) => "internal_error",
        }
    }
}

/// Database-related errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to run migrations
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Record not found
    #[error("record not found: {0}")]
    NotFound(String),
}

/// Errors raised while downloading a single post's media
///
/// All transport, HTTP, and filesystem failures during one post's download funnel
/// into this one type so the batch orchestrator can record them uniformly. A
/// failure here never aborts the batch.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Network or transport failure while fetching the media resource
    #[error("transfer failed: {0}")]
    Transfer(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("HTTP status {status} fetching {url}")]
    HttpStatus {
        /// The HTTP status code returned
        status: u16,
        /// The URL that was requested
        url: String,
    },

    /// The resource is no longer reachable (404/410)
    #[error("resource no longer reachable: {url}")]
    Gone {
        /// The URL that is gone
        url: String,
    },

    /// Filesystem failure creating the post folder or writing the media file
    #[error("filesystem error at {path}: {source}")]
    Filesystem {
        /// The path being created or written
        path: PathBuf,
        /// The underlying I/O error
        source: std::io::Error,
    },

    /// The post has no URL to download (classifier should have skipped it)
    #[error("post has no downloadable url")]
    MissingUrl,
}

impl DownloadError {
    /// Whether this failure is attributable to the host being offline.
    ///
    /// Offline failures are still recorded as failed in the tracker but are
    /// excluded from error-level logging.
    pub fn is_offline(&self) -> bool {
        match self {
            DownloadError::Transfer(e) => e.is_connect() || e.is_timeout(),
            _ => false,
        }
    }
}
