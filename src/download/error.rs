//! Error types for the download module.
//!
//! Each variant names the pipeline stage that failed, so a caller can tell a
//! storage problem from a network one without inspecting sources.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that end a download. No partial metadata accompanies any of them.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The base URL and path do not form a valid absolute URL.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The rejected URL string.
        url: String,
    },

    /// The download HTTP client could not be constructed.
    #[error("failed to build download client: {source}")]
    ClientBuild {
        /// The builder error.
        #[source]
        source: reqwest::Error,
    },

    /// The storage root could not be created.
    #[error("cannot provision storage directory {path}: {source}")]
    Provisioning {
        /// The storage root path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Connection, DNS or TLS failure, before the headers or mid-body.
    #[error("network error downloading {url}: {source}")]
    Transport {
        /// The URL being downloaded.
        url: String,
        /// The underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// The server stopped responding for longer than the response timeout.
    #[error("timeout downloading {url}")]
    Timeout {
        /// The URL being downloaded.
        url: String,
    },

    /// The server answered with a non-2xx status; nothing was written.
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// The URL being downloaded.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The cancellation token fired.
    #[error("download of {url} was interrupted")]
    Interrupted {
        /// The URL being downloaded.
        url: String,
    },

    /// Opening, writing, flushing or syncing the target file failed.
    #[error("streaming to {path} failed: {source}")]
    Streaming {
        /// The target file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The completed file could not be measured.
    #[error("cannot measure completed file {path}: {source}")]
    Finalization {
        /// The completed file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl DownloadError {
    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a client construction error.
    pub fn client_build(source: reqwest::Error) -> Self {
        Self::ClientBuild { source }
    }

    /// Creates a provisioning error.
    pub fn provisioning(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Provisioning {
            path: path.into(),
            source,
        }
    }

    /// Creates a transport error, promoting timeouts to [`DownloadError::Timeout`].
    pub fn transport(url: impl Into<String>, source: reqwest::Error) -> Self {
        let url = url.into();
        if source.is_timeout() {
            Self::Timeout { url }
        } else {
            Self::Transport { url, source }
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates an interruption error.
    pub fn interrupted(url: impl Into<String>) -> Self {
        Self::Interrupted { url: url.into() }
    }

    /// Creates a streaming error.
    pub fn streaming(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Streaming {
            path: path.into(),
            source,
        }
    }

    /// Creates a finalization error.
    pub fn finalization(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Finalization {
            path: path.into(),
            source,
        }
    }
}

// Note on From trait implementations:
// `From<reqwest::Error>` and `From<std::io::Error>` are deliberately absent.
// Every variant needs a URL or path that the source error does not carry, and
// the same io::Error means different things in different stages.
