//! Streaming download pipeline.
//!
//! A download moves through fixed stages, each starting only after the
//! previous one's effects are in place:
//!
//! ```text
//! EnsuringStorage -> Dispatching -> Streaming -> Finalizing -> Complete
//!        \________________\______________\____________\______> Failed
//! ```
//!
//! Response headers are inspected before any byte is written; the file size is
//! measured from disk only after the last byte is flushed and the handle closed.

use std::fmt;
use std::path::Path;

use futures_util::StreamExt;
use reqwest::Client;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::error::DownloadError;
use super::metadata::{DownloadedFile, extract_metadata, finalize};
use super::storage::StorageRoot;
use crate::config::HttpSettings;
use crate::query::join_url;
use crate::transport::async_client_builder;

/// Pipeline stage, reported in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadStage {
    EnsuringStorage,
    Dispatching,
    Streaming,
    Finalizing,
    Complete,
    Failed,
}

impl fmt::Display for DownloadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::EnsuringStorage => "ensuring_storage",
            Self::Dispatching => "dispatching",
            Self::Streaming => "streaming",
            Self::Finalizing => "finalizing",
            Self::Complete => "complete",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Streams remote files into a [`StorageRoot`].
///
/// This client is designed to be created once and reused; clones share the
/// connection pool. Concurrent downloads are not serialized against each other
/// since each one writes its own generated filename.
///
/// # Example
///
/// ```no_run
/// use apilink_core::{CancellationToken, Downloader, HttpSettings, StorageRoot};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let downloader = Downloader::new(&HttpSettings::default(), StorageRoot::ephemeral())?;
/// let file = downloader
///     .download("https://example.com", "/files/report.pdf", &CancellationToken::new())
///     .await?;
/// println!("{} bytes at {}", file.file_size(), file.saved_path().display());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Downloader {
    client: Client,
    storage: StorageRoot,
}

impl Downloader {
    /// Creates a downloader writing under `storage`.
    ///
    /// The response timeout bounds the wait for headers and for each body
    /// chunk, so a slow but steady transfer is never cut off.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::ClientBuild`] if the HTTP client cannot be built.
    pub fn new(settings: &HttpSettings, storage: StorageRoot) -> Result<Self, DownloadError> {
        let client = async_client_builder(settings)
            .read_timeout(settings.response_timeout)
            .build()
            .map_err(DownloadError::client_build)?;
        Ok(Self { client, storage })
    }

    /// Downloads `remote_path` under `remote_base` into the storage root.
    ///
    /// Returns fully populated metadata, or an error and no metadata at all.
    /// A file that was opened before the failure is removed again.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] naming the stage that failed.
    #[instrument(skip(self, cancel), fields(storage = %self.storage.path().display()))]
    pub async fn download(
        &self,
        remote_base: &str,
        remote_path: &str,
        cancel: &CancellationToken,
    ) -> Result<DownloadedFile, DownloadError> {
        let result = self.run(remote_base, remote_path, cancel).await;
        if let Err(e) = &result {
            warn!(stage = %DownloadStage::Failed, error = %e, "download failed");
        }
        result
    }

    async fn run(
        &self,
        remote_base: &str,
        remote_path: &str,
        cancel: &CancellationToken,
    ) -> Result<DownloadedFile, DownloadError> {
        debug!(stage = %DownloadStage::EnsuringStorage, "entering stage");
        self.storage.ensure().await?;

        debug!(stage = %DownloadStage::Dispatching, "entering stage");
        let url = join_url(remote_base, remote_path);
        Url::parse(&url).map_err(|_| DownloadError::invalid_url(&url))?;
        if cancel.is_cancelled() {
            return Err(DownloadError::interrupted(&url));
        }

        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(DownloadError::interrupted(&url)),
            sent = self.client.get(&url).send() => {
                sent.map_err(|e| DownloadError::transport(&url, e))?
            }
        };

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(&url, status.as_u16()));
        }

        debug!(stage = %DownloadStage::Streaming, status = status.as_u16(), "entering stage");
        let metadata = extract_metadata(response.headers(), remote_path);
        let target = self.storage.resolve(metadata.saved_file_name());
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&target)
            .await
            .map_err(|e| DownloadError::streaming(&target, e))?;

        let bytes_streamed = match stream_to_file(file, response, &url, &target, cancel).await {
            Ok(bytes) => bytes,
            Err(e) => {
                remove_partial(&target).await;
                return Err(e);
            }
        };

        debug!(stage = %DownloadStage::Finalizing, bytes_streamed, "entering stage");
        let (saved_path, file_size) = match measure(&target).await {
            Ok(measured) => measured,
            Err(e) => {
                remove_partial(&target).await;
                return Err(e);
            }
        };

        info!(
            stage = %DownloadStage::Complete,
            path = %saved_path.display(),
            bytes = file_size,
            "download complete"
        );
        Ok(finalize(metadata, saved_path, file_size))
    }
}

/// Streams the response body to `file`, returning the number of bytes written.
///
/// Each chunk is fully accepted by the writer before the next one is read, so
/// a slow disk throttles the network read. The file is flushed, synced and
/// closed before returning.
async fn stream_to_file(
    file: File,
    response: reqwest::Response,
    url: &str,
    path: &Path,
    cancel: &CancellationToken,
) -> Result<u64, DownloadError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(DownloadError::interrupted(url)),
            next = stream.next() => next,
        };
        let Some(chunk_result) = next else {
            break;
        };
        let chunk = chunk_result.map_err(|e| DownloadError::transport(url, e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::streaming(path, e))?;

        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::streaming(path, e))?;
    let file = writer.into_inner();
    file.sync_all()
        .await
        .map_err(|e| DownloadError::streaming(path, e))?;
    drop(file);

    Ok(bytes_written)
}

/// Absolute path and on-disk size of the completed file.
async fn measure(path: &Path) -> Result<(std::path::PathBuf, u64), DownloadError> {
    let size = tokio::fs::metadata(path)
        .await
        .map_err(|e| DownloadError::finalization(path, e))?
        .len();
    let absolute = std::path::absolute(path).map_err(|e| DownloadError::finalization(path, e))?;
    Ok((absolute, size))
}

async fn remove_partial(path: &Path) {
    debug!(path = %path.display(), "cleaning up partial file after error");
    if let Err(e) = tokio::fs::remove_file(path).await
        && e.kind() != std::io::ErrorKind::NotFound
    {
        warn!(path = %path.display(), error = %e, "could not remove partial file");
    }
}
