//! Streaming downloads into local storage.
//!
//! This module turns a remote GET into a persisted local file plus metadata.
//!
//! # Features
//!
//! - Streaming writes with back-pressure (memory use independent of file size)
//! - Filename from Content-Disposition, request path, or a placeholder
//! - Collision-free generated storage names (128-bit random token)
//! - File size measured from disk after the write completes
//! - Partial files removed when a download fails
//! - Cancellation before dispatch, while awaiting headers, and between chunks
//!
//! # Example
//!
//! ```no_run
//! use apilink_core::download::{Downloader, StorageRoot};
//! use apilink_core::{CancellationToken, HttpSettings};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let downloader = Downloader::new(&HttpSettings::default(), StorageRoot::ephemeral())?;
//! let file = downloader
//!     .download("https://dummyimage.com", "/600x400/000/fff.png", &CancellationToken::new())
//!     .await?;
//! println!("Saved {} as {}", file.metadata().original_file_name(), file.saved_path().display());
//! # Ok(())
//! # }
//! ```

mod error;
mod metadata;
mod orchestrator;
mod storage;

pub use error::DownloadError;
pub use metadata::{DownloadedFile, FileMetadata, PLACEHOLDER_FILE_NAME, extract_metadata, finalize};
pub use orchestrator::{DownloadStage, Downloader};
pub use storage::StorageRoot;

// Note: we do NOT define module-local Result aliases.
// Use `Result<T, DownloadError>` explicitly in function signatures.
