//! apilink Core Library
//!
//! This library provides a client-side HTTP access layer: every JSON API call
//! comes back as one [`ApiResponse`] envelope regardless of which transport
//! executed it, and remote files are streamed to local storage together with
//! metadata derived from the response headers.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`envelope`] - Result envelope returned by every API call
//! - [`query`] - Request URL and query string composition
//! - [`transport`] - Interchangeable HTTP transports behind one trait
//! - [`normalize`] - Raw transport outcome to envelope conversion
//! - [`service`] - CRUD facade over a configured transport
//! - [`download`] - Streaming download pipeline and file metadata
//! - [`config`] - Defaults and environment overrides

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod download;
pub mod envelope;
pub mod normalize;
pub mod query;
pub mod service;
pub mod transport;
mod user_agent;

// Re-export commonly used types
pub use config::{ClientConfig, ConfigError, HttpSettings};
pub use download::{
    DownloadError, DownloadedFile, Downloader, FileMetadata, StorageRoot, extract_metadata,
    finalize,
};
pub use envelope::{ApiResponse, ErrorDetail, Outcome};
pub use normalize::normalize;
pub use query::{build_url, join_url};
pub use service::ApiClient;
pub use transport::{
    ApiRequest, ErrorClass, RawResponse, ResponseShape, Transport, TransportError, TransportKind,
};
pub use tokio_util::sync::CancellationToken;
