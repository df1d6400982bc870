//! Interchangeable HTTP transports behind a single [`Transport`] trait.
//!
//! Four variants share one outward contract and differ only in concurrency model:
//!
//! - [`PerCallTransport`] - builds and tears down a blocking client for every call
//! - [`PooledTransport`] - one shared blocking client with pooled connections
//! - [`ClassifyingTransport`] - pooled blocking client that classifies 4xx/5xx
//!   responses into [`TransportError::Rejected`] before normalization
//! - [`ReactiveTransport`] - non-blocking client driven by the tokio reactor
//!
//! Blocking variants occupy a `spawn_blocking` thread for the full duration of a
//! call and are always bounded by the configured connect and read timeouts.
//! Which variant runs is decided once, by [`build`] from a [`TransportKind`].
//!
//! Every call takes a [`CancellationToken`]. Cancellation observed before or
//! during a call yields [`TransportError::Interrupted`]; the token itself is left
//! cancelled so callers further up still see it.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::HttpSettings;

mod blocking;
mod classifying;
mod per_call;
mod pooled;
mod reactive;

pub use classifying::ClassifyingTransport;
pub use per_call::PerCallTransport;
pub use pooled::PooledTransport;
pub use reactive::ReactiveTransport;
pub(crate) use reactive::async_client_builder;

/// Value of the `Accept` header sent on every call.
pub const ACCEPT_JSON: &str = "application/json";

/// Value of the `Content-Type` header sent with every request body.
pub const CONTENT_TYPE_JSON_UTF8: &str = "application/json; charset=UTF-8";

/// What the caller expects back from a successful call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseShape {
    /// A JSON document to decode.
    #[default]
    Json,
    /// Nothing; any 2xx is a success without data.
    NoContent,
}

/// One outbound API call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub body: Option<Value>,
    pub shape: ResponseShape,
}

impl ApiRequest {
    /// Creates a body-less request expecting JSON back.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            body: None,
            shape: ResponseShape::Json,
        }
    }

    /// Attaches a JSON body.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Sets the expected response shape.
    #[must_use]
    pub fn expecting(mut self, shape: ResponseShape) -> Self {
        self.shape = shape;
        self
    }

    /// Serialized body bytes, if any.
    pub(crate) fn encoded_body(&self) -> Result<Option<Vec<u8>>, TransportError> {
        self.body
            .as_ref()
            .map(serde_json::to_vec)
            .transpose()
            .map_err(|source| TransportError::encoding(&self.url, source))
    }
}

/// Status and body text as received from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    /// `None` when the body could not be read or was never sent (204).
    pub body: Option<String>,
}

impl RawResponse {
    #[must_use]
    pub fn new(status: u16, body: Option<String>) -> Self {
        Self { status, body }
    }

    /// True for statuses in `[200, 300)`.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Which side of the exchange a rejected call is blamed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// 4xx responses.
    Client,
    /// 5xx responses.
    Server,
}

impl ErrorClass {
    /// Classifies an error status; `None` for anything outside 4xx/5xx.
    #[must_use]
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            400..=499 => Some(Self::Client),
            500..=599 => Some(Self::Server),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Client => write!(f, "client"),
            Self::Server => write!(f, "server"),
        }
    }
}

/// Failures raised by a transport instead of a [`RawResponse`].
///
/// None of these leave the crate as a panic or raw error: the normalizer turns
/// each into a failed envelope.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection refused, DNS failure, or a timeout.
    #[error("network failure or timeout calling {url}: {source}")]
    Unavailable {
        /// The URL being called.
        url: String,
        /// The underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// Any other failure while sending the request or reading the response.
    #[error("connection or IO error calling {url}: {source}")]
    Io {
        /// The URL being called.
        url: String,
        /// The underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// The cancellation token fired before the call completed.
    #[error("request to {url} was interrupted")]
    Interrupted {
        /// The URL being called.
        url: String,
    },

    /// 4xx/5xx response surfaced as an error by the classifying transport.
    #[error("{class} error {status} calling {url}")]
    Rejected {
        /// The URL being called.
        url: String,
        /// Client or server side.
        class: ErrorClass,
        /// The HTTP status code.
        status: u16,
        /// Response body, when it could be read.
        body: Option<String>,
    },

    /// The request body could not be serialized.
    #[error("could not encode request body for {url}: {source}")]
    Encoding {
        /// The URL being called.
        url: String,
        /// The serialization error.
        #[source]
        source: serde_json::Error,
    },

    /// The blocking worker thread panicked or was aborted.
    #[error("transport worker for {url} failed: {source}")]
    Worker {
        /// The URL being called.
        url: String,
        /// The join error from the blocking pool.
        #[source]
        source: tokio::task::JoinError,
    },

    /// The underlying HTTP client could not be constructed.
    #[error("failed to build HTTP client: {source}")]
    ClientBuild {
        /// The builder error.
        #[source]
        source: reqwest::Error,
    },
}

impl TransportError {
    /// Maps a client send/read error onto availability vs. local failure.
    pub(crate) fn from_reqwest(url: impl Into<String>, source: reqwest::Error) -> Self {
        let url = url.into();
        if source.is_timeout() || source.is_connect() {
            Self::Unavailable { url, source }
        } else {
            Self::Io { url, source }
        }
    }

    /// Creates an interruption error.
    pub fn interrupted(url: impl Into<String>) -> Self {
        Self::Interrupted { url: url.into() }
    }

    /// Creates a rejected-status error, classifying the status.
    ///
    /// Statuses outside 4xx/5xx are attributed to the server.
    pub fn rejected(url: impl Into<String>, status: u16, body: Option<String>) -> Self {
        Self::Rejected {
            url: url.into(),
            class: ErrorClass::from_status(status).unwrap_or(ErrorClass::Server),
            status,
            body,
        }
    }

    /// Creates an encoding error.
    pub fn encoding(url: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Encoding {
            url: url.into(),
            source,
        }
    }

    /// Creates a worker failure error.
    pub fn worker(url: impl Into<String>, source: tokio::task::JoinError) -> Self {
        Self::Worker {
            url: url.into(),
            source,
        }
    }

    /// Creates a client construction error.
    pub fn client_build(source: reqwest::Error) -> Self {
        Self::ClientBuild { source }
    }

    /// HTTP-shaped status reported for this failure.
    ///
    /// 503 for availability problems, the real status for rejected calls,
    /// 500 for everything local.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            Self::Unavailable { .. } => 503,
            Self::Rejected { status, .. } => *status,
            Self::Io { .. }
            | Self::Interrupted { .. }
            | Self::Encoding { .. }
            | Self::Worker { .. }
            | Self::ClientBuild { .. } => 500,
        }
    }
}

/// One strategy for performing an HTTP request/response exchange.
///
/// # Object Safety
///
/// This trait uses `async_trait` so transports can be selected at runtime and
/// held as `Arc<dyn Transport>`.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Short name used in logs (matches the [`TransportKind`] spelling).
    fn name(&self) -> &'static str;

    /// Performs one exchange.
    ///
    /// Non-2xx responses are returned as `Ok` except by the classifying variant,
    /// which reports 4xx/5xx as [`TransportError::Rejected`].
    async fn execute(
        &self,
        request: &ApiRequest,
        cancel: &CancellationToken,
    ) -> Result<RawResponse, TransportError>;
}

/// Configuration value selecting a transport variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportKind {
    PerCall,
    Pooled,
    Classifying,
    #[default]
    Reactive,
}

impl TransportKind {
    /// Every variant, in documentation order.
    pub const ALL: [Self; 4] = [
        Self::PerCall,
        Self::Pooled,
        Self::Classifying,
        Self::Reactive,
    ];

    /// Kebab-case name accepted by [`FromStr`].
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PerCall => "per-call",
            Self::Pooled => "pooled",
            Self::Classifying => "classifying",
            Self::Reactive => "reactive",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|k| k.as_str()).collect();
                format!("unknown transport '{s}' (expected one of: {})", names.join(", "))
            })
    }
}

/// Builds the transport selected by `kind`.
///
/// # Errors
///
/// Returns [`TransportError::ClientBuild`] when a shared client cannot be built.
pub async fn build(
    kind: TransportKind,
    settings: &HttpSettings,
) -> Result<Arc<dyn Transport>, TransportError> {
    debug!(transport = %kind, ?settings, "building transport");
    let transport: Arc<dyn Transport> = match kind {
        TransportKind::PerCall => Arc::new(PerCallTransport::new(*settings)),
        TransportKind::Pooled => Arc::new(PooledTransport::connect(settings).await?),
        TransportKind::Classifying => Arc::new(ClassifyingTransport::connect(settings).await?),
        TransportKind::Reactive => Arc::new(ReactiveTransport::new(settings)?),
    };
    Ok(transport)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_transport_kind_round_trips_names() {
        for kind in TransportKind::ALL {
            assert_eq!(kind.as_str().parse::<TransportKind>().unwrap(), kind);
        }
        assert_eq!("POOLED".parse::<TransportKind>().unwrap(), TransportKind::Pooled);
    }

    #[test]
    fn test_transport_kind_unknown_name_lists_choices() {
        let err = "smoke-signal".parse::<TransportKind>().unwrap_err();
        assert!(err.contains("per-call"), "Expected choices in: {err}");
    }

    #[test]
    fn test_error_class_from_status() {
        assert_eq!(ErrorClass::from_status(404), Some(ErrorClass::Client));
        assert_eq!(ErrorClass::from_status(503), Some(ErrorClass::Server));
        assert_eq!(ErrorClass::from_status(302), None);
    }

    #[test]
    fn test_rejected_error_reports_real_status() {
        let error = TransportError::rejected("https://api.test/x", 418, None);
        assert_eq!(error.status(), 418);
        let msg = error.to_string();
        assert!(msg.contains("client error 418"), "Expected class in: {msg}");
    }

    #[test]
    fn test_interrupted_error_reports_500() {
        let error = TransportError::interrupted("https://api.test/x");
        assert_eq!(error.status(), 500);
        assert!(error.to_string().contains("interrupted"));
    }

    #[test]
    fn test_raw_response_success_range() {
        assert!(RawResponse::new(200, None).is_success());
        assert!(RawResponse::new(299, None).is_success());
        assert!(!RawResponse::new(300, None).is_success());
        assert!(!RawResponse::new(199, None).is_success());
    }

    #[test]
    fn test_api_request_builder_and_encoding() {
        let request = ApiRequest::new(Method::POST, "https://api.test/posts")
            .with_body(json!({"title": "t"}))
            .expecting(ResponseShape::Json);
        let bytes = request.encoded_body().unwrap().unwrap();
        assert_eq!(bytes, br#"{"title":"t"}"#);

        let empty = ApiRequest::new(Method::DELETE, "https://api.test/posts/1");
        assert!(empty.encoded_body().unwrap().is_none());
    }
}
