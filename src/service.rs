//! CRUD facade over a configured [`Transport`].
//!
//! [`ApiClient`] composes request URLs from a base URL and a resource path,
//! hands them to whichever transport it was built with, and normalizes the
//! result. It never returns an error: every failure is a failed envelope.

use std::sync::Arc;

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::config::ClientConfig;
use crate::envelope::ApiResponse;
use crate::normalize::normalize;
use crate::query::{build_url, join_url};
use crate::transport::{self, ApiRequest, ResponseShape, Transport, TransportError};

/// Error code for a request body that cannot be serialized.
pub const REQUEST_ENCODING_ERROR: &str = "REQUEST_ENCODING_ERROR";

/// Entry point for JSON API calls.
///
/// # Example
///
/// ```no_run
/// use apilink_core::{ApiClient, CancellationToken, ClientConfig};
/// use serde_json::Value;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = ApiClient::from_config(&ClientConfig::default()).await?;
/// let response = client.fetch::<Value>("1", &CancellationToken::new()).await;
/// println!("{}", serde_json::to_string_pretty(&response)?);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    base_url: String,
    resource: String,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("transport", &self.transport.name())
            .field("base_url", &self.base_url)
            .field("resource", &self.resource)
            .finish()
    }
}

impl ApiClient {
    /// Creates a client over an already-built transport.
    pub fn new(
        transport: Arc<dyn Transport>,
        base_url: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
            resource: resource.into(),
        }
    }

    /// Builds the configured transport and wraps it.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the transport's client cannot be built.
    pub async fn from_config(config: &ClientConfig) -> Result<Self, TransportError> {
        let transport = transport::build(config.transport, &config.http).await?;
        info!(transport = transport.name(), base_url = %config.base_url, "API client ready");
        Ok(Self::new(
            transport,
            config.base_url.clone(),
            config.resource.clone(),
        ))
    }

    /// Name of the transport in use.
    #[must_use]
    pub fn transport_name(&self) -> &'static str {
        self.transport.name()
    }

    /// Absolute URL of `path` under the base URL.
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    /// Performs one call against `path` (relative to the base URL).
    ///
    /// A body that fails to serialize produces a failed envelope with
    /// [`REQUEST_ENCODING_ERROR`]; nothing is sent in that case.
    #[instrument(skip(self, body, cancel), fields(transport = self.transport.name()))]
    pub async fn call<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        shape: ResponseShape,
        cancel: &CancellationToken,
    ) -> ApiResponse<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let mut request = ApiRequest::new(method, self.url_for(path)).expecting(shape);
        if let Some(body) = body {
            match serde_json::to_value(body) {
                Ok(value) => request = request.with_body(value),
                Err(e) => {
                    return ApiResponse::fail_with_code(
                        500,
                        REQUEST_ENCODING_ERROR,
                        format!("Request encoding error: {e}"),
                    );
                }
            }
        }
        self.send(&request, cancel).await
    }

    /// Sends a prepared request and normalizes the outcome.
    pub async fn send<T>(&self, request: &ApiRequest, cancel: &CancellationToken) -> ApiResponse<T>
    where
        T: DeserializeOwned,
    {
        let outcome = self.transport.execute(request, cancel).await;
        let response = normalize(outcome, request.shape);
        debug!(
            status = response.http_status_code(),
            outcome = ?response.outcome(),
            "call finished"
        );
        response
    }

    /// GET the resource collection, with optional query parameters.
    pub async fn list<T>(
        &self,
        params: &[(&str, Value)],
        cancel: &CancellationToken,
    ) -> ApiResponse<T>
    where
        T: DeserializeOwned,
    {
        let url = build_url(&self.url_for(&self.resource), params);
        self.send(&ApiRequest::new(Method::GET, url), cancel).await
    }

    /// GET one item of the resource.
    pub async fn fetch<T>(&self, id: &str, cancel: &CancellationToken) -> ApiResponse<T>
    where
        T: DeserializeOwned,
    {
        self.call::<T, Value>(Method::GET, &self.item_path(id), None, ResponseShape::Json, cancel)
            .await
    }

    /// POST a new item to the resource collection.
    pub async fn create<T, B>(&self, body: &B, cancel: &CancellationToken) -> ApiResponse<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.call(Method::POST, &self.resource, Some(body), ResponseShape::Json, cancel)
            .await
    }

    /// PUT a full replacement of one item.
    pub async fn replace<T, B>(
        &self,
        id: &str,
        body: &B,
        cancel: &CancellationToken,
    ) -> ApiResponse<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.call(Method::PUT, &self.item_path(id), Some(body), ResponseShape::Json, cancel)
            .await
    }

    /// PATCH part of one item.
    pub async fn update<T, B>(
        &self,
        id: &str,
        body: &B,
        cancel: &CancellationToken,
    ) -> ApiResponse<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.call(Method::PATCH, &self.item_path(id), Some(body), ResponseShape::Json, cancel)
            .await
    }

    /// DELETE one item; success never carries data.
    pub async fn delete(&self, id: &str, cancel: &CancellationToken) -> ApiResponse<()> {
        self.call::<(), Value>(
            Method::DELETE,
            &self.item_path(id),
            None,
            ResponseShape::NoContent,
            cancel,
        )
        .await
    }

    fn item_path(&self, id: &str) -> String {
        format!(
            "{}/{}",
            self.resource.trim_end_matches('/'),
            urlencoding::encode(id)
        )
    }
}
