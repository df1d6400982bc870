//! Non-blocking transport driven by the tokio reactor.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, ClientBuilder};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use super::{ACCEPT_JSON, ApiRequest, CONTENT_TYPE_JSON_UTF8, RawResponse, Transport, TransportError};
use crate::config::HttpSettings;
use crate::user_agent;

/// Async client builder shared with the download client.
pub(crate) fn async_client_builder(settings: &HttpSettings) -> ClientBuilder {
    Client::builder()
        .connect_timeout(settings.connect_timeout)
        .gzip(true)
        .user_agent(user_agent::default_user_agent())
}

/// Suspends on the network instead of occupying a thread.
///
/// Each call is bounded by the response timeout, applied per request.
#[derive(Debug, Clone)]
pub struct ReactiveTransport {
    client: Client,
    response_timeout: Duration,
}

impl ReactiveTransport {
    /// Builds the async client.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::ClientBuild`] if the client cannot be built.
    pub fn new(settings: &HttpSettings) -> Result<Self, TransportError> {
        let client = async_client_builder(settings)
            .build()
            .map_err(TransportError::client_build)?;
        Ok(Self {
            client,
            response_timeout: settings.response_timeout,
        })
    }

    async fn exchange(&self, request: &ApiRequest) -> Result<RawResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method.clone(), &request.url)
            .header(ACCEPT, ACCEPT_JSON)
            .timeout(self.response_timeout);
        if let Some(body) = request.encoded_body()? {
            builder = builder.header(CONTENT_TYPE, CONTENT_TYPE_JSON_UTF8).body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(&request.url, e))?;
        let status = response.status().as_u16();

        if status == 204 {
            return Ok(RawResponse::new(status, None));
        }

        match response.text().await {
            Ok(text) => Ok(RawResponse::new(status, Some(text))),
            Err(e) if (200..300).contains(&status) => {
                Err(TransportError::from_reqwest(&request.url, e))
            }
            Err(e) => {
                debug!(status, error = %e, "error body unavailable");
                Ok(RawResponse::new(status, None))
            }
        }
    }
}

#[async_trait]
impl Transport for ReactiveTransport {
    fn name(&self) -> &'static str {
        "reactive"
    }

    #[instrument(level = "debug", skip_all, fields(transport = "reactive", method = %request.method, url = %request.url))]
    async fn execute(
        &self,
        request: &ApiRequest,
        cancel: &CancellationToken,
    ) -> Result<RawResponse, TransportError> {
        if cancel.is_cancelled() {
            return Err(TransportError::interrupted(&request.url));
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!("request interrupted while awaiting response");
                Err(TransportError::interrupted(&request.url))
            }
            result = self.exchange(request) => result,
        }
    }
}
