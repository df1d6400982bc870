//! Pooled blocking transport that reports error statuses as classified failures.

use async_trait::async_trait;
use reqwest::blocking::Client;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use super::{ApiRequest, ErrorClass, RawResponse, Transport, TransportError, blocking};
use crate::config::HttpSettings;

/// Same exchange as [`super::PooledTransport`], but 4xx/5xx responses come back
/// as [`TransportError::Rejected`] tagged with an [`ErrorClass`], and connect or
/// timeout failures as [`TransportError::Unavailable`].
#[derive(Debug, Clone)]
pub struct ClassifyingTransport {
    client: Client,
}

impl ClassifyingTransport {
    /// Builds the shared client.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::ClientBuild`] if the client cannot be built.
    pub async fn connect(settings: &HttpSettings) -> Result<Self, TransportError> {
        Ok(Self {
            client: blocking::build_shared_client(settings).await?,
        })
    }
}

/// Turns 4xx/5xx responses into rejected errors; everything else passes through.
pub(super) fn classify(url: &str, raw: RawResponse) -> Result<RawResponse, TransportError> {
    match ErrorClass::from_status(raw.status) {
        Some(class) => {
            debug!(url, status = raw.status, %class, "classified error response");
            Err(TransportError::rejected(url, raw.status, raw.body))
        }
        None => Ok(raw),
    }
}

#[async_trait]
impl Transport for ClassifyingTransport {
    fn name(&self) -> &'static str {
        "classifying"
    }

    #[instrument(level = "debug", skip_all, fields(transport = "classifying", method = %request.method, url = %request.url))]
    async fn execute(
        &self,
        request: &ApiRequest,
        cancel: &CancellationToken,
    ) -> Result<RawResponse, TransportError> {
        let client = self.client.clone();
        let owned = request.clone();
        let raw = blocking::run(&request.url, cancel, move || {
            blocking::exchange(&client, &owned, false)
        })
        .await?;
        classify(&request.url, raw)
    }
}
