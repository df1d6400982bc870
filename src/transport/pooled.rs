//! Thread-per-call transport sharing one pooled blocking client.

use async_trait::async_trait;
use reqwest::blocking::Client;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use super::{ApiRequest, RawResponse, Transport, TransportError, blocking};
use crate::config::HttpSettings;

/// Reuses one blocking client, amortizing connection setup across calls.
#[derive(Debug, Clone)]
pub struct PooledTransport {
    client: Client,
}

impl PooledTransport {
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

#[async_trait]
impl Transport for PooledTransport {
    fn name(&self) -> &'static str {
        "pooled"
    }

    #[instrument(level = "debug", skip_all, fields(transport = "pooled", method = %request.method, url = %request.url))]
    async fn execute(
        &self,
        request: &ApiRequest,
        cancel: &CancellationToken,
    ) -> Result<RawResponse, TransportError> {
        let client = self.client.clone();
        let owned = request.clone();
        blocking::run(&request.url, cancel, move || {
            blocking::exchange(&client, &owned, false)
        })
        .await
    }
}
