//! Thread-per-call transport with a fresh connection for every request.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use super::{ApiRequest, RawResponse, Transport, TransportError, blocking};
use crate::config::HttpSettings;

/// Opens one connection per call and tears it down afterwards.
///
/// The client is built inside the worker and dropped when the worker returns,
/// on success, non-2xx and error alike, so nothing outlives the call. Idle
/// pooling is disabled and the request carries `Connection: close`.
#[derive(Debug, Clone, Copy)]
pub struct PerCallTransport {
    settings: HttpSettings,
}

impl PerCallTransport {
    #[must_use]
    pub fn new(settings: HttpSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl Transport for PerCallTransport {
    fn name(&self) -> &'static str {
        "per-call"
    }

    #[instrument(level = "debug", skip_all, fields(transport = "per-call", method = %request.method, url = %request.url))]
    async fn execute(
        &self,
        request: &ApiRequest,
        cancel: &CancellationToken,
    ) -> Result<RawResponse, TransportError> {
        let settings = self.settings;
        let owned = request.clone();
        blocking::run(&request.url, cancel, move || {
            let client = blocking::client_builder(&settings)
                .pool_max_idle_per_host(0)
                .build()
                .map_err(TransportError::client_build)?;
            let result = blocking::exchange(&client, &owned, true);
            drop(client);
            debug!(ok = result.is_ok(), "per-call connection released");
            result
        })
        .await
    }
}
