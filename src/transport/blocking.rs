//! Helpers shared by the thread-per-call transports.

use reqwest::blocking::{Client, ClientBuilder};
use reqwest::header::{ACCEPT, CONNECTION, CONTENT_TYPE};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{ACCEPT_JSON, ApiRequest, CONTENT_TYPE_JSON_UTF8, RawResponse, TransportError};
use crate::config::HttpSettings;
use crate::user_agent;

/// Blocking client builder carrying the connect and whole-request timeouts.
pub(super) fn client_builder(settings: &HttpSettings) -> ClientBuilder {
    Client::builder()
        .connect_timeout(settings.connect_timeout)
        .timeout(settings.read_timeout)
        .gzip(true)
        .user_agent(user_agent::default_user_agent())
}

/// Builds a shared blocking client off the async runtime.
///
/// `reqwest::blocking` starts its own runtime and must not be constructed on
/// an async worker thread.
pub(super) async fn build_shared_client(settings: &HttpSettings) -> Result<Client, TransportError> {
    let builder = client_builder(settings);
    tokio::task::spawn_blocking(move || builder.build())
        .await
        .map_err(|e| TransportError::worker("<client construction>", e))?
        .map_err(TransportError::client_build)
}

/// Sends `request` and reads the whole response, blocking the current thread.
///
/// With `close_connection`, the request asks the server to close the
/// connection after the exchange.
pub(super) fn exchange(
    client: &Client,
    request: &ApiRequest,
    close_connection: bool,
) -> Result<RawResponse, TransportError> {
    let mut builder = client
        .request(request.method.clone(), &request.url)
        .header(ACCEPT, ACCEPT_JSON);
    if close_connection {
        builder = builder.header(CONNECTION, "close");
    }
    if let Some(body) = request.encoded_body()? {
        builder = builder.header(CONTENT_TYPE, CONTENT_TYPE_JSON_UTF8).body(body);
    }

    let response = builder
        .send()
        .map_err(|e| TransportError::from_reqwest(&request.url, e))?;
    let status = response.status().as_u16();

    if status == 204 {
        return Ok(RawResponse::new(status, None));
    }

    match response.text() {
        Ok(text) => Ok(RawResponse::new(status, Some(text))),
        Err(e) if (200..300).contains(&status) => Err(TransportError::from_reqwest(&request.url, e)),
        Err(e) => {
            debug!(status, error = %e, "error body unavailable");
            Ok(RawResponse::new(status, None))
        }
    }
}

/// Runs `work` on the blocking pool, racing it against `cancel`.
///
/// On cancellation the worker thread is abandoned; it finishes on its own
/// within the client's timeouts and its result is dropped.
pub(super) async fn run<F>(
    url: &str,
    cancel: &CancellationToken,
    work: F,
) -> Result<RawResponse, TransportError>
where
    F: FnOnce() -> Result<RawResponse, TransportError> + Send + 'static,
{
    if cancel.is_cancelled() {
        return Err(TransportError::interrupted(url));
    }

    let handle = tokio::task::spawn_blocking(work);
    tokio::select! {
        biased;
        () = cancel.cancelled() => {
            debug!(url, "request interrupted while waiting on blocking worker");
            Err(TransportError::interrupted(url))
        }
        joined = handle => match joined {
            Ok(result) => result,
            Err(e) => Err(TransportError::worker(url, e)),
        },
    }
}
