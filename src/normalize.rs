//! Conversion of a raw transport outcome into an [`ApiResponse`].
//!
//! Every outcome produces exactly one envelope:
//!
//! | Outcome                                   | Envelope                                 |
//! |-------------------------------------------|------------------------------------------|
//! | 2xx, no-content shape, 204 or empty body  | success, no data                         |
//! | 2xx, body decodes                         | success with data                        |
//! | 2xx, body does not decode                 | fail 500, `JSON_PARSE_ERROR`             |
//! | non-2xx (or classified rejection)         | fail with the real status, `HTTP_<code>` |
//! | connect/DNS/timeout failure               | fail 503                                 |
//! | interruption or other local failure       | fail 500                                 |
//!
//! Decoding failures are final; nothing here retries.

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::envelope::ApiResponse;
use crate::transport::{RawResponse, ResponseShape, TransportError};

/// Error code for a 2xx body that does not match the expected shape.
pub const JSON_PARSE_ERROR: &str = "JSON_PARSE_ERROR";

/// Placeholder used when an error response body could not be read.
pub const NO_BODY_PLACEHOLDER: &str = "No body available";

/// Maps a transport outcome onto an envelope.
pub fn normalize<T>(
    outcome: Result<RawResponse, TransportError>,
    shape: ResponseShape,
) -> ApiResponse<T>
where
    T: DeserializeOwned,
{
    match outcome {
        Ok(raw) if raw.is_success() => decode_success(raw, shape),
        Ok(raw) => error_status(raw.status, raw.body.as_deref()),
        Err(TransportError::Rejected { status, body, .. }) => {
            error_status(status, body.as_deref())
        }
        Err(err) => {
            let status = err.status();
            warn!(status, error = %err, "transport failure");
            ApiResponse::fail(status, transport_details(&err))
        }
    }
}

fn decode_success<T>(raw: RawResponse, shape: ResponseShape) -> ApiResponse<T>
where
    T: DeserializeOwned,
{
    let body = match raw.body {
        Some(body) if !body.trim().is_empty() => body,
        _ => return ApiResponse::success(raw.status, None),
    };
    if shape == ResponseShape::NoContent || raw.status == 204 {
        return ApiResponse::success(raw.status, None);
    }

    match serde_json::from_str::<T>(&body) {
        Ok(data) => ApiResponse::success(raw.status, Some(data)),
        Err(e) => {
            debug!(status = raw.status, error = %e, "response body did not decode");
            ApiResponse::fail_with_code(500, JSON_PARSE_ERROR, format!("JSON parsing error: {e}"))
        }
    }
}

fn error_status<T>(status: u16, body: Option<&str>) -> ApiResponse<T> {
    let body = body.unwrap_or(NO_BODY_PLACEHOLDER);
    debug!(status, "error response");
    ApiResponse::fail(status, format!("API error {status}. Body: {body}"))
}

fn transport_details(err: &TransportError) -> String {
    match err {
        TransportError::Unavailable { .. } => format!("Network failure or timeout: {err}"),
        TransportError::Interrupted { .. } => format!("Request interrupted: {err}"),
        _ => format!("Connection or IO error: {err}"),
    }
}
