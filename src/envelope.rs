//! Result envelope returned by every remote API call.
//!
//! An [`ApiResponse`] is built through exactly two paths, [`ApiResponse::success`]
//! and [`ApiResponse::fail`] (plus [`ApiResponse::fail_with_code`] for locally
//! classified failures). Fields are private, so an envelope can never carry both
//! `data` and `error`, and its [`Outcome`] always agrees with which one is set.

use serde::Serialize;

/// Message attached to every successful envelope.
pub const SUCCESS_MESSAGE: &str = "API call succeeded.";

/// Message attached to every failed envelope.
pub const FAIL_MESSAGE: &str = "API call failed.";

/// Outcome of a remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    /// The call produced a 2xx status and a usable body (or no body by design).
    Success,
    /// The call failed; see [`ApiResponse::error`].
    Fail,
}

/// Machine-readable code plus a human-readable description of a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorDetail {
    code: String,
    details: String,
}

impl ErrorDetail {
    /// Creates a new error detail.
    pub fn new(code: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            details: details.into(),
        }
    }

    /// Error code, e.g. `HTTP_404` or `JSON_PARSE_ERROR`.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Description of the failure, including the raw body where one was received.
    #[must_use]
    pub fn details(&self) -> &str {
        &self.details
    }
}

/// Immutable outcome of one remote call.
///
/// Serializes with camelCase keys and omits `data`/`error` when absent:
///
/// ```
/// use apilink_core::ApiResponse;
///
/// let ok = ApiResponse::success(200, Some(vec![1, 2, 3]));
/// let json = serde_json::to_value(&ok).unwrap();
/// assert_eq!(json["serviceCode"], "SUCCESS");
/// assert!(json.get("error").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    http_status_code: u16,
    service_code: Outcome,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorDetail>,
}

impl<T> ApiResponse<T> {
    /// Builds a successful envelope. `data` is `None` for no-content responses.
    #[must_use]
    pub fn success(http_status_code: u16, data: Option<T>) -> Self {
        Self {
            http_status_code,
            service_code: Outcome::Success,
            message: SUCCESS_MESSAGE.to_string(),
            data,
            error: None,
        }
    }

    /// Builds a failed envelope with the code `HTTP_<status>`.
    pub fn fail(http_status_code: u16, details: impl Into<String>) -> Self {
        Self::fail_with_code(http_status_code, format!("HTTP_{http_status_code}"), details)
    }

    /// Builds a failed envelope with an explicit error code.
    pub fn fail_with_code(
        http_status_code: u16,
        code: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            http_status_code,
            service_code: Outcome::Fail,
            message: FAIL_MESSAGE.to_string(),
            data: None,
            error: Some(ErrorDetail::new(code, details)),
        }
    }

    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        self.http_status_code
    }

    #[must_use]
    pub fn outcome(&self) -> Outcome {
        self.service_code
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.service_code == Outcome::Success
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    #[must_use]
    pub fn error(&self) -> Option<&ErrorDetail> {
        self.error.as_ref()
    }

    /// Consumes the envelope, returning the decoded payload if any.
    #[must_use]
    pub fn into_data(self) -> Option<T> {
        self.data
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_envelope_has_data_and_no_error() {
        let response = ApiResponse::success(201, Some("created"));
        assert_eq!(response.http_status_code(), 201);
        assert_eq!(response.outcome(), Outcome::Success);
        assert_eq!(response.message(), SUCCESS_MESSAGE);
        assert_eq!(response.data(), Some(&"created"));
        assert!(response.error().is_none());
    }

    #[test]
    fn test_success_envelope_without_data() {
        let response: ApiResponse<String> = ApiResponse::success(204, None);
        assert!(response.is_success());
        assert!(response.data().is_none());
        assert!(response.error().is_none());
    }

    #[test]
    fn test_fail_envelope_uses_http_status_code() {
        let response: ApiResponse<String> = ApiResponse::fail(404, "not here");
        assert_eq!(response.outcome(), Outcome::Fail);
        assert_eq!(response.message(), FAIL_MESSAGE);
        assert!(response.data().is_none());
        let error = response.error().unwrap();
        assert_eq!(error.code(), "HTTP_404");
        assert_eq!(error.details(), "not here");
    }

    #[test]
    fn test_fail_with_code_keeps_explicit_code() {
        let response: ApiResponse<()> =
            ApiResponse::fail_with_code(500, "JSON_PARSE_ERROR", "bad json");
        assert_eq!(response.http_status_code(), 500);
        assert_eq!(response.error().unwrap().code(), "JSON_PARSE_ERROR");
    }

    #[test]
    fn test_serialization_omits_absent_members() {
        let ok = serde_json::to_value(ApiResponse::success(200, Some(json!({"id": 1})))).unwrap();
        assert_eq!(
            ok,
            json!({
                "httpStatusCode": 200,
                "serviceCode": "SUCCESS",
                "message": "API call succeeded.",
                "data": {"id": 1}
            })
        );

        let failed = serde_json::to_value(ApiResponse::<()>::fail(503, "down")).unwrap();
        assert_eq!(
            failed,
            json!({
                "httpStatusCode": 503,
                "serviceCode": "FAIL",
                "message": "API call failed.",
                "error": {"code": "HTTP_503", "details": "down"}
            })
        );
    }
}
