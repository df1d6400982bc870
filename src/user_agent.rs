//! User-Agent string shared by every transport and the download client.

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/fierce/apilink";

/// Default User-Agent for API and download requests (identifies the tool).
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("apilink/{version} (+{PROJECT_UA_URL})")
}
