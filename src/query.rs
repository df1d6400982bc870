//! Request URL composition.

use serde_json::Value;

/// Builds a request URL from a base and an ordered set of query parameters.
///
/// Returns `base` unchanged when `params` is empty. Otherwise appends
/// `?k1=v1&k2=v2...`; each value is percent-encoded (UTF-8) on its own and
/// keys are written as given. A `null` value is rendered as the text `null`.
///
/// ```
/// use apilink_core::build_url;
/// use serde_json::json;
///
/// let url = build_url("https://api.test/posts", &[("userId", json!(1))]);
/// assert_eq!(url, "https://api.test/posts?userId=1");
/// ```
#[must_use]
pub fn build_url(base: &str, params: &[(&str, Value)]) -> String {
    if params.is_empty() {
        return base.to_string();
    }

    let query = params
        .iter()
        .map(|(key, value)| format!("{key}={}", urlencoding::encode(&render_value(value))))
        .collect::<Vec<_>>()
        .join("&");

    format!("{base}?{query}")
}

/// Joins a base URL and a path with exactly one `/` between them.
#[must_use]
pub fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        return base.to_string();
    }
    format!("{base}/{path}")
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const BASE: &str = "https://jsonplaceholder.typicode.com/posts";

    #[test]
    fn test_build_url_empty_params_returns_base() {
        assert_eq!(build_url(BASE, &[]), BASE);
    }

    #[test]
    fn test_build_url_single_param_has_no_trailing_separator() {
        assert_eq!(
            build_url(BASE, &[("userId", json!(1))]),
            format!("{BASE}?userId=1")
        );
    }

    #[test]
    fn test_build_url_preserves_parameter_order() {
        let url = build_url(BASE, &[("b", json!("2")), ("a", json!("1"))]);
        assert_eq!(url, format!("{BASE}?b=2&a=1"));
        assert!(!url.ends_with('&'));
    }

    #[test]
    fn test_build_url_encodes_values_only() {
        let url = build_url(BASE, &[("q", json!("a b&c=d/é"))]);
        assert_eq!(url, format!("{BASE}?q=a%20b%26c%3Dd%2F%C3%A9"));
    }

    #[test]
    fn test_build_url_null_value_rendered_as_text() {
        assert_eq!(
            build_url(BASE, &[("filter", Value::Null)]),
            format!("{BASE}?filter=null")
        );
    }

    #[test]
    fn test_build_url_renders_booleans_and_numbers() {
        let url = build_url(BASE, &[("draft", json!(true)), ("score", json!(1.5))]);
        assert_eq!(url, format!("{BASE}?draft=true&score=1.5"));
    }

    #[test]
    fn test_join_url_single_separator() {
        assert_eq!(join_url("https://a.test/", "/x/y.png"), "https://a.test/x/y.png");
        assert_eq!(join_url("https://a.test", "x/y.png"), "https://a.test/x/y.png");
        assert_eq!(join_url("https://a.test", "/posts/1"), "https://a.test/posts/1");
    }

    #[test]
    fn test_join_url_empty_path_returns_base() {
        assert_eq!(join_url("https://a.test/", ""), "https://a.test");
    }
}
