//! File metadata derived from response headers and the request path.
//!
//! Metadata is built in two stages. [`extract_metadata`] produces a
//! [`FileMetadata`] before any byte is written; [`finalize`] combines it with
//! the saved path and the measured size into a [`DownloadedFile`]. Only the
//! download pipeline calls [`finalize`], and only after a complete write, so a
//! `DownloadedFile` always describes a fully persisted file.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE, HeaderMap};
use serde::Serialize;
use tracing::debug;

/// Name used when neither the headers nor the path provide one.
pub const PLACEHOLDER_FILE_NAME: &str = "downloaded_file";

/// Longest MIME subtype (exclusive) accepted as an extension fallback.
const MAX_SUBTYPE_EXTENSION_LEN: usize = 10;

/// Stage-1 metadata, known before the body is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    original_file_name: String,
    extension: String,
    saved_file_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_type: Option<String>,
}

impl FileMetadata {
    /// Name suggested by the server, or derived from the request path.
    #[must_use]
    pub fn original_file_name(&self) -> &str {
        &self.original_file_name
    }

    /// Extension without the dot; empty when none could be determined.
    #[must_use]
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Generated, collision-free name used on disk.
    #[must_use]
    pub fn saved_file_name(&self) -> &str {
        &self.saved_file_name
    }

    /// Raw `Content-Type` header value, if the server sent one.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }
}

/// Stage-2 metadata: a file that was completely written and measured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadedFile {
    #[serde(flatten)]
    metadata: FileMetadata,
    saved_path: PathBuf,
    file_size: u64,
}

impl DownloadedFile {
    #[must_use]
    pub fn metadata(&self) -> &FileMetadata {
        &self.metadata
    }

    #[must_use]
    pub fn saved_path(&self) -> &Path {
        &self.saved_path
    }

    /// Size in bytes as measured on disk after the write.
    #[must_use]
    pub fn file_size(&self) -> u64 {
        self.file_size
    }
}

/// Completes stage-1 metadata with the persisted location and measured size.
#[must_use]
pub fn finalize(metadata: FileMetadata, saved_path: PathBuf, file_size: u64) -> DownloadedFile {
    DownloadedFile {
        metadata,
        saved_path,
        file_size,
    }
}

/// Derives stage-1 metadata from response headers and the request path.
///
/// Filename precedence: `Content-Disposition`, then the last path segment,
/// then [`PLACEHOLDER_FILE_NAME`]. The extension comes from the filename, or
/// from a short MIME subtype when the filename has none.
///
/// ```
/// use apilink_core::extract_metadata;
/// use reqwest::header::HeaderMap;
///
/// let metadata = extract_metadata(&HeaderMap::new(), "/x/y/report.pdf");
/// assert_eq!(metadata.original_file_name(), "report.pdf");
/// assert_eq!(metadata.extension(), "pdf");
/// assert!(metadata.saved_file_name().ends_with(".pdf"));
/// ```
#[must_use]
pub fn extract_metadata(headers: &HeaderMap, request_path: &str) -> FileMetadata {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let subtype = content_type.as_deref().and_then(mime_subtype);

    let disposition_name = headers
        .get(CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_content_disposition);
    let original_file_name = match disposition_name {
        Some(name) => name,
        None => file_name_from_path(request_path),
    };

    let extension = extension_of(&original_file_name)
        .map(str::to_string)
        .or_else(|| subtype.filter(|s| is_acceptable_subtype(s)))
        .unwrap_or_default();

    let saved_file_name = storage_file_name(&generate_token(), &extension);
    debug!(
        original = %original_file_name,
        extension = %extension,
        saved = %saved_file_name,
        "extracted file metadata"
    );

    FileMetadata {
        original_file_name,
        extension,
        saved_file_name,
        content_type,
    }
}

/// Parses the filename out of a Content-Disposition header.
///
/// Handles:
/// - `attachment; filename="example.pdf"`
/// - `attachment; filename=example.pdf`
/// - `attachment; filename*=UTF-8''example%20file.pdf` (RFC 5987, preferred)
///
/// Parameter names match case-insensitively. Returns `None` when no usable
/// filename is present.
pub(crate) fn parse_content_disposition(header: &str) -> Option<String> {
    // ASCII lowercasing keeps byte offsets aligned with `header`.
    let lowered = header.to_ascii_lowercase();

    if let Some(pos) = lowered.find("filename*=") {
        let value = header[pos + "filename*=".len()..].trim_start();
        if let Some(quote_pos) = value.find("''") {
            let encoded = &value[quote_pos + 2..];
            let end = encoded.find(';').unwrap_or(encoded.len());
            let encoded = encoded[..end].trim().trim_matches('"');
            if let Ok(decoded) = urlencoding::decode(encoded)
                && !decoded.is_empty()
            {
                return Some(decoded.into_owned());
            }
        }
    }

    let pos = lowered.find("filename=")?;
    let value = header[pos + "filename=".len()..].trim_start();
    let name = if let Some(stripped) = value.strip_prefix('"') {
        &stripped[..stripped.find('"')?]
    } else {
        let end = value.find(';').unwrap_or(value.len());
        value[..end].trim()
    };
    (!name.is_empty()).then(|| name.to_string())
}

/// Last segment of the request path, percent-decoded, or the placeholder.
fn file_name_from_path(request_path: &str) -> String {
    let path = request_path.split(['?', '#']).next().unwrap_or_default();
    let segment = path.rsplit('/').next().unwrap_or_default();
    if segment.is_empty() {
        return PLACEHOLDER_FILE_NAME.to_string();
    }
    urlencoding::decode(segment).map_or_else(|_| segment.to_string(), Cow::into_owned)
}

/// Text after the last `.`, unless that dot is the first or last character.
fn extension_of(file_name: &str) -> Option<&str> {
    let idx = file_name.rfind('.')?;
    (idx > 0 && idx + 1 < file_name.len()).then(|| &file_name[idx + 1..])
}

/// Lowercased subtype of a MIME type, parameters stripped.
fn mime_subtype(content_type: &str) -> Option<String> {
    let essence = content_type.split(';').next()?.trim();
    let (_, subtype) = essence.split_once('/')?;
    let subtype = subtype.trim().to_ascii_lowercase();
    (!subtype.is_empty()).then_some(subtype)
}

fn is_acceptable_subtype(subtype: &str) -> bool {
    !subtype.contains('/') && subtype.len() < MAX_SUBTYPE_EXTENSION_LEN
}

/// 128 random bits as 32 lowercase hex digits.
fn generate_token() -> String {
    format!("{:032x}", rand::random::<u128>())
}

/// Joins the token and extension. Extensions containing anything other than
/// ASCII alphanumerics, `+`, `-` or `_` are left off so the name can never
/// contain a path separator.
fn storage_file_name(token: &str, extension: &str) -> String {
    let safe = !extension.is_empty()
        && extension
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '_'));
    if safe {
        format!("{token}.{extension}")
    } else {
        token.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use reqwest::header::HeaderValue;

    use super::*;

    fn headers(pairs: &[(reqwest::header::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    fn is_token_name(name: &str, extension: &str) -> bool {
        let (token, rest) = name.split_at(name.len().min(32));
        token.len() == 32
            && token.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
            && if extension.is_empty() {
                rest.is_empty()
            } else {
                rest == format!(".{extension}")
            }
    }

    #[test]
    fn test_extract_uses_content_disposition_filename() {
        let headers = headers(&[(CONTENT_DISPOSITION, r#"attachment; filename="a.png""#)]);
        let metadata = extract_metadata(&headers, "/images/download");
        assert_eq!(metadata.original_file_name(), "a.png");
        assert_eq!(metadata.extension(), "png");
        assert!(is_token_name(metadata.saved_file_name(), "png"));
    }

    #[test]
    fn test_extract_falls_back_to_last_path_segment() {
        let metadata = extract_metadata(&HeaderMap::new(), "/x/y/report.pdf");
        assert_eq!(metadata.original_file_name(), "report.pdf");
        assert_eq!(metadata.extension(), "pdf");
        assert!(metadata.content_type().is_none());
    }

    #[test]
    fn test_extract_path_without_separator_is_used_whole() {
        let metadata = extract_metadata(&HeaderMap::new(), "report.pdf");
        assert_eq!(metadata.original_file_name(), "report.pdf");
        assert_eq!(metadata.extension(), "pdf");

        let metadata = extract_metadata(&HeaderMap::new(), "");
        assert_eq!(metadata.original_file_name(), PLACEHOLDER_FILE_NAME);
    }

    #[test]
    fn test_extract_trailing_separator_uses_placeholder() {
        let metadata = extract_metadata(&HeaderMap::new(), "/x/y/");
        assert_eq!(metadata.original_file_name(), PLACEHOLDER_FILE_NAME);
        assert_eq!(metadata.extension(), "");
        assert!(is_token_name(metadata.saved_file_name(), ""));
    }

    #[test]
    fn test_extract_uses_mime_subtype_when_name_has_no_extension() {
        let headers = headers(&[(CONTENT_TYPE, "image/JPEG; charset=binary")]);
        let metadata = extract_metadata(&headers, "/600x400/000000/FFFFFF/jpg");
        assert_eq!(metadata.original_file_name(), "jpg");
        assert_eq!(metadata.extension(), "jpeg");
        assert_eq!(metadata.content_type(), Some("image/JPEG; charset=binary"));
    }

    #[test]
    fn test_extract_rejects_long_mime_subtype() {
        let headers = headers(&[(CONTENT_TYPE, "application/octet-stream")]);
        let metadata = extract_metadata(&headers, "/blob");
        assert_eq!(metadata.extension(), "");
    }

    #[test]
    fn test_extract_filename_extension_wins_over_mime() {
        let headers = headers(&[(CONTENT_TYPE, "image/png")]);
        let metadata = extract_metadata(&headers, "/files/photo.webp");
        assert_eq!(metadata.extension(), "webp");
    }

    #[test]
    fn test_extract_strips_query_and_decodes_segment() {
        let metadata = extract_metadata(&HeaderMap::new(), "/files/annual%20report.pdf?v=2#top");
        assert_eq!(metadata.original_file_name(), "annual report.pdf");
        assert_eq!(metadata.extension(), "pdf");
    }

    #[test]
    fn test_extract_generates_distinct_names() {
        let first = extract_metadata(&HeaderMap::new(), "/a.txt");
        let second = extract_metadata(&HeaderMap::new(), "/a.txt");
        assert_ne!(first.saved_file_name(), second.saved_file_name());
    }

    #[test]
    fn test_extract_unusable_disposition_falls_back_to_path() {
        let headers = headers(&[(CONTENT_DISPOSITION, "attachment; filename=\"unterminated")]);
        let metadata = extract_metadata(&headers, "/docs/notes.md");
        assert_eq!(metadata.original_file_name(), "notes.md");
    }

    #[test]
    fn test_extract_never_puts_separators_in_saved_name() {
        let headers = headers(&[(CONTENT_DISPOSITION, r#"attachment; filename="evil./../../etc""#)]);
        let metadata = extract_metadata(&headers, "/x");
        assert_eq!(metadata.extension(), "/etc");
        assert!(!metadata.saved_file_name().contains('/'));
        assert!(is_token_name(metadata.saved_file_name(), ""));
    }

    #[test]
    fn test_extension_of_edge_positions() {
        assert_eq!(extension_of("archive.tar.gz"), Some("gz"));
        assert_eq!(extension_of(".bashrc"), None);
        assert_eq!(extension_of("trailing."), None);
        assert_eq!(extension_of("plain"), None);
    }

    #[test]
    fn test_mime_subtype_parsing() {
        assert_eq!(mime_subtype("text/html; charset=utf-8"), Some("html".to_string()));
        assert_eq!(mime_subtype("nonsense"), None);
        assert_eq!(mime_subtype("text/"), None);
        assert!(!is_acceptable_subtype("vnd.openxmlformats"));
        assert!(is_acceptable_subtype("svg+xml"));
    }

    #[test]
    fn test_parse_content_disposition_quoted() {
        let header = r#"attachment; filename="example.pdf""#;
        assert_eq!(
            parse_content_disposition(header),
            Some("example.pdf".to_string())
        );
    }

    #[test]
    fn test_parse_content_disposition_unquoted_with_trailing_params() {
        let header = "attachment; filename=example.pdf; size=1234";
        assert_eq!(
            parse_content_disposition(header),
            Some("example.pdf".to_string())
        );
    }

    #[test]
    fn test_parse_content_disposition_rfc5987_preferred() {
        let header = "attachment; filename=\"fallback.pdf\"; filename*=UTF-8''example%20file.pdf";
        assert_eq!(
            parse_content_disposition(header),
            Some("example file.pdf".to_string())
        );
    }

    #[test]
    fn test_parse_content_disposition_case_insensitive() {
        let header = r#"Attachment; FileName="Upper.PDF""#;
        assert_eq!(
            parse_content_disposition(header),
            Some("Upper.PDF".to_string())
        );
    }

    #[test]
    fn test_parse_content_disposition_missing() {
        assert_eq!(parse_content_disposition("attachment"), None);
        assert_eq!(parse_content_disposition("attachment; filename=\"\""), None);
    }

    #[test]
    fn test_finalize_carries_stage_one_fields() {
        let metadata = extract_metadata(&HeaderMap::new(), "/x/report.pdf");
        let saved_name = metadata.saved_file_name().to_string();
        let path = PathBuf::from("/tmp/downloads").join(&saved_name);

        let file = finalize(metadata.clone(), path.clone(), 42);

        assert_eq!(file.metadata(), &metadata);
        assert_eq!(file.saved_path(), path.as_path());
        assert_eq!(file.file_size(), 42);
    }

    #[test]
    fn test_downloaded_file_serializes_flat_camel_case() {
        let metadata = extract_metadata(&HeaderMap::new(), "/x/report.pdf");
        let file = finalize(metadata, PathBuf::from("/tmp/downloads/f.pdf"), 7);
        let json = serde_json::to_value(&file).unwrap();
        assert_eq!(json["originalFileName"], "report.pdf");
        assert_eq!(json["extension"], "pdf");
        assert_eq!(json["savedPath"], "/tmp/downloads/f.pdf");
        assert_eq!(json["fileSize"], 7);
        assert!(json.get("contentType").is_none());
    }
}
