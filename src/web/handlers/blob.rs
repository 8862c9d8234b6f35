//! Public blob download.

use axum::{
    body::Body,
    extract::{Path, State},
    http::header,
    response::Response,
};
use std::sync::Arc;

use crate::file::FileKey;
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// Generate a safe Content-Disposition header value for file downloads.
///
/// Control characters are dropped, quotes and backslashes are replaced in
/// the plain `filename`, and non-ASCII names get an RFC 5987 `filename*`.
pub(crate) fn content_disposition_header(filename: &str) -> String {
    let sanitized: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '"' | '\\' => '_',
            _ => c,
        })
        .collect();

    if filename.is_ascii() && !filename.chars().any(|c| c.is_control() || c == '"' || c == '\\') {
        return format!("attachment; filename=\"{}\"", filename);
    }

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        sanitized,
        urlencoding::encode(filename)
    )
}

/// GET /blobs/:key - Download a blob.
///
/// This is where public URLs point. The file is named after its original
/// name, not its storage key.
pub async fn download_blob(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Response<Body>, ApiError> {
    let object = state.service.open_blob(&key).await?;

    let filename = FileKey::parse(&key)
        .map(|k| k.display_name().to_string())
        .unwrap_or_else(|| key.clone());

    Response::builder()
        .header(header::CONTENT_TYPE, object.content_type)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_header(&filename),
        )
        .header(header::CONTENT_LENGTH, object.content.len())
        .body(Body::from(object.content))
        .map_err(|e| {
            tracing::error!("Failed to build response: {}", e);
            ApiError::internal("Failed to build response")
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_header_simple_ascii() {
        let result = content_disposition_header("notes.txt");
        assert_eq!(result, "attachment; filename=\"notes.txt\"");
    }

    #[test]
    fn test_content_disposition_header_unicode() {
        let result = content_disposition_header("ノート.txt");
        assert!(result.starts_with("attachment; filename=\""));
        assert!(result.contains("filename*=UTF-8''%E3%83%8E"));
    }

    #[test]
    fn test_content_disposition_header_quote_and_backslash() {
        let result = content_disposition_header("a\"b\\c.txt");
        assert!(result.contains("filename=\"a_b_c.txt\""));
        assert!(result.contains("%22"));
    }

    #[test]
    fn test_content_disposition_header_strips_line_breaks() {
        let result = content_disposition_header("file\"\r\nX-Evil: header\r\n.txt");
        assert!(!result.contains('\r'));
        assert!(!result.contains('\n'));
        assert!(result.starts_with("attachment; filename="));
    }
}
