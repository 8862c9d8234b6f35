//! Upload handler.

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::file::UploadRequest;
use crate::web::dto::{ApiResponse, UploadResponse};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::payload_too_large("File too large");
    }
    tracing::error!("Failed to read multipart field: {}", e);
    ApiError::bad_request("Invalid multipart data")
}

/// POST /api/files - Upload a file.
///
/// Request body: multipart/form-data with `user_name`, `password` and `file`.
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<UploadResponse>>, ApiError> {
    let mut user_name: Option<String> = None;
    let mut password: Option<String> = None;
    let mut file_name: Option<String> = None;
    let mut content_type: Option<String> = None;
    let mut content: Option<Vec<u8>> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "user_name" => user_name = Some(field.text().await.map_err(multipart_error)?),
            "password" => password = Some(field.text().await.map_err(multipart_error)?),
            "file" => {
                file_name = field.file_name().map(|s| s.to_string());
                content_type = field.content_type().map(|s| s.to_string());
                content = Some(field.bytes().await.map_err(multipart_error)?.to_vec());
            }
            _ => {}
        }
    }

    let (Some(user_name), Some(password), Some(content)) = (user_name, password, content) else {
        return Err(ApiError::unprocessable(
            "Please fill in all fields and choose a file",
        ));
    };

    let mut request = UploadRequest::new(user_name, password, file_name.unwrap_or_default(), content);
    if let Some(content_type) = content_type {
        request = request.with_content_type(content_type);
    }

    let receipt = state.service.upload(request).await?;

    Ok(Json(ApiResponse::new(UploadResponse::from(receipt))))
}
