//! Access handlers: verification, listing, download links and deletion.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;

use crate::web::dto::{
    ApiResponse, DeleteQuery, DeleteResponse, FileResponse, FileUrlResponse, ValidatedJson,
    VerifyRequest, VerifyResponse,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::AuthUser;

/// POST /api/access/verify - Verify credentials.
///
/// Returns an access grant together with the current listing.
pub async fn verify(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<VerifyRequest>,
) -> Result<Json<ApiResponse<VerifyResponse>>, ApiError> {
    let user = state.service.verify(&req.user_name, &req.password).await?;
    let files = state.service.list_files(&user).await?;
    let access_token = state.jwt.issue(&user)?;

    Ok(Json(ApiResponse::new(VerifyResponse {
        access_token,
        expires_in: state.jwt.expiry_secs,
        user_name: user.user_name().to_string(),
        files: files.into_iter().map(FileResponse::from).collect(),
    })))
}

/// GET /api/access/files - List the verified user's files.
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<FileResponse>>>, ApiError> {
    let files = state.service.list_files(&auth.verified_user()).await?;

    Ok(Json(ApiResponse::new(
        files.into_iter().map(FileResponse::from).collect(),
    )))
}

/// GET /api/access/files/:key/url - Resolve a download URL.
pub async fn file_url(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(key): Path<String>,
) -> Result<Json<ApiResponse<FileUrlResponse>>, ApiError> {
    let url = state.service.file_url(&auth.verified_user(), &key)?;

    Ok(Json(ApiResponse::new(FileUrlResponse { key, url })))
}

/// DELETE /api/access/files/:key?confirm=true - Delete a file.
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(key): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<ApiResponse<DeleteResponse>>, ApiError> {
    if !query.confirm {
        return Err(ApiError::unprocessable(
            "Deletion must be confirmed with confirm=true",
        ));
    }

    state
        .service
        .delete_file(&auth.verified_user(), &key)
        .await?;

    Ok(Json(ApiResponse::new(DeleteResponse { key, deleted: true })))
}
