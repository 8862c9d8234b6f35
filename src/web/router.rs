//! Router configuration for Web API.

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{
    delete_file, download_blob, file_url, landing, list_files, upload_file, verify, AppState,
};
use super::middleware::{create_cors_layer, jwt_auth};

/// Room for multipart boundaries and the text fields on top of the file.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Create the main router, health check included.
pub fn create_router(app_state: Arc<AppState>, cors_origins: &[String]) -> Router {
    let max_body = usize::try_from(app_state.service.max_file_size())
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    // Access routes (grant required, except verify which issues it)
    let access_routes = Router::new()
        .route("/verify", post(verify))
        .route("/files", get(list_files))
        .route("/files/:key/url", get(file_url))
        .route("/files/:key", delete(delete_file));

    let api_routes = Router::new()
        .route(
            "/files",
            post(upload_file).layer(DefaultBodyLimit::max(max_body)),
        )
        .nest("/access", access_routes);

    let jwt_state = app_state.jwt.clone();

    Router::new()
        .route("/", get(landing))
        .route("/blobs/:key", get(download_blob))
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins))
                .layer(middleware::from_fn(move |req, next| {
                    let state = jwt_state.clone();
                    jwt_auth(state, req, next)
                })),
        )
        .with_state(app_state)
        .merge(create_health_router())
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}
