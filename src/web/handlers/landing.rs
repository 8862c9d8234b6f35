//! Landing handler.

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::web::dto::{ApiResponse, LandingLinks, LandingResponse};
use crate::web::handlers::AppState;

/// GET / - Navigation document.
pub async fn landing(State(state): State<Arc<AppState>>) -> Json<ApiResponse<LandingResponse>> {
    Json(ApiResponse::new(LandingResponse {
        name: state.portal_name.clone(),
        links: LandingLinks {
            upload: "/api/files".to_string(),
            verify: "/api/access/verify".to_string(),
            files: "/api/access/files".to_string(),
        },
    }))
}
