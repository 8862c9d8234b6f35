//! Test helpers for the Web API tests.
//!
//! Builds the router on an in-memory database and a memory blob store, and
//! wraps the upload and verify calls most tests start with.

#![allow(dead_code)]

use std::sync::Arc;

use axum_test::multipart::{MultipartForm, Part};
use axum_test::{TestResponse, TestServer};
use serde_json::{json, Value};

use cloudportal::auth::HashCost;
use cloudportal::web::handlers::AppState;
use cloudportal::web::middleware::JwtState;
use cloudportal::web::router::create_router;
use cloudportal::{Database, MemoryBlobStore, PortalService};

/// Secret used to sign access grants in tests.
pub const TEST_SECRET: &str = "test-secret-key-for-testing-only";

/// Public base URL of the memory blob store.
pub const BASE_URL: &str = "http://localhost:8080/";

/// A running test portal.
pub struct TestPortal {
    pub server: TestServer,
    pub service: PortalService,
    pub blobs: Arc<MemoryBlobStore>,
}

/// Create a test portal with default limits.
pub async fn create_test_portal() -> TestPortal {
    create_test_portal_with(|service| service).await
}

/// Create a test portal, letting the caller adjust the service first.
pub async fn create_test_portal_with(
    configure: impl FnOnce(PortalService) -> PortalService,
) -> TestPortal {
    let db = Database::open_in_memory()
        .await
        .expect("Failed to create test database");
    let blobs = Arc::new(MemoryBlobStore::new(BASE_URL));
    let service = configure(
        PortalService::new(db, blobs.clone()).with_hash_cost(HashCost::MINIMAL),
    );

    let jwt_state = Arc::new(JwtState::new(TEST_SECRET, 900));
    let app_state = Arc::new(AppState::new(service.clone(), jwt_state));
    let router = create_router(app_state, &[]);

    let server = TestServer::new(router).expect("Failed to create test server");

    TestPortal {
        server,
        service,
        blobs,
    }
}

/// Build the upload form.
pub fn upload_form(user_name: &str, password: &str, file_name: &str, content: &[u8]) -> MultipartForm {
    MultipartForm::new()
        .add_text("user_name", user_name.to_string())
        .add_text("password", password.to_string())
        .add_part(
            "file",
            Part::bytes(content.to_vec())
                .file_name(file_name.to_string())
                .mime_type("text/plain"),
        )
}

/// POST /api/files.
pub async fn upload(
    server: &TestServer,
    user_name: &str,
    password: &str,
    file_name: &str,
    content: &[u8],
) -> TestResponse {
    server
        .post("/api/files")
        .multipart(upload_form(user_name, password, file_name, content))
        .await
}

/// Upload and return the file key, failing the test on error.
pub async fn upload_ok(
    server: &TestServer,
    user_name: &str,
    password: &str,
    file_name: &str,
    content: &[u8],
) -> String {
    let response = upload(server, user_name, password, file_name, content).await;
    response.assert_status_ok();
    response.json::<Value>()["data"]["file_key"]
        .as_str()
        .unwrap()
        .to_string()
}

/// POST /api/access/verify.
pub async fn verify(server: &TestServer, user_name: &str, password: &str) -> TestResponse {
    server
        .post("/api/access/verify")
        .json(&json!({
            "user_name": user_name,
            "password": password
        }))
        .await
}

/// Verify and return the access grant, failing the test on error.
pub async fn verify_ok(server: &TestServer, user_name: &str, password: &str) -> String {
    let response = verify(server, user_name, password).await;
    response.assert_status_ok();
    get_access_token(&response.json::<Value>())
}

/// Get access token from response.
pub fn get_access_token(response: &Value) -> String {
    response["data"]["access_token"]
        .as_str()
        .unwrap()
        .to_string()
}

/// Error code from an error response.
pub fn error_code(response: &TestResponse) -> String {
    response.json::<Value>()["error"]["code"]
        .as_str()
        .unwrap()
        .to_string()
}

/// Error message from an error response.
pub fn error_message(response: &TestResponse) -> String {
    response.json::<Value>()["error"]["message"]
        .as_str()
        .unwrap()
        .to_string()
}
