//! Web API Access Tests
//!
//! Integration tests for verification, listing, download links, deletion
//! and public blob downloads.

mod common;

use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use cloudportal::AccessRepository;
use serde_json::{json, Value};

use common::{
    create_test_portal, error_code, error_message, get_access_token, upload_ok, verify,
    verify_ok,
};

#[tokio::test]
async fn test_landing_and_health() {
    let portal = create_test_portal().await;

    let response = portal.server.get("/").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["name"], "Cloud Storage Portal");
    assert_eq!(body["data"]["links"]["upload"], "/api/files");
    assert_eq!(body["data"]["links"]["verify"], "/api/access/verify");

    let response = portal.server.get("/health").await;
    response.assert_status_ok();
    response.assert_text("OK");
}

#[tokio::test]
async fn test_carol_round_trip() {
    let portal = create_test_portal().await;
    let key = upload_ok(&portal.server, "carol", "p1", "notes.txt", b"hello").await;

    // Verify returns a grant and the listing
    let response = verify(&portal.server, "carol", "p1").await;
    response.assert_status_ok();
    let body: Value = response.json();
    let token = get_access_token(&body);
    assert_eq!(body["data"]["user_name"], "carol");
    assert_eq!(body["data"]["expires_in"], 900);
    let files = body["data"]["files"].as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["key"], key.as_str());
    assert_eq!(files[0]["display_name"], "notes.txt");
    assert_eq!(files[0]["size"], 5);

    // Download link resolution
    let response = portal
        .server
        .get(&format!("/api/access/files/{key}/url"))
        .add_header(AUTHORIZATION, format!("Bearer {}", token))
        .await;
    response.assert_status_ok();
    let url = response.json::<Value>()["data"]["url"]
        .as_str()
        .unwrap()
        .to_string();
    assert_eq!(url, format!("http://localhost:8080/blobs/{key}"));

    // The link serves the bytes
    let response = portal.server.get(&format!("/blobs/{key}")).await;
    response.assert_status_ok();
    assert_eq!(response.as_bytes().as_ref(), b"hello");
    assert_eq!(response.header("content-type"), "text/plain");
    assert_eq!(
        response.header("content-disposition"),
        "attachment; filename=\"notes.txt\""
    );

    // Delete with confirmation
    let response = portal
        .server
        .delete(&format!("/api/access/files/{key}"))
        .add_query_param("confirm", "true")
        .add_header(AUTHORIZATION, format!("Bearer {}", token))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["data"]["deleted"], true);

    // Listing is empty and the name is unknown again
    let response = portal
        .server
        .get("/api/access/files")
        .add_header(AUTHORIZATION, format!("Bearer {}", token))
        .await;
    response.assert_status_ok();
    assert!(response.json::<Value>()["data"].as_array().unwrap().is_empty());

    let response = verify(&portal.server, "carol", "p1").await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(error_message(&response), "no files found for this user");
}

#[tokio::test]
async fn test_verify_failures() {
    let portal = create_test_portal().await;
    upload_ok(&portal.server, "carol", "p1", "notes.txt", b"hello").await;

    let response = verify(&portal.server, "carol", "wrong").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(error_message(&response), "incorrect password");

    let response = verify(&portal.server, "dave", "p1").await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(error_code(&response), "NOT_FOUND");

    let response = verify(&portal.server, "", "").await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert!(body["error"]["details"]["user_name"].is_array());
    assert!(body["error"]["details"]["password"].is_array());

    let response = portal
        .server
        .post("/api/access/verify")
        .json(&json!({ "user_name": "carol" }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_code(&response), "VALIDATION_ERROR");
    let body: Value = response.json();
    assert!(body["error"]["details"]["password"].is_array());
}

#[tokio::test]
async fn test_unknown_user_is_not_found_for_any_password() {
    let portal = create_test_portal().await;
    upload_ok(&portal.server, "carol", "p1", "notes.txt", b"hello").await;

    for password in ["p1", "x", "another password"] {
        verify(&portal.server, "dave", password)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
async fn test_access_requires_grant() {
    let portal = create_test_portal().await;
    let key = upload_ok(&portal.server, "carol", "p1", "notes.txt", b"hello").await;

    let response = portal.server.get("/api/access/files").await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let response = portal
        .server
        .get("/api/access/files")
        .add_header(AUTHORIZATION, "Bearer not-a-token")
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let response = portal
        .server
        .delete(&format!("/api/access/files/{key}"))
        .add_query_param("confirm", "true")
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert!(portal.blobs.contains(&key));
}

#[tokio::test]
async fn test_key_boundary_between_al_and_alice() {
    let portal = create_test_portal().await;
    let al_key = upload_ok(&portal.server, "al", "p1", "short.txt", b"al").await;
    let alice_key = upload_ok(&portal.server, "alice", "p2", "long.txt", b"alice").await;

    let response = verify(&portal.server, "al", "p1").await;
    response.assert_status_ok();
    let body: Value = response.json();
    let files = body["data"]["files"].as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["key"], al_key.as_str());
    let al_token = get_access_token(&body);

    // al cannot reach alice's file
    let response = portal
        .server
        .get(&format!("/api/access/files/{alice_key}/url"))
        .add_header(AUTHORIZATION, format!("Bearer {}", al_token))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    let response = portal
        .server
        .delete(&format!("/api/access/files/{alice_key}"))
        .add_query_param("confirm", "true")
        .add_header(AUTHORIZATION, format!("Bearer {}", al_token))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
    assert!(portal.blobs.contains(&alice_key));

    // alice sees only her own file
    let alice_token = verify_ok(&portal.server, "alice", "p2").await;
    let response = portal
        .server
        .get("/api/access/files")
        .add_header(AUTHORIZATION, format!("Bearer {}", alice_token))
        .await;
    response.assert_status_ok();
    let files = response.json::<Value>()["data"].as_array().unwrap().clone();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["display_name"], "long.txt");
}

#[tokio::test]
async fn test_delete_requires_confirmation() {
    let portal = create_test_portal().await;
    let key = upload_ok(&portal.server, "carol", "p1", "notes.txt", b"hello").await;
    let token = verify_ok(&portal.server, "carol", "p1").await;

    let response = portal
        .server
        .delete(&format!("/api/access/files/{key}"))
        .add_header(AUTHORIZATION, format!("Bearer {}", token))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    let response = portal
        .server
        .delete(&format!("/api/access/files/{key}"))
        .add_query_param("confirm", "false")
        .add_header(AUTHORIZATION, format!("Bearer {}", token))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    assert!(portal.blobs.contains(&key));
}

#[tokio::test]
async fn test_delete_blob_failure_keeps_record() {
    let portal = create_test_portal().await;
    let key = upload_ok(&portal.server, "carol", "p1", "notes.txt", b"hello").await;
    let token = verify_ok(&portal.server, "carol", "p1").await;
    portal.blobs.set_read_only(true);

    let response = portal
        .server
        .delete(&format!("/api/access/files/{key}"))
        .add_query_param("confirm", "true")
        .add_header(AUTHORIZATION, format!("Bearer {}", token))
        .await;

    response.assert_status(StatusCode::BAD_GATEWAY);
    assert_eq!(
        error_message(&response),
        "failed to delete: storage is read-only"
    );
    let record = AccessRepository::new(portal.service.database().pool())
        .get_by_key(&key)
        .await
        .unwrap();
    assert!(record.is_some());
}

#[tokio::test]
async fn test_delete_missing_blob_is_bad_gateway() {
    let portal = create_test_portal().await;
    upload_ok(&portal.server, "carol", "p1", "notes.txt", b"hello").await;
    let token = verify_ok(&portal.server, "carol", "p1").await;

    let response = portal
        .server
        .delete("/api/access/files/carol_1_ghost.txt")
        .add_query_param("confirm", "true")
        .add_header(AUTHORIZATION, format!("Bearer {}", token))
        .await;

    response.assert_status(StatusCode::BAD_GATEWAY);
    assert!(error_message(&response).contains("not found"));
}

#[tokio::test]
async fn test_reupload_lists_both_copies() {
    let portal = create_test_portal().await;
    let first = upload_ok(&portal.server, "carol", "p1", "notes.txt", b"v1").await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = upload_ok(&portal.server, "carol", "p1", "notes.txt", b"v2").await;
    assert_ne!(first, second);

    let response = verify(&portal.server, "carol", "p1").await;
    response.assert_status_ok();
    let files = response.json::<Value>()["data"]["files"]
        .as_array()
        .unwrap()
        .clone();
    assert_eq!(files.len(), 2);
    assert!(files.iter().all(|f| f["display_name"] == "notes.txt"));
}

#[tokio::test]
async fn test_download_missing_blob() {
    let portal = create_test_portal().await;

    let response = portal.server.get("/blobs/carol_1_missing.txt").await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_download_encoded_key() {
    let portal = create_test_portal().await;
    let key = upload_ok(&portal.server, "carol", "p1", "my notes.txt", b"spaced").await;

    let response = portal
        .server
        .get(&format!("/blobs/{}", urlencoding::encode(&key)))
        .await;

    response.assert_status_ok();
    assert_eq!(response.as_bytes().as_ref(), b"spaced");
}
