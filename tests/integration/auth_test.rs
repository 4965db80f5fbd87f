//! Bearer-token checks on the REST surface.

use axum::http::StatusCode;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = TestApp::new();

    let response = app.request("GET", "/api/presence/me", None, None).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_code(), "UNAUTHORIZED");
}

#[tokio::test]
async fn test_garbage_token_is_unauthorized() {
    let app = TestApp::new();

    let response = app
        .request("GET", "/api/notifications", None, Some("not-a-jwt"))
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_path_id_is_validation_error() {
    let app = TestApp::new();
    let student = app.student("pat");

    let response = app.get("/api/sessions/not-a-uuid", &student).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "VALIDATION_ERROR");
}
