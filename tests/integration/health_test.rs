//! Health endpoints.

use axum::http::StatusCode;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_health_needs_no_token() {
    let app = TestApp::new();

    let response = app.request("GET", "/api/health", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["status"], "ok");
}

#[tokio::test]
async fn test_detailed_health_reports_backend_and_sweeps() {
    let app = TestApp::new();

    let response = app.request("GET", "/api/health/detailed", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    let data = response.data();
    assert_eq!(data["backend"], "memory");
    assert_eq!(data["database"], "connected");
    assert_eq!(data["ws_connections"], 0);
    let sweeps: Vec<&str> = data["sweeps"]
        .as_array()
        .expect("sweeps array")
        .iter()
        .filter_map(|v| v.as_str())
        .collect();
    assert!(sweeps.contains(&"presence"));
    assert!(sweeps.contains(&"notification_queue"));
}
