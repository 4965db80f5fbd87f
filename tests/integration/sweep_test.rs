//! Admin sweep trigger.

use axum::http::StatusCode;
use serde_json::json;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_list_sweeps_requires_admin() {
    let app = TestApp::new();
    let instructor = app.instructor("prof");
    let admin = app.admin("root");

    let denied = app.get("/api/admin/sweeps", &instructor).await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);

    let listed = app.get("/api/admin/sweeps", &admin).await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.data().as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn test_unknown_sweep_is_not_found() {
    let app = TestApp::new();
    let admin = app.admin("root");

    let response = app
        .post("/api/admin/sweeps/compaction", json!({}), &admin)
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_presence_sweep_runs_on_demand() {
    let app = TestApp::new();
    let admin = app.admin("root");

    let response = app
        .post("/api/admin/sweeps/presence", json!({}), &admin)
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["name"], "presence");
    assert_eq!(response.data()["result"]["demoted"], 0);
}

#[tokio::test]
async fn test_notification_sweep_runs_on_demand() {
    let app = TestApp::new();
    let admin = app.admin("root");

    let response = app
        .post("/api/admin/sweeps/notification_queue", json!({}), &admin)
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["result"]["promoted"], 0);
    assert_eq!(response.data()["result"]["discarded"], 0);
}
