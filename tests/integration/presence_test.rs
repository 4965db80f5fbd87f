//! Presence over HTTP.

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::json;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_unknown_user_reads_offline() {
    let app = TestApp::new();
    let viewer = app.student("viewer");
    let stranger = uuid::Uuid::new_v4();

    let response = app
        .get(&format!("/api/presence/users/{stranger}"), &viewer)
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["status"], "offline");
}

#[tokio::test]
async fn test_set_status_then_visible_online() {
    let app = TestApp::new();
    let alice = app.student("alice");
    let bob = app.student("bob");

    let set = app
        .put(
            "/api/presence/status",
            json!({ "status": "busy", "activity": "Quiz 3" }),
            &alice,
        )
        .await;
    assert_eq!(set.status, StatusCode::OK);
    assert_eq!(set.data()["status"], "busy");
    assert_eq!(set.data()["activity"], "Quiz 3");

    let seen = app
        .get(&format!("/api/presence/users/{}", alice.id), &bob)
        .await;
    assert_eq!(seen.data()["status"], "busy");

    let online = app.get("/api/presence/online?limit=10", &bob).await;
    let ids: Vec<&str> = online
        .data()
        .as_array()
        .expect("online list")
        .iter()
        .filter_map(|r| r["user_id"].as_str())
        .collect();
    assert_eq!(ids, vec![alice.id.to_string().as_str()]);
}

#[tokio::test]
async fn test_batch_keeps_request_order_and_fills_offline() {
    let app = TestApp::new();
    let alice = app.student("alice");
    let bob = app.student("bob");
    let missing = uuid::Uuid::new_v4();

    app.put("/api/presence/status", json!({ "status": "online" }), &alice)
        .await;

    let response = app
        .post(
            "/api/presence/batch",
            json!({ "user_ids": [missing, alice.id] }),
            &bob,
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let records = response.data().as_array().expect("records");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["user_id"], missing.to_string());
    assert_eq!(records[0]["status"], "offline");
    assert_eq!(records[1]["status"], "online");
}

#[tokio::test]
async fn test_empty_batch_is_rejected() {
    let app = TestApp::new();
    let bob = app.student("bob");

    let response = app
        .post("/api/presence/batch", json!({ "user_ids": [] }), &bob)
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_sweep_demotes_stale_user() {
    let app = TestApp::new();
    let alice = app.student("alice");

    app.put("/api/presence/status", json!({ "status": "online" }), &alice)
        .await;

    // Run the sweep as if the stale window had long passed.
    let demoted = app
        .state
        .presence_service
        .sweep_stale(Utc::now() + Duration::hours(1))
        .await
        .expect("sweep");
    assert_eq!(demoted, 1);

    let me = app.get("/api/presence/me", &alice).await;
    assert_eq!(me.data()["status"], "offline");
}
