//! Live-session admission over HTTP.

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use crate::helpers::{TestApp, TestUser};

async fn create_session(app: &TestApp, host: &TestUser, capacity: u32) -> Uuid {
    let response = app
        .post(
            "/api/sessions",
            json!({ "title": "Week 4 live review", "capacity": capacity }),
            host,
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    assert_eq!(response.data()["status"], "scheduled");
    response.id()
}

#[tokio::test]
async fn test_zero_capacity_is_rejected() {
    let app = TestApp::new();
    let host = app.instructor("host");

    let response = app
        .post(
            "/api/sessions",
            json!({ "title": "Broken", "capacity": 0 }),
            &host,
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_full_session_reports_capacity_exceeded() {
    let app = TestApp::new();
    let host = app.instructor("host");
    let a = app.student("a");
    let b = app.student("b");
    let late = app.student("late");
    let session = create_session(&app, &host, 2).await;

    for student in [&a, &b] {
        let joined = app
            .post(&format!("/api/sessions/{session}/join"), json!({}), student)
            .await;
        assert_eq!(joined.status, StatusCode::OK);
    }

    let denied = app
        .post(&format!("/api/sessions/{session}/join"), json!({}), &late)
        .await;
    assert_eq!(denied.status, StatusCode::CONFLICT);
    assert_eq!(denied.error_code(), "CAPACITY_EXCEEDED");

    let attendees = app
        .get(&format!("/api/sessions/{session}/attendees"), &host)
        .await;
    assert_eq!(attendees.data().as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn test_rejoin_is_idempotent() {
    let app = TestApp::new();
    let host = app.instructor("host");
    let student = app.student("s");
    let session = create_session(&app, &host, 1).await;

    let first = app
        .post(&format!("/api/sessions/{session}/join"), json!({}), &student)
        .await;
    assert_eq!(first.data()["already_joined"], false);
    assert_eq!(first.data()["current_count"], 1);

    let second = app
        .post(&format!("/api/sessions/{session}/join"), json!({}), &student)
        .await;
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(second.data()["already_joined"], true);
    assert_eq!(second.data()["current_count"], 1);
}

#[tokio::test]
async fn test_leave_frees_the_seat() {
    let app = TestApp::new();
    let host = app.instructor("host");
    let first = app.student("first");
    let next = app.student("next");
    let session = create_session(&app, &host, 1).await;

    app.post(&format!("/api/sessions/{session}/join"), json!({}), &first)
        .await;
    let left = app
        .post(&format!("/api/sessions/{session}/leave"), json!({}), &first)
        .await;
    assert_eq!(left.status, StatusCode::OK);

    let joined = app
        .post(&format!("/api/sessions/{session}/join"), json!({}), &next)
        .await;
    assert_eq!(joined.status, StatusCode::OK);
}

#[tokio::test]
async fn test_capacity_cannot_drop_below_occupancy() {
    let app = TestApp::new();
    let host = app.instructor("host");
    let a = app.student("a");
    let b = app.student("b");
    let session = create_session(&app, &host, 3).await;

    app.post(&format!("/api/sessions/{session}/join"), json!({}), &a)
        .await;
    app.post(&format!("/api/sessions/{session}/join"), json!({}), &b)
        .await;

    let shrink = app
        .put(
            &format!("/api/sessions/{session}/capacity"),
            json!({ "capacity": 1 }),
            &host,
        )
        .await;
    assert_eq!(shrink.status, StatusCode::CONFLICT);

    let ok = app
        .put(
            &format!("/api/sessions/{session}/capacity"),
            json!({ "capacity": 2 }),
            &host,
        )
        .await;
    assert_eq!(ok.status, StatusCode::OK);
    assert_eq!(ok.data()["capacity"], 2);
}

#[tokio::test]
async fn test_lifecycle_start_then_end() {
    let app = TestApp::new();
    let host = app.instructor("host");
    let other = app.instructor("other");
    let session = create_session(&app, &host, 5).await;

    let hijack = app
        .post(&format!("/api/sessions/{session}/start"), json!({}), &other)
        .await;
    assert_eq!(hijack.status, StatusCode::FORBIDDEN);

    let started = app
        .post(&format!("/api/sessions/{session}/start"), json!({}), &host)
        .await;
    assert_eq!(started.status, StatusCode::OK);
    assert_eq!(started.data()["status"], "live");

    let ended = app
        .post(&format!("/api/sessions/{session}/end"), json!({}), &host)
        .await;
    assert_eq!(ended.data()["status"], "ended");

    let late = app.student("late");
    let join = app
        .post(&format!("/api/sessions/{session}/join"), json!({}), &late)
        .await;
    assert_eq!(join.status, StatusCode::NOT_FOUND);
}
