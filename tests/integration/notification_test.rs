//! Notification publish, inbox, preferences, and the quiet-hours queue.

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::{Value, json};

use crate::helpers::{TestApp, TestUser};

fn publish_body(recipient: &TestUser, subcategory: &str) -> Value {
    json!({
        "user_id": recipient.id,
        "notification_type": format!("test.{subcategory}"),
        "subcategory": subcategory,
        "title": "Heads up",
        "message": "Something happened in your course"
    })
}

async fn inbox_len(app: &TestApp, user: &TestUser) -> usize {
    let page = app.get("/api/notifications", user).await;
    assert_eq!(page.status, StatusCode::OK);
    page.data()["items"].as_array().map(Vec::len).unwrap_or(0)
}

#[tokio::test]
async fn test_students_cannot_publish() {
    let app = TestApp::new();
    let student = app.student("s");
    let other = app.student("o");

    let response = app
        .post(
            "/api/notifications/publish",
            publish_body(&other, "discussion_reply"),
            &student,
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_publish_delivers_and_read_state_tracks() {
    let app = TestApp::new();
    let instructor = app.instructor("prof");
    let student = app.student("s");

    let published = app
        .post(
            "/api/notifications/publish",
            publish_body(&student, "assessment_graded"),
            &instructor,
        )
        .await;
    assert_eq!(published.status, StatusCode::ACCEPTED);
    assert_eq!(published.data()["in_app"]["kind"], "delivered");
    assert_eq!(published.data()["emailed"], true);
    let id = published.data()["in_app"]["record"]["id"]
        .as_str()
        .expect("notification id")
        .to_string();

    assert_eq!(inbox_len(&app, &student).await, 1);
    let unread = app.get("/api/notifications/unread-count", &student).await;
    assert_eq!(unread.data()["count"], 1);

    let read = app
        .put(&format!("/api/notifications/{id}/read"), json!({}), &student)
        .await;
    assert_eq!(read.status, StatusCode::OK);
    assert_eq!(read.data()["is_read"], true);

    let unread = app.get("/api/notifications/unread-count", &student).await;
    assert_eq!(unread.data()["count"], 0);

    // Another user's id reads as missing.
    let intruder = app.student("intruder");
    let stolen = app
        .put(&format!("/api/notifications/{id}/read"), json!({}), &intruder)
        .await;
    assert_eq!(stolen.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_security_alert_ignores_disabled_in_app() {
    let app = TestApp::new();
    let instructor = app.instructor("prof");
    let student = app.student("s");

    let saved = app
        .put(
            "/api/notifications/preferences",
            json!({ "global": { "in_app_enabled": false } }),
            &student,
        )
        .await;
    assert_eq!(saved.status, StatusCode::OK);

    let muted = app
        .post(
            "/api/notifications/publish",
            publish_body(&student, "discussion_reply"),
            &instructor,
        )
        .await;
    assert_eq!(muted.data()["in_app"]["kind"], "skipped");

    let alert = app
        .post(
            "/api/notifications/publish",
            publish_body(&student, "security_alert"),
            &instructor,
        )
        .await;
    assert_eq!(alert.data()["in_app"]["kind"], "delivered");
    assert_eq!(inbox_len(&app, &student).await, 1);
}

#[tokio::test]
async fn test_quiet_hours_defer_in_app_until_swept() {
    let app = TestApp::new();
    let instructor = app.instructor("prof");
    let student = app.student("s");

    let now = Utc::now();
    let start = (now - Duration::hours(1)).format("%H:%M:%S").to_string();
    let end = (now + Duration::hours(1)).format("%H:%M:%S").to_string();
    let saved = app
        .put(
            "/api/notifications/preferences",
            json!({ "quiet_hours": { "start": start, "end": end, "utc_offset_minutes": 0 } }),
            &student,
        )
        .await;
    assert_eq!(saved.status, StatusCode::OK, "{}", saved.body);

    let published = app
        .post(
            "/api/notifications/publish",
            publish_body(&student, "course_announcement"),
            &instructor,
        )
        .await;
    assert_eq!(published.status, StatusCode::ACCEPTED);
    assert_eq!(published.data()["in_app"]["kind"], "deferred");
    // Email is not held back by quiet hours.
    assert_eq!(app.email.recipients(), vec![student.id]);
    assert_eq!(inbox_len(&app, &student).await, 0);

    // Still inside the window: nothing is due yet.
    let early = app
        .state
        .notification_fanout
        .sweep_queue(Utc::now())
        .await
        .expect("sweep");
    assert_eq!(early.promoted, 0);

    let later = app
        .state
        .notification_fanout
        .sweep_queue(now + Duration::hours(2))
        .await
        .expect("sweep");
    assert_eq!(later.promoted, 1);
    assert_eq!(inbox_len(&app, &student).await, 1);
}

#[tokio::test]
async fn test_invalid_quiet_hours_are_rejected() {
    let app = TestApp::new();
    let student = app.student("s");

    let response = app
        .put(
            "/api/notifications/preferences",
            json!({ "quiet_hours": { "start": "22:00:00", "end": "22:00:00" } }),
            &student,
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_mark_all_read_and_delete() {
    let app = TestApp::new();
    let instructor = app.instructor("prof");
    let student = app.student("s");

    for sub in ["new_content", "mention"] {
        app.post(
            "/api/notifications/publish",
            publish_body(&student, sub),
            &instructor,
        )
        .await;
    }

    let marked = app
        .put("/api/notifications/read-all", json!({}), &student)
        .await;
    assert_eq!(marked.data()["marked"], 2);

    let page = app.get("/api/notifications?unread_only=true", &student).await;
    assert_eq!(page.data()["items"].as_array().map(Vec::len), Some(0));

    let all = app.get("/api/notifications", &student).await;
    let id = all.data()["items"][0]["id"].as_str().expect("id").to_string();
    let deleted = app
        .request(
            "DELETE",
            &format!("/api/notifications/{id}"),
            None,
            Some(&student.token),
        )
        .await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(inbox_len(&app, &student).await, 1);
}
