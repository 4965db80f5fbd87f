//! Office-hours queue over HTTP.

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use crate::helpers::{TestApp, TestUser};

async fn open_schedule(app: &TestApp, instructor: &TestUser) -> Uuid {
    let response = app
        .post(
            "/api/office-hours/schedules",
            json!({ "title": "Thursday office hours" }),
            instructor,
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.data()["is_open"], true);
    response.id()
}

async fn join(app: &TestApp, schedule_id: Uuid, student: &TestUser) -> (Uuid, u64) {
    let response = app
        .post(
            &format!("/api/office-hours/schedules/{schedule_id}/queue"),
            json!({ "question": "How do closures capture?" }),
            student,
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    let entry_id = response.data()["entry"]["id"]
        .as_str()
        .and_then(|s| s.parse().ok())
        .expect("entry id");
    let position = response.data()["position"].as_u64().expect("position");
    (entry_id, position)
}

#[tokio::test]
async fn test_students_cannot_create_schedules() {
    let app = TestApp::new();
    let student = app.student("sam");

    let response = app
        .post(
            "/api/office-hours/schedules",
            json!({ "title": "Mine" }),
            &student,
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_queue_is_fifo_and_positions_advance() {
    let app = TestApp::new();
    let instructor = app.instructor("prof");
    let first = app.student("first");
    let second = app.student("second");
    let schedule = open_schedule(&app, &instructor).await;

    let (first_entry, first_pos) = join(&app, schedule, &first).await;
    let (second_entry, second_pos) = join(&app, schedule, &second).await;
    assert_eq!((first_pos, second_pos), (1, 2));

    let queue = app
        .get(
            &format!("/api/office-hours/instructors/{}/queue", instructor.id),
            &instructor,
        )
        .await;
    assert_eq!(queue.status, StatusCode::OK);
    let listed: Vec<&str> = queue
        .data()
        .as_array()
        .expect("queue")
        .iter()
        .filter_map(|e| e["id"].as_str())
        .collect();
    assert_eq!(
        listed,
        vec![first_entry.to_string().as_str(), second_entry.to_string().as_str()]
    );

    let admitted = app
        .post(
            &format!("/api/office-hours/entries/{first_entry}/admit"),
            json!({}),
            &instructor,
        )
        .await;
    assert_eq!(admitted.status, StatusCode::OK);
    assert_eq!(admitted.data()["status"], "admitted");

    let position = app
        .get(
            &format!("/api/office-hours/entries/{second_entry}/position"),
            &second,
        )
        .await;
    assert_eq!(position.data()["position"], 1);
}

#[tokio::test]
async fn test_second_join_is_conflict() {
    let app = TestApp::new();
    let instructor = app.instructor("prof");
    let student = app.student("sam");
    let schedule = open_schedule(&app, &instructor).await;

    join(&app, schedule, &student).await;
    let again = app
        .post(
            &format!("/api/office-hours/schedules/{schedule}/queue"),
            json!({}),
            &student,
        )
        .await;

    assert_eq!(again.status, StatusCode::CONFLICT);
    assert_eq!(again.error_code(), "CONFLICT");
}

#[tokio::test]
async fn test_closed_schedule_refuses_joins() {
    let app = TestApp::new();
    let instructor = app.instructor("prof");
    let student = app.student("sam");
    let schedule = open_schedule(&app, &instructor).await;

    let closed = app
        .put(
            &format!("/api/office-hours/schedules/{schedule}/close"),
            json!({}),
            &instructor,
        )
        .await;
    assert_eq!(closed.status, StatusCode::OK);
    assert_eq!(closed.data()["is_open"], false);

    let response = app
        .post(
            &format!("/api/office-hours/schedules/{schedule}/queue"),
            json!({}),
            &student,
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_only_the_instructor_reads_the_queue() {
    let app = TestApp::new();
    let instructor = app.instructor("prof");
    let student = app.student("sam");
    open_schedule(&app, &instructor).await;

    let response = app
        .get(
            &format!("/api/office-hours/instructors/{}/queue", instructor.id),
            &student,
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_student_cancels_own_entry() {
    let app = TestApp::new();
    let instructor = app.instructor("prof");
    let student = app.student("sam");
    let schedule = open_schedule(&app, &instructor).await;
    let (entry, _) = join(&app, schedule, &student).await;

    let cancelled = app
        .post(
            &format!("/api/office-hours/entries/{entry}/cancel"),
            json!({}),
            &student,
        )
        .await;
    assert_eq!(cancelled.status, StatusCode::OK);
    assert_eq!(cancelled.data()["status"], "cancelled");

    let mine = app.get("/api/office-hours/me/entries", &student).await;
    assert_eq!(mine.data().as_array().map(Vec::len), Some(0));
}
