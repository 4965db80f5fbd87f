//! Shared test helpers for integration tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use learnhub_api::{AppState, build_app};
use learnhub_auth::JwtEncoder;
use learnhub_core::AppResult;
use learnhub_core::config::AppConfig;
use learnhub_database::Stores;
use learnhub_entity::user::UserRole;
use learnhub_service::{AllowAllDirectory, EmailContent, EmailSender};

/// Email relay that remembers what it was handed.
#[derive(Debug, Default)]
pub struct RecordingEmail {
    sent: Mutex<Vec<(Uuid, EmailContent)>>,
}

impl RecordingEmail {
    /// Recipients in send order.
    pub fn recipients(&self) -> Vec<Uuid> {
        self.sent
            .lock()
            .expect("email log poisoned")
            .iter()
            .map(|(user, _)| *user)
            .collect()
    }
}

#[async_trait]
impl EmailSender for RecordingEmail {
    async fn send(&self, user_id: Uuid, content: &EmailContent) -> AppResult<()> {
        self.sent
            .lock()
            .expect("email log poisoned")
            .push((user_id, content.clone()));
        Ok(())
    }
}

/// A signed-in test user
#[derive(Debug, Clone)]
pub struct TestUser {
    /// User id carried in the token
    pub id: Uuid,
    /// Bearer token
    pub token: String,
}

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Shared state, for driving services directly
    pub state: AppState,
    /// Emails handed to the relay
    pub email: Arc<RecordingEmail>,
    encoder: JwtEncoder,
}

impl TestApp {
    /// Create a new test application over in-memory stores
    pub fn new() -> Self {
        let config = AppConfig::default();
        let encoder = JwtEncoder::new(&config.auth);
        let email = Arc::new(RecordingEmail::default());
        let state = AppState::with_collaborators(
            config,
            Stores::memory(),
            email.clone(),
            Arc::new(AllowAllDirectory),
        );
        let router = build_app(state.clone());

        Self {
            router,
            state,
            email,
            encoder,
        }
    }

    /// Mint a token for a fresh user with `role`
    pub fn user(&self, role: UserRole, username: &str) -> TestUser {
        let id = Uuid::new_v4();
        let (token, _) = self
            .encoder
            .generate_access_token(id, role, username)
            .expect("Failed to sign token");
        TestUser { id, token }
    }

    /// Shorthand for a student
    pub fn student(&self, username: &str) -> TestUser {
        self.user(UserRole::Student, username)
    }

    /// Shorthand for an instructor
    pub fn instructor(&self, username: &str) -> TestUser {
        self.user(UserRole::Instructor, username)
    }

    /// Shorthand for an admin
    pub fn admin(&self, username: &str) -> TestUser {
        self.user(UserRole::Admin, username)
    }

    /// Make an HTTP request to the test server
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);

        if let Some(t) = token {
            builder = builder.header("Authorization", format!("Bearer {t}"));
        }

        let request = match body {
            Some(b) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::to_vec(&b).expect("Failed to serialize body"),
                ))
                .expect("Failed to build request"),
            None => builder.body(Body::empty()).expect("Failed to build request"),
        };

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }

    /// GET as `user`
    pub async fn get(&self, path: &str, user: &TestUser) -> TestResponse {
        self.request("GET", path, None, Some(&user.token)).await
    }

    /// POST a JSON body as `user`
    pub async fn post(&self, path: &str, body: Value, user: &TestUser) -> TestResponse {
        self.request("POST", path, Some(body), Some(&user.token))
            .await
    }

    /// PUT a JSON body as `user`
    pub async fn put(&self, path: &str, body: Value, user: &TestUser) -> TestResponse {
        self.request("PUT", path, Some(body), Some(&user.token))
            .await
    }
}

/// Parsed test response
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
}

impl TestResponse {
    /// The `data` field of a success envelope
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    /// The machine-readable code of an error body
    pub fn error_code(&self) -> &str {
        self.body["error"].as_str().unwrap_or_default()
    }

    /// `data.id` parsed as a UUID
    pub fn id(&self) -> Uuid {
        self.data()["id"]
            .as_str()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(|| panic!("response has no data.id: {}", self.body))
    }
}
