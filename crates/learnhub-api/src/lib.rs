//! # learnhub-api
//!
//! HTTP API layer for LearnHub built on Axum.
//!
//! Provides the REST endpoints for presence, office hours, live sessions,
//! notifications and sweeps, the WebSocket upgrade, middleware (CORS,
//! compression, request logging), extractors, DTOs, and error mapping.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::build_app;
pub use error::{ApiError, ApiResult};
pub use state::AppState;
