//! End-to-end tests over the HTTP router with in-memory stores.

mod helpers;

mod auth_test;
mod health_test;
mod live_session_test;
mod notification_test;
mod office_hours_test;
mod presence_test;
mod sweep_test;
