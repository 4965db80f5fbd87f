//! # learnhub-database
//!
//! Persistence for LearnHub's coordination layer: the PostgreSQL pool and
//! migrations, the store traits services are written against, their
//! PostgreSQL repositories and in-memory counterparts, and the shared
//! capacity admission algorithm both implementations run.

pub mod admission;
pub mod backend;
pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use backend::Stores;
pub use connection::DatabasePool;
