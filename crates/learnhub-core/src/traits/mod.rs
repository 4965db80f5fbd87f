//! Trait seams shared by multiple crates.

pub mod publisher;

pub use publisher::{EventPublisher, NullPublisher};
