//! # learnhub-realtime
//!
//! WebSocket push transport for LearnHub. Provides:
//!
//! - Connection pool with a per-user connection cap
//! - Typed pub/sub channels (`user:`, `presence:global`, `office_hours:`,
//!   `live_session:`, `course:`)
//! - The [`EventPublisher`](learnhub_core::traits::EventPublisher)
//!   implementation that maps event audiences onto channels
//! - A socket gateway that drives presence from connection lifecycle and
//!   authorises room subscriptions

pub mod channel;
pub mod connection;
pub mod gateway;
pub mod message;
pub mod server;

pub use channel::{ChannelError, ChannelRegistry, ChannelType};
pub use connection::{ConnectionHandle, ConnectionManager};
pub use gateway::SocketGateway;
pub use server::RealtimeEngine;
