//! Pub/sub channel system.

pub mod error;
pub mod registry;
pub mod subscription;
pub mod types;

pub use error::ChannelError;
pub use registry::ChannelRegistry;
pub use types::ChannelType;
