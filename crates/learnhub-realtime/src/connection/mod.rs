//! WebSocket connection management: lifecycle, pool, handles, heartbeat, auth.

pub mod authenticator;
pub mod handle;
pub mod heartbeat;
pub mod manager;
pub mod pool;

pub use authenticator::{AuthenticatedConnection, WsAuthenticator};
pub use handle::{ConnectionHandle, ConnectionId, ConnectionInfo};
pub use heartbeat::{HeartbeatConfig, run_heartbeat};
pub use manager::{ConnectionManager, Departure, Registration};
pub use pool::ConnectionPool;
