//! User-related value types. Users themselves live with the identity provider.

pub mod role;

pub use role::UserRole;
