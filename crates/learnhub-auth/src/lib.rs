//! # learnhub-auth
//!
//! Identity for the coordination layer. Credentials are issued elsewhere;
//! this crate verifies the bearer tokens that carry a `(user_id, role)` pair
//! into every request and transport connection.
//!
//! ## Modules
//!
//! - `jwt`: claims, HS256 verification, and a local encoder for tooling and tests

pub mod jwt;

pub use jwt::{Claims, JwtDecoder, JwtEncoder};
