//! Token verification configuration.

use serde::{Deserialize, Serialize};

/// Settings for verifying identity tokens issued by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Shared HMAC secret used to verify (and, in tests, sign) tokens.
    #[serde(default = "default_secret")]
    pub jwt_secret: String,
    /// Lifetime of tokens minted by the local encoder.
    #[serde(default = "default_access_ttl")]
    pub jwt_access_ttl_minutes: u64,
    /// Allowed clock skew in seconds.
    #[serde(default = "default_leeway")]
    pub leeway_seconds: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_secret(),
            jwt_access_ttl_minutes: default_access_ttl(),
            leeway_seconds: default_leeway(),
        }
    }
}

fn default_secret() -> String {
    "change-me-in-production-please".to_string()
}

fn default_access_ttl() -> u64 {
    60
}

fn default_leeway() -> u64 {
    5
}
