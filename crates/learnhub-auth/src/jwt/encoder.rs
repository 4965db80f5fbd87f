//! JWT token creation.
//!
//! Real logins are issued by the identity provider. The encoder exists for
//! local tooling and for tests that need a valid bearer token.

use chrono::{DateTime, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use learnhub_core::config::AuthConfig;
use learnhub_core::error::AppError;
use learnhub_entity::user::UserRole;

use super::claims::Claims;

/// Creates signed HS256 access tokens.
#[derive(Clone)]
pub struct JwtEncoder {
    /// HMAC secret key for signing.
    encoding_key: EncodingKey,
    /// Access token TTL in minutes.
    access_ttl_minutes: i64,
}

impl std::fmt::Debug for JwtEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtEncoder")
            .field("access_ttl_minutes", &self.access_ttl_minutes)
            .finish()
    }
}

impl JwtEncoder {
    /// Creates a new encoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            access_ttl_minutes: i64::try_from(config.jwt_access_ttl_minutes).unwrap_or(60),
        }
    }

    /// Generates an access token for the given identity.
    pub fn generate_access_token(
        &self,
        user_id: Uuid,
        role: UserRole,
        username: &str,
    ) -> Result<(String, DateTime<Utc>), AppError> {
        let now = Utc::now();
        let exp = now + chrono::Duration::minutes(self.access_ttl_minutes);

        let claims = Claims {
            sub: user_id,
            role,
            username: username.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to encode access token: {e}")))?;

        Ok((token, exp))
    }
}
