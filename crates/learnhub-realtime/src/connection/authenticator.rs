//! WebSocket authentication: validates the JWT from the query parameter.

use std::sync::Arc;

use uuid::Uuid;

use learnhub_auth::jwt::JwtDecoder;
use learnhub_core::error::AppError;
use learnhub_entity::user::UserRole;
use learnhub_service::RequestContext;

/// Authenticated connection info extracted from JWT.
#[derive(Debug, Clone)]
pub struct AuthenticatedConnection {
    /// User ID.
    pub user_id: Uuid,
    /// User role.
    pub role: UserRole,
    /// Username.
    pub username: String,
}

impl AuthenticatedConnection {
    /// Request context for service calls made on behalf of this connection.
    pub fn context(&self) -> RequestContext {
        RequestContext::new(self.user_id, self.role, self.username.clone())
    }
}

/// Authenticates WebSocket connections using JWT tokens.
#[derive(Clone)]
pub struct WsAuthenticator {
    /// JWT decoder.
    decoder: Arc<JwtDecoder>,
}

impl std::fmt::Debug for WsAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsAuthenticator").finish()
    }
}

impl WsAuthenticator {
    /// Creates a new WebSocket authenticator.
    pub fn new(decoder: Arc<JwtDecoder>) -> Self {
        Self { decoder }
    }

    /// Authenticates a connection using a JWT token.
    pub fn authenticate(&self, token: &str) -> Result<AuthenticatedConnection, AppError> {
        if token.trim().is_empty() {
            return Err(AppError::authentication("Missing access token"));
        }
        let claims = self.decoder.decode_access_token(token)?;

        Ok(AuthenticatedConnection {
            user_id: claims.user_id(),
            role: claims.role,
            username: claims.username,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use learnhub_auth::jwt::JwtEncoder;
    use learnhub_core::config::AuthConfig;
    use learnhub_core::error::ErrorKind;

    fn config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "websocket-test-secret-0123456789".to_string(),
            ..AuthConfig::default()
        }
    }

    #[test]
    fn test_authenticate_reads_identity_from_token() {
        let config = config();
        let user = Uuid::new_v4();
        let (token, _) = JwtEncoder::new(&config)
            .generate_access_token(user, UserRole::Instructor, "grace")
            .unwrap();

        let auth = WsAuthenticator::new(Arc::new(JwtDecoder::new(&config)));
        let conn = auth.authenticate(&token).unwrap();
        assert_eq!(conn.user_id, user);
        assert_eq!(conn.role, UserRole::Instructor);
        assert_eq!(conn.context().username, "grace");
    }

    #[test]
    fn test_empty_token_is_rejected() {
        let auth = WsAuthenticator::new(Arc::new(JwtDecoder::new(&config())));
        let err = auth.authenticate("  ").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authentication);
    }
}
