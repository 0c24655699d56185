//! JWT session token creation and verification.

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{entity::user, error::Error};

pub const SESSION_COOKIE_NAME: &str = "menuboard_session";

/// Signing secret and lifetime of issued session tokens.
#[derive(Clone)]
pub struct SessionSettings {
    pub secret_key: String,
    pub ttl: Duration,
}

impl std::fmt::Debug for SessionSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSettings")
            .field("secret_key", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,      // User ID
    pub username: String, // Username at issue time
    pub exp: i64,         // Expiration time
    pub iat: i64,         // Issued at
}

impl SessionClaims {
    pub fn user_id(&self) -> Option<i32> {
        self.sub.parse().ok()
    }

    pub fn new(user: &user::Model, settings: &SessionSettings) -> Self {
        let now = Utc::now().timestamp();
        let ttl = i64::try_from(settings.ttl.as_secs()).unwrap_or(i64::MAX);

        Self {
            sub: user.id.to_string(),
            username: user.username.clone(),
            exp: now.saturating_add(ttl),
            iat: now,
        }
    }
}

pub fn create_session_token(
    user: &user::Model,
    settings: &SessionSettings,
) -> Result<String, Error> {
    let claims = SessionClaims::new(user, settings);
    let key = EncodingKey::from_secret(settings.secret_key.as_bytes());

    encode(&Header::default(), &claims, &key).map_err(|e| Error::Internal {
        operation: format!("create session token: {e}"),
    })
}

/// Decode a session token. `None` covers every reason a token is unusable:
/// bad signature, malformed, expired.
pub fn verify_session_token(token: &str, settings: &SessionSettings) -> Option<SessionClaims> {
    let key = DecodingKey::from_secret(settings.secret_key.as_bytes());

    match decode::<SessionClaims>(token, &key, &Validation::default()) {
        Ok(data) => Some(data.claims),
        Err(err) => {
            tracing::debug!(?err, "Rejected session token");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> SessionSettings {
        SessionSettings {
            secret_key: "test-secret-key-for-jwt".to_owned(),
            ttl: Duration::from_secs(3600),
        }
    }

    fn user() -> user::Model {
        user::Model {
            id: 7,
            username: "ana".to_owned(),
            password_hash: String::new(),
        }
    }

    #[test]
    fn test_create_and_verify_session_token() {
        let token = create_session_token(&user(), &settings()).unwrap();
        let claims = verify_session_token(&token, &settings()).unwrap();

        assert_eq!(claims.user_id(), Some(7));
        assert_eq!(claims.username, "ana");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_token_signed_with_other_key_is_rejected() {
        let token = create_session_token(&user(), &settings()).unwrap();
        let other = SessionSettings {
            secret_key: "another-key".to_owned(),
            ..settings()
        };

        assert!(verify_session_token(&token, &other).is_none());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            sub: "7".to_owned(),
            username: "ana".to_owned(),
            exp: now - 3600,
            iat: now - 7200,
        };
        let key = EncodingKey::from_secret(settings().secret_key.as_bytes());
        let token = encode(&Header::default(), &claims, &key).unwrap();

        assert!(verify_session_token(&token, &settings()).is_none());
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        assert!(verify_session_token("not.a.jwt", &settings()).is_none());
    }
}
