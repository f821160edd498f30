use anyhow::Result;
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::db::User;

/// Identity claims embedded in a signed session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: i32,
    pub email: String,
    pub username: String,
    /// Issued-at, seconds since epoch
    pub iat: i64,
    /// Expiry, seconds since epoch
    pub exp: i64,
}

/// Stateless session token issuer/verifier.
///
/// The signing secret is process-wide configuration loaded once at startup;
/// validity is determined purely by signature and expiry, there is no
/// server-side revocation list.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_seconds: i64,
}

impl TokenService {
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            ttl_seconds: i64::from(config.token_ttl_days) * 24 * 3600,
        }
    }

    /// Issue a signed token for the user with the configured validity window.
    pub fn issue(&self, user: &User) -> Result<String> {
        self.issue_with_ttl(user, self.ttl_seconds)
    }

    fn issue_with_ttl(&self, user: &User, ttl_seconds: i64) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            iat: now,
            exp: now + ttl_seconds,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("Failed to sign session token: {e}"))
    }

    /// Verify a token and return its claims.
    ///
    /// Any failure (bad signature, expired, malformed) yields `None` so that
    /// callers uniformly respond with 401.
    #[must_use]
    pub fn verify(&self, token: &str) -> Option<Claims> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> TokenService {
        TokenService::new(&AuthConfig {
            jwt_secret: "test-secret".to_string(),
            token_ttl_days: 7,
            app_name: "AISync".to_string(),
        })
    }

    fn test_user() -> User {
        User {
            id: 42,
            email: "a@b.com".to_string(),
            username: "abc".to_string(),
            first_name: None,
            last_name: None,
            two_factor_enabled: false,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_round_trip_preserves_claims() {
        let service = test_service();
        let token = service.issue(&test_user()).unwrap();

        let claims = service.verify(&token).expect("freshly issued token");
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.email, "a@b.com");
        assert_eq!(claims.username, "abc");
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 3600);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let service = test_service();
        // Expiry far enough in the past to clear the default leeway
        let token = service.issue_with_ttl(&test_user(), -3600).unwrap();

        assert!(service.verify(&token).is_none());
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = test_service().issue(&test_user()).unwrap();

        let other = TokenService::new(&AuthConfig {
            jwt_secret: "different-secret".to_string(),
            token_ttl_days: 7,
            app_name: "AISync".to_string(),
        });
        assert!(other.verify(&token).is_none());
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(test_service().verify("not-a-token").is_none());
        assert!(test_service().verify("").is_none());
    }
}
