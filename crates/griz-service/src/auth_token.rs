use crate::error::{Result, ServiceError};
use griz_core::UserId;
use jiff::Timestamp;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthClaims {
    pub id: UserId,
    pub exp: u64,
}

/// Mints HS256 session tokens.
///
/// Tokens are only ever looked up in the cache, never verified, so the
/// cache TTL decides how long a session lasts. `exp` mirrors that TTL.
#[derive(Clone)]
pub struct AuthTokenIssuer {
    key: EncodingKey,
}

impl AuthTokenIssuer {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            key: EncodingKey::from_secret(secret.as_ref()),
        }
    }

    /// Signs a token for `id` that expires `ttl` from now.
    pub fn issue(&self, id: UserId, ttl: Duration) -> Result<String> {
        let now = u64::try_from(Timestamp::now().as_second())
            .map_err(|_| ServiceError::AuthToken("system clock is before the epoch".to_string()))?;
        let claims = AuthClaims {
            id,
            exp: now + ttl.as_secs(),
        };

        encode(&Header::default(), &claims, &self.key)
            .map_err(|e| ServiceError::AuthToken(e.to_string()))
    }
}

impl std::fmt::Debug for AuthTokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthTokenIssuer").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

    fn claims(token: &str, secret: &str) -> jsonwebtoken::errors::Result<AuthClaims> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<AuthClaims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
    }

    #[test]
    fn token_carries_id_and_expiry() {
        let issuer = AuthTokenIssuer::new("jwt-secret");
        let before = Timestamp::now().as_second() as u64;

        let token = issuer.issue(42, Duration::from_secs(1800)).unwrap();
        let claims = claims(&token, "jwt-secret").unwrap();

        assert_eq!(claims.id, 42);
        assert!(claims.exp >= before + 1800);
        assert!(claims.exp <= Timestamp::now().as_second() as u64 + 1800);
    }

    #[test]
    fn token_is_signed_with_the_secret() {
        let issuer = AuthTokenIssuer::new("jwt-secret");
        let token = issuer.issue(1, Duration::from_secs(60)).unwrap();
        assert!(claims(&token, "another-secret").is_err());
    }

    #[test]
    fn debug_hides_the_key() {
        let issuer = AuthTokenIssuer::new("jwt-secret");
        assert!(!format!("{issuer:?}").contains("jwt-secret"));
    }
}
