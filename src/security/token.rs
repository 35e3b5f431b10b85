//! Access token issuing and verification.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user: String,
    pub iat: u64,
    pub exp: u64,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            _ => TokenError::Malformed(err.to_string()),
        }
    }
}

/// Issues and verifies access tokens.
pub trait TokenService: Send + Sync {
    /// Sign a token for the given claims.
    fn create(&self, claims: &Claims) -> Result<String, TokenError>;

    /// Sign a fresh token for `user`, valid for the service's lifetime.
    fn issue(&self, user: &str) -> Result<String, TokenError>;

    /// Verify signature and expiry, returning the claims.
    fn decode(&self, token: &str) -> Result<Claims, TokenError>;

    fn validate(&self, token: &str) -> bool {
        self.decode(token).is_ok()
    }
}

/// HS256 token service.
pub struct JwtTokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl JwtTokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp"]);
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl std::fmt::Debug for JwtTokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtTokenService")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService for JwtTokenService {
    fn create(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    fn issue(&self, user: &str) -> Result<String, TokenError> {
        let now = unix_now();
        self.create(&Claims {
            user: user.to_string(),
            iat: now,
            exp: now + self.ttl.as_secs(),
        })
    }

    fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)?;
        Ok(data.claims)
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(secret: &str) -> JwtTokenService {
        JwtTokenService::new(secret, Duration::from_secs(3600))
    }

    #[test]
    fn test_issue_then_decode() {
        let tokens = service("secret");
        let token = tokens.issue("admin").unwrap();
        let claims = tokens.decode(&token).unwrap();
        assert_eq!(claims.user, "admin");
        assert_eq!(claims.exp - claims.iat, 3600);
        assert!(tokens.validate(&token));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = service("one").issue("admin").unwrap();
        let err = service("two").decode(&token).unwrap_err();
        assert!(matches!(err, TokenError::InvalidSignature));
    }

    #[test]
    fn test_expired_token_rejected() {
        let tokens = service("secret");
        let now = unix_now();
        let token = tokens
            .create(&Claims {
                user: "admin".into(),
                iat: now - 7200,
                exp: now - 120,
            })
            .unwrap();
        assert!(matches!(tokens.decode(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn test_garbage_is_malformed() {
        assert!(matches!(
            service("secret").decode("not-a-token"),
            Err(TokenError::Malformed(_))
        ));
        assert!(!service("secret").validate(""));
    }
}
