//! Bearer token verification
//!
//! Tokens are HS256 JWTs signed with a shared secret. `sub` carries the
//! user id and `exp` (Unix seconds) is enforced without leeway.

use async_trait::async_trait;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use colorhunt_common::time;
use colorhunt_common::{Error, Result};

/// Resolves a bearer token to the acting user id
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn verify_token(&self, token: &str) -> Result<String>;
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: u64,
    exp: u64,
}

/// Shared-secret signed tokens
pub struct SharedSecretTokens {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl SharedSecretTokens {
    pub fn new(secret: impl Into<String>) -> Result<Self> {
        let secret = secret.into();
        if secret.trim().is_empty() {
            return Err(Error::Config("token secret must not be empty".to_string()));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    /// Issue a token valid for `ttl` from now
    pub fn issue(&self, user_id: &str, ttl: Duration) -> Result<String> {
        self.issue_until(user_id, now_secs() + ttl.as_secs())
    }

    /// Issue a token expiring at the given Unix epoch seconds
    pub fn issue_until(&self, user_id: &str, expires_at: u64) -> Result<String> {
        if user_id.is_empty() {
            return Err(Error::InvalidInput("user id must not be empty".to_string()));
        }
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now_secs(),
            exp: expires_at,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| Error::Internal(format!("Failed to sign token: {}", e)))
    }

    fn verify(&self, token: &str) -> Result<String> {
        let data = decode::<Claims>(token.trim(), &self.decoding, &self.validation).map_err(|err| {
            let reason = match err.kind() {
                ErrorKind::ExpiredSignature => "token expired",
                ErrorKind::InvalidSignature => "invalid token signature",
                ErrorKind::InvalidAlgorithm => "unsupported token algorithm",
                _ => "malformed token",
            };
            Error::Unauthorized(reason.to_string())
        })?;

        if data.claims.sub.is_empty() {
            return Err(Error::Unauthorized("token has no subject".to_string()));
        }
        Ok(data.claims.sub)
    }
}

#[async_trait]
impl IdentityProvider for SharedSecretTokens {
    async fn verify_token(&self, token: &str) -> Result<String> {
        self.verify(token)
    }
}

fn now_secs() -> u64 {
    time::now().timestamp().max(0) as u64
}
