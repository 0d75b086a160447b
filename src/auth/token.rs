//! Opaque signed bearer tokens for the demo directory.
//!
//! Format: `base64url(claims_json) + "." + hex(sha256(secret || payload))`.
//! Expiry lives inside the claims. This is not a standards JWT; the only
//! consumer is `verify`.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::AuthError;

const DEFAULT_TTL_HOURS: i64 = 24;

#[derive(Debug, Serialize, Deserialize)]
struct TokenClaims {
    sub: String,
    email: String,
    exp: i64,
}

pub struct TokenSigner {
    secret: Vec<u8>,
    ttl: Duration,
}

impl TokenSigner {
    /// Signer with an externally supplied secret.
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self { secret: secret.into(), ttl: Duration::hours(DEFAULT_TTL_HOURS) }
    }

    /// Process-local random secret; issued tokens die with the process.
    pub fn ephemeral() -> Self {
        let mut secret = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut secret);
        Self::new(secret.to_vec())
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn issue(&self, user_id: &str, email: &str) -> String {
        let claims = TokenClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            exp: (Utc::now() + self.ttl).timestamp(),
        };
        let payload = URL_SAFE_NO_PAD
            .encode(serde_json::to_vec(&claims).expect("token claims serialize to JSON"));
        let tag = self.tag(&payload);
        format!("{payload}.{tag}")
    }

    /// Check signature and expiry, returning `(user_id, email)`.
    pub fn decode(&self, token: &str) -> Result<(String, String), AuthError> {
        let (payload, tag) = token.split_once('.').ok_or(AuthError::InvalidToken)?;
        if !constant_time_eq(self.tag(payload).as_bytes(), tag.as_bytes()) {
            return Err(AuthError::InvalidToken);
        }

        let bytes = URL_SAFE_NO_PAD.decode(payload).map_err(|_| AuthError::InvalidToken)?;
        let claims: TokenClaims =
            serde_json::from_slice(&bytes).map_err(|_| AuthError::InvalidToken)?;
        if claims.exp <= Utc::now().timestamp() {
            return Err(AuthError::InvalidToken);
        }

        Ok((claims.sub, claims.email))
    }

    fn tag(&self, payload: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.secret);
        hasher.update(b".");
        hasher.update(payload.as_bytes());
        hex::encode(hasher.finalize())
    }
}

pub(super) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
