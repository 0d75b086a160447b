//! Demo credential service.
//!
//! The core assumes exactly three operations behind the
//! `CredentialService` seam: `register`, `login` and `verify`. Tokens
//! are opaque bearer strings; failure reasons are displayed, never
//! interpreted. The in-memory directory behind the seam keeps no durable
//! state and stands in for a real user-directory service.

mod memory;
mod token;

pub use memory::InMemoryDirectory;
pub use token::TokenSigner;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum accepted password length for registration.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Client-side storage key hosts use for the issued bearer token.
pub const AUTH_TOKEN_KEY: &str = "auth_token";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Result of a successful login or registration.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub user: User,
    pub token: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Password must be at least 8 characters")]
    WeakPassword,

    #[error("An account with this email already exists")]
    DuplicateEmail,

    #[error("Invalid email or password")]
    BadCredentials,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("User not found")]
    UserNotFound,
}

/// Pluggable user-directory seam. These three operations are the only
/// surface the rest of the product may rely on.
#[async_trait]
pub trait CredentialService: Send + Sync {
    async fn register(&self, request: RegisterRequest) -> Result<AuthSession, AuthError>;
    async fn login(&self, email: &str, password: &str) -> Result<AuthSession, AuthError>;
    async fn verify(&self, token: &str) -> Result<User, AuthError>;
}
