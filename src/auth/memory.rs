//! In-memory user directory.
//!
//! Accounts are keyed by normalized email. Passwords are stored as
//! per-user salted SHA-256 digests; nothing here survives a restart.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rand::RngCore;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::validate::validate_email;

use super::token::{constant_time_eq, TokenSigner};
use super::{
    AuthError, AuthSession, CredentialService, RegisterRequest, User, MIN_PASSWORD_LEN,
};

struct StoredUser {
    user: User,
    salt: [u8; 16],
    digest: [u8; 32],
}

pub struct InMemoryDirectory {
    users: DashMap<String, StoredUser>,
    signer: TokenSigner,
}

impl InMemoryDirectory {
    pub fn new(signer: TokenSigner) -> Self {
        Self { users: DashMap::new(), signer }
    }

    /// Directory with a process-local random signing secret.
    pub fn with_ephemeral_secret() -> Self {
        Self::new(TokenSigner::ephemeral())
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    fn hash_password(password: &str, salt: &[u8]) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(salt);
        hasher.update(password.as_bytes());
        hasher.finalize().into()
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

#[async_trait]
impl CredentialService for InMemoryDirectory {
    async fn register(&self, request: RegisterRequest) -> Result<AuthSession, AuthError> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(AuthError::MissingField("name"));
        }
        if request.email.trim().is_empty() {
            return Err(AuthError::MissingField("email"));
        }
        if request.password.is_empty() {
            return Err(AuthError::MissingField("password"));
        }
        if request.password != request.confirm_password {
            return Err(AuthError::PasswordMismatch);
        }
        if request.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }
        validate_email(&request.email).map_err(|_| AuthError::InvalidEmail)?;

        let email = normalize_email(&request.email);
        let mut salt = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut salt);

        let user = User {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            email: email.clone(),
            created_at: Utc::now(),
        };
        let digest = Self::hash_password(&request.password, &salt);

        // entry keeps duplicate detection atomic under concurrent signups
        match self.users.entry(email) {
            Entry::Occupied(_) => return Err(AuthError::DuplicateEmail),
            Entry::Vacant(slot) => {
                slot.insert(StoredUser { user: user.clone(), salt, digest });
            }
        }

        let token = self.signer.issue(&user.id, &user.email);
        Ok(AuthSession { user, token })
    }

    async fn login(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        if email.trim().is_empty() {
            return Err(AuthError::MissingField("email"));
        }
        if password.is_empty() {
            return Err(AuthError::MissingField("password"));
        }

        let stored =
            self.users.get(&normalize_email(email)).ok_or(AuthError::BadCredentials)?;
        let digest = Self::hash_password(password, &stored.salt);
        if !constant_time_eq(&digest, &stored.digest) {
            return Err(AuthError::BadCredentials);
        }

        let token = self.signer.issue(&stored.user.id, &stored.user.email);
        Ok(AuthSession { user: stored.user.clone(), token })
    }

    async fn verify(&self, token: &str) -> Result<User, AuthError> {
        let (user_id, email) = self.signer.decode(token)?;
        let stored = self.users.get(&normalize_email(&email)).ok_or(AuthError::UserNotFound)?;
        if stored.user.id != user_id {
            return Err(AuthError::UserNotFound);
        }
        Ok(stored.user.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    fn signup(email: &str) -> RegisterRequest {
        RegisterRequest {
            name: "Jamie".to_string(),
            email: email.to_string(),
            password: "hunter2hunter2".to_string(),
            confirm_password: "hunter2hunter2".to_string(),
        }
    }

    #[tokio::test]
    async fn register_login_verify_round_trip() {
        let directory = InMemoryDirectory::with_ephemeral_secret();

        let session = directory.register(signup("jamie@example.com")).await.unwrap();
        assert_eq!(session.user.email, "jamie@example.com");
        assert!(!session.token.is_empty());

        let login = directory.login("jamie@example.com", "hunter2hunter2").await;
        let login = tokio_test::assert_ok!(login);
        assert_eq!(login.user.id, session.user.id);

        let verified = directory.verify(&login.token).await.unwrap();
        assert_eq!(verified.id, session.user.id);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let directory = InMemoryDirectory::with_ephemeral_secret();
        directory.register(signup("jamie@example.com")).await.unwrap();

        // same address, different casing and whitespace
        let dup = directory.register(signup("  Jamie@Example.COM ")).await;
        assert_eq!(dup.unwrap_err(), AuthError::DuplicateEmail);
        assert_eq!(directory.user_count(), 1);
    }

    #[tokio::test]
    async fn registration_validation() {
        let directory = InMemoryDirectory::with_ephemeral_secret();

        let mut request = signup("jamie@example.com");
        request.name = "  ".to_string();
        assert_eq!(
            directory.register(request).await.unwrap_err(),
            AuthError::MissingField("name")
        );

        let mut request = signup("jamie@example.com");
        request.confirm_password = "different".to_string();
        assert_eq!(
            directory.register(request).await.unwrap_err(),
            AuthError::PasswordMismatch
        );

        let mut request = signup("jamie@example.com");
        request.password = "short".to_string();
        request.confirm_password = "short".to_string();
        assert_eq!(directory.register(request).await.unwrap_err(), AuthError::WeakPassword);

        let request = signup("not-an-email");
        assert_eq!(directory.register(request).await.unwrap_err(), AuthError::InvalidEmail);
    }

    #[tokio::test]
    async fn login_failures_do_not_reveal_which_part_was_wrong() {
        let directory = InMemoryDirectory::with_ephemeral_secret();
        directory.register(signup("jamie@example.com")).await.unwrap();

        let wrong_password = directory.login("jamie@example.com", "wrong-password").await;
        assert_eq!(wrong_password.unwrap_err(), AuthError::BadCredentials);

        let unknown_user = directory.login("nobody@example.com", "hunter2hunter2").await;
        assert_eq!(unknown_user.unwrap_err(), AuthError::BadCredentials);
    }

    #[tokio::test]
    async fn verify_rejects_tampered_and_foreign_tokens() {
        let directory = InMemoryDirectory::with_ephemeral_secret();
        let session = directory.register(signup("jamie@example.com")).await.unwrap();

        let mut tampered = session.token.clone();
        tampered.push('x');
        assert_eq!(directory.verify(&tampered).await.unwrap_err(), AuthError::InvalidToken);

        assert_eq!(directory.verify("garbage").await.unwrap_err(), AuthError::InvalidToken);
    }

    #[tokio::test]
    async fn valid_token_for_an_absent_user_is_not_found() {
        // two directories sharing one secret model a token that outlived
        // its user record
        let secret = b"shared-secret".to_vec();
        let issuer = InMemoryDirectory::new(TokenSigner::new(secret.clone()));
        let verifier = InMemoryDirectory::new(TokenSigner::new(secret));

        let session = issuer.register(signup("jamie@example.com")).await.unwrap();
        assert_eq!(
            verifier.verify(&session.token).await.unwrap_err(),
            AuthError::UserNotFound
        );
    }
}
