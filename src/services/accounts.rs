//! Account registration and password login.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use garde::Validate;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::RepositoryError;
use crate::models::user::{RegisterRequest, User};
use crate::services::ports::AccountStore;

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("Invalid registration: {0}")]
    Invalid(String),

    #[error("Username already exists")]
    UsernameTaken,

    #[error("Email already registered")]
    EmailTaken,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Persistence error: {0}")]
    Persistence(#[from] RepositoryError),
}

pub struct AccountService {
    accounts: Arc<dyn AccountStore>,
}

impl AccountService {
    pub fn new(accounts: Arc<dyn AccountStore>) -> Self {
        Self { accounts }
    }

    /// Create an account. Username and email must both be unused.
    pub async fn register(&self, request: RegisterRequest) -> Result<User, AccountError> {
        request
            .validate()
            .map_err(|report| AccountError::Invalid(report.to_string()))?;

        if self.accounts.find_by_username(&request.username).await?.is_some() {
            return Err(AccountError::UsernameTaken);
        }
        if self.accounts.email_exists(&request.email).await? {
            return Err(AccountError::EmailTaken);
        }

        let password_hash = hash_password(&request.password)?;
        let user = User {
            id: Uuid::new_v4(),
            username: request.username,
            email: request.email,
        };

        // A concurrent registration can still win the race; the store's
        // unique constraint decides.
        match self.accounts.create_account(&user, &password_hash).await {
            Ok(()) => {}
            Err(RepositoryError::Duplicate("email")) => return Err(AccountError::EmailTaken),
            Err(RepositoryError::Duplicate(_)) => return Err(AccountError::UsernameTaken),
            Err(e) => return Err(e.into()),
        }

        tracing::info!(user_id = %user.id, username = %user.username, "Account registered");
        metrics::counter!("accounts_registered_total").increment(1);
        Ok(user)
    }

    /// Check a username/password pair. Unknown users and wrong passwords
    /// fail the same way.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User, AccountError> {
        let Some(account) = self.accounts.find_by_username(username).await? else {
            metrics::counter!("login_failures_total").increment(1);
            return Err(AccountError::InvalidCredentials);
        };

        if !verify_password(password, &account.password_hash) {
            tracing::debug!(username, "Password rejected");
            metrics::counter!("login_failures_total").increment(1);
            return Err(AccountError::InvalidCredentials);
        }

        Ok(account.user)
    }
}

/// Argon2id PHC string with a fresh random salt.
fn hash_password(password: &str) -> Result<String, AccountError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AccountError::Hashing(e.to_string()))
}

/// An empty or unparsable stored hash never verifies.
fn verify_password(password: &str, stored: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}
