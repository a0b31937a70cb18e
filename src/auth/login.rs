use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::auth::password::verify_password;
use crate::auth::token::{TokenCodec, TokenError};
use crate::storage::{StorageError, UserStore};

/// Minimum password length accepted at login and registration
pub const MIN_PASSWORD_LENGTH: usize = 6;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern"));

/// Authentication errors.
///
/// `Validation` and `InvalidCredentials` must render identically to clients;
/// the split exists only so validation can fail before any storage or
/// hashing work happens.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(&'static str),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("Storage error: {0}")]
    Storage(StorageError),
}

/// Check login/registration input shape before touching storage or the hasher
pub fn validate_credentials(email: &str, password: &str) -> Result<(), AuthError> {
    if email.is_empty() {
        return Err(AuthError::Validation("The field 'email' is required"));
    }
    if password.is_empty() {
        return Err(AuthError::Validation("The field 'password' is required"));
    }
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::Validation(
            "The field 'password' must be at least 6 characters long",
        ));
    }
    if !EMAIL_PATTERN.is_match(email) {
        return Err(AuthError::Validation("Invalid email format"));
    }

    Ok(())
}

/// Normalize an identity for storage and token claims
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Authenticate a user and issue a session token.
///
/// An unknown email and a wrong password both come back as
/// [`AuthError::InvalidCredentials`] so the outcome never reveals whether the
/// account exists.
pub async fn authenticate(
    user_store: &dyn UserStore,
    codec: &TokenCodec,
    email: &str,
    password: &str,
) -> Result<String, AuthError> {
    let email = normalize_email(email);
    validate_credentials(&email, password)?;

    let user = match user_store.get_user_by_email(&email).await {
        Ok(user) => user,
        Err(StorageError::UserNotFound(_)) => {
            warn!("Login attempt for unknown user: {}", email);
            return Err(AuthError::InvalidCredentials);
        }
        Err(e) => return Err(AuthError::Storage(e)),
    };

    if !verify_password(password, &user.password_hash) {
        warn!("Invalid password for user: {}", email);
        return Err(AuthError::InvalidCredentials);
    }

    Ok(codec.issue(&email, Utc::now())?)
}
