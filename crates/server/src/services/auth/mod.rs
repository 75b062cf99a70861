//! Authentication service.
//!
//! Password registration and login. Both hand back the public identity plus
//! a freshly issued bearer token.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tracing::instrument;

use waymark_core::{AuthResponse, Email, LoginRequest, RegisterRequest};

use crate::db::{RepositoryError, Store};
use crate::models::NewUser;
use crate::services::token::TokenAuthority;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Authentication service.
pub struct AuthService<'a> {
    store: &'a dyn Store,
    tokens: &'a TokenAuthority,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(store: &'a dyn Store, tokens: &'a TokenAuthority) -> Self {
        Self { store, tokens }
    }

    /// Register a new user and issue their first token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingUsername` if the username is blank.
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, AuthError> {
        let username = request.username.trim();
        if username.is_empty() {
            return Err(AuthError::MissingUsername);
        }

        let email = Email::parse(&request.email)?;
        validate_password(&request.password)?;
        let password_hash = hash_password(&request.password)?;

        let user = self
            .store
            .create_user(NewUser {
                username: username.to_owned(),
                email,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        let token = self.tokens.issue(user.id)?;
        tracing::info!(user_id = %user.id, "User registered");

        Ok(AuthResponse { user, token })
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AuthError> {
        // A malformed email can't match an account.
        let email = Email::parse(&request.email).map_err(|_| AuthError::InvalidCredentials)?;

        let credentials = self
            .store
            .find_credentials(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(&request.password, &credentials.password_hash)?;

        let token = self.tokens.issue(credentials.user.id)?;

        Ok(AuthResponse {
            user: credentials.user,
            token,
        })
    }
}

/// Validate password requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
