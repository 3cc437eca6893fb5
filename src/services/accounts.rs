//! Account creation and credential checks.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::database::models::{FieldErrors, NewUser, Role, User};
use crate::database::{Store, StoreError};
use crate::policy::{admit, AdmissionError};

const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_USERNAME_LENGTH: usize = 150;
const MIN_USERNAME_LENGTH: usize = 3;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Invalid registration data")]
    Invalid(FieldErrors),

    #[error(transparent)]
    Admission(#[from] AdmissionError),

    #[error("No active account found with the given credentials")]
    InvalidCredentials,

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Body of `POST /api/register` and `POST /api/users/create`
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationRequest {
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub password: String,
    pub password2: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    /// Defaults to `user` when omitted
    #[serde(default)]
    pub role: Option<Role>,
}

impl RegistrationRequest {
    pub fn requested_role(&self) -> Role {
        self.role.unwrap_or_default()
    }

    /// Field-level checks that need no store access
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();

        if let Some(msg) = username_problem(&self.username) {
            errors.insert("username".to_string(), msg);
        }
        if !looks_like_email(&self.email) {
            errors.insert("email".to_string(), "Enter a valid email address.".to_string());
        }
        if let Some(msg) = password_problem(&self.password) {
            errors.insert("password".to_string(), msg);
        }
        if self.password != self.password2 {
            errors.insert("password".to_string(), "Password fields didn't match.".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn username_problem(username: &str) -> Option<String> {
    let len = username.chars().count();
    if len < MIN_USERNAME_LENGTH || len > MAX_USERNAME_LENGTH {
        return Some(format!(
            "Username must be between {MIN_USERNAME_LENGTH} and {MAX_USERNAME_LENGTH} characters."
        ));
    }
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_');
    if !username.chars().all(allowed) {
        return Some(
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters."
                .to_string(),
        );
    }
    None
}

fn password_problem(password: &str) -> Option<String> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Some(format!(
            "This password is too short. It must contain at least {MIN_PASSWORD_LENGTH} characters."
        ));
    }
    if password.chars().all(|c| c.is_ascii_digit()) {
        return Some("This password is entirely numeric.".to_string());
    }
    None
}

fn looks_like_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

pub fn hash_password(password: &str) -> Result<String, AccountError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AccountError::Hashing(e.to_string()))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!("Stored password hash is unreadable: {}", e);
            false
        }
    }
}

/// Role-gate, validate and persist a new account
pub async fn register(
    store: &dyn Store,
    caller: Option<&User>,
    request: RegistrationRequest,
) -> Result<User, AccountError> {
    let role = request.requested_role();
    admit(caller, role)?;
    create_account(store, request, role).await
}

/// Validate and persist without role-gating; used by `register` and the CLI bootstrap
pub async fn create_account(
    store: &dyn Store,
    request: RegistrationRequest,
    role: Role,
) -> Result<User, AccountError> {
    let mut errors = request.validate().err().unwrap_or_default();
    if !errors.contains_key("username")
        && store.find_user_by_username(&request.username).await?.is_some()
    {
        errors.insert(
            "username".to_string(),
            "A user with that username already exists.".to_string(),
        );
    }
    if !errors.is_empty() {
        return Err(AccountError::Invalid(errors));
    }

    let new_user = NewUser {
        username: request.username,
        email: request.email,
        first_name: request.first_name,
        last_name: request.last_name,
        password_hash: hash_password(&request.password)?,
        role,
    };

    let user = store.create_user(new_user).await?;
    info!("Created {} account '{}'", user.role, user.username);
    Ok(user)
}

/// Look up `username` and check `password` against its stored hash
pub async fn authenticate(store: &dyn Store, username: &str, password: &str) -> Result<User, AccountError> {
    let Some(user) = store.find_user_by_username(username).await? else {
        warn!("Login attempt for unknown user '{}'", username);
        return Err(AccountError::InvalidCredentials);
    };
    if !verify_password(password, &user.password_hash) {
        warn!("Login attempt with a wrong password for '{}'", username);
        return Err(AccountError::InvalidCredentials);
    }
    Ok(user)
}
