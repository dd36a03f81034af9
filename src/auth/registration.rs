//! Account creation.
//!
//! Every account gets its free plan record in the same call, so plan lookups
//! can treat a missing record as a broken invariant.

use thiserror::Error;
use tracing::info;

use crate::auth::validation::{validate_registration, ValidationError};
use crate::auth::{hash_password, PasswordError};
use crate::db::{DbPool, NewUser, Role, User, UserRepository};
use crate::plan::PlanRepository;
use crate::PinpinError;

#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Taken, ignoring case.
    #[error("username already exists")]
    UsernameExists,

    #[error("password error: {0}")]
    Password(#[from] PasswordError),

    #[error("database error: {0}")]
    Database(String),
}

impl From<PinpinError> for RegistrationError {
    fn from(err: PinpinError) -> Self {
        match err {
            PinpinError::Database(msg) => RegistrationError::Database(msg),
            other => RegistrationError::Database(other.to_string()),
        }
    }
}

/// Sign-up form as submitted; validated by [`register`].
#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    pub username: String,
    /// Plain text, hashed before storage.
    pub password: String,
    pub display_name: String,
    pub email: Option<String>,
}

impl RegistrationRequest {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            display_name: display_name.into(),
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// Sign up with the `user` role. The account starts on the free plan,
/// limited to `free_storage_limit` bytes.
pub async fn register(
    pool: &DbPool,
    request: RegistrationRequest,
    free_storage_limit: i64,
) -> Result<User, RegistrationError> {
    register_with_role(pool, request, Role::User, free_storage_limit).await
}

/// Create an account holding `role`. The admin panel goes through here; who
/// may hand out which role is checked by the caller.
pub async fn register_with_role(
    pool: &DbPool,
    request: RegistrationRequest,
    role: Role,
    free_storage_limit: i64,
) -> Result<User, RegistrationError> {
    let RegistrationRequest {
        username,
        password,
        display_name,
        email,
    } = request;
    validate_registration(&username, &password, &display_name, email.as_deref())?;

    if UserRepository::new(pool).username_exists(&username).await? {
        return Err(RegistrationError::UsernameExists);
    }

    let mut new_user =
        NewUser::new(username, hash_password(&password)?, display_name.trim()).with_role(role);
    if let Some(email) = email.filter(|e| !e.is_empty()) {
        new_user = new_user.with_email(email);
    }

    let user = create_account(pool, &new_user, free_storage_limit).await?;
    info!(
        username = %user.username,
        user_id = user.id,
        role = %role,
        "New user registered"
    );
    Ok(user)
}

/// Bootstrap the first founder. Nothing happens once any active founder
/// exists, in which case `None` is returned.
pub async fn ensure_founder(
    pool: &DbPool,
    username: &str,
    password: &str,
    free_storage_limit: i64,
) -> Result<Option<User>, RegistrationError> {
    if UserRepository::new(pool).count_by_role(Role::Founder).await? > 0 {
        return Ok(None);
    }

    let new_user = NewUser::new(username, hash_password(password)?, username).with_role(Role::Founder);
    let user = create_account(pool, &new_user, free_storage_limit).await?;
    info!(username = %user.username, user_id = user.id, "Founder account created");
    Ok(Some(user))
}

/// Insert the user and its free plan record.
async fn create_account(
    pool: &DbPool,
    new_user: &NewUser,
    free_storage_limit: i64,
) -> Result<User, RegistrationError> {
    let user = UserRepository::new(pool).create(new_user).await?;
    PlanRepository::new(pool)
        .create_for_user(user.id, free_storage_limit)
        .await?;
    Ok(user)
}
