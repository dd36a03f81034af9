//! Sign-up field rules.
//!
//! Usernames are ASCII, 3 to 32 characters, from `[A-Za-z0-9_.-]`, and may not
//! collide with a reserved name. Lengths of display names count characters.

use thiserror::Error;

use super::password::{MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH};

pub const MIN_USERNAME_LENGTH: usize = 3;
pub const MAX_USERNAME_LENGTH: usize = 32;
pub const MAX_DISPLAY_NAME_LENGTH: usize = 50;
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Names that would be confusing next to staff accounts or public routes.
const RESERVED_USERNAMES: &[&str] = &[
    "admin",
    "administrator",
    "founder",
    "root",
    "system",
    "support",
    "pinpin",
    "share",
    "null",
    "undefined",
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("username must be at least {MIN_USERNAME_LENGTH} characters")]
    UsernameTooShort,
    #[error("username must be at most {MAX_USERNAME_LENGTH} characters")]
    UsernameTooLong,
    #[error("username can only contain letters, digits, '_', '-' and '.'")]
    UsernameInvalidChars,
    #[error("this username is reserved")]
    UsernameReserved,
    #[error("password must be at least {MIN_PASSWORD_LENGTH} characters")]
    PasswordTooShort,
    #[error("password must be at most {MAX_PASSWORD_LENGTH} characters")]
    PasswordTooLong,
    #[error("password cannot be the same as username")]
    PasswordSameAsUsername,
    #[error("display name cannot be empty")]
    DisplayNameEmpty,
    #[error("display name must be at most {MAX_DISPLAY_NAME_LENGTH} characters")]
    DisplayNameTooLong,
    #[error("display name contains invalid characters")]
    DisplayNameInvalidChars,
    #[error("email must be at most {MAX_EMAIL_LENGTH} characters")]
    EmailTooLong,
    #[error("invalid email format")]
    EmailInvalidFormat,
}

type Check = Result<(), ValidationError>;

fn ensure(ok: bool, err: ValidationError) -> Check {
    if ok {
        Ok(())
    } else {
        Err(err)
    }
}

pub fn is_reserved_username(username: &str) -> bool {
    RESERVED_USERNAMES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(username))
}

/// ```
/// use pinpin::auth::validation::validate_username;
///
/// assert!(validate_username("jane.doe").is_ok());
/// assert!(validate_username("ab").is_err());
/// assert!(validate_username("founder").is_err());
/// ```
pub fn validate_username(username: &str) -> Check {
    let allowed = |c: char| c.is_ascii_alphanumeric() || "_-.".contains(c);

    ensure(
        username.len() >= MIN_USERNAME_LENGTH,
        ValidationError::UsernameTooShort,
    )?;
    ensure(
        username.len() <= MAX_USERNAME_LENGTH,
        ValidationError::UsernameTooLong,
    )?;
    ensure(
        username.chars().all(allowed),
        ValidationError::UsernameInvalidChars,
    )?;
    ensure(
        !is_reserved_username(username),
        ValidationError::UsernameReserved,
    )
}

/// Password rules for a new account. The password may not equal the
/// username, ignoring ASCII case.
pub fn validate_registration_password(password: &str, username: Option<&str>) -> Check {
    ensure(
        password.len() >= MIN_PASSWORD_LENGTH,
        ValidationError::PasswordTooShort,
    )?;
    ensure(
        password.len() <= MAX_PASSWORD_LENGTH,
        ValidationError::PasswordTooLong,
    )?;
    ensure(
        !username.is_some_and(|name| password.eq_ignore_ascii_case(name)),
        ValidationError::PasswordSameAsUsername,
    )
}

pub fn validate_display_name(display_name: &str) -> Check {
    ensure(
        !display_name.trim().is_empty(),
        ValidationError::DisplayNameEmpty,
    )?;
    ensure(
        display_name.chars().count() <= MAX_DISPLAY_NAME_LENGTH,
        ValidationError::DisplayNameTooLong,
    )?;
    ensure(
        !display_name.chars().any(char::is_control),
        ValidationError::DisplayNameInvalidChars,
    )
}

/// Shape check only: `local@domain.tld` without whitespace. Empty means the
/// user left the field out.
pub fn validate_email(email: &str) -> Check {
    if email.is_empty() {
        return Ok(());
    }
    ensure(email.len() <= MAX_EMAIL_LENGTH, ValidationError::EmailTooLong)?;

    let well_formed = !email.contains(char::is_whitespace)
        && email.split_once('@').is_some_and(|(local, domain)| {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && domain.split('.').all(|label| !label.is_empty())
        });
    ensure(well_formed, ValidationError::EmailInvalidFormat)
}

/// Check every sign-up field, stopping at the first failure.
pub fn validate_registration(
    username: &str,
    password: &str,
    display_name: &str,
    email: Option<&str>,
) -> Check {
    validate_username(username)?;
    validate_registration_password(password, Some(username))?;
    validate_display_name(display_name)?;
    email.map_or(Ok(()), validate_email)
}
