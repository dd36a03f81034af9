//! Request DTOs for Web API.

use serde::Deserialize;
use validator::Validate;

use super::validation::{no_control_chars, not_empty_trimmed};

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// User registration request.
///
/// Field rules beyond presence are enforced by the registration service.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    #[validate(custom(function = "not_empty_trimmed"))]
    pub display_name: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Theme preference update.
#[derive(Debug, Deserialize)]
pub struct ThemeRequest {
    pub theme: String,
}

/// Maintenance on/off switch.
#[derive(Debug, Deserialize)]
pub struct SetEnabledRequest {
    pub enabled: bool,
}

/// Maintenance mode change.
#[derive(Debug, Deserialize)]
pub struct SetModeRequest {
    pub mode: String,
}

/// Maintenance message change. An empty message restores the default.
#[derive(Debug, Deserialize, Validate)]
pub struct SetMessageRequest {
    #[validate(
        length(max = 500, message = "Message must be at most 500 characters"),
        custom(function = "no_control_chars")
    )]
    pub message: String,
}

/// Activation key redemption.
#[derive(Debug, Deserialize)]
pub struct RedeemRequest {
    #[serde(default)]
    pub key: String,
}

/// Activation key minting.
#[derive(Debug, Deserialize, Validate)]
pub struct MintKeysRequest {
    #[validate(range(min = 1, max = 100, message = "Count must be between 1 and 100"))]
    pub count: usize,
}

/// Filter for the key listing.
#[derive(Debug, Default, Deserialize)]
pub struct KeyListQuery {
    #[serde(default)]
    pub used: Option<bool>,
}

/// Account creation from the admin panel.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    #[validate(custom(function = "not_empty_trimmed"))]
    pub display_name: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Defaults to `user`.
    #[serde(default)]
    pub role: Option<String>,
}

/// Role change from the admin panel.
#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: String,
}
