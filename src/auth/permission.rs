//! Permission checking for PinPin.
//!
//! Role-based access control over the `user < admin < founder` ladder.

use thiserror::Error;

use crate::db::{Role, User};

/// Permission-related errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PermissionError {
    /// User does not have sufficient permission.
    #[error("this action requires the {0} role or higher")]
    InsufficientRole(String),

    /// User is not authenticated.
    #[error("you must be logged in to do this")]
    NotAuthenticated,

    /// User account is not active.
    #[error("this account has been deactivated")]
    AccountInactive,

    /// Users may not change their own role.
    #[error("you cannot change your own role")]
    OwnRoleChange,

    /// Granting or revoking the founder role.
    #[error("only founders can grant or revoke the founder role")]
    FounderRoleChange,
}

/// Check if a user has the required permission level.
///
/// The user must be present, active, and hold at least `required`.
///
/// # Examples
///
/// ```
/// use pinpin::auth::permission::{check_permission, PermissionError};
/// use pinpin::db::Role;
///
/// assert!(matches!(
///     check_permission(None, Role::User),
///     Err(PermissionError::NotAuthenticated)
/// ));
/// ```
pub fn check_permission(user: Option<&User>, required: Role) -> Result<(), PermissionError> {
    let user = user.ok_or(PermissionError::NotAuthenticated)?;

    if !user.is_active {
        return Err(PermissionError::AccountInactive);
    }

    if !user.role.can_access(required) {
        return Err(PermissionError::InsufficientRole(
            required.display_name().to_string(),
        ));
    }

    Ok(())
}

/// Require at least the Admin role.
pub fn require_admin(user: Option<&User>) -> Result<(), PermissionError> {
    check_permission(user, Role::Admin)
}

/// Require the Founder role.
pub fn require_founder(user: Option<&User>) -> Result<(), PermissionError> {
    check_permission(user, Role::Founder)
}

/// Whether a role may use the maintenance bypass.
pub fn can_bypass_maintenance(role: Role) -> bool {
    role.is_privileged()
}

/// Whether a role may change maintenance settings.
pub fn can_manage_maintenance(role: Role) -> bool {
    role == Role::Founder
}

/// Whether a role may open the admin panel.
pub fn can_access_admin_panel(role: Role) -> bool {
    role.is_privileged()
}

/// Check that `actor` may move `target` to `new_role`.
///
/// Rules:
/// - the actor needs at least Admin
/// - nobody changes their own role
/// - only founders touch the founder role, in either direction
pub fn check_role_change(
    actor: &User,
    target: &User,
    new_role: Role,
) -> Result<(), PermissionError> {
    require_admin(Some(actor))?;

    if actor.id == target.id {
        return Err(PermissionError::OwnRoleChange);
    }

    let touches_founder = new_role == Role::Founder || target.role == Role::Founder;
    if touches_founder && actor.role != Role::Founder {
        return Err(PermissionError::FounderRoleChange);
    }

    Ok(())
}

/// Check that `actor` may delete the account `target`.
///
/// Admins may delete regular users and admins; founders can only be removed
/// by another founder. Self-deletion through the admin panel is refused.
pub fn check_user_delete(actor: &User, target: &User) -> Result<(), PermissionError> {
    require_admin(Some(actor))?;

    if actor.id == target.id {
        return Err(PermissionError::OwnRoleChange);
    }
    if target.role == Role::Founder && actor.role != Role::Founder {
        return Err(PermissionError::FounderRoleChange);
    }

    Ok(())
}
