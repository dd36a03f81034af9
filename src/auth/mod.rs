//! Authentication module for PinPin.
//!
//! This module provides password hashing, user registration, role
//! resolution, and permission checks.

mod password;
pub mod permission;
mod registration;
mod resolver;
pub mod validation;

pub use password::{hash_password, validate_password, verify_password, PasswordError};
pub use permission::{
    can_access_admin_panel, can_bypass_maintenance, can_manage_maintenance, check_permission,
    check_role_change, check_user_delete, require_admin, require_founder, PermissionError,
};
pub use registration::{
    ensure_founder, register, register_with_role, RegistrationError, RegistrationRequest,
};
pub use resolver::{resolve_or_unprivileged, RoleResolver, UserRoleResolver};
pub use validation::ValidationError;

#[cfg(test)]
pub(crate) use resolver::test_support;
