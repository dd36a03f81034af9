//! Role resolution.
//!
//! Maps a user identity to its role. Callers that need a yes/no answer go
//! through [`resolve_or_unprivileged`], which treats every failure as the
//! lowest role.

use std::future::Future;

use tracing::warn;

use crate::db::{DbPool, Role, UserRepository};
use crate::{PinpinError, Result};

/// Looks up the role of a user.
pub trait RoleResolver: Send + Sync {
    /// Resolve the role of `user_id`.
    fn resolve(&self, user_id: i64) -> impl Future<Output = Result<Role>> + Send;
}

/// Resolver backed by the users table.
///
/// Unknown or deactivated users resolve to an error.
#[derive(Clone)]
pub struct UserRoleResolver {
    pool: DbPool,
}

impl UserRoleResolver {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl RoleResolver for UserRoleResolver {
    async fn resolve(&self, user_id: i64) -> Result<Role> {
        UserRepository::new(&self.pool)
            .get_role(user_id)
            .await?
            .ok_or_else(|| PinpinError::NotFound(format!("active user {user_id}")))
    }
}

/// Resolve a role, failing closed.
///
/// Any resolver error yields [`Role::User`].
pub async fn resolve_or_unprivileged<R: RoleResolver>(resolver: &R, user_id: i64) -> Role {
    match resolver.resolve(user_id).await {
        Ok(role) => role,
        Err(e) => {
            warn!(user_id, error = %e, "Role resolution failed, treating as unprivileged");
            Role::User
        }
    }
}
