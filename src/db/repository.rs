//! Queries against the `users` table.

use sqlx::{QueryBuilder, Sqlite};

use super::user::{NewUser, Role, User, UserUpdate};
use super::DbPool;
use crate::{PinpinError, Result};

const SELECT_USER: &str = "SELECT id, username, password, display_name, email, role, theme, \
     created_at, last_login, is_active FROM users";

pub struct UserRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> UserRepository<'a> {
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Insert and read the row back. A username that differs only in case
    /// from an existing one violates the unique index.
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        let id = sqlx::query(
            "INSERT INTO users (username, password, display_name, email, role)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&new_user.username)
        .bind(&new_user.password)
        .bind(&new_user.display_name)
        .bind(&new_user.email)
        .bind(new_user.role.as_str())
        .execute(self.pool)
        .await?
        .last_insert_rowid();

        self.get_by_id(id)
            .await?
            .ok_or_else(|| PinpinError::NotFound("user".to_string()))
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("{SELECT_USER} WHERE id = ?"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(user)
    }

    /// Case-insensitive lookup used by login.
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let user =
            sqlx::query_as::<_, User>(&format!("{SELECT_USER} WHERE username = ? COLLATE NOCASE"))
                .bind(username)
                .fetch_optional(self.pool)
                .await?;
        Ok(user)
    }

    /// Current role of an active account. Missing and deactivated accounts
    /// both give `None`.
    pub async fn get_role(&self, id: i64) -> Result<Option<Role>> {
        let stored: Option<String> =
            sqlx::query_scalar("SELECT role FROM users WHERE id = ? AND is_active = 1")
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        stored
            .map(|role| role.parse().map_err(PinpinError::Database))
            .transpose()
    }

    /// Apply the set fields of `update`. `None` when the user does not exist.
    pub async fn update(&self, id: i64, update: &UserUpdate) -> Result<Option<User>> {
        if update.is_empty() {
            return self.get_by_id(id).await;
        }

        let mut query = QueryBuilder::<Sqlite>::new("UPDATE users SET ");
        let mut columns = query.separated(", ");
        if let Some(password) = &update.password {
            columns.push("password = ").push_bind_unseparated(password.clone());
        }
        if let Some(display_name) = &update.display_name {
            columns
                .push("display_name = ")
                .push_bind_unseparated(display_name.clone());
        }
        if let Some(email) = &update.email {
            columns.push("email = ").push_bind_unseparated(email.clone());
        }
        if let Some(role) = update.role {
            columns.push("role = ").push_bind_unseparated(role.as_str());
        }
        if let Some(theme) = update.theme {
            columns.push("theme = ").push_bind_unseparated(theme.as_str());
        }
        if let Some(is_active) = update.is_active {
            columns.push("is_active = ").push_bind_unseparated(is_active);
        }
        query.push(" WHERE id = ").push_bind(id);

        let changed = query.build().execute(self.pool).await?.rows_affected();
        if changed == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    pub async fn update_last_login(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE users SET last_login = datetime('now') WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Plans and files go with the account through `ON DELETE CASCADE`.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let deleted = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?
            .rows_affected();
        Ok(deleted > 0)
    }

    /// Every account, inactive ones included, by username.
    pub async fn list_all(&self) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!("{SELECT_USER} ORDER BY username"))
            .fetch_all(self.pool)
            .await?;
        Ok(users)
    }

    pub async fn count_by_role(&self, role: Role) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = ? AND is_active = 1")
            .bind(role.as_str())
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    pub async fn username_exists(&self, username: &str) -> Result<bool> {
        let exists = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = ? COLLATE NOCASE)",
        )
        .bind(username)
        .fetch_one(self.pool)
        .await?;
        Ok(exists)
    }
}
