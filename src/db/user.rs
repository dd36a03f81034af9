//! Accounts, their role on the `User < Admin < Founder` ladder and the UI
//! theme they picked.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    /// Sees the admin panel and may pass the maintenance gate with the bypass
    /// header.
    Admin,
    /// Only role allowed to edit maintenance settings or mint keys.
    Founder,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::User, Role::Admin, Role::Founder];

    /// Stored and serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::Founder => "founder",
        }
    }

    /// Label for the admin panel.
    pub fn display_name(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Admin => "Admin",
            Role::Founder => "Founder",
        }
    }

    /// ```
    /// use pinpin::db::Role;
    ///
    /// assert!(Role::Founder.can_access(Role::Admin));
    /// assert!(!Role::User.can_access(Role::Admin));
    /// ```
    pub fn can_access(&self, required: Role) -> bool {
        *self >= required
    }

    pub fn is_privileged(&self) -> bool {
        self.can_access(Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown role: {s}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Theme::Dark, Theme::Light]
            .into_iter()
            .find(|theme| theme.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown theme: {s}"))
    }
}

/// A row of the `users` table.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    /// Unique ignoring case.
    pub username: String,
    /// Argon2 PHC string, never the plain password.
    pub password: String,
    pub display_name: String,
    pub email: Option<String>,
    pub role: Role,
    pub theme: Theme,
    /// SQLite `datetime('now')` text, UTC.
    pub created_at: String,
    pub last_login: Option<String>,
    /// Inactive accounts cannot log in and resolve to no role.
    pub is_active: bool,
}

impl User {
    pub fn has_role(&self, required: Role) -> bool {
        self.role.can_access(required)
    }

    pub fn is_founder(&self) -> bool {
        self.role == Role::Founder
    }
}

impl<'r> FromRow<'r, SqliteRow> for User {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let role = row
            .try_get::<String, _>("role")?
            .parse::<Role>()
            .map_err(|e: String| sqlx::Error::ColumnDecode {
                index: "role".to_string(),
                source: e.into(),
            })?;
        // A stale theme value falls back to the default instead of hiding the user.
        let theme = row
            .try_get::<String, _>("theme")?
            .parse::<Theme>()
            .unwrap_or_default();

        Ok(User {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            password: row.try_get("password")?,
            display_name: row.try_get("display_name")?,
            email: row.try_get("email")?,
            role,
            theme,
            created_at: row.try_get("created_at")?,
            last_login: row.try_get("last_login")?,
            is_active: row.try_get("is_active")?,
        })
    }
}

/// Insert payload. `password` must already be hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub display_name: String,
    pub email: Option<String>,
    pub role: Role,
}

impl NewUser {
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
            role: Role::User,
        }
    }

    pub fn with_email(self, email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            ..self
        }
    }

    pub fn with_role(self, role: Role) -> Self {
        Self { role, ..self }
    }
}

/// Partial update; `None` leaves the column alone.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub password: Option<String>,
    pub display_name: Option<String>,
    /// `Some(None)` clears the address.
    pub email: Option<Option<String>>,
    pub role: Option<Role>,
    pub theme: Option<Theme>,
    pub is_active: Option<bool>,
}

impl UserUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn password(self, hash: impl Into<String>) -> Self {
        Self {
            password: Some(hash.into()),
            ..self
        }
    }

    pub fn display_name(self, display_name: impl Into<String>) -> Self {
        Self {
            display_name: Some(display_name.into()),
            ..self
        }
    }

    pub fn email(self, email: Option<String>) -> Self {
        Self {
            email: Some(email),
            ..self
        }
    }

    pub fn role(self, role: Role) -> Self {
        Self {
            role: Some(role),
            ..self
        }
    }

    pub fn theme(self, theme: Theme) -> Self {
        Self {
            theme: Some(theme),
            ..self
        }
    }

    pub fn is_active(self, is_active: bool) -> Self {
        Self {
            is_active: Some(is_active),
            ..self
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(
            self,
            UserUpdate {
                password: None,
                display_name: None,
                email: None,
                role: None,
                theme: None,
                is_active: None,
            }
        )
    }
}
