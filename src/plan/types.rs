//! Plan records.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

/// Storage plan tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanType {
    #[default]
    Free,
    Premium,
}

impl PlanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanType::Free => "free",
            PlanType::Premium => "premium",
        }
    }
}

impl fmt::Display for PlanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(PlanType::Free),
            "premium" => Ok(PlanType::Premium),
            _ => Err(format!("unknown plan type: {s}")),
        }
    }
}

/// A user's plan and storage usage, in bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPlan {
    pub user_id: i64,
    pub plan_type: PlanType,
    pub storage_limit: i64,
    pub storage_used: i64,
    /// When a premium key was last redeemed.
    pub validated_at: Option<String>,
}

impl UserPlan {
    pub fn remaining(&self) -> i64 {
        (self.storage_limit - self.storage_used).max(0)
    }

    pub fn is_premium(&self) -> bool {
        self.plan_type == PlanType::Premium
    }
}

impl<'r> FromRow<'r, SqliteRow> for UserPlan {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let plan_type: String = row.try_get("plan_type")?;
        Ok(UserPlan {
            user_id: row.try_get("user_id")?,
            plan_type: plan_type
                .parse()
                .map_err(|e: String| sqlx::Error::ColumnDecode {
                    index: "plan_type".to_string(),
                    source: e.into(),
                })?,
            storage_limit: row.try_get("storage_limit")?,
            storage_used: row.try_get("storage_used")?,
            validated_at: row.try_get("validated_at")?,
        })
    }
}

/// A stored activation key.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct KeyRecord {
    pub key: String,
    pub used: bool,
    pub used_by: Option<i64>,
    pub used_at: Option<String>,
    pub created_by: Option<i64>,
    pub created_at: String,
}
