//! Plan and activation-key repositories.

use super::key::ActivationKey;
use super::types::{KeyRecord, UserPlan};
use crate::db::DbPool;
use crate::{PinpinError, Result};

const PLAN_COLUMNS: &str = "user_id, plan_type, storage_limit, storage_used, validated_at";
const KEY_COLUMNS: &str = "key, used, used_by, used_at, created_by, created_at";

/// Repository for per-user plan records.
pub struct PlanRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> PlanRepository<'a> {
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create the free plan for a new user. Existing plans are left alone.
    pub async fn create_for_user(&self, user_id: i64, storage_limit: i64) -> Result<UserPlan> {
        sqlx::query(
            "INSERT OR IGNORE INTO user_plans (user_id, plan_type, storage_limit, storage_used)
             VALUES (?, 'free', ?, 0)",
        )
        .bind(user_id)
        .bind(storage_limit)
        .execute(self.pool)
        .await
        .map_err(|e| PinpinError::Database(e.to_string()))?;

        self.get(user_id)
            .await?
            .ok_or_else(|| PinpinError::NotFound("plan".to_string()))
    }

    pub async fn get(&self, user_id: i64) -> Result<Option<UserPlan>> {
        let sql = format!("SELECT {PLAN_COLUMNS} FROM user_plans WHERE user_id = ?");
        let plan = sqlx::query_as::<_, UserPlan>(&sql)
            .bind(user_id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| PinpinError::Database(e.to_string()))?;
        Ok(plan)
    }

    /// Claim `bytes` of the user's quota.
    ///
    /// The check and the increment are one statement, so concurrent uploads
    /// cannot overrun the limit. Returns false when the quota would be
    /// exceeded (or the user has no plan).
    pub async fn reserve(&self, user_id: i64, bytes: i64) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE user_plans SET storage_used = storage_used + ?
             WHERE user_id = ? AND storage_used + ? <= storage_limit",
        )
        .bind(bytes)
        .bind(user_id)
        .bind(bytes)
        .execute(self.pool)
        .await
        .map_err(|e| PinpinError::Database(e.to_string()))?;
        Ok(result.rows_affected() == 1)
    }

    /// Give back `bytes` of the user's quota, never going below zero.
    pub async fn release(&self, user_id: i64, bytes: i64) -> Result<()> {
        sqlx::query(
            "UPDATE user_plans SET storage_used = MAX(0, storage_used - ?) WHERE user_id = ?",
        )
        .bind(bytes)
        .bind(user_id)
        .execute(self.pool)
        .await
        .map_err(|e| PinpinError::Database(e.to_string()))?;
        Ok(())
    }
}

/// Repository for activation keys.
pub struct KeyRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> KeyRepository<'a> {
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Store a new unused key. Returns false if the key already exists.
    pub async fn create(&self, key: &ActivationKey, created_by: Option<i64>) -> Result<bool> {
        let result =
            sqlx::query("INSERT OR IGNORE INTO activation_keys (key, created_by) VALUES (?, ?)")
                .bind(key.as_str())
                .bind(created_by)
                .execute(self.pool)
                .await
                .map_err(|e| PinpinError::Database(e.to_string()))?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn get(&self, key: &str) -> Result<Option<KeyRecord>> {
        let sql = format!("SELECT {KEY_COLUMNS} FROM activation_keys WHERE key = ?");
        let record = sqlx::query_as::<_, KeyRecord>(&sql)
            .bind(key)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| PinpinError::Database(e.to_string()))?;
        Ok(record)
    }

    /// List keys, newest first, optionally filtered by `used`.
    pub async fn list(&self, used: Option<bool>) -> Result<Vec<KeyRecord>> {
        let records = match used {
            Some(used) => {
                let sql = format!(
                    "SELECT {KEY_COLUMNS} FROM activation_keys WHERE used = ?
                     ORDER BY created_at DESC, key"
                );
                sqlx::query_as::<_, KeyRecord>(&sql)
                    .bind(used)
                    .fetch_all(self.pool)
                    .await
            }
            None => {
                let sql = format!(
                    "SELECT {KEY_COLUMNS} FROM activation_keys ORDER BY created_at DESC, key"
                );
                sqlx::query_as::<_, KeyRecord>(&sql).fetch_all(self.pool).await
            }
        }
        .map_err(|e| PinpinError::Database(e.to_string()))?;
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, NewUser, UserRepository};
    use crate::plan::PlanType;

    async fn setup() -> (Database, i64) {
        let db = Database::open_in_memory().await.unwrap();
        let user = UserRepository::new(db.pool())
            .create(&NewUser::new("alice", "pw", "Alice"))
            .await
            .unwrap();
        (db, user.id)
    }

    #[tokio::test]
    async fn test_create_for_user_is_idempotent() {
        let (db, user_id) = setup().await;
        let repo = PlanRepository::new(db.pool());

        let plan = repo.create_for_user(user_id, 1000).await.unwrap();
        assert_eq!(plan.plan_type, PlanType::Free);
        assert_eq!(plan.storage_limit, 1000);

        let again = repo.create_for_user(user_id, 5).await.unwrap();
        assert_eq!(again.storage_limit, 1000);
        assert!(repo.get(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reserve_respects_limit() {
        let (db, user_id) = setup().await;
        let repo = PlanRepository::new(db.pool());
        repo.create_for_user(user_id, 100).await.unwrap();

        assert!(repo.reserve(user_id, 60).await.unwrap());
        assert!(!repo.reserve(user_id, 41).await.unwrap());
        assert!(repo.reserve(user_id, 40).await.unwrap());
        assert_eq!(repo.get(user_id).await.unwrap().unwrap().storage_used, 100);

        // No plan, no quota.
        assert!(!repo.reserve(999, 1).await.unwrap());
    }

    #[tokio::test]
    async fn test_release_floors_at_zero() {
        let (db, user_id) = setup().await;
        let repo = PlanRepository::new(db.pool());
        repo.create_for_user(user_id, 100).await.unwrap();

        repo.reserve(user_id, 30).await.unwrap();
        repo.release(user_id, 10).await.unwrap();
        assert_eq!(repo.get(user_id).await.unwrap().unwrap().storage_used, 20);

        repo.release(user_id, 500).await.unwrap();
        assert_eq!(repo.get(user_id).await.unwrap().unwrap().storage_used, 0);
    }

    #[tokio::test]
    async fn test_key_create_and_list() {
        let (db, user_id) = setup().await;
        let repo = KeyRepository::new(db.pool());
        let key = ActivationKey::parse("PINPIN-AB12-CD34-EF56").unwrap();

        assert!(repo.create(&key, Some(user_id)).await.unwrap());
        assert!(!repo.create(&key, None).await.unwrap());

        let record = repo.get(key.as_str()).await.unwrap().unwrap();
        assert!(!record.used);
        assert_eq!(record.created_by, Some(user_id));
        assert!(repo.get("PINPIN-0000-0000-0000").await.unwrap().is_none());

        repo.create(&ActivationKey::generate(), None).await.unwrap();
        assert_eq!(repo.list(None).await.unwrap().len(), 2);
        assert_eq!(repo.list(Some(false)).await.unwrap().len(), 2);
        assert!(repo.list(Some(true)).await.unwrap().is_empty());
    }
}
