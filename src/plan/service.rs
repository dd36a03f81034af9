//! Key redemption and minting.

use thiserror::Error;
use tracing::{info, warn};

use super::key::{ActivationKey, KeyFormatError};
use super::repository::KeyRepository;
use super::types::UserPlan;
use crate::db::DbPool;
use crate::{PinpinError, Result};

/// Upper bound for one minting request.
pub const MAX_MINT_COUNT: usize = 100;

/// Why a redemption was refused.
#[derive(Error, Debug)]
pub enum RedeemError {
    #[error("Please enter a premium key")]
    Empty,

    #[error(transparent)]
    InvalidFormat(#[from] KeyFormatError),

    #[error("Premium key not found")]
    NotFound,

    #[error("This key has already been used")]
    AlreadyUsed,

    #[error("Error validating key. Please try again.")]
    Backend(#[source] PinpinError),
}

impl From<sqlx::Error> for RedeemError {
    fn from(e: sqlx::Error) -> Self {
        RedeemError::Backend(PinpinError::Database(e.to_string()))
    }
}

/// Plan upgrades through activation keys.
pub struct PlanService<'a> {
    pool: &'a DbPool,
    premium_storage_limit: i64,
}

impl<'a> PlanService<'a> {
    pub fn new(pool: &'a DbPool, premium_storage_limit: i64) -> Self {
        Self {
            pool,
            premium_storage_limit,
        }
    }

    /// Redeem `input` for `user_id`.
    ///
    /// The input is trimmed and format-checked before touching the database.
    /// Marking the key used and upgrading the plan happen in one transaction;
    /// the key is claimed with a conditional update, so of two concurrent
    /// redemptions exactly one succeeds.
    pub async fn redeem(
        &self,
        user_id: i64,
        input: &str,
    ) -> std::result::Result<UserPlan, RedeemError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(RedeemError::Empty);
        }
        let key = ActivationKey::parse(input)?;

        let mut tx = self.pool.begin().await?;

        let claimed: Option<String> = sqlx::query_scalar(
            "UPDATE activation_keys SET used = 1, used_by = ?, used_at = datetime('now')
             WHERE key = ? AND used = 0
             RETURNING key",
        )
        .bind(user_id)
        .bind(key.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        if claimed.is_none() {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM activation_keys WHERE key = ?)")
                    .bind(key.as_str())
                    .fetch_one(&mut *tx)
                    .await?;
            tx.rollback().await?;

            warn!(user_id, key = %key, exists, "Activation key rejected");
            return Err(if exists {
                RedeemError::AlreadyUsed
            } else {
                RedeemError::NotFound
            });
        }

        let plan = sqlx::query_as::<_, UserPlan>(
            "INSERT INTO user_plans (user_id, plan_type, storage_limit, storage_used, validated_at)
             VALUES (?, 'premium', ?, 0, datetime('now'))
             ON CONFLICT(user_id) DO UPDATE SET
                 plan_type = 'premium',
                 storage_limit = excluded.storage_limit,
                 validated_at = excluded.validated_at
             RETURNING user_id, plan_type, storage_limit, storage_used, validated_at",
        )
        .bind(user_id)
        .bind(self.premium_storage_limit)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(user_id, key = %key, "Premium plan activated");
        Ok(plan)
    }

    /// Generate and store `count` fresh keys.
    pub async fn mint_keys(&self, created_by: i64, count: usize) -> Result<Vec<ActivationKey>> {
        if count == 0 || count > MAX_MINT_COUNT {
            return Err(PinpinError::Validation(format!(
                "key count must be between 1 and {MAX_MINT_COUNT}"
            )));
        }

        let repo = KeyRepository::new(self.pool);
        let mut keys = Vec::with_capacity(count);
        while keys.len() < count {
            let key = ActivationKey::generate();
            // A collision just means another draw.
            if repo.create(&key, Some(created_by)).await? {
                keys.push(key);
            }
        }

        info!(created_by, count, "Activation keys minted");
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, NewUser, UserRepository};
    use crate::plan::{PlanRepository, PlanType};

    const FREE: i64 = 100 * 1024 * 1024;
    const PREMIUM: i64 = 1000 * 1024 * 1024;
    const KEY: &str = "PINPIN-AB12-CD34-EF56";

    async fn add_user(db: &Database, name: &str) -> i64 {
        let user = UserRepository::new(db.pool())
            .create(&NewUser::new(name, "pw", name))
            .await
            .unwrap();
        PlanRepository::new(db.pool())
            .create_for_user(user.id, FREE)
            .await
            .unwrap();
        user.id
    }

    async fn add_key(db: &Database, key: &str) {
        KeyRepository::new(db.pool())
            .create(&ActivationKey::parse(key).unwrap(), None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_redeem_upgrades_and_marks_used() {
        let db = Database::open_in_memory().await.unwrap();
        let user_id = add_user(&db, "alice").await;
        add_key(&db, KEY).await;
        PlanRepository::new(db.pool())
            .reserve(user_id, 42)
            .await
            .unwrap();

        let service = PlanService::new(db.pool(), PREMIUM);
        let plan = service.redeem(user_id, KEY).await.unwrap();

        assert_eq!(plan.plan_type, PlanType::Premium);
        assert_eq!(plan.storage_limit, PREMIUM);
        assert_eq!(plan.storage_used, 42);
        assert!(plan.validated_at.is_some());

        let record = KeyRepository::new(db.pool()).get(KEY).await.unwrap().unwrap();
        assert!(record.used);
        assert_eq!(record.used_by, Some(user_id));
        assert!(record.used_at.is_some());
    }

    #[tokio::test]
    async fn test_second_redemption_is_rejected() {
        let db = Database::open_in_memory().await.unwrap();
        let alice = add_user(&db, "alice").await;
        let bob = add_user(&db, "bob").await;
        add_key(&db, KEY).await;

        let service = PlanService::new(db.pool(), PREMIUM);
        service.redeem(alice, KEY).await.unwrap();

        let err = service.redeem(bob, KEY).await.unwrap_err();
        assert!(matches!(err, RedeemError::AlreadyUsed));
        assert_eq!(err.to_string(), "This key has already been used");

        let bob_plan = PlanRepository::new(db.pool()).get(bob).await.unwrap().unwrap();
        assert_eq!(bob_plan.plan_type, PlanType::Free);
    }

    #[tokio::test]
    async fn test_redeem_input_errors() {
        let db = Database::open_in_memory().await.unwrap();
        let user_id = add_user(&db, "alice").await;
        let service = PlanService::new(db.pool(), PREMIUM);

        let err = service.redeem(user_id, "   ").await.unwrap_err();
        assert_eq!(err.to_string(), "Please enter a premium key");

        let err = service.redeem(user_id, "PINPIN-1234").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid key format. Expected: PINPIN-XXXX-XXXX-XXXX"
        );

        let err = service.redeem(user_id, KEY).await.unwrap_err();
        assert!(matches!(err, RedeemError::NotFound));
        assert_eq!(err.to_string(), "Premium key not found");
    }

    #[tokio::test]
    async fn test_redeem_trims_input() {
        let db = Database::open_in_memory().await.unwrap();
        let user_id = add_user(&db, "alice").await;
        add_key(&db, KEY).await;

        let service = PlanService::new(db.pool(), PREMIUM);
        assert!(service.redeem(user_id, "  PINPIN-AB12-CD34-EF56\n").await.is_ok());
    }

    #[tokio::test]
    async fn test_lowercase_key_rejected_without_database() {
        let db = Database::open_in_memory().await.unwrap();
        let user_id = add_user(&db, "alice").await;
        db.pool().close().await;

        let service = PlanService::new(db.pool(), PREMIUM);
        let err = service
            .redeem(user_id, "pinpin-ab12-cd34-ef56")
            .await
            .unwrap_err();
        assert!(matches!(err, RedeemError::InvalidFormat(_)));

        // A well-formed key does need the database.
        let err = service.redeem(user_id, KEY).await.unwrap_err();
        assert!(matches!(err, RedeemError::Backend(_)));
    }

    #[tokio::test]
    async fn test_concurrent_redemptions_single_winner() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path().join("race.db")).await.unwrap();
        let alice = add_user(&db, "alice").await;
        let bob = add_user(&db, "bob").await;
        add_key(&db, KEY).await;

        let tasks: Vec<_> = [alice, bob]
            .into_iter()
            .map(|user_id| {
                let pool = db.pool().clone();
                tokio::spawn(async move {
                    PlanService::new(&pool, PREMIUM).redeem(user_id, KEY).await
                })
            })
            .collect();

        let mut wins = 0;
        let mut already_used = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => wins += 1,
                Err(RedeemError::AlreadyUsed) => already_used += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(wins, 1);
        assert_eq!(already_used, 1);
    }

    #[tokio::test]
    async fn test_mint_keys() {
        let db = Database::open_in_memory().await.unwrap();
        let founder = add_user(&db, "owner").await;
        let service = PlanService::new(db.pool(), PREMIUM);

        let keys = service.mint_keys(founder, 5).await.unwrap();
        assert_eq!(keys.len(), 5);

        let stored = KeyRepository::new(db.pool()).list(Some(false)).await.unwrap();
        assert_eq!(stored.len(), 5);
        assert!(stored.iter().all(|k| k.created_by == Some(founder)));

        assert!(matches!(
            service.mint_keys(founder, 0).await,
            Err(PinpinError::Validation(_))
        ));
        assert!(service.mint_keys(founder, MAX_MINT_COUNT + 1).await.is_err());
    }
}
