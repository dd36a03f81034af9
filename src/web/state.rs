//! Shared application state for handlers.

use std::sync::Arc;

use jsonwebtoken::{encode, EncodingKey, Header};

use crate::auth::UserRoleResolver;
use crate::config::Config;
use crate::db::{User, UserRepository};
use crate::file::{BlobStore, FileService};
use crate::maintenance::{MaintenanceObserver, SqliteConfigStore};
use crate::plan::PlanService;
use crate::{Database, Result};

use super::error::ApiError;
use super::middleware::JwtClaims;

/// Application state shared across handlers.
pub struct AppState {
    pub db: Database,
    pub encoding_key: EncodingKey,
    /// Access token lifetime in seconds.
    pub access_token_expiry: u64,
    /// The maintenance document.
    pub maintenance_store: Arc<SqliteConfigStore>,
    /// Live view of the maintenance document.
    pub maintenance: MaintenanceObserver,
    pub roles: UserRoleResolver,
    pub blobs: BlobStore,
    /// Upload limit in bytes.
    pub max_upload_size: u64,
    pub free_storage_limit: i64,
    pub premium_storage_limit: i64,
    /// Base URL for share links.
    pub public_url: String,
    pub bypass_key: String,
}

impl AppState {
    /// Build the state and start observing the maintenance document.
    ///
    /// Must be called inside a tokio runtime.
    pub fn new(db: Database, config: &Config) -> Result<Self> {
        let maintenance_store = Arc::new(SqliteConfigStore::new(db.pool().clone()));
        let maintenance = MaintenanceObserver::activate(maintenance_store.clone());
        let blobs = BlobStore::new(&config.files.storage_path)?;

        Ok(Self {
            roles: UserRoleResolver::new(db.pool().clone()),
            db,
            encoding_key: EncodingKey::from_secret(config.web.jwt_secret.as_bytes()),
            access_token_expiry: config.web.jwt_access_token_expiry_secs,
            maintenance_store,
            maintenance,
            blobs,
            max_upload_size: config.files.max_upload_size_mb * 1024 * 1024,
            free_storage_limit: config.plans.free_storage_bytes(),
            premium_storage_limit: config.plans.premium_storage_bytes(),
            public_url: config.web.public_url.clone(),
            bypass_key: config.maintenance.bypass_key.clone(),
        })
    }

    /// Generate an access token for a user.
    pub fn generate_access_token(&self, user: &User) -> std::result::Result<String, ApiError> {
        let now = chrono::Utc::now().timestamp() as u64;
        let claims = JwtClaims {
            sub: user.id,
            username: user.username.clone(),
            role: user.role.as_str().to_string(),
            iat: now,
            exp: now + self.access_token_expiry,
            jti: uuid::Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to encode JWT: {}", e);
            ApiError::internal("Failed to generate token")
        })
    }

    /// Load the caller's account. Deleted and deactivated accounts are rejected.
    pub async fn current_user(&self, claims: &JwtClaims) -> std::result::Result<User, ApiError> {
        let user = UserRepository::new(self.db.pool())
            .get_by_id(claims.sub)
            .await?
            .ok_or_else(|| ApiError::unauthorized("User no longer exists"))?;
        if !user.is_active {
            return Err(ApiError::forbidden("Account is disabled"));
        }
        Ok(user)
    }

    pub fn file_service(&self) -> FileService<'_> {
        FileService::new(self.db.pool(), &self.blobs, self.max_upload_size)
    }

    pub fn plan_service(&self) -> PlanService<'_> {
        PlanService::new(self.db.pool(), self.premium_storage_limit)
    }
}
