//! Shared helpers for the web API tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum_test::TestServer;
use tempfile::TempDir;

use pinpin::auth::{register_with_role, RegistrationRequest};
use pinpin::config::Config;
use pinpin::maintenance::{ConfigStore, MaintenanceConfig, MaintenanceMode};
use pinpin::web::middleware::JwtState;
use pinpin::web::{create_router, AppState};
use pinpin::{Database, Role, User};

pub const PASSWORD: &str = "password123";

/// A router under test plus handles on its state.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    _dir: TempDir,
}

/// Test configuration with blobs under `dir`.
pub fn test_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.web.host = "127.0.0.1".to_string();
    config.web.port = 0;
    config.web.public_url = "https://cloud.test".to_string();
    config.web.jwt_secret = "test-secret-key-for-testing-only".to_string();
    config.web.login_rate_limit = 1000;
    config.web.redeem_rate_limit = 1000;
    config.files.storage_path = dir.path().join("files").to_string_lossy().into_owned();
    config.files.max_upload_size_mb = 1;
    config
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Build the app after letting the caller adjust the configuration.
    pub async fn with_config(adjust: impl FnOnce(&mut Config)) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let mut config = test_config(&dir);
        adjust(&mut config);

        let db = Database::open_in_memory()
            .await
            .expect("Failed to create test database");
        let state = Arc::new(AppState::new(db, &config).expect("Failed to create app state"));
        let jwt_state = Arc::new(JwtState::new(&config.web.jwt_secret));
        let router = create_router(state.clone(), jwt_state, &config.web);

        let mut observer = state.maintenance.watch();
        let _ = observer.wait_for(|s| !s.loading).await;

        Self {
            server: TestServer::new(router).expect("Failed to create test server"),
            state,
            _dir: dir,
        }
    }

    /// Create an account directly and return it with an access token.
    pub async fn user_with_role(&self, username: &str, role: Role) -> (User, String) {
        let user = register_with_role(
            self.state.db.pool(),
            RegistrationRequest::new(username, PASSWORD, username),
            role,
            self.state.free_storage_limit,
        )
        .await
        .expect("Failed to create user");
        let token = self
            .state
            .generate_access_token(&user)
            .expect("Failed to create token");
        (user, token)
    }

    pub async fn user(&self, username: &str) -> (User, String) {
        self.user_with_role(username, Role::User).await
    }

    /// Write the maintenance document and wait until the gate sees it.
    pub async fn set_maintenance(&self, enabled: bool, mode: MaintenanceMode, message: &str) {
        let config = MaintenanceConfig {
            enabled,
            mode,
            message: message.to_string(),
            last_updated: None,
        };
        self.state
            .maintenance_store
            .save(&config.to_document(chrono::Utc::now()))
            .await
            .expect("Failed to save maintenance config");
        self.wait_for_maintenance(|c| c.enabled == enabled && c.mode == mode)
            .await;
    }

    /// Wait until the observed maintenance config satisfies `check`.
    pub async fn wait_for_maintenance(&self, check: impl Fn(&MaintenanceConfig) -> bool) {
        let mut rx = self.state.maintenance.watch();
        tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|s| check(&s.config)))
            .await
            .expect("Timed out waiting for maintenance state")
            .expect("Maintenance observer stopped");
    }
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}
