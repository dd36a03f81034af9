//! Web server for PinPin.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;

use crate::config::{Config, WebConfig};
use crate::maintenance::SqliteConfigStore;
use crate::{Database, PinpinError, Result};

use super::middleware::{JwtState, RateLimitState};
use super::router::create_router_with_limits;
use super::state::AppState;

/// Web server for the API.
pub struct WebServer {
    addr: SocketAddr,
    app_state: Arc<AppState>,
    jwt_state: Arc<JwtState>,
    limits: Arc<RateLimitState>,
    web_config: WebConfig,
    refresh_interval: Duration,
}

impl WebServer {
    /// Create a new web server.
    ///
    /// Starts observing the maintenance document, so this must run inside a
    /// tokio runtime.
    pub fn new(config: &Config, db: Database) -> Result<Self> {
        let addr = format!("{}:{}", config.web.host, config.web.port)
            .parse()
            .map_err(|e| PinpinError::Config(format!("invalid web server address: {e}")))?;

        let app_state = AppState::new(db, config)?;
        tracing::info!("File storage at: {}", config.files.storage_path);

        Ok(Self {
            addr,
            app_state: Arc::new(app_state),
            jwt_state: Arc::new(JwtState::new(&config.web.jwt_secret)),
            limits: Arc::new(RateLimitState::new(
                config.web.login_rate_limit,
                config.web.redeem_rate_limit,
            )),
            web_config: config.web.clone(),
            refresh_interval: Duration::from_secs(config.maintenance.refresh_interval_secs.max(1)),
        })
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Shared state, for callers that need the services outside of HTTP.
    pub fn state(&self) -> Arc<AppState> {
        self.app_state.clone()
    }

    /// Periodically re-read the maintenance document.
    ///
    /// Picks up edits made by other processes sharing the database file.
    fn start_maintenance_refresh_task(store: Arc<SqliteConfigStore>, interval: Duration) {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // Skip the first immediate tick
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if !store.refresh().await {
                    tracing::debug!("Maintenance refresh skipped");
                }
            }
        });
    }

    fn build(self) -> (Router, Background) {
        let store = self.app_state.maintenance_store.clone();
        let router = create_router_with_limits(
            self.app_state,
            self.jwt_state,
            &self.web_config.cors_origins,
            self.limits.clone(),
        )
        .layer(CompressionLayer::new());

        (
            router,
            Background {
                addr: self.addr,
                store,
                limits: self.limits,
                refresh_interval: self.refresh_interval,
            },
        )
    }

    async fn bind(self) -> std::io::Result<(Router, TcpListener)> {
        let (router, background) = self.build();
        let listener = TcpListener::bind(background.addr).await?;

        // Background tasks start after a successful bind
        Self::start_maintenance_refresh_task(background.store, background.refresh_interval);
        background.limits.start_cleanup_task();
        tracing::info!(
            refresh_secs = background.refresh_interval.as_secs(),
            "Maintenance refresh task started"
        );

        Ok((router, listener))
    }

    /// Run the web server.
    pub async fn run(self) -> std::io::Result<()> {
        let (router, listener) = self.bind().await?;
        tracing::info!("Web server listening on http://{}", listener.local_addr()?);

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
    }

    /// Run the server and return the actual bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> std::io::Result<SocketAddr> {
        let (router, listener) = self.bind().await?;
        let local_addr = listener.local_addr()?;
        tracing::info!("Web server listening on http://{}", local_addr);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}

/// What the background tasks need once the router has taken the state.
struct Background {
    addr: SocketAddr,
    store: Arc<SqliteConfigStore>,
    limits: Arc<RateLimitState>,
    refresh_interval: Duration,
}
