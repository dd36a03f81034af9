//! Router configuration for Web API.

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::WebConfig;

use super::handlers::{self, maintenance};
use super::middleware::{
    create_cors_layer, jwt_auth, maintenance_gate, rate_limit, Bucket, JwtState, RateLimitState,
};
use super::state::AppState;

/// Multipart framing on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Create the main API router.
///
/// Auth, health and maintenance routes stay reachable during maintenance;
/// everything else sits behind the maintenance gate.
pub fn create_router(
    app_state: Arc<AppState>,
    jwt_state: Arc<JwtState>,
    config: &WebConfig,
) -> Router {
    let limits = Arc::new(RateLimitState::new(
        config.login_rate_limit,
        config.redeem_rate_limit,
    ));
    create_router_with_limits(app_state, jwt_state, &config.cors_origins, limits)
}

/// Like [`create_router`], with a caller-owned rate limit registry.
pub fn create_router_with_limits(
    app_state: Arc<AppState>,
    jwt_state: Arc<JwtState>,
    cors_origins: &[String],
    limits: Arc<RateLimitState>,
) -> Router<()> {
    let login_limits = limits.clone();
    let auth_routes = Router::new()
        .route(
            "/login",
            post(handlers::login).layer(middleware::from_fn(move |req, next| {
                rate_limit(login_limits.clone(), Bucket::Login, req, next)
            })),
        )
        .route("/register", post(handlers::register))
        .route("/me", get(handlers::me));

    let maintenance_routes = Router::new()
        .route("/maintenance", get(maintenance::status))
        .route("/maintenance/stream", get(maintenance::status_stream))
        .route("/admin/maintenance", get(maintenance::editor))
        .route("/admin/maintenance/enabled", put(maintenance::set_enabled))
        .route("/admin/maintenance/mode", put(maintenance::set_mode))
        .route("/admin/maintenance/message", put(maintenance::set_message));

    let upload_limit = usize::try_from(app_state.max_upload_size)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);
    let redeem_limits = limits;
    let gated_routes = Router::new()
        .route("/me/theme", put(handlers::update_theme))
        .route("/plan", get(handlers::get_plan))
        .route(
            "/plan/redeem",
            post(handlers::redeem).layer(middleware::from_fn(move |req, next| {
                rate_limit(redeem_limits.clone(), Bucket::Redeem, req, next)
            })),
        )
        .route(
            "/files",
            get(handlers::list_files)
                .post(handlers::upload_file)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/files/:id",
            get(handlers::get_file).delete(handlers::delete_file),
        )
        .route("/files/:id/download", get(handlers::download_file))
        .route("/files/:id/share", post(handlers::share_file))
        .route("/share/:token", get(handlers::download_shared))
        .route(
            "/admin/users",
            get(handlers::list_users).post(handlers::create_user),
        )
        .route("/admin/users/:id", axum::routing::delete(handlers::delete_user))
        .route("/admin/users/:id/role", put(handlers::update_role))
        .route(
            "/admin/keys",
            get(handlers::list_keys).post(handlers::mint_keys),
        )
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            maintenance_gate,
        ));

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .merge(maintenance_routes)
        .merge(gated_routes);

    Router::new()
        .nest("/api", api_routes)
        .merge(create_health_router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins))
                .layer(middleware::from_fn(move |req, next| {
                    jwt_auth(jwt_state.clone(), req, next)
                })),
        )
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router<S: Clone + Send + Sync + 'static>() -> Router<S> {
    Router::new().route("/health", get(health_check))
}

async fn health_check() -> &'static str {
    "OK"
}
