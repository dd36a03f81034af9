//! Maintenance gate for API routes.
//!
//! Each request gets a fresh [`GateSession`]: the caller's role is resolved
//! from the database and the bypass header stands in for the bypass key.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::maintenance::{GateDecision, GateSession};
use crate::web::error::ApiError;
use crate::web::state::AppState;

use super::auth::OptionalAuthUser;

/// Request header that toggles the staff bypass on.
pub const BYPASS_HEADER: &str = "x-maintenance-bypass";

/// Response header describing an active maintenance window that did not
/// block the request: `warning` or `bypassed`.
pub const NOTICE_HEADER: &str = "x-maintenance-notice";

fn bypass_requested(headers: &HeaderMap) -> bool {
    headers
        .get(BYPASS_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| matches!(v.trim(), "1" | "true"))
}

/// Middleware applying the maintenance decision to the wrapped routes.
pub async fn maintenance_gate(
    State(state): State<Arc<AppState>>,
    OptionalAuthUser(claims): OptionalAuthUser,
    req: Request<Body>,
    next: Next,
) -> Response {
    let config = state.maintenance.config();
    if !config.enabled {
        return next.run(req).await;
    }

    let mut session = GateSession::new(state.bypass_key.clone());
    session
        .resolve_role(&state.roles, claims.as_ref().map(|c| c.sub))
        .await;
    if bypass_requested(req.headers()) {
        session.on_key(&state.bypass_key);
    }

    let notice = match session.render(&config) {
        GateDecision::Block => {
            tracing::debug!(
                user_id = claims.as_ref().map(|c| c.sub),
                path = %req.uri().path(),
                "Request blocked by maintenance"
            );
            return ApiError::service_unavailable(config.message).into_response();
        }
        GateDecision::Inform => "warning",
        GateDecision::Pass => "bypassed",
    };

    let mut response = next.run(req).await;
    response
        .headers_mut()
        .insert(NOTICE_HEADER, HeaderValue::from_static(notice));
    response
}
