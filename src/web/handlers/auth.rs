//! Authentication handlers.

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::auth::{register as register_user, verify_password, RegistrationRequest};
use crate::db::UserRepository;
use crate::plan::PlanRepository;
use crate::web::dto::{
    ApiResponse, LoginRequest, LoginResponse, MeResponse, RegisterRequest, UserInfo,
    ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::middleware::AuthUser;
use crate::web::state::AppState;

const INVALID_CREDENTIALS: &str = "Invalid username or password";

/// POST /api/auth/register - Create an account and sign in.
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    let mut request = RegistrationRequest::new(&req.username, &req.password, req.display_name.trim());
    if let Some(email) = req.email.filter(|e| !e.trim().is_empty()) {
        request = request.with_email(email);
    }

    let user = register_user(state.db.pool(), request, state.free_storage_limit).await?;
    let access_token = state.generate_access_token(&user)?;

    Ok(Json(ApiResponse::new(LoginResponse {
        access_token,
        expires_in: state.access_token_expiry,
        user: UserInfo::from(&user),
    })))
}

/// POST /api/auth/login - Exchange credentials for an access token.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    if req.username.is_empty() || req.password.is_empty() {
        return Err(ApiError::bad_request("Username and password are required"));
    }

    let repo = UserRepository::new(state.db.pool());
    let user = repo
        .get_by_username(&req.username)
        .await?
        .ok_or_else(|| ApiError::unauthorized(INVALID_CREDENTIALS))?;

    verify_password(&req.password, &user.password).map_err(|_| {
        tracing::info!(username = %req.username, "Failed login attempt");
        ApiError::unauthorized(INVALID_CREDENTIALS)
    })?;

    if !user.is_active {
        return Err(ApiError::forbidden("Account is disabled"));
    }

    let access_token = state.generate_access_token(&user)?;
    if let Err(e) = repo.update_last_login(user.id).await {
        tracing::warn!(user_id = user.id, error = %e, "Failed to record last login");
    }
    tracing::info!(user_id = user.id, username = %user.username, "User logged in");

    Ok(Json(ApiResponse::new(LoginResponse {
        access_token,
        expires_in: state.access_token_expiry,
        user: UserInfo::from(&user),
    })))
}

/// GET /api/auth/me - Profile, plan and theme of the caller.
pub async fn me(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
) -> Result<Json<ApiResponse<MeResponse>>, ApiError> {
    let user = state.current_user(&claims).await?;
    let plan = PlanRepository::new(state.db.pool()).get(user.id).await?;

    Ok(Json(ApiResponse::new(MeResponse::new(&user, plan.as_ref()))))
}
