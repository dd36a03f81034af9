//! Per-user preference handlers.

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::db::{Theme, UserRepository, UserUpdate};
use crate::web::dto::{ApiResponse, ThemeRequest, UserInfo};
use crate::web::error::ApiError;
use crate::web::middleware::AuthUser;
use crate::web::state::AppState;

/// PUT /api/me/theme - Switch between the dark and light theme.
pub async fn update_theme(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Json(req): Json<ThemeRequest>,
) -> Result<Json<ApiResponse<UserInfo>>, ApiError> {
    let theme: Theme = req
        .theme
        .parse()
        .map_err(|_| ApiError::bad_request("Theme must be 'dark' or 'light'"))?;

    let user = state.current_user(&claims).await?;
    let updated = UserRepository::new(state.db.pool())
        .update(user.id, &UserUpdate::new().theme(theme))
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    tracing::debug!(user_id = updated.id, theme = %theme, "Theme updated");
    Ok(Json(ApiResponse::new(UserInfo::from(&updated))))
}
