//! Admin panel handlers for user management.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::auth::{
    check_role_change, check_user_delete, register_with_role, require_admin, PermissionError,
    RegistrationRequest,
};
use crate::db::{Role, User, UserRepository, UserUpdate};
use crate::file::FileRepository;
use crate::web::dto::{
    AdminUserResponse, ApiResponse, CreateUserRequest, UpdateRoleRequest, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::middleware::{AuthUser, JwtClaims};
use crate::web::state::AppState;

/// The caller, required to be admin or founder.
async fn admin_actor(state: &AppState, claims: &JwtClaims) -> Result<User, ApiError> {
    let actor = state.current_user(claims).await?;
    require_admin(Some(&actor))?;
    Ok(actor)
}

async fn load_user(state: &AppState, user_id: i64) -> Result<User, ApiError> {
    UserRepository::new(state.db.pool())
        .get_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))
}

fn parse_role(role: &str) -> Result<Role, ApiError> {
    role.parse()
        .map_err(|_| ApiError::bad_request("Role must be 'user', 'admin' or 'founder'"))
}

/// GET /api/admin/users - All accounts.
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
) -> Result<Json<ApiResponse<Vec<AdminUserResponse>>>, ApiError> {
    admin_actor(&state, &claims).await?;
    let users = UserRepository::new(state.db.pool()).list_all().await?;
    Ok(Json(ApiResponse::new(
        users.iter().map(AdminUserResponse::from).collect(),
    )))
}

/// POST /api/admin/users - Create an account.
///
/// Creating a founder requires a founder.
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    ValidatedJson(req): ValidatedJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AdminUserResponse>>), ApiError> {
    let actor = admin_actor(&state, &claims).await?;
    let role = match req.role.as_deref() {
        Some(role) => parse_role(role)?,
        None => Role::User,
    };
    if role == Role::Founder && !actor.is_founder() {
        return Err(PermissionError::FounderRoleChange.into());
    }

    let mut request =
        RegistrationRequest::new(&req.username, &req.password, req.display_name.trim());
    if let Some(email) = req.email.filter(|e| !e.trim().is_empty()) {
        request = request.with_email(email);
    }
    let user =
        register_with_role(state.db.pool(), request, role, state.free_storage_limit).await?;

    tracing::info!(
        actor_id = actor.id,
        user_id = user.id,
        role = %role,
        "User created from admin panel"
    );
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(AdminUserResponse::from(&user))),
    ))
}

/// DELETE /api/admin/users/:id
///
/// File records go with the account; their blobs are removed afterwards.
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(user_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let actor = admin_actor(&state, &claims).await?;
    let target = load_user(&state, user_id).await?;
    check_user_delete(&actor, &target)?;

    let files = FileRepository::new(state.db.pool())
        .list_by_owner(target.id)
        .await?;
    UserRepository::new(state.db.pool()).delete(target.id).await?;
    for file in &files {
        if let Err(e) = state.blobs.delete(&file.storage_path) {
            tracing::warn!(file_id = file.id, error = %e, "Failed to remove blob of deleted user");
        }
    }

    tracing::info!(
        actor_id = actor.id,
        user_id = target.id,
        files = files.len(),
        "User deleted"
    );
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/admin/users/:id/role
pub async fn update_role(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(user_id): Path<i64>,
    Json(req): Json<UpdateRoleRequest>,
) -> Result<Json<ApiResponse<AdminUserResponse>>, ApiError> {
    let actor = admin_actor(&state, &claims).await?;
    let target = load_user(&state, user_id).await?;
    let role = parse_role(&req.role)?;
    check_role_change(&actor, &target, role)?;

    let updated = UserRepository::new(state.db.pool())
        .update(target.id, &UserUpdate::new().role(role))
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    tracing::info!(
        actor_id = actor.id,
        user_id = updated.id,
        from = %target.role,
        to = %role,
        "Role changed"
    );
    Ok(Json(ApiResponse::new(AdminUserResponse::from(&updated))))
}
