//! Plan and activation key handlers.

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::auth::require_founder;
use crate::plan::{KeyRecord, KeyRepository, PlanRepository};
use crate::web::dto::{
    ApiResponse, KeyListQuery, MintKeysRequest, MintKeysResponse, PlanResponse, RedeemRequest,
    ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::middleware::AuthUser;
use crate::web::state::AppState;

/// GET /api/plan - The caller's plan and storage usage.
pub async fn get_plan(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
) -> Result<Json<ApiResponse<PlanResponse>>, ApiError> {
    let user = state.current_user(&claims).await?;
    let plan = PlanRepository::new(state.db.pool())
        .get(user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Plan not found"))?;

    Ok(Json(ApiResponse::new(PlanResponse::from(&plan))))
}

/// POST /api/plan/redeem - Upgrade to premium with an activation key.
pub async fn redeem(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Json(req): Json<RedeemRequest>,
) -> Result<Json<ApiResponse<PlanResponse>>, ApiError> {
    let user = state.current_user(&claims).await?;
    let plan = state.plan_service().redeem(user.id, &req.key).await?;

    Ok(Json(ApiResponse::new(PlanResponse::from(&plan))))
}

/// POST /api/admin/keys - Mint activation keys (founders only).
pub async fn mint_keys(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    ValidatedJson(req): ValidatedJson<MintKeysRequest>,
) -> Result<Json<ApiResponse<MintKeysResponse>>, ApiError> {
    let user = state.current_user(&claims).await?;
    require_founder(Some(&user))?;

    let keys = state.plan_service().mint_keys(user.id, req.count).await?;

    Ok(Json(ApiResponse::new(MintKeysResponse {
        keys: keys.iter().map(|k| k.to_string()).collect(),
    })))
}

/// GET /api/admin/keys - List activation keys (founders only).
pub async fn list_keys(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Query(query): Query<KeyListQuery>,
) -> Result<Json<ApiResponse<Vec<KeyRecord>>>, ApiError> {
    let user = state.current_user(&claims).await?;
    require_founder(Some(&user))?;

    let keys = KeyRepository::new(state.db.pool()).list(query.used).await?;
    Ok(Json(ApiResponse::new(keys)))
}
