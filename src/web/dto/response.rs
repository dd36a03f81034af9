//! Response DTOs for Web API.

use serde::Serialize;

use crate::datetime::to_rfc3339;
use crate::db::User;
use crate::file::{format_size, FileRecord};
use crate::maintenance::{EditorView, MaintenanceConfig, MaintenanceMode};
use crate::plan::{PlanType, UserPlan};

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Login and registration response.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Access token (JWT).
    pub access_token: String,
    /// Access token expiry in seconds.
    pub expires_in: u64,
    pub user: UserInfo,
}

/// User summary embedded in other responses.
#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    pub role: String,
    pub theme: String,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            display_name: user.display_name.clone(),
            role: user.role.as_str().to_string(),
            theme: user.theme.as_str().to_string(),
        }
    }
}

/// Current user response (for /api/auth/me).
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub role: String,
    pub theme: String,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<PlanResponse>,
}

impl MeResponse {
    pub fn new(user: &User, plan: Option<&UserPlan>) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            display_name: user.display_name.clone(),
            email: user.email.clone(),
            role: user.role.as_str().to_string(),
            theme: user.theme.as_str().to_string(),
            created_at: to_rfc3339(&user.created_at),
            last_login: user.last_login.as_deref().map(to_rfc3339),
            plan: plan.map(PlanResponse::from),
        }
    }
}

/// Plan and storage usage.
#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub plan_type: PlanType,
    pub storage_limit: i64,
    pub storage_used: i64,
    pub storage_remaining: i64,
    /// e.g. "12.5 MB of 100.0 MB".
    pub usage_display: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validated_at: Option<String>,
}

impl From<&UserPlan> for PlanResponse {
    fn from(plan: &UserPlan) -> Self {
        Self {
            plan_type: plan.plan_type,
            storage_limit: plan.storage_limit,
            storage_used: plan.storage_used,
            storage_remaining: plan.remaining(),
            usage_display: format!(
                "{} of {}",
                format_size(plan.storage_used.max(0) as u64),
                format_size(plan.storage_limit.max(0) as u64)
            ),
            validated_at: plan.validated_at.as_deref().map(to_rfc3339),
        }
    }
}

/// Public maintenance status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceStatusResponse {
    pub enabled: bool,
    pub message: String,
    pub mode: MaintenanceMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

impl From<&MaintenanceConfig> for MaintenanceStatusResponse {
    fn from(config: &MaintenanceConfig) -> Self {
        Self {
            enabled: config.enabled,
            message: config.message.clone(),
            mode: config.mode,
            last_updated: config.last_updated.map(|t| t.to_rfc3339()),
        }
    }
}

/// Maintenance panel as seen by the caller.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceEditorResponse {
    /// `editor`, `readOnly` or `denied`.
    pub view: &'static str,
    pub can_edit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<MaintenanceStatusResponse>,
    /// Explanation shown instead of the panel.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

impl MaintenanceEditorResponse {
    pub fn new(view: EditorView, config: Option<&MaintenanceConfig>, notice: Option<&str>) -> Self {
        Self {
            view: match view {
                EditorView::Editor => "editor",
                EditorView::ReadOnly => "readOnly",
                EditorView::Denied => "denied",
            },
            can_edit: view.can_edit(),
            config: config.map(MaintenanceStatusResponse::from),
            notice: notice.map(str::to_string),
        }
    }
}

/// File metadata.
#[derive(Debug, Serialize)]
pub struct FileResponse {
    pub id: i64,
    pub name: String,
    pub size: i64,
    pub size_display: String,
    pub mime_type: String,
    pub shared: bool,
    pub uploaded_at: String,
}

impl From<&FileRecord> for FileResponse {
    fn from(file: &FileRecord) -> Self {
        Self {
            id: file.id,
            name: file.name.clone(),
            size: file.size,
            size_display: format_size(file.size.max(0) as u64),
            mime_type: file.mime_type.clone(),
            shared: file.shared,
            uploaded_at: to_rfc3339(&file.uploaded_at),
        }
    }
}

/// Share link of a file.
#[derive(Debug, Serialize)]
pub struct ShareResponse {
    pub file: FileResponse,
    pub token: String,
    pub url: String,
}

/// Freshly minted keys.
#[derive(Debug, Serialize)]
pub struct MintKeysResponse {
    pub keys: Vec<String>,
}

/// User row in the admin panel.
#[derive(Debug, Serialize)]
pub struct AdminUserResponse {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub role: String,
    pub role_display: &'static str,
    pub is_active: bool,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login: Option<String>,
}

impl From<&User> for AdminUserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            display_name: user.display_name.clone(),
            email: user.email.clone(),
            role: user.role.as_str().to_string(),
            role_display: user.role.display_name(),
            is_active: user.is_active,
            created_at: to_rfc3339(&user.created_at),
            last_login: user.last_login.as_deref().map(to_rfc3339),
        }
    }
}
