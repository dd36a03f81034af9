//! Maintenance status and editor handlers.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::{self, Stream};

use crate::maintenance::{
    EditorError, MaintenanceEditor, MaintenanceMode, SqliteConfigStore, WriteOutcome,
    ACCESS_DENIED_MESSAGE, DEFAULT_MESSAGE,
};
use crate::web::dto::{
    ApiResponse, MaintenanceEditorResponse, MaintenanceStatusResponse, SetEnabledRequest,
    SetMessageRequest, SetModeRequest, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::middleware::{AuthUser, JwtClaims};
use crate::web::state::AppState;

type Editor = MaintenanceEditor<SqliteConfigStore>;

/// GET /api/maintenance - Public maintenance status.
pub async fn status(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<MaintenanceStatusResponse>> {
    let config = state.maintenance.config();
    Json(ApiResponse::new(MaintenanceStatusResponse::from(&config)))
}

/// GET /api/maintenance/stream - Status as Server-Sent Events.
///
/// The current status is sent immediately, then one `maintenance` event per
/// change.
pub async fn status_stream(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.maintenance.watch();

    let events = stream::unfold((rx, true), |(mut rx, first)| async move {
        if !first && rx.changed().await.is_err() {
            return None;
        }
        let status = MaintenanceStatusResponse::from(&rx.borrow_and_update().config);
        let event = match Event::default().event("maintenance").json_data(&status) {
            Ok(event) => event,
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode maintenance event");
                Event::default().event("maintenance").data("{}")
            }
        };
        Some((Ok(event), (rx, false)))
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

async fn open_editor(state: &AppState, claims: &JwtClaims) -> Result<Editor, ApiError> {
    let user = state.current_user(claims).await?;
    Ok(MaintenanceEditor::open(state.maintenance_store.clone(), user.role).await)
}

fn editor_response(editor: &Editor) -> Json<ApiResponse<MaintenanceEditorResponse>> {
    let notice = (!editor.view().can_view()).then_some(ACCESS_DENIED_MESSAGE);
    Json(ApiResponse::new(MaintenanceEditorResponse::new(
        editor.view(),
        editor.config(),
        notice,
    )))
}

fn persisted(outcome: WriteOutcome) -> Result<(), ApiError> {
    match outcome {
        WriteOutcome::Persisted => Ok(()),
        WriteOutcome::NotPersisted => Err(ApiError::internal(
            "Failed to save maintenance settings. Please try again.",
        )),
    }
}

/// GET /api/admin/maintenance - The maintenance panel for the caller.
///
/// Founders get the editor, admins a read-only view and everyone else the
/// access-denied notice.
pub async fn editor(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
) -> Result<Json<ApiResponse<MaintenanceEditorResponse>>, ApiError> {
    let editor = open_editor(&state, &claims).await?;
    Ok(editor_response(&editor))
}

/// PUT /api/admin/maintenance/enabled
pub async fn set_enabled(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Json(req): Json<SetEnabledRequest>,
) -> Result<Json<ApiResponse<MaintenanceEditorResponse>>, ApiError> {
    let mut editor = open_editor(&state, &claims).await?;
    persisted(editor.set_enabled(req.enabled).await?)?;
    tracing::info!(user_id = claims.sub, enabled = req.enabled, "Maintenance switched");
    Ok(editor_response(&editor))
}

/// PUT /api/admin/maintenance/mode
pub async fn set_mode(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Json(req): Json<SetModeRequest>,
) -> Result<Json<ApiResponse<MaintenanceEditorResponse>>, ApiError> {
    let mut editor = open_editor(&state, &claims).await?;
    if !editor.view().can_edit() {
        return Err(EditorError::ModeDenied.into());
    }
    let mode: MaintenanceMode = req
        .mode
        .parse()
        .map_err(|_| ApiError::bad_request("Mode must be 'warning' or 'global'"))?;

    persisted(editor.set_mode(mode).await?)?;
    tracing::info!(user_id = claims.sub, mode = %mode, "Maintenance mode changed");
    Ok(editor_response(&editor))
}

/// PUT /api/admin/maintenance/message
///
/// A blank message restores the default text.
pub async fn set_message(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    ValidatedJson(req): ValidatedJson<SetMessageRequest>,
) -> Result<Json<ApiResponse<MaintenanceEditorResponse>>, ApiError> {
    let mut editor = open_editor(&state, &claims).await?;
    let message = match req.message.trim() {
        "" => DEFAULT_MESSAGE.to_string(),
        trimmed => trimmed.to_string(),
    };

    persisted(editor.set_message(message).await?)?;
    tracing::info!(user_id = claims.sub, "Maintenance message changed");
    Ok(editor_response(&editor))
}
