//! File handlers.

use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use std::sync::Arc;

use crate::file::{share_url, Download};
use crate::web::dto::{ApiResponse, FileResponse, ShareResponse};
use crate::web::error::ApiError;
use crate::web::middleware::AuthUser;
use crate::web::state::AppState;

/// Content-Disposition value for `filename`.
///
/// Control characters, quotes and backslashes are stripped from the plain
/// `filename` parameter; non-ASCII names also get an RFC 5987 `filename*`.
fn content_disposition(filename: &str) -> String {
    let plain: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| if matches!(c, '"' | '\\') { '_' } else { c })
        .collect();

    if plain.is_ascii() && plain == filename {
        return format!("attachment; filename=\"{plain}\"");
    }
    format!(
        "attachment; filename=\"{plain}\"; filename*=UTF-8''{}",
        urlencoding::encode(filename)
    )
}

fn download_response(download: Download) -> Result<Response, ApiError> {
    let Download { record, content } = download;
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, record.mime_type.as_str())
        .header(header::CONTENT_DISPOSITION, content_disposition(&record.name))
        .header(header::CONTENT_LENGTH, content.len())
        .body(Body::from(content))
        .map_err(|e| {
            tracing::error!("Failed to build response: {}", e);
            ApiError::internal("Failed to build response")
        })
}

/// GET /api/files - The caller's files, newest first.
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
) -> Result<Json<ApiResponse<Vec<FileResponse>>>, ApiError> {
    let user = state.current_user(&claims).await?;
    let files = state.file_service().list(user.id).await?;
    Ok(Json(ApiResponse::new(
        files.iter().map(FileResponse::from).collect(),
    )))
}

/// POST /api/files - Upload a file.
///
/// Request body: multipart/form-data with a `file` field.
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<FileResponse>>), ApiError> {
    let user = state.current_user(&claims).await?;

    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::warn!("Failed to read multipart field: {}", e);
        ApiError::bad_request("Invalid multipart data")
    })? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let content = field.bytes().await.map_err(|e| {
            tracing::warn!("Failed to read file content: {}", e);
            ApiError::payload_too_large("File could not be read or is too large")
        })?;
        upload = Some((filename, content.to_vec()));
    }

    let (filename, content) = upload.ok_or_else(|| ApiError::bad_request("No file provided"))?;
    if content.len() as u64 > state.max_upload_size {
        return Err(ApiError::payload_too_large(format!(
            "File too large (max {})",
            crate::file::format_size(state.max_upload_size)
        )));
    }

    let record = state
        .file_service()
        .upload(user.id, &filename, &content)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(FileResponse::from(&record))),
    ))
}

/// GET /api/files/:id - Metadata of one of the caller's files.
pub async fn get_file(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(file_id): Path<i64>,
) -> Result<Json<ApiResponse<FileResponse>>, ApiError> {
    let user = state.current_user(&claims).await?;
    let record = state.file_service().get(user.id, file_id).await?;
    Ok(Json(ApiResponse::new(FileResponse::from(&record))))
}

/// GET /api/files/:id/download - Content of one of the caller's files.
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(file_id): Path<i64>,
) -> Result<Response, ApiError> {
    let user = state.current_user(&claims).await?;
    let download = state.file_service().download(user.id, file_id).await?;
    download_response(download)
}

/// POST /api/files/:id/share - Create (or return) the public link.
pub async fn share_file(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(file_id): Path<i64>,
) -> Result<Json<ApiResponse<ShareResponse>>, ApiError> {
    let user = state.current_user(&claims).await?;
    let (record, token) = state.file_service().share(user.id, file_id).await?;

    Ok(Json(ApiResponse::new(ShareResponse {
        file: FileResponse::from(&record),
        url: share_url(&state.public_url, &token),
        token,
    })))
}

/// DELETE /api/files/:id
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(file_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let user = state.current_user(&claims).await?;
    state.file_service().delete(user.id, file_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/share/:token - Download a shared file without signing in.
pub async fn download_shared(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Response, ApiError> {
    let download = state.file_service().download_shared(&token).await?;
    download_response(download)
}
